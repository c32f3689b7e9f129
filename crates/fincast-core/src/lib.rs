pub mod error;
pub mod numeric;
pub mod types;

#[cfg(feature = "three_statement")]
pub mod three_statement;

#[cfg(feature = "facts")]
pub mod facts;

pub use error::ForecastError;
pub use types::*;

/// Standard result type for all forecasting operations
pub type ForecastResult<T> = Result<T, ForecastError>;
