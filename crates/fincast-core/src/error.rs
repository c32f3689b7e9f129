use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForecastError {
    /// An assumption, the horizon, or a base-year field is outside its range.
    #[error("Invalid input: {field} = {value} (expected {expected})")]
    Validation {
        field: String,
        value: String,
        expected: String,
    },

    /// A required fact was missing from the external data source.
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// The balance-sheet identity failed after the cash plug. Always fatal.
    #[error(
        "Balance sheet does not balance in period {period}: total assets {total_assets} \
         vs liabilities + equity {total_liabilities_and_equity}"
    )]
    Balance {
        period: u32,
        total_assets: Decimal,
        total_liabilities_and_equity: Decimal,
    },

    #[error("Invalid engine state: cannot {operation} while {state}")]
    InvalidState { operation: String, state: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ForecastError {
    /// Shorthand for a range violation on a named field.
    pub fn validation(
        field: impl Into<String>,
        value: impl ToString,
        expected: impl Into<String>,
    ) -> Self {
        ForecastError::Validation {
            field: field.into(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(e: serde_json::Error) -> Self {
        ForecastError::Serialization(e.to_string())
    }
}
