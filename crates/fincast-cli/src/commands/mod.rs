pub mod facts;
pub mod forecast;
