use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Three-statement forecast
// ---------------------------------------------------------------------------

#[napi]
pub fn build_forecast(input_json: String) -> NapiResult<String> {
    let input: fincast_core::three_statement::ForecastInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        fincast_core::three_statement::build_forecast(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Company facts
// ---------------------------------------------------------------------------

#[napi]
pub fn base_from_company_facts(facts_json: String) -> NapiResult<String> {
    let facts = fincast_core::facts::parse_company_facts(&facts_json).map_err(to_napi_error)?;
    let base = fincast_core::facts::base_from_company_facts(&facts).map_err(to_napi_error)?;
    serde_json::to_string(&base).map_err(to_napi_error)
}
