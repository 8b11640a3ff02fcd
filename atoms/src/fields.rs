//! Field-level checks shared by the task and bid payloads.
//!
//! Clients send loosely typed JSON (amounts as numbers or numeric strings,
//! dates as plain dates or full timestamps), so the helpers here normalise a
//! single field at a time. Whole-payload validation lives in each model.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

/// Deserialize a JSON request body. An empty body yields the default
/// payload so that required-field checks report what is missing.
pub fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    Ok(serde_json::from_slice(body)?)
}

/// Parse a client date. Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM[:SS]`
/// (read as UTC) or a plain `YYYY-MM-DD` (midnight UTC).
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// A JSON value counts as supplied unless it is null, false, zero or blank.
pub fn is_supplied(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

pub fn has_text(value: &Option<String>) -> bool {
    value.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
}

/// Numbers and numeric strings greater than zero.
pub fn positive_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n.is_finite() && n > 0.0).then_some(n)
}

/// Amounts are stored as DynamoDB numbers, so they are kept to a range
/// whose decimal form the table accepts.
pub const MIN_AMOUNT: f64 = 0.01;
pub const MAX_AMOUNT: f64 = 1_000_000_000_000.0;

/// A positive money amount within `MIN_AMOUNT..=MAX_AMOUNT`. `label` names
/// the field in the error message.
pub fn amount(value: &Value, label: &str) -> Result<f64, ApiError> {
    let n = positive_number(value)
        .ok_or_else(|| ApiError::validation(format!("{label} must be a positive number.")))?;
    if !(MIN_AMOUNT..=MAX_AMOUNT).contains(&n) {
        return Err(ApiError::validation(format!(
            "{label} must be between {MIN_AMOUNT} and {MAX_AMOUNT}."
        )));
    }
    Ok(n)
}
