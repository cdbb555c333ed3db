//! Response shape validation
//!
//! The endpoint client hands over decoded JSON without interpreting it; this
//! module checks the shape the rest of the pipeline relies on and splits the
//! payload into its useful parts.

use crate::error::ValidationError;
use serde_json::Value;

/// Validated view of a status endpoint payload
#[derive(Clone, Debug, PartialEq)]
pub struct StatusPage {
    /// Raw homework records, most recently updated first, possibly empty
    pub homeworks: Vec<Value>,
    /// Server clock at response time (Unix seconds), when usable
    pub current_date: Option<i64>,
}

/// Check the payload shape and split it into a [`StatusPage`].
///
/// The payload must be a JSON object carrying a `homeworks` array. The
/// `current_date` field is advisory: an absent or non-integral value degrades
/// to `None` instead of failing the cycle.
pub fn validate(payload: Value) -> Result<StatusPage, ValidationError> {
    let Value::Object(mut map) = payload else {
        return Err(ValidationError::PayloadNotObject);
    };

    let homeworks = match map.remove("homeworks") {
        None => return Err(ValidationError::HomeworksMissing),
        Some(Value::Array(records)) => records,
        Some(_) => return Err(ValidationError::HomeworksNotArray),
    };

    let current_date = map.get("current_date").and_then(Value::as_i64);

    Ok(StatusPage {
        homeworks,
        current_date,
    })
}
