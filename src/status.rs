//! Review status translation
//!
//! Maps raw homework records to the fixed notification text sent to the
//! chat. The verdict table is an exhaustive match over [`ReviewStatus`], so
//! adding a variant without a verdict fails to compile.

use crate::error::ValidationError;
use serde_json::Value;

/// Review state of a submitted homework
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewStatus {
    /// Reviewed and accepted
    Approved,
    /// Taken by a reviewer, verdict pending
    Reviewing,
    /// Reviewed and returned for fixes
    Rejected,
}

impl ReviewStatus {
    /// The fixed human-readable verdict for this status
    pub fn verdict(self) -> &'static str {
        match self {
            ReviewStatus::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            ReviewStatus::Reviewing => "Работа взята на проверку ревьюером.",
            ReviewStatus::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }

    /// The wire name of this status as the API reports it
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewStatus::Approved => "approved",
            ReviewStatus::Reviewing => "reviewing",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(ReviewStatus::Approved),
            "reviewing" => Ok(ReviewStatus::Reviewing),
            "rejected" => Ok(ReviewStatus::Rejected),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }
}

/// A homework record extracted from the API payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Homework {
    /// Name of the submitted work
    pub name: String,
    /// Current review status
    pub status: ReviewStatus,
}

impl Homework {
    /// Extract a homework from a raw payload record.
    ///
    /// Both `homework_name` and `status` must be present as strings, and the
    /// status must be one of the known values. Records violating this are
    /// reported, not skipped, so API drift shows up in the logs.
    pub fn from_value(record: &Value) -> Result<Self, ValidationError> {
        let name = record
            .get("homework_name")
            .and_then(Value::as_str)
            .ok_or(ValidationError::NameMissing)?;
        let status = record
            .get("status")
            .and_then(Value::as_str)
            .ok_or(ValidationError::StatusMissing)?;

        Ok(Self {
            name: name.to_string(),
            status: status.parse()?,
        })
    }

    /// Render the notification message for this homework
    pub fn message(&self) -> String {
        format!(
            "Изменился статус проверки работы \"{}\". {}",
            self.name,
            self.status.verdict()
        )
    }
}

/// Translate a raw payload record into its notification message
pub fn translate(record: &Value) -> Result<String, ValidationError> {
    Ok(Homework::from_value(record)?.message())
}
