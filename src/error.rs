use thiserror::Error;

use crate::template::TemplateError;

/// A single failed constraint on a trigger configuration field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Configuration field the constraint applies to.
    pub field: &'static str,
    /// Why the value was rejected.
    pub reason: String,
}

impl Violation {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }

    /// Shorthand for a required field that was left empty.
    pub fn required(field: &'static str) -> Self {
        Self::new(field, "is required")
    }
}

/// Configuration rejected by `validate`, carrying every failed constraint.
///
/// Raised before any client construction, so a trigger with an invalid
/// configuration never touches the transport.
#[derive(Error, Debug)]
#[error("invalid trigger configuration: {}", describe(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

fn describe(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("{} {}", v.field, v.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}

#[derive(Error, Debug)]
pub enum TriggerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("template rendering failed: {0}")]
    Template(#[from] TemplateError),

    #[error("mqtt publish failed: {0}")]
    Publish(String),

    #[error("chat api call failed: {0}")]
    Chat(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TriggerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_violation() {
        let err = ValidationError::new(vec![
            Violation::required("token"),
            Violation::new("mode", "must be one of simple, batch"),
        ]);
        assert_eq!(
            err.to_string(),
            "invalid trigger configuration: token is required, mode must be one of simple, batch"
        );
    }
}
