//! Structured error types for the insights engine.
//!
//! Per-commit problems never surface here; they are defaulted during normalization.
//! Only request-level problems (bad bounds, unknown lookups, unreadable JSON) do.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InsightsError {
  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  #[error("not found: {what} {key}")]
  NotFound { what: String, key: String },

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("io: {0}")]
  Io(#[from] std::io::Error),
}

impl InsightsError {
  pub fn validation(field: &str, reason: &str) -> Self {
    Self::Validation {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn not_found(what: &str, key: impl Into<String>) -> Self {
    Self::NotFound {
      what: what.to_string(),
      key: key.into(),
    }
  }

  /// Name of the offending input field, when the error is tied to one.
  pub fn field(&self) -> Option<&str> {
    match self {
      Self::Validation { field, .. } => Some(field),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn validation_message_names_field() {
    let err = InsightsError::validation("now", "invalid RFC3339");
    assert_eq!(err.to_string(), "validation: now: invalid RFC3339");
    assert_eq!(err.field(), Some("now"));
  }

  #[test]
  fn not_found_has_no_field() {
    let err = InsightsError::not_found("commit", "abc1234");
    assert!(err.to_string().contains("abc1234"));
    assert!(err.field().is_none());
  }
}
