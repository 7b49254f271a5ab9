//! Result of one validation call

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Whether a message conformed, and why not if it did not.
///
/// The message is empty on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationOutcome {
    pub valid: bool,
    #[serde(default)]
    pub message: String,
}

impl ValidationOutcome {
    #[must_use]
    pub fn passed() -> Self {
        Self {
            valid: true,
            message: String::new(),
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// `Ok(())` when valid, the failure message otherwise.
    ///
    /// # Errors
    ///
    /// Returns the captured message when the outcome is invalid.
    pub fn into_result(self) -> Result<(), String> {
        if self.valid { Ok(()) } else { Err(self.message) }
    }
}

impl<E: std::fmt::Display> From<Result<(), E>> for ValidationOutcome {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::passed(),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passed_has_empty_message() {
        let o = ValidationOutcome::passed();
        assert!(o.is_valid());
        assert!(o.message.is_empty());
        assert_eq!(o.into_result(), Ok(()));
    }

    #[test]
    fn failed_keeps_message() {
        let o = ValidationOutcome::failed("id is not an integer");
        assert!(!o.is_valid());
        assert_eq!(o.into_result(), Err("id is not an integer".to_string()));
    }

    #[test]
    fn from_result_uses_display() {
        let err: Result<(), std::fmt::Error> = Err(std::fmt::Error);
        let o = ValidationOutcome::from(err);
        assert!(!o.valid);
        assert_eq!(o.message, std::fmt::Error.to_string());

        let ok: Result<(), std::fmt::Error> = Ok(());
        assert_eq!(ValidationOutcome::from(ok), ValidationOutcome::passed());
    }

    #[test]
    fn serializes_as_flat_object() {
        let json = serde_json::to_value(ValidationOutcome::failed("bad")).unwrap();
        assert_eq!(json, serde_json::json!({"valid": false, "message": "bad"}));
    }
}
