//! Domain error model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Every rule violated by a single input, in the order the rules were checked.
///
/// Validation never stops at the first failure: callers receive the complete
/// list so a form can highlight all offending fields at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, msg: impl Into<String>) {
        self.0.push(msg.into());
    }

    /// Records `msg` when `failed` holds.
    pub fn check(&mut self, failed: bool, msg: impl Into<String>) {
        if failed {
            self.push(msg);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.0.iter().any(|m| m.contains(needle))
    }

    /// `Ok(())` when nothing was recorded, otherwise `DomainError::Validation`.
    pub fn finish(self) -> DomainResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self))
        }
    }
}

impl From<Vec<String>> for ValidationErrors {
    fn from(value: Vec<String>) -> Self {
        Self(value)
    }
}

impl core::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0.join("; "))
    }
}

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures. Storage
/// failures belong to the infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// One or more input rules failed.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// An outbound movement asked for more than is on hand.
    #[error(
        "insufficient stock for {product_id} at {location}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: String,
        location: String,
        available: i64,
        requested: i64,
    },

    /// A stock quantity was negative.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A status change is not allowed from the current status.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl DomainError {
    /// Single-message validation failure.
    pub fn validation(msg: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.push(msg);
        Self::Validation(errors)
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl core::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Human-readable messages, one per violated rule.
    pub fn messages(&self) -> Vec<String> {
        match self {
            DomainError::Validation(errors) => errors.messages().to_vec(),
            other => vec![other.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_errors_finish_ok() {
        assert!(ValidationErrors::new().finish().is_ok());
    }

    #[test]
    fn collected_errors_are_all_reported() {
        let mut errors = ValidationErrors::new();
        errors.check(true, "Name is required");
        errors.check(false, "never recorded");
        errors.check(true, "Region is required");

        match errors.finish() {
            Err(DomainError::Validation(e)) => {
                assert_eq!(e.len(), 2);
                assert_eq!(e.to_string(), "Name is required; Region is required");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn messages_flatten_non_validation_errors() {
        let err = DomainError::not_found("invoice", "INV-ST1");
        assert_eq!(err.messages(), vec!["invoice not found: INV-ST1".to_string()]);
    }
}
