use serde::{Deserialize, Serialize};
use thiserror::Error;

use pharmaledger_core::DomainError;

use crate::store::StoreError;

/// Service-level failure: a rule was broken, or storage failed.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Human-readable messages, one per broken rule.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ServiceError::Domain(err) => err.messages(),
            ServiceError::Store(err) => vec![err.to_string()],
        }
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, ServiceError::Domain(_))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Serializable `{success, data, errors}` result shape for callers that
/// cannot consume a Rust `Result` (UI bridges, JSON output).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl<T> Outcome<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            errors: Vec::new(),
        }
    }

    pub fn failed(errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            errors,
        }
    }
}

impl<T> From<ServiceResult<T>> for Outcome<T> {
    fn from(result: ServiceResult<T>) -> Self {
        match result {
            Ok(data) => Outcome::ok(data),
            Err(err) => Outcome::failed(err.messages()),
        }
    }
}
