use std::sync::Arc;

use thiserror::Error;

/// Storage operation error.
///
/// These are **infrastructure errors** (IO, encoding, locking) as opposed to
/// domain errors (validation, invariants). Services wrap both in
/// [`crate::services::ServiceError`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failed for '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("write rejected: {0}")]
    Rejected(String),
}

impl StoreError {
    pub fn serialization(key: impl Into<String>, source: serde_json::Error) -> Self {
        StoreError::Serialization {
            key: key.into(),
            source,
        }
    }
}

/// Flat string key-value store holding one JSON document per key.
///
/// ## Contract
///
/// - `get` of a missing key is `Ok(None)`, never an error
/// - `set` replaces the whole value for the key
/// - `remove` of a missing key is a no-op
/// - a failed `set` leaves the previous value readable
///
/// Implementations must be safe to share across threads. Multi-key
/// atomicity is not part of this trait; [`crate::unit_of_work::UnitOfWork`]
/// layers it on top.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// All keys currently holding a value, sorted.
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).keys()
    }
}
