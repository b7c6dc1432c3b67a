//! Soft-delete lifecycle shared by catalog records.

use serde::{Deserialize, Serialize};

/// Whether a record still participates in queries.
///
/// Records are never hard-deleted; archiving flips this flag and every list
/// or aggregate query filters on [`Lifecycle::is_active`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    #[default]
    Active,
    Archived,
}

impl Lifecycle {
    pub fn is_active(self) -> bool {
        matches!(self, Lifecycle::Active)
    }
}
