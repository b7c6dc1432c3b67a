//! Strongly-typed identifiers used across the domain.
//!
//! Identifiers are short uppercase strings: a record-type prefix, the creation
//! time in base-36 milliseconds and five random base-36 characters, e.g.
//! `PRODLXK2M3A1B9QZ`. They sort roughly by creation time within a prefix.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RANDOM_SUFFIX_LEN: u32 = 5;

fn to_base36(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Builds a raw identifier string for `prefix` at `now`.
pub fn generate_id(prefix: &str, now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().max(0) as u128;
    let random = Uuid::new_v4().as_u128() % 36u128.pow(RANDOM_SUFFIX_LEN);
    let suffix = format!(
        "{:0>width$}",
        to_base36(random),
        width = RANDOM_SUFFIX_LEN as usize
    );
    format!("{prefix}{}{suffix}", to_base36(millis)).to_uppercase()
}

macro_rules! impl_prefixed_id {
    ($t:ident, $prefix:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(String);

        impl $t {
            /// Default record-type prefix.
            pub const PREFIX: &'static str = $prefix;

            /// Create a new identifier stamped with the current time.
            pub fn new() -> Self {
                Self::generate_at($prefix, Utc::now())
            }

            /// Create a new identifier under a variant-specific prefix.
            pub fn with_prefix(prefix: &str) -> Self {
                Self::generate_at(prefix, Utc::now())
            }

            pub fn generate_at(prefix: &str, now: DateTime<Utc>) -> Self {
                Self(generate_id(prefix, now))
            }

            /// Wrap an existing identifier without checking its shape.
            ///
            /// Prefer explicit ids in tests for determinism.
            pub fn from_raw(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::validation(concat!(
                        stringify!($t),
                        " cannot be empty"
                    )));
                }
                Ok(Self(trimmed.to_string()))
            }
        }
    };
}

impl_prefixed_id!(ProductId, "PROD");
impl_prefixed_id!(DistributorId, "DIST");
impl_prefixed_id!(InventoryItemId, "INV");
impl_prefixed_id!(MovementId, "MOV");
impl_prefixed_id!(InvoiceId, "INV");
impl_prefixed_id!(InvoiceItemId, "INVITEM");
impl_prefixed_id!(LoanId, "LOAN");
impl_prefixed_id!(PaymentId, "PAY");
impl_prefixed_id!(ExpenseId, "EXP");

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn generated_ids_carry_prefix_and_are_uppercase() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let id = ProductId::generate_at(ProductId::PREFIX, now);

        assert!(id.as_str().starts_with("PROD"));
        assert_eq!(id.as_str(), id.as_str().to_uppercase());
        // prefix + 8 timestamp chars + 5 random chars
        assert_eq!(id.as_str().len(), 4 + 8 + 5);
    }

    #[test]
    fn ids_generated_in_the_same_millisecond_differ() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let a = InvoiceId::generate_at("INV-ST", now);
        let b = InvoiceId::generate_at("INV-ST", now);
        assert_ne!(a, b);
    }

    #[test]
    fn base36_encoding() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn parse_rejects_blank() {
        assert!("  ".parse::<LoanId>().is_err());
        assert_eq!("BLN1".parse::<LoanId>().unwrap().as_str(), "BLN1");
    }

    #[test]
    fn serializes_transparently() {
        let id = DistributorId::from_raw("SS001");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"SS001\"");
    }
}
