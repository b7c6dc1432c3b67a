//! Configuration loading and representation.
//!
//! Runtime knobs come from the environment; company settings are data and
//! live in the `settings` namespace.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use pharmaledger_core::BasisPoints;

pub const DEFAULT_STORAGE_PREFIX: &str = "sanj_healthcare_";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_NEAR_EXPIRY_DAYS: i64 = 30;
pub const DEFAULT_UPCOMING_DAYS: u32 = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub storage_prefix: String,
    pub near_expiry_days: i64,
    pub upcoming_days: u32,
    /// Load sample data into an empty store on startup.
    pub seed_sample_data: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            storage_prefix: DEFAULT_STORAGE_PREFIX.to_string(),
            near_expiry_days: DEFAULT_NEAR_EXPIRY_DAYS,
            upcoming_days: DEFAULT_UPCOMING_DAYS,
            seed_sample_data: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Unparsable values fall back to
    /// the default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            data_dir: lookup("PHARMALEDGER_DATA_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            storage_prefix: lookup("PHARMALEDGER_STORAGE_PREFIX").unwrap_or(defaults.storage_prefix),
            near_expiry_days: parse_or(
                &lookup,
                "PHARMALEDGER_NEAR_EXPIRY_DAYS",
                defaults.near_expiry_days,
            ),
            upcoming_days: parse_or(&lookup, "PHARMALEDGER_UPCOMING_DAYS", defaults.upcoming_days),
            seed_sample_data: parse_or(&lookup, "PHARMALEDGER_SEED", defaults.seed_sample_data),
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + core::fmt::Debug,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, ?default, "unparsable config value, using default");
                default
            }
        },
    }
}

/// Company settings persisted under `settings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub company_name: String,
    pub address: String,
    pub tax_rate: BasisPoints,
    pub currency: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            company_name: "Sanj Healthcare".to_string(),
            address: "Guwahati, Assam".to_string(),
            tax_rate: BasisPoints::percent(12),
            currency: "INR".to_string(),
        }
    }
}
