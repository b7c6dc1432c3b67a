//! Contact-detail checks for Indian distributors.

use std::sync::LazyLock;

use regex::Regex;

use pharmaledger_core::{DomainResult, ValidationErrors};

use crate::distributor::NewDistributor;

static MOBILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[6-9]\d{9}$").expect("valid mobile regex"));
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static GSTIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{2}[A-Z]{5}[0-9]{4}[A-Z][1-9A-Z]Z[0-9A-Z]$").expect("valid gstin regex")
});

/// Ten-digit Indian mobile number; formatting characters are ignored.
pub fn valid_phone(phone: &str) -> bool {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    MOBILE.is_match(&digits)
}

pub fn valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

pub fn valid_gstin(gstin: &str) -> bool {
    GSTIN.is_match(gstin)
}

/// Collects every rule a new distributor breaks.
///
/// Email and GSTIN are optional; when present they must be well formed.
pub fn validate_distributor(input: &NewDistributor) -> DomainResult<()> {
    let mut errors = ValidationErrors::new();
    errors.check(input.name.trim().is_empty(), "Name is required");
    if input.phone.trim().is_empty() {
        errors.push("Contact is required");
    } else {
        errors.check(!valid_phone(&input.phone), "Valid phone number is required");
    }
    errors.check(input.region.trim().is_empty(), "Region is required");
    errors.check(input.credit_limit < 0, "Credit limit cannot be negative");
    if let Some(email) = input.email.as_deref().filter(|e| !e.is_empty()) {
        errors.check(!valid_email(email), "Valid email is required");
    }
    if let Some(gstin) = input.gstin.as_deref().filter(|g| !g.is_empty()) {
        errors.check(!valid_gstin(gstin), "Valid GSTIN is required");
    }
    errors.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_accepts_formatted_mobile_numbers() {
        assert!(valid_phone("98765 43210"));
        assert!(valid_phone("(987) 654-3210"));
        assert!(!valid_phone("5876543210"));
        assert!(!valid_phone("987654321"));
    }

    #[test]
    fn gstin_shape() {
        assert!(valid_gstin("18AABCS1234A1Z5"));
        assert!(!valid_gstin("18aabcs1234a1z5"));
    }

    #[test]
    fn email_shape() {
        assert!(valid_email("orders@sanj.in"));
        assert!(!valid_email("orders@sanj"));
    }
}
