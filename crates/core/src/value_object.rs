//! Value objects: equality by value, not identity.

use serde::{Deserialize, Serialize};

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. To
/// "modify" one, build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// A percentage expressed in basis points (`1200` = 12%).
///
/// Discounts, tax rates and interest rates are all carried this way so money
/// math stays in integers until the single rounding step in [`BasisPoints::apply`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BasisPoints(u32);

impl BasisPoints {
    pub const ZERO: BasisPoints = BasisPoints(0);
    pub const HUNDRED_PERCENT: BasisPoints = BasisPoints(10_000);

    pub const fn from_bps(bps: u32) -> Self {
        Self(bps)
    }

    /// Whole-percent constructor (`percent(12)` = 12%).
    pub const fn percent(whole: u32) -> Self {
        Self(whole * 100)
    }

    pub const fn bps(self) -> u32 {
        self.0
    }

    pub fn as_percent(self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// Rate as a fraction (`1200` -> `0.12`).
    pub fn as_fraction(self) -> f64 {
        f64::from(self.0) / 10_000.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn at_most_hundred_percent(self) -> bool {
        self <= Self::HUNDRED_PERCENT
    }

    /// `amount * rate`, rounded half away from zero to the nearest unit.
    /// Results beyond the `i64` range saturate.
    pub fn apply(self, amount: i64) -> i64 {
        let product = i128::from(amount) * i128::from(self.0);
        let half = if product >= 0 { 5_000 } else { -5_000 };
        let rounded = (product + half) / 10_000;
        i64::try_from(rounded).unwrap_or(if rounded < 0 { i64::MIN } else { i64::MAX })
    }
}

impl ValueObject for BasisPoints {}

impl core::fmt::Display for BasisPoints {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}%", self.as_percent())
    }
}
