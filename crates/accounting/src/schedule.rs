use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use pharmaledger_core::BasisPoints;

use crate::loan::{add_months, monthly_interest};

/// One projected row of an amortization schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    pub installment: u32,
    pub date: NaiveDate,
    pub principal: i64,
    pub interest: i64,
    pub total: i64,
    pub balance: i64,
}

/// Lazy amortization schedule for a fixed EMI.
///
/// Yields at most `tenure` rows; the principal part is clamped so the
/// balance never goes below zero.
#[derive(Debug, Clone)]
pub struct PaymentSchedule {
    balance: i64,
    rate: BasisPoints,
    emi: i64,
    tenure: u32,
    start: NaiveDate,
    next: u32,
}

impl PaymentSchedule {
    pub fn new(principal: i64, rate: BasisPoints, emi: i64, tenure: u32, start: NaiveDate) -> Self {
        Self {
            balance: principal,
            rate,
            emi,
            tenure,
            start,
            next: 1,
        }
    }

    pub fn empty(start: NaiveDate) -> Self {
        Self::new(0, BasisPoints::ZERO, 0, 0, start)
    }
}

impl Iterator for PaymentSchedule {
    type Item = Installment;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.tenure {
            return None;
        }
        let interest = monthly_interest(self.balance, self.rate);
        let principal = (self.emi - interest).clamp(0, self.balance.max(0));
        self.balance -= principal;
        let row = Installment {
            installment: self.next,
            date: add_months(self.start, self.next),
            principal,
            interest,
            total: principal + interest,
            balance: self.balance,
        };
        self.next += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.tenure + 1).saturating_sub(self.next) as usize;
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::calculate_emi;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn schedule_has_tenure_rows_and_ends_near_zero() {
        let rate = BasisPoints::from_bps(950);
        let emi = calculate_emi(500_000, rate, 48);
        let rows: Vec<_> = PaymentSchedule::new(500_000, rate, emi, 48, start()).collect();

        assert_eq!(rows.len(), 48);
        assert_eq!(rows[0].installment, 1);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());
        assert_eq!(rows[0].interest, 3_958);
        assert_eq!(rows[0].principal, emi - 3_958);
        assert_eq!(rows[47].date, NaiveDate::from_ymd_opt(2028, 1, 15).unwrap());
        assert!(rows[47].balance.abs() <= 50);
    }

    #[test]
    fn balance_is_monotone_and_never_negative() {
        let rows: Vec<_> =
            PaymentSchedule::new(10_000, BasisPoints::percent(12), 5_000, 6, start()).collect();
        let mut previous = 10_000;
        for row in &rows {
            assert!(row.balance >= 0);
            assert!(row.balance <= previous);
            previous = row.balance;
        }
        assert_eq!(rows.last().unwrap().balance, 0);
        assert_eq!(rows.last().unwrap().principal, 0);
    }

    #[test]
    fn empty_schedule_yields_nothing() {
        assert_eq!(PaymentSchedule::empty(start()).count(), 0);
    }

    #[test]
    fn schedule_is_restartable_by_clone() {
        let schedule = PaymentSchedule::new(12_000, BasisPoints::ZERO, 1_000, 12, start());
        assert_eq!(schedule.size_hint(), (12, Some(12)));
        let first: i64 = schedule.clone().map(|r| r.principal).sum();
        let second: i64 = schedule.map(|r| r.principal).sum();
        assert_eq!(first, 12_000);
        assert_eq!(first, second);
    }
}
