use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use pharmaledger_core::{DomainError, DomainResult, Entity, LoanId};

use crate::loan::{Loan, LoanKind, LoanTerms};

/// A payment expected within the look-ahead window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingPayment {
    pub loan_id: LoanId,
    pub kind: LoanKind,
    pub description: String,
    pub amount: i64,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanTypeSummary {
    pub count: usize,
    pub active: usize,
    pub total_balance: i64,
    pub total_monthly: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanSummary {
    pub bank: LoanTypeSummary,
    pub personal: LoanTypeSummary,
    pub total_balance: i64,
    pub total_monthly: i64,
}

/// All loans, kept in separate bank and personal collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoanBook {
    bank: Vec<Loan>,
    personal: Vec<Loan>,
}

impl LoanBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bank(&self) -> &[Loan] {
        &self.bank
    }

    pub fn personal(&self) -> &[Loan] {
        &self.personal
    }

    pub fn all(&self) -> impl Iterator<Item = &Loan> {
        self.bank.iter().chain(self.personal.iter())
    }

    pub fn get(&self, id: &LoanId) -> Option<&Loan> {
        self.all().find(|l| l.id() == id)
    }

    pub fn get_mut(&mut self, id: &LoanId) -> DomainResult<&mut Loan> {
        self.bank
            .iter_mut()
            .chain(self.personal.iter_mut())
            .find(|l| l.id() == id)
            .ok_or_else(|| DomainError::not_found("loan", id))
    }

    /// Adds a loan to the collection matching its kind.
    pub fn add(&mut self, loan: Loan) -> DomainResult<()> {
        if self.get(loan.id()).is_some() {
            return Err(DomainError::invariant(format!("loan {} already exists", loan.id())));
        }
        match loan.kind() {
            LoanKind::Bank => self.bank.push(loan),
            LoanKind::Personal => self.personal.push(loan),
        }
        Ok(())
    }

    /// Active loans with a payment due in `[today, today + days]`, soonest first.
    pub fn upcoming_payments(&self, today: NaiveDate, days: u32) -> Vec<UpcomingPayment> {
        let horizon = today + Duration::days(i64::from(days));
        let mut upcoming: Vec<_> = self
            .all()
            .filter_map(|loan| {
                let due = loan.next_due()?;
                if due < today || due > horizon {
                    return None;
                }
                let description = match loan.terms() {
                    LoanTerms::Bank { bank, .. } => format!("EMI - {bank}"),
                    LoanTerms::Personal { lender, .. } => format!("Interest - {lender}"),
                };
                Some(UpcomingPayment {
                    loan_id: loan.id().clone(),
                    kind: loan.kind(),
                    description,
                    amount: loan.periodic_amount(),
                    due_date: due,
                })
            })
            .collect();
        upcoming.sort_by_key(|p| p.due_date);
        upcoming
    }

    pub fn summary(&self) -> LoanSummary {
        fn tally(loans: &[Loan]) -> LoanTypeSummary {
            loans.iter().fold(LoanTypeSummary::default(), |mut acc, loan| {
                acc.count += 1;
                if loan.is_active() {
                    acc.active += 1;
                    acc.total_balance += loan.balance();
                    acc.total_monthly += loan.periodic_amount();
                }
                acc
            })
        }
        let bank = tally(&self.bank);
        let personal = tally(&self.personal);
        LoanSummary {
            bank,
            personal,
            total_balance: bank.total_balance + personal.total_balance,
            total_monthly: bank.total_monthly + personal.total_monthly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::{InterestFrequency, NewBankLoan, NewPersonalLoan, PrincipalRepayment};
    use crate::payment::PaymentRequest;
    use chrono::{DateTime, TimeZone, Utc};
    use pharmaledger_core::{BasisPoints, PaymentId};

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bank(id: &str, due: NaiveDate) -> Loan {
        Loan::open_bank(
            LoanId::from_raw(id),
            NewBankLoan {
                bank: "HDFC".to_string(),
                account_number: String::new(),
                amount: 500_000,
                interest_rate: BasisPoints::from_bps(950),
                tenure_months: 48,
                emi: None,
                start_date: date(2024, 1, 1),
                emi_due_date: Some(due),
                penalty_rate: BasisPoints::ZERO,
                purpose: String::new(),
                notes: String::new(),
                occurred_at: test_time(),
            },
        )
        .unwrap()
    }

    fn personal(id: &str, start: NaiveDate) -> Loan {
        Loan::open_personal(
            LoanId::from_raw(id),
            NewPersonalLoan {
                lender: "Mr. Das".to_string(),
                lender_contact: String::new(),
                amount: 100_000,
                interest_rate: BasisPoints::percent(18),
                start_date: start,
                monthly_interest: None,
                interest_frequency: InterestFrequency::Monthly,
                principal_repayment: PrincipalRepayment::Bullet,
                purpose: String::new(),
                notes: String::new(),
                occurred_at: test_time(),
            },
        )
        .unwrap()
    }

    #[test]
    fn upcoming_payments_window_and_order() {
        let today = date(2024, 3, 1);
        let mut book = LoanBook::new();
        book.add(bank("BLN1", date(2024, 3, 6))).unwrap();
        book.add(bank("BLN2", date(2024, 3, 20))).unwrap();
        book.add(bank("BLN3", date(2024, 2, 28))).unwrap();
        book.add(personal("PLN1", date(2024, 2, 3))).unwrap();

        let upcoming = book.upcoming_payments(today, 7);
        let ids: Vec<_> = upcoming.iter().map(|p| p.loan_id.as_str()).collect();
        assert_eq!(ids, vec!["PLN1", "BLN1"]);
        assert_eq!(upcoming[0].description, "Interest - Mr. Das");
        assert_eq!(upcoming[0].amount, 1_500);
        assert_eq!(upcoming[1].description, "EMI - HDFC");
        assert_eq!(upcoming[1].amount, 12_562);
    }

    #[test]
    fn paid_loans_have_no_upcoming_payment() {
        let mut book = LoanBook::new();
        book.add(personal("PLN1", date(2024, 2, 3))).unwrap();
        let loan = book.get_mut(&LoanId::from_raw("PLN1")).unwrap();
        loan.record_payment(
            PaymentId::from_raw("PMT1"),
            PaymentRequest {
                amount: 100_000,
                date: date(2024, 2, 20),
                principal: Some(100_000),
                penalty: 0,
                payment_method: "cash".to_string(),
                reference: String::new(),
                notes: String::new(),
                occurred_at: test_time(),
            },
        )
        .unwrap();

        assert!(book.upcoming_payments(date(2024, 3, 1), 60).is_empty());
        let summary = book.summary();
        assert_eq!(summary.personal.count, 1);
        assert_eq!(summary.personal.active, 0);
        assert_eq!(summary.total_balance, 0);
    }

    #[test]
    fn summary_totals_active_loans() {
        let mut book = LoanBook::new();
        book.add(bank("BLN1", date(2024, 2, 1))).unwrap();
        book.add(personal("PLN1", date(2024, 1, 1))).unwrap();
        let summary = book.summary();
        assert_eq!(summary.bank.count, 1);
        assert_eq!(summary.total_balance, 600_000);
        assert_eq!(summary.total_monthly, 12_562 + 1_500);
    }

    #[test]
    fn duplicate_and_missing_loans_are_rejected() {
        let mut book = LoanBook::new();
        book.add(bank("BLN1", date(2024, 2, 1))).unwrap();
        assert!(matches!(
            book.add(bank("BLN1", date(2024, 2, 1))),
            Err(DomainError::InvariantViolation(_))
        ));
        assert!(matches!(
            book.get_mut(&LoanId::from_raw("NOPE")),
            Err(DomainError::NotFound { entity: "loan", .. })
        ));
    }
}
