use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use pharmaledger_core::{DomainError, DomainResult, LoanId, PaymentId};

/// Command: pay against a loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount: i64,
    pub date: NaiveDate,
    /// Principal component for personal loans. Ignored for bank loans.
    pub principal: Option<i64>,
    pub penalty: i64,
    pub payment_method: String,
    pub reference: String,
    pub notes: String,
    pub occurred_at: DateTime<Utc>,
}

/// A recorded loan payment. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanPayment {
    pub id: PaymentId,
    pub loan_id: LoanId,
    pub date: NaiveDate,
    pub amount: i64,
    pub principal: i64,
    pub interest: i64,
    pub penalty: i64,
    pub balance_after: i64,
    pub payment_method: String,
    pub reference: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl LoanPayment {
    pub(crate) fn new(
        id: PaymentId,
        loan_id: LoanId,
        principal: i64,
        interest: i64,
        balance_after: i64,
        request: PaymentRequest,
    ) -> DomainResult<Self> {
        if principal + interest + request.penalty != request.amount {
            return Err(DomainError::invariant(format!(
                "payment components {principal} + {interest} + {} do not sum to {}",
                request.penalty, request.amount
            )));
        }
        Ok(Self {
            id,
            loan_id,
            date: request.date,
            amount: request.amount,
            principal,
            interest,
            penalty: request.penalty,
            balance_after,
            payment_method: request.payment_method,
            reference: request.reference,
            notes: request.notes,
            created_at: request.occurred_at,
        })
    }
}

/// Append-only history of loan payments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentLedger {
    payments: Vec<LoanPayment>,
}

impl PaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, payment: LoanPayment) {
        self.payments.push(payment);
    }

    pub fn all(&self) -> &[LoanPayment] {
        &self.payments
    }

    pub fn len(&self) -> usize {
        self.payments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }

    /// Payments for one loan, newest first.
    pub fn for_loan(&self, loan_id: &LoanId) -> Vec<&LoanPayment> {
        let mut payments: Vec<_> = self.payments.iter().filter(|p| &p.loan_id == loan_id).collect();
        payments.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.created_at.cmp(&a.created_at)));
        payments
    }

    pub fn total_paid(&self, loan_id: &LoanId) -> i64 {
        self.payments.iter().filter(|p| &p.loan_id == loan_id).map(|p| p.amount).sum()
    }

    pub fn total_interest(&self, loan_id: &LoanId) -> i64 {
        self.payments.iter().filter(|p| &p.loan_id == loan_id).map(|p| p.interest).sum()
    }
}
