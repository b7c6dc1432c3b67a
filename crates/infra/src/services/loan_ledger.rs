use std::sync::Arc;

use chrono::NaiveDate;

use pharmaledger_accounting::{
    Loan, LoanBook, LoanPayment, LoanSummary, NewBankLoan, NewPersonalLoan, PaymentLedger,
    PaymentRequest, PaymentSchedule, UpcomingPayment,
};
use pharmaledger_core::{DomainError, Entity, LoanId, PaymentId};

use crate::namespace::Namespace;
use crate::store::KeyValueStore;
use crate::unit_of_work::Storage;

use super::outcome::ServiceResult;

pub const BANK_LOAN_PREFIX: &str = "BLN";
pub const PERSONAL_LOAN_PREFIX: &str = "PLN";
pub const PAYMENT_PREFIX: &str = "PMT";

/// Loans and their payment history.
///
/// A payment updates the loan and appends to `payments` in the same unit
/// of work.
pub struct LoanLedger<S: KeyValueStore> {
    storage: Arc<Storage<S>>,
}

impl<S: KeyValueStore> LoanLedger<S> {
    pub fn new(storage: Arc<Storage<S>>) -> Self {
        Self { storage }
    }

    fn loans(&self) -> ServiceResult<LoanBook> {
        Ok(self.storage.fetch::<LoanBook>()?)
    }

    fn open(&self, loan: Loan) -> ServiceResult<Loan> {
        let mut uow = self.storage.begin(&[Namespace::Loans])?;
        let mut loans: LoanBook = uow.fetch()?;
        loans.add(loan.clone())?;
        uow.put(&loans)?;
        uow.commit()?;
        tracing::info!(
            loan_id = %loan.id(),
            counterparty = loan.counterparty(),
            amount = loan.amount(),
            "loan opened"
        );
        Ok(loan)
    }

    pub fn add_bank_loan(&self, input: NewBankLoan) -> ServiceResult<Loan> {
        let id = LoanId::generate_at(BANK_LOAN_PREFIX, input.occurred_at);
        self.open(Loan::open_bank(id, input)?)
    }

    pub fn add_personal_loan(&self, input: NewPersonalLoan) -> ServiceResult<Loan> {
        let id = LoanId::generate_at(PERSONAL_LOAN_PREFIX, input.occurred_at);
        self.open(Loan::open_personal(id, input)?)
    }

    pub fn get(&self, id: &LoanId) -> ServiceResult<Option<Loan>> {
        Ok(self.loans()?.get(id).cloned())
    }

    pub fn record_payment(&self, loan_id: &LoanId, request: PaymentRequest) -> ServiceResult<LoanPayment> {
        let mut uow = self.storage.begin(&[Namespace::Loans, Namespace::Payments])?;
        let mut loans: LoanBook = uow.fetch()?;
        let mut payments: PaymentLedger = uow.fetch()?;

        let payment_id = PaymentId::generate_at(PAYMENT_PREFIX, request.occurred_at);
        let loan = loans.get_mut(loan_id)?;
        let payment = loan.record_payment(payment_id, request)?;
        let paid_off = !loan.is_active();
        payments.record(payment.clone());

        uow.put(&loans)?;
        uow.put(&payments)?;
        uow.commit()?;

        tracing::info!(
            loan_id = %loan_id,
            amount = payment.amount,
            principal = payment.principal,
            interest = payment.interest,
            balance = payment.balance_after,
            paid_off,
            "loan payment recorded"
        );
        Ok(payment)
    }

    /// Projected installments; empty for personal loans.
    pub fn payment_schedule(&self, loan_id: &LoanId) -> ServiceResult<PaymentSchedule> {
        let loans = self.loans()?;
        let loan = loans
            .get(loan_id)
            .ok_or_else(|| DomainError::not_found("loan", loan_id))?;
        Ok(loan.payment_schedule())
    }

    pub fn upcoming_payments(&self, today: NaiveDate, days: u32) -> ServiceResult<Vec<UpcomingPayment>> {
        Ok(self.loans()?.upcoming_payments(today, days))
    }

    /// Simple interest accrued between two dates; `None` for bank loans.
    pub fn interest_for_period(
        &self,
        loan_id: &LoanId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ServiceResult<Option<i64>> {
        let loans = self.loans()?;
        let loan = loans
            .get(loan_id)
            .ok_or_else(|| DomainError::not_found("loan", loan_id))?;
        Ok(loan.interest_for_period(from, to))
    }

    /// Newest first.
    pub fn payments_for(&self, loan_id: &LoanId) -> ServiceResult<Vec<LoanPayment>> {
        let payments = self.storage.fetch::<PaymentLedger>()?;
        Ok(payments.for_loan(loan_id).into_iter().cloned().collect())
    }

    pub fn loan_summary(&self) -> ServiceResult<LoanSummary> {
        Ok(self.loans()?.summary())
    }
}
