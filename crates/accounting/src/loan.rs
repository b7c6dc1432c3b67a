use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use pharmaledger_core::{
    BasisPoints, DomainError, DomainResult, Entity, LoanId, PaymentId, ValidationErrors,
};

use crate::payment::{LoanPayment, PaymentRequest};
use crate::schedule::PaymentSchedule;

/// Equated monthly installment for `principal` at `annual_rate` over
/// `tenure_months`, rounded to the nearest unit.
///
/// A zero rate spreads the principal evenly.
pub fn calculate_emi(principal: i64, annual_rate: BasisPoints, tenure_months: u32) -> i64 {
    if tenure_months == 0 {
        return principal;
    }
    if annual_rate.is_zero() {
        return (principal as f64 / f64::from(tenure_months)).round() as i64;
    }
    let r = annual_rate.as_fraction() / 12.0;
    let growth = (1.0 + r).powi(tenure_months as i32);
    (principal as f64 * r * growth / (growth - 1.0)).round() as i64
}

/// One month of simple interest on `balance`, rounded to the nearest unit.
pub fn monthly_interest(balance: i64, annual_rate: BasisPoints) -> i64 {
    let numerator = i128::from(balance) * i128::from(annual_rate.bps());
    let denominator = 12 * 10_000;
    ((numerator + denominator / 2) / denominator) as i64
}

pub(crate) fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months)).unwrap_or(date)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanKind {
    Bank,
    Personal,
}

/// `Active` until the balance reaches zero, then `Paid` for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    Active,
    Paid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterestFrequency {
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl InterestFrequency {
    pub fn months(self) -> u32 {
        match self {
            InterestFrequency::Monthly => 1,
            InterestFrequency::Quarterly => 3,
            InterestFrequency::Yearly => 12,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalRepayment {
    #[default]
    Bullet,
    Monthly,
    Custom,
}

/// Kind-specific loan data, stored next to the common fields under a `type` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum LoanTerms {
    Bank {
        bank: String,
        account_number: String,
        tenure_months: u32,
        emi: i64,
        emi_due_date: NaiveDate,
        penalty_rate: BasisPoints,
    },
    Personal {
        lender: String,
        lender_contact: String,
        monthly_interest: i64,
        last_payment_date: Option<NaiveDate>,
        interest_frequency: InterestFrequency,
        principal_repayment: PrincipalRepayment,
    },
}

/// Command: record a new EMI-based bank loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBankLoan {
    pub bank: String,
    pub account_number: String,
    pub amount: i64,
    pub interest_rate: BasisPoints,
    pub tenure_months: u32,
    /// Computed from amount, rate and tenure when absent.
    pub emi: Option<i64>,
    pub start_date: NaiveDate,
    /// Defaults to one month after the start date.
    pub emi_due_date: Option<NaiveDate>,
    pub penalty_rate: BasisPoints,
    pub purpose: String,
    pub notes: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: record a new interest-only personal loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPersonalLoan {
    pub lender: String,
    pub lender_contact: String,
    pub amount: i64,
    pub interest_rate: BasisPoints,
    pub start_date: NaiveDate,
    /// Computed from amount and rate when absent.
    pub monthly_interest: Option<i64>,
    pub interest_frequency: InterestFrequency,
    pub principal_repayment: PrincipalRepayment,
    pub purpose: String,
    pub notes: String,
    pub occurred_at: DateTime<Utc>,
}

/// Aggregate root: Loan.
///
/// The balance only ever decreases, and only through
/// [`Loan::record_payment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    id: LoanId,
    amount: i64,
    interest_rate: BasisPoints,
    start_date: NaiveDate,
    balance: i64,
    status: LoanStatus,
    purpose: String,
    notes: String,
    #[serde(flatten)]
    terms: LoanTerms,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Loan {
    pub fn open_bank(id: LoanId, input: NewBankLoan) -> DomainResult<Self> {
        let mut errors = ValidationErrors::new();
        errors.check(input.bank.trim().is_empty(), "Bank name is required");
        errors.check(input.amount <= 0, "Valid loan amount is required");
        errors.check(input.interest_rate.is_zero(), "Valid interest rate is required");
        errors.check(input.tenure_months == 0, "Valid tenure is required");
        errors.finish()?;

        let emi = input
            .emi
            .filter(|e| *e > 0)
            .unwrap_or_else(|| calculate_emi(input.amount, input.interest_rate, input.tenure_months));
        Ok(Self {
            id,
            amount: input.amount,
            interest_rate: input.interest_rate,
            start_date: input.start_date,
            balance: input.amount,
            status: LoanStatus::Active,
            purpose: input.purpose,
            notes: input.notes,
            terms: LoanTerms::Bank {
                bank: input.bank.trim().to_string(),
                account_number: input.account_number,
                tenure_months: input.tenure_months,
                emi,
                emi_due_date: input
                    .emi_due_date
                    .unwrap_or_else(|| add_months(input.start_date, 1)),
                penalty_rate: input.penalty_rate,
            },
            created_at: input.occurred_at,
            updated_at: input.occurred_at,
        })
    }

    pub fn open_personal(id: LoanId, input: NewPersonalLoan) -> DomainResult<Self> {
        let mut errors = ValidationErrors::new();
        errors.check(input.lender.trim().is_empty(), "Lender name is required");
        errors.check(input.amount <= 0, "Valid loan amount is required");
        errors.check(input.interest_rate.is_zero(), "Valid interest rate is required");
        errors.finish()?;

        let interest = input
            .monthly_interest
            .filter(|i| *i > 0)
            .unwrap_or_else(|| monthly_interest(input.amount, input.interest_rate));
        Ok(Self {
            id,
            amount: input.amount,
            interest_rate: input.interest_rate,
            start_date: input.start_date,
            balance: input.amount,
            status: LoanStatus::Active,
            purpose: input.purpose,
            notes: input.notes,
            terms: LoanTerms::Personal {
                lender: input.lender.trim().to_string(),
                lender_contact: input.lender_contact,
                monthly_interest: interest,
                last_payment_date: None,
                interest_frequency: input.interest_frequency,
                principal_repayment: input.principal_repayment,
            },
            created_at: input.occurred_at,
            updated_at: input.occurred_at,
        })
    }

    pub fn kind(&self) -> LoanKind {
        match self.terms {
            LoanTerms::Bank { .. } => LoanKind::Bank,
            LoanTerms::Personal { .. } => LoanKind::Personal,
        }
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn interest_rate(&self) -> BasisPoints {
        self.interest_rate
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    pub fn status(&self) -> LoanStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    pub fn terms(&self) -> &LoanTerms {
        &self.terms
    }

    /// Bank or lender name.
    pub fn counterparty(&self) -> &str {
        match &self.terms {
            LoanTerms::Bank { bank, .. } => bank,
            LoanTerms::Personal { lender, .. } => lender,
        }
    }

    pub fn emi(&self) -> Option<i64> {
        match self.terms {
            LoanTerms::Bank { emi, .. } => Some(emi),
            LoanTerms::Personal { .. } => None,
        }
    }

    /// Regular amount owed per period: the EMI, or interest for one
    /// interest period.
    pub fn periodic_amount(&self) -> i64 {
        match &self.terms {
            LoanTerms::Bank { emi, .. } => *emi,
            LoanTerms::Personal {
                monthly_interest,
                interest_frequency,
                ..
            } => monthly_interest * i64::from(interest_frequency.months()),
        }
    }

    /// Next date a payment falls due; `None` once the loan is paid.
    pub fn next_due(&self) -> Option<NaiveDate> {
        if !self.is_active() {
            return None;
        }
        match &self.terms {
            LoanTerms::Bank { emi_due_date, .. } => Some(*emi_due_date),
            LoanTerms::Personal {
                last_payment_date,
                interest_frequency,
                ..
            } => Some(add_months(
                last_payment_date.unwrap_or(self.start_date),
                interest_frequency.months(),
            )),
        }
    }

    /// Simple interest accrued on the current balance between two dates.
    ///
    /// Only personal loans accrue this way; bank loans return `None`.
    pub fn interest_for_period(&self, from: NaiveDate, to: NaiveDate) -> Option<i64> {
        match self.terms {
            LoanTerms::Personal { .. } => {
                let days = i128::from(to.signed_duration_since(from).num_days());
                let numerator = i128::from(self.balance) * i128::from(self.interest_rate.bps()) * days;
                let denominator: i128 = 10_000 * 365;
                let half = if numerator >= 0 { denominator / 2 } else { -denominator / 2 };
                Some(((numerator + half) / denominator) as i64)
            }
            LoanTerms::Bank { .. } => None,
        }
    }

    /// Projected installments from the original amount. Empty for personal loans.
    pub fn payment_schedule(&self) -> PaymentSchedule {
        match self.terms {
            LoanTerms::Bank {
                tenure_months, emi, ..
            } => PaymentSchedule::new(self.amount, self.interest_rate, emi, tenure_months, self.start_date),
            LoanTerms::Personal { .. } => PaymentSchedule::empty(self.start_date),
        }
    }

    /// Total paid over the full tenure minus the amount borrowed.
    pub fn total_interest(&self) -> Option<i64> {
        match self.terms {
            LoanTerms::Bank {
                tenure_months, emi, ..
            } => Some(emi * i64::from(tenure_months) - self.amount),
            LoanTerms::Personal { .. } => None,
        }
    }

    /// Splits a payment into penalty, interest and principal and applies it.
    ///
    /// Bank loans pay a month's interest on the balance first and the rest
    /// goes to principal. Personal loans treat the whole payment as interest
    /// unless a principal component is given. A paid loan takes no more
    /// payments.
    pub fn record_payment(&mut self, payment_id: PaymentId, request: PaymentRequest) -> DomainResult<LoanPayment> {
        if self.status == LoanStatus::Paid {
            return Err(DomainError::transition(format!("loan {} is already paid", self.id)));
        }
        let mut errors = ValidationErrors::new();
        errors.check(request.amount <= 0, "Valid payment amount is required");
        errors.check(
            request.penalty < 0 || request.penalty > request.amount,
            "Penalty must be between 0 and the payment amount",
        );
        errors.finish()?;

        let available = request.amount - request.penalty;
        let (principal, interest) = match &self.terms {
            LoanTerms::Bank { .. } => {
                let interest = monthly_interest(self.balance, self.interest_rate).min(available);
                (available - interest, interest)
            }
            LoanTerms::Personal { .. } => {
                let principal = request.principal.unwrap_or(0);
                if principal < 0 || principal > available {
                    return Err(DomainError::validation(
                        "Principal must be between 0 and the payment amount less penalty",
                    ));
                }
                (principal, available - principal)
            }
        };

        self.balance -= principal;
        if self.balance <= 0 {
            self.status = LoanStatus::Paid;
        }
        let status = self.status;
        match &mut self.terms {
            LoanTerms::Bank { emi_due_date, .. } if status == LoanStatus::Active => {
                *emi_due_date = add_months(request.date, 1);
            }
            LoanTerms::Personal {
                last_payment_date, ..
            } => {
                *last_payment_date = Some(request.date);
            }
            LoanTerms::Bank { .. } => {}
        }
        self.updated_at = request.occurred_at;

        LoanPayment::new(
            payment_id,
            self.id.clone(),
            principal,
            interest,
            self.balance,
            request,
        )
    }
}

impl Entity for Loan {
    type Id = LoanId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
