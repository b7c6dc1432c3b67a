use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use pharmaledger_core::{DomainError, DomainResult, Entity, ExpenseId, ValidationErrors};

use crate::loan::add_months;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    pub fn advance(self, from: NaiveDate) -> NaiveDate {
        match self {
            Frequency::Daily => from + Duration::days(1),
            Frequency::Weekly => from + Duration::weeks(1),
            Frequency::Monthly => add_months(from, 1),
            Frequency::Quarterly => add_months(from, 3),
            Frequency::Yearly => add_months(from, 12),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    #[default]
    Paid,
    Pending,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseKind {
    Marketing,
    Operating,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ExpenseDetails {
    Marketing {
        doctor_name: String,
        event_name: String,
        purpose: String,
        expected_roi: Option<f64>,
        follow_up_date: Option<NaiveDate>,
    },
    Operating {
        vendor: String,
        bill_number: String,
        due_date: Option<NaiveDate>,
        paid_date: Option<NaiveDate>,
        tax_amount: i64,
        is_essential: bool,
    },
}

/// Command: record an expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub date: NaiveDate,
    pub description: String,
    pub amount: i64,
    pub category: String,
    pub payment_method: String,
    pub reference: String,
    pub recurrence: Option<Frequency>,
    pub status: ExpenseStatus,
    pub notes: String,
    pub details: ExpenseDetails,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    id: ExpenseId,
    date: NaiveDate,
    description: String,
    amount: i64,
    category: String,
    payment_method: String,
    reference: String,
    recurrence: Option<Frequency>,
    status: ExpenseStatus,
    notes: String,
    #[serde(flatten)]
    details: ExpenseDetails,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Expense {
    pub fn record(id: ExpenseId, input: NewExpense) -> DomainResult<Self> {
        let mut errors = ValidationErrors::new();
        errors.check(input.description.trim().is_empty(), "Description is required");
        errors.check(input.amount <= 0, "Valid amount is required");
        if let ExpenseDetails::Operating { tax_amount, .. } = input.details {
            errors.check(tax_amount < 0, "Tax amount cannot be negative");
        }
        errors.finish()?;

        Ok(Self {
            id,
            date: input.date,
            description: input.description.trim().to_string(),
            amount: input.amount,
            category: input.category,
            payment_method: input.payment_method,
            reference: input.reference,
            recurrence: input.recurrence,
            status: input.status,
            notes: input.notes,
            details: input.details,
            created_at: input.occurred_at,
            updated_at: input.occurred_at,
        })
    }

    pub fn kind(&self) -> ExpenseKind {
        match self.details {
            ExpenseDetails::Marketing { .. } => ExpenseKind::Marketing,
            ExpenseDetails::Operating { .. } => ExpenseKind::Operating,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn status(&self) -> ExpenseStatus {
        self.status
    }

    pub fn recurrence(&self) -> Option<Frequency> {
        self.recurrence
    }

    pub fn details(&self) -> &ExpenseDetails {
        &self.details
    }

    /// Next occurrence of a recurring expense.
    pub fn next_due_date(&self) -> Option<NaiveDate> {
        self.recurrence.map(|f| f.advance(self.date))
    }

    /// Amount plus tax for operating expenses.
    pub fn total_amount(&self) -> i64 {
        match self.details {
            ExpenseDetails::Operating { tax_amount, .. } => self.amount + tax_amount,
            ExpenseDetails::Marketing { .. } => self.amount,
        }
    }

    /// Unpaid operating expense past its due date.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.details {
            ExpenseDetails::Operating {
                due_date: Some(due), ..
            } => self.status == ExpenseStatus::Pending && today > due,
            _ => false,
        }
    }

    /// Marketing expense with a follow-up still ahead.
    pub fn requires_follow_up(&self, today: NaiveDate) -> bool {
        match self.details {
            ExpenseDetails::Marketing {
                follow_up_date: Some(date),
                ..
            } => self.status != ExpenseStatus::Cancelled && date > today,
            _ => false,
        }
    }

    pub fn schedule_follow_up(&mut self, date: NaiveDate, at: DateTime<Utc>) -> DomainResult<()> {
        match &mut self.details {
            ExpenseDetails::Marketing { follow_up_date, .. } => {
                *follow_up_date = Some(date);
                self.updated_at = at;
                Ok(())
            }
            ExpenseDetails::Operating { .. } => Err(DomainError::validation(
                "Follow-up applies to marketing expenses only",
            )),
        }
    }

    /// Operating expenses also record the paid date.
    pub fn mark_paid(&mut self, on: NaiveDate, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status == ExpenseStatus::Cancelled {
            return Err(DomainError::transition(format!(
                "expense {} is cancelled",
                self.id
            )));
        }
        self.status = ExpenseStatus::Paid;
        if let ExpenseDetails::Operating { paid_date, .. } = &mut self.details {
            *paid_date = Some(on);
        }
        self.updated_at = at;
        Ok(())
    }

    pub fn cancel(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status == ExpenseStatus::Paid {
            return Err(DomainError::transition(format!(
                "expense {} is already paid",
                self.id
            )));
        }
        self.status = ExpenseStatus::Cancelled;
        self.updated_at = at;
        Ok(())
    }
}

impl Entity for Expense {
    type Id = ExpenseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExpenseBook {
    marketing: Vec<Expense>,
    operating: Vec<Expense>,
}

impl ExpenseBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn marketing(&self) -> &[Expense] {
        &self.marketing
    }

    pub fn operating(&self) -> &[Expense] {
        &self.operating
    }

    pub fn all(&self) -> impl Iterator<Item = &Expense> {
        self.marketing.iter().chain(self.operating.iter())
    }

    pub fn get(&self, id: &ExpenseId) -> Option<&Expense> {
        self.all().find(|e| e.id() == id)
    }

    pub fn get_mut(&mut self, id: &ExpenseId) -> DomainResult<&mut Expense> {
        self.marketing
            .iter_mut()
            .chain(self.operating.iter_mut())
            .find(|e| e.id() == id)
            .ok_or_else(|| DomainError::not_found("expense", id))
    }

    pub fn add(&mut self, expense: Expense) {
        match expense.kind() {
            ExpenseKind::Marketing => self.marketing.push(expense),
            ExpenseKind::Operating => self.operating.push(expense),
        }
    }

    pub fn overdue(&self, today: NaiveDate) -> Vec<&Expense> {
        self.operating.iter().filter(|e| e.is_overdue(today)).collect()
    }

    pub fn needing_follow_up(&self, today: NaiveDate) -> Vec<&Expense> {
        self.marketing
            .iter()
            .filter(|e| e.requires_follow_up(today))
            .collect()
    }

    /// Sum of non-cancelled totals dated within `[from, to]`.
    pub fn total_between(&self, from: NaiveDate, to: NaiveDate) -> i64 {
        self.all()
            .filter(|e| e.status() != ExpenseStatus::Cancelled)
            .filter(|e| e.date() >= from && e.date() <= to)
            .map(Expense::total_amount)
            .sum()
    }
}
