use core::str::FromStr;

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use pharmaledger_core::{
    DistributorId, DomainError, DomainResult, Entity, InvoiceId, InvoiceItemId, ValidationErrors,
};
use pharmaledger_inventory::Location;

use crate::item::InvoiceItem;
use crate::request::{
    InvoiceLine, InvoiceRequest, check_line, checked_invoice_total, validate_invoice_request,
};

/// Who issues the invoice, which fixes where its stock moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceKind {
    /// Stockist selling to a retailer.
    Stockist,
    /// Superstockist selling to a stockist.
    Superstockist,
}

impl InvoiceKind {
    pub fn number_prefix(self) -> &'static str {
        match self {
            InvoiceKind::Stockist => "ST",
            InvoiceKind::Superstockist => "SS",
        }
    }

    pub fn id_prefix(self) -> &'static str {
        match self {
            InvoiceKind::Stockist => "INV-ST",
            InvoiceKind::Superstockist => "INV-SS",
        }
    }

    /// Location stock leaves when the invoice is issued.
    pub fn source_location(self) -> Location {
        match self {
            InvoiceKind::Stockist => Location::Stockist,
            InvoiceKind::Superstockist => Location::Superstockist,
        }
    }

    /// Location that receives the ordered and bonus units.
    pub fn destination_location(self) -> Location {
        match self {
            InvoiceKind::Stockist => Location::Retailer,
            InvoiceKind::Superstockist => Location::Stockist,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }
}

/// Credit period granted on an invoice, stored as text like `"30 days"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PaymentTerms {
    Days(u32),
    Months(u32),
}

impl Default for PaymentTerms {
    fn default() -> Self {
        PaymentTerms::Days(30)
    }
}

impl PaymentTerms {
    pub fn due_date(self, from: NaiveDate) -> NaiveDate {
        let due = match self {
            PaymentTerms::Days(n) => from.checked_add_days(Days::new(u64::from(n))),
            PaymentTerms::Months(n) => from.checked_add_months(Months::new(n)),
        };
        due.unwrap_or(from)
    }
}

impl FromStr for PaymentTerms {
    type Err = DomainError;

    /// Accepts `"<n> day(s)"` and `"<n> month(s)"`; a missing count falls
    /// back to 30 days or 1 month.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let leading: String = lower.chars().take_while(char::is_ascii_digit).collect();
        let count = leading.parse::<u32>().ok();
        if lower.contains("day") {
            Ok(PaymentTerms::Days(count.unwrap_or(30)))
        } else if lower.contains("month") {
            Ok(PaymentTerms::Months(count.unwrap_or(1)))
        } else {
            Err(DomainError::validation(format!("unrecognised payment terms: {s}")))
        }
    }
}

impl TryFrom<String> for PaymentTerms {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PaymentTerms> for String {
    fn from(value: PaymentTerms) -> Self {
        value.to_string()
    }
}

impl core::fmt::Display for PaymentTerms {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PaymentTerms::Days(1) => f.write_str("1 day"),
            PaymentTerms::Days(n) => write!(f, "{n} days"),
            PaymentTerms::Months(1) => f.write_str("1 month"),
            PaymentTerms::Months(n) => write!(f, "{n} months"),
        }
    }
}

/// Aggregate root: Invoice.
///
/// Owns its line items. The four totals are never set directly; they are
/// recomputed from the items on every change:
///
/// - `subtotal` = sum of line taxable amounts (after discount, before tax)
/// - `total_discount` = sum of line discounts
/// - `total_tax` = sum of line taxes
/// - `grand_total` = `subtotal + total_tax` = sum of line final amounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    id: InvoiceId,
    #[serde(rename = "type")]
    kind: InvoiceKind,
    invoice_number: String,
    date: NaiveDate,
    from_party: DistributorId,
    to_party: String,
    items: Vec<InvoiceItem>,
    subtotal: i64,
    total_discount: i64,
    total_tax: i64,
    grand_total: i64,
    payment_terms: PaymentTerms,
    due_date: NaiveDate,
    status: InvoiceStatus,
    paid_date: Option<NaiveDate>,
    notes: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Validates the request and builds a pending invoice with totals and
    /// bonus quantities derived.
    pub fn create(
        id: InvoiceId,
        invoice_number: String,
        kind: InvoiceKind,
        request: InvoiceRequest,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        validate_invoice_request(&request)?;
        let payment_terms = match &request.payment_terms {
            Some(terms) => terms.parse()?,
            None => PaymentTerms::default(),
        };
        let items = request
            .items
            .into_iter()
            .map(|line| InvoiceItem::new(Self::next_item_id(occurred_at), line))
            .collect();

        let mut invoice = Self {
            id,
            kind,
            invoice_number,
            date: request.date,
            from_party: DistributorId::from_raw(request.from_party.trim()),
            to_party: request.to_party.trim().to_string(),
            items,
            subtotal: 0,
            total_discount: 0,
            total_tax: 0,
            grand_total: 0,
            payment_terms,
            due_date: payment_terms.due_date(request.date),
            status: InvoiceStatus::Pending,
            paid_date: None,
            notes: request.notes,
            created_at: occurred_at,
            updated_at: occurred_at,
        };
        invoice.calculate_totals();
        invoice.apply_bonus_schemes();
        Ok(invoice)
    }

    fn next_item_id(at: DateTime<Utc>) -> InvoiceItemId {
        InvoiceItemId::generate_at(InvoiceItemId::PREFIX, at)
    }

    pub fn kind(&self) -> InvoiceKind {
        self.kind
    }

    pub fn invoice_number(&self) -> &str {
        &self.invoice_number
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn from_party(&self) -> &DistributorId {
        &self.from_party
    }

    pub fn to_party(&self) -> &str {
        &self.to_party
    }

    pub fn items(&self) -> &[InvoiceItem] {
        &self.items
    }

    pub fn subtotal(&self) -> i64 {
        self.subtotal
    }

    pub fn total_discount(&self) -> i64 {
        self.total_discount
    }

    pub fn total_tax(&self) -> i64 {
        self.total_tax
    }

    pub fn grand_total(&self) -> i64 {
        self.grand_total
    }

    pub fn payment_terms(&self) -> PaymentTerms {
        self.payment_terms
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn paid_date(&self) -> Option<NaiveDate> {
        self.paid_date
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Recomputes every line and the invoice-level totals.
    pub fn calculate_totals(&mut self) {
        self.subtotal = 0;
        self.total_discount = 0;
        self.total_tax = 0;
        for item in &mut self.items {
            item.calculate_totals();
            self.subtotal = self.subtotal.saturating_add(item.taxable_amount());
            self.total_discount = self.total_discount.saturating_add(item.discount_amount());
            self.total_tax = self.total_tax.saturating_add(item.tax_amount());
        }
        self.grand_total = self.subtotal.saturating_add(self.total_tax);
    }

    pub fn apply_bonus_schemes(&mut self) {
        for item in &mut self.items {
            item.apply_bonus();
        }
    }

    /// Copies catalog name and HSN code onto lines that arrived without them.
    pub fn fill_product_details<'a>(&mut self, lookup: impl Fn(&InvoiceItem) -> Option<(&'a str, &'a str)>) {
        for item in &mut self.items {
            if let Some((name, hsn)) = lookup(item) {
                item.fill_product_details(name, hsn);
            }
        }
    }

    fn ensure_editable(&self) -> DomainResult<()> {
        if self.status != InvoiceStatus::Pending {
            return Err(DomainError::transition(format!(
                "invoice {} is {} and can no longer be edited",
                self.invoice_number,
                self.status.as_str()
            )));
        }
        Ok(())
    }

    pub fn add_item(&mut self, line: InvoiceLine, at: DateTime<Utc>) -> DomainResult<&InvoiceItem> {
        self.ensure_editable()?;
        let mut errors = ValidationErrors::new();
        check_line(&mut errors, self.items.len() + 1, &line);
        errors.check(
            checked_invoice_total(core::slice::from_ref(&line), self.grand_total).is_none(),
            "Invoice total is too large",
        );
        errors.finish()?;
        self.items.push(InvoiceItem::new(Self::next_item_id(at), line));
        self.calculate_totals();
        self.updated_at = at;
        let last = self.items.len() - 1;
        Ok(&self.items[last])
    }

    pub fn remove_item(&mut self, item_id: &InvoiceItemId, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_editable()?;
        let Some(idx) = self.items.iter().position(|i| i.id() == item_id) else {
            return Err(DomainError::not_found("invoice item", item_id));
        };
        if self.items.len() == 1 {
            return Err(DomainError::validation("At least one product item is required"));
        }
        self.items.remove(idx);
        self.calculate_totals();
        self.updated_at = at;
        Ok(())
    }

    /// Unpaid and past its due date as of `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(self.status, InvoiceStatus::Pending | InvoiceStatus::Overdue) && today > self.due_date
    }

    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        if self.is_overdue(today) {
            today.signed_duration_since(self.due_date).num_days()
        } else {
            0
        }
    }

    /// Pending -> Overdue once the due date has passed. Returns whether the
    /// status changed.
    pub fn refresh_overdue(&mut self, today: NaiveDate, at: DateTime<Utc>) -> bool {
        if self.status == InvoiceStatus::Pending && self.is_overdue(today) {
            self.status = InvoiceStatus::Overdue;
            self.updated_at = at;
            return true;
        }
        false
    }

    /// Pending or Overdue -> Paid.
    pub fn mark_paid(&mut self, payment_date: NaiveDate, at: DateTime<Utc>) -> DomainResult<()> {
        match self.status {
            InvoiceStatus::Pending | InvoiceStatus::Overdue => {
                self.status = InvoiceStatus::Paid;
                self.paid_date = Some(payment_date);
                self.updated_at = at;
                Ok(())
            }
            other => Err(DomainError::transition(format!(
                "cannot mark a {} invoice as paid",
                other.as_str()
            ))),
        }
    }

    /// Pending -> Cancelled. Stock already moved stays where it is.
    pub fn cancel(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        match self.status {
            InvoiceStatus::Pending => {
                self.status = InvoiceStatus::Cancelled;
                self.updated_at = at;
                Ok(())
            }
            other => Err(DomainError::transition(format!(
                "cannot cancel a {} invoice",
                other.as_str()
            ))),
        }
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
