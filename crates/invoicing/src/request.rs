use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use pharmaledger_core::{BasisPoints, DomainResult, ValidationErrors};

use crate::invoice::PaymentTerms;
use crate::item::{checked_final_amount, checked_final_quantity};

/// One requested product line, before amounts are derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub product_id: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub hsn_code: String,
    pub quantity: i64,
    pub rate: i64,
    #[serde(default)]
    pub discount: BasisPoints,
    pub tax_rate: BasisPoints,
    #[serde(default)]
    pub bonus_scheme: String,
}

/// Command: issue an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRequest {
    pub date: NaiveDate,
    pub from_party: String,
    pub to_party: String,
    pub items: Vec<InvoiceLine>,
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub notes: String,
}

/// Checks every rule and reports all that fail, numbering items from 1.
pub fn validate_invoice_request(request: &InvoiceRequest) -> DomainResult<()> {
    let mut errors = ValidationErrors::new();
    errors.check(request.from_party.trim().is_empty(), "From party is required");
    errors.check(request.to_party.trim().is_empty(), "To party is required");
    errors.check(request.items.is_empty(), "At least one product item is required");

    for (idx, item) in request.items.iter().enumerate() {
        check_line(&mut errors, idx + 1, item);
    }
    errors.check(
        checked_invoice_total(&request.items, 0).is_none(),
        "Invoice total is too large",
    );

    if let Some(terms) = &request.payment_terms {
        errors.check(
            terms.parse::<PaymentTerms>().is_err(),
            format!("Unrecognised payment terms: {terms}"),
        );
    }
    errors.finish()
}

/// Rules for a single line; `n` is its 1-based position on the invoice.
pub(crate) fn check_line(errors: &mut ValidationErrors, n: usize, item: &InvoiceLine) {
    errors.check(
        item.product_id.trim().is_empty(),
        format!("Product is required for item {n}"),
    );
    errors.check(item.quantity <= 0, format!("Valid quantity is required for item {n}"));
    errors.check(item.rate <= 0, format!("Valid rate is required for item {n}"));
    errors.check(
        !item.discount.at_most_hundred_percent(),
        format!("Discount must be between 0 and 100 for item {n}"),
    );
    errors.check(
        !item.tax_rate.at_most_hundred_percent(),
        format!("Tax rate must be between 0 and 100 for item {n}"),
    );
    if item.quantity > 0 && item.rate > 0 {
        errors.check(
            checked_final_amount(item).is_none(),
            format!("Amount is too large for item {n}"),
        );
        errors.check(
            checked_final_quantity(item).is_none(),
            format!("Quantity is too large for item {n}"),
        );
    }
}

/// `base` plus the final amount of every line, or `None` when the sum (or any
/// line) leaves the `i64` range.
pub(crate) fn checked_invoice_total(items: &[InvoiceLine], base: i64) -> Option<i64> {
    items
        .iter()
        .try_fold(base, |acc, item| acc.checked_add(checked_final_amount(item)?))
}
