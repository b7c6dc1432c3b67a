use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use pharmaledger_core::{BasisPoints, InvoiceItemId, ProductId};

use crate::request::InvoiceLine;

static BONUS_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\+(\d+)").expect("valid bonus scheme regex"));

/// Free units earned under a `"<base>+<bonus>"` scheme such as `"10+1"`.
///
/// The pattern may appear anywhere in the string. Anything that does not
/// parse, including a zero base, earns nothing.
pub fn bonus_quantity(scheme: &str, quantity: i64) -> i64 {
    let Some(caps) = BONUS_SCHEME.captures(scheme) else {
        return 0;
    };
    let base = caps[1].parse::<i64>().unwrap_or(0);
    let bonus = caps[2].parse::<i64>().unwrap_or(0);
    if base <= 0 || quantity <= 0 {
        return 0;
    }
    (quantity / base).saturating_mul(bonus)
}

/// Final amount (after discount, with tax) of a requested line, or `None`
/// when any intermediate amount leaves the `i64` range.
pub(crate) fn checked_final_amount(line: &InvoiceLine) -> Option<i64> {
    let total = line.quantity.checked_mul(line.rate)?;
    let taxable = total.checked_sub(line.discount.apply(total))?;
    taxable.checked_add(line.tax_rate.apply(taxable))
}

/// Ordered plus bonus units of a requested line, or `None` on overflow.
pub(crate) fn checked_final_quantity(line: &InvoiceLine) -> Option<i64> {
    line.quantity
        .checked_add(bonus_quantity(&line.bonus_scheme, line.quantity))
}

/// One product line on an invoice. All amounts are derived from
/// quantity, rate, discount and tax rate by [`InvoiceItem::calculate_totals`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    id: InvoiceItemId,
    product_id: ProductId,
    product_name: String,
    hsn_code: String,
    quantity: i64,
    rate: i64,
    discount: BasisPoints,
    tax_rate: BasisPoints,
    bonus_scheme: String,
    bonus_quantity: i64,
    total: i64,
    discount_amount: i64,
    tax_amount: i64,
    final_amount: i64,
}

impl InvoiceItem {
    pub fn new(id: InvoiceItemId, line: InvoiceLine) -> Self {
        let mut item = Self {
            id,
            product_id: ProductId::from_raw(line.product_id.trim()),
            product_name: line.product_name,
            hsn_code: line.hsn_code,
            quantity: line.quantity,
            rate: line.rate,
            discount: line.discount,
            tax_rate: line.tax_rate,
            bonus_scheme: line.bonus_scheme,
            bonus_quantity: 0,
            total: 0,
            discount_amount: 0,
            tax_amount: 0,
            final_amount: 0,
        };
        item.calculate_totals();
        item.apply_bonus();
        item
    }

    pub fn id(&self) -> &InvoiceItemId {
        &self.id
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn hsn_code(&self) -> &str {
        &self.hsn_code
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn rate(&self) -> i64 {
        self.rate
    }

    pub fn discount(&self) -> BasisPoints {
        self.discount
    }

    pub fn tax_rate(&self) -> BasisPoints {
        self.tax_rate
    }

    pub fn bonus_scheme(&self) -> &str {
        &self.bonus_scheme
    }

    pub fn bonus_quantity(&self) -> i64 {
        self.bonus_quantity
    }

    /// Units that physically move: ordered plus free.
    pub fn final_quantity(&self) -> i64 {
        self.quantity.saturating_add(self.bonus_quantity)
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn discount_amount(&self) -> i64 {
        self.discount_amount
    }

    pub fn taxable_amount(&self) -> i64 {
        self.total.saturating_sub(self.discount_amount)
    }

    pub fn tax_amount(&self) -> i64 {
        self.tax_amount
    }

    pub fn final_amount(&self) -> i64 {
        self.final_amount
    }

    /// Saturates instead of overflowing; request validation rejects lines
    /// whose amounts do not fit, so saturation only shows on unvalidated data.
    pub fn calculate_totals(&mut self) {
        self.total = self.quantity.saturating_mul(self.rate);
        self.discount_amount = self.discount.apply(self.total);
        let taxable = self.total.saturating_sub(self.discount_amount);
        self.tax_amount = self.tax_rate.apply(taxable);
        self.final_amount = taxable.saturating_add(self.tax_amount);
    }

    pub fn apply_bonus(&mut self) {
        self.bonus_quantity = bonus_quantity(&self.bonus_scheme, self.quantity);
    }

    pub(crate) fn fill_product_details(&mut self, name: &str, hsn_code: &str) {
        if self.product_name.is_empty() {
            self.product_name = name.to_string();
        }
        if self.hsn_code.is_empty() {
            self.hsn_code = hsn_code.to_string();
        }
    }
}
