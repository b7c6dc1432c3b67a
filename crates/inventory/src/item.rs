use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use pharmaledger_core::{
    DistributorId, DomainError, DomainResult, Entity, InventoryItemId, Lifecycle, ProductId,
    ValidationErrors,
};

use crate::location::Location;

/// Items expiring within this many days count as near expiry.
pub const NEAR_EXPIRY_DAYS: i64 = 30;

const DEFAULT_MIN_STOCK: i64 = 10;
const DEFAULT_MAX_STOCK: i64 = 100;
const DEFAULT_REORDER_POINT: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    Low,
    Medium,
    Good,
}

/// Command: register a batch-specific stock record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub batch_number: String,
    pub location: Location,
    pub distributor_id: Option<DistributorId>,
    /// Opening quantity.
    pub quantity: i64,
    pub min_stock_level: Option<i64>,
    pub reorder_point: Option<i64>,
    pub max_stock_level: Option<i64>,
    pub cost_price: i64,
    pub mrp: i64,
    pub expiry_date: Option<NaiveDate>,
    pub shelf_location: String,
    pub occurred_at: DateTime<Utc>,
}

fn validate_levels(errors: &mut ValidationErrors, min: i64, reorder: i64, max: i64) {
    errors.check(min < 0, "Minimum stock level cannot be negative");
    errors.check(
        min > reorder || reorder > max,
        "Stock levels must satisfy minimum <= reorder point <= maximum",
    );
}

/// Quantity on hand for one product batch at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    id: InventoryItemId,
    product_id: ProductId,
    product_name: String,
    batch_number: String,
    location: Location,
    distributor_id: Option<DistributorId>,
    quantity: i64,
    min_stock_level: i64,
    reorder_point: i64,
    max_stock_level: i64,
    cost_price: i64,
    mrp: i64,
    expiry_date: Option<NaiveDate>,
    shelf_location: String,
    lifecycle: Lifecycle,
    last_stock_update: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Builds a record from registration input. The opening quantity is
    /// taken as-is; the caller records the matching movement.
    pub fn create(id: InventoryItemId, input: NewInventoryItem) -> DomainResult<Self> {
        if input.quantity < 0 {
            return Err(DomainError::InvalidQuantity(input.quantity));
        }
        let min = input.min_stock_level.unwrap_or(DEFAULT_MIN_STOCK);
        let reorder = input.reorder_point.unwrap_or(DEFAULT_REORDER_POINT);
        let max = input.max_stock_level.unwrap_or(DEFAULT_MAX_STOCK);

        let mut errors = ValidationErrors::new();
        errors.check(input.product_id.as_str().is_empty(), "Product is required");
        errors.check(input.cost_price < 0, "Cost price cannot be negative");
        errors.check(input.mrp < 0, "MRP cannot be negative");
        validate_levels(&mut errors, min, reorder, max);
        errors.finish()?;

        Ok(Self {
            id,
            product_id: input.product_id,
            product_name: input.product_name,
            batch_number: input.batch_number,
            location: input.location,
            distributor_id: input.distributor_id,
            quantity: input.quantity,
            min_stock_level: min,
            reorder_point: reorder,
            max_stock_level: max,
            cost_price: input.cost_price,
            mrp: input.mrp,
            expiry_date: input.expiry_date,
            shelf_location: input.shelf_location,
            lifecycle: Lifecycle::Active,
            last_stock_update: input.occurred_at,
            created_at: input.occurred_at,
            updated_at: input.occurred_at,
        })
    }

    /// Empty record created on the first movement into a (product, location)
    /// pair that has none.
    pub fn empty(
        id: InventoryItemId,
        product_id: ProductId,
        location: Location,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            product_id,
            product_name: String::new(),
            batch_number: String::new(),
            location,
            distributor_id: None,
            quantity: 0,
            min_stock_level: DEFAULT_MIN_STOCK,
            reorder_point: DEFAULT_REORDER_POINT,
            max_stock_level: DEFAULT_MAX_STOCK,
            cost_price: 0,
            mrp: 0,
            expiry_date: None,
            shelf_location: String::new(),
            lifecycle: Lifecycle::Active,
            last_stock_update: at,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn batch_number(&self) -> &str {
        &self.batch_number
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn distributor_id(&self) -> Option<&DistributorId> {
        self.distributor_id.as_ref()
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn min_stock_level(&self) -> i64 {
        self.min_stock_level
    }

    pub fn reorder_point(&self) -> i64 {
        self.reorder_point
    }

    pub fn max_stock_level(&self) -> i64 {
        self.max_stock_level
    }

    pub fn cost_price(&self) -> i64 {
        self.cost_price
    }

    pub fn mrp(&self) -> i64 {
        self.mrp
    }

    pub fn expiry_date(&self) -> Option<NaiveDate> {
        self.expiry_date
    }

    pub fn shelf_location(&self) -> &str {
        &self.shelf_location
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    pub fn last_stock_update(&self) -> DateTime<Utc> {
        self.last_stock_update
    }

    /// Quantity at cost; saturates rather than overflowing.
    pub fn stock_value(&self) -> i64 {
        self.quantity.saturating_mul(self.cost_price)
    }

    pub fn stock_status(&self) -> StockStatus {
        if self.quantity <= self.min_stock_level {
            StockStatus::Low
        } else if self.quantity <= self.reorder_point {
            StockStatus::Medium
        } else {
            StockStatus::Good
        }
    }

    pub fn needs_reorder(&self) -> bool {
        self.quantity <= self.reorder_point
    }

    /// Whole days from `today` until expiry; negative once expired.
    pub fn days_to_expiry(&self, today: NaiveDate) -> Option<i64> {
        self.expiry_date
            .map(|expiry| expiry.signed_duration_since(today).num_days())
    }

    pub fn expires_within(&self, today: NaiveDate, days: i64) -> bool {
        matches!(self.days_to_expiry(today), Some(d) if (0..=days).contains(&d))
    }

    pub fn is_near_expiry(&self, today: NaiveDate) -> bool {
        self.expires_within(today, NEAR_EXPIRY_DAYS)
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        matches!(self.days_to_expiry(today), Some(d) if d < 0)
    }

    /// Adds `quantity`; a supplied cost price replaces the current one.
    pub fn add_stock(
        &mut self,
        quantity: i64,
        cost_price: Option<i64>,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.quantity = self.quantity_after_adding(quantity)?;
        if let Some(cost) = cost_price {
            self.cost_price = cost;
        }
        self.touch(at);
        Ok(())
    }

    /// Removes `quantity`, failing without change if it exceeds what is on hand.
    pub fn remove_stock(&mut self, quantity: i64, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_can_remove(quantity)?;
        self.quantity -= quantity;
        self.touch(at);
        Ok(())
    }

    /// Rejects negative additions and ones that would overflow the on-hand count.
    pub fn ensure_can_add(&self, quantity: i64) -> DomainResult<()> {
        self.quantity_after_adding(quantity).map(|_| ())
    }

    fn quantity_after_adding(&self, quantity: i64) -> DomainResult<i64> {
        if quantity < 0 {
            return Err(DomainError::InvalidQuantity(quantity));
        }
        self.quantity
            .checked_add(quantity)
            .ok_or(DomainError::InvalidQuantity(quantity))
    }

    pub fn ensure_can_remove(&self, quantity: i64) -> DomainResult<()> {
        if quantity < 0 {
            return Err(DomainError::InvalidQuantity(quantity));
        }
        if quantity > self.quantity {
            return Err(DomainError::InsufficientStock {
                product_id: self.product_id.to_string(),
                location: self.location.to_string(),
                available: self.quantity,
                requested: quantity,
            });
        }
        Ok(())
    }

    pub fn update_stock_levels(
        &mut self,
        min: i64,
        max: i64,
        reorder: i64,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        let mut errors = ValidationErrors::new();
        validate_levels(&mut errors, min, reorder, max);
        errors.finish()?;
        self.min_stock_level = min;
        self.max_stock_level = max;
        self.reorder_point = reorder;
        self.updated_at = at;
        Ok(())
    }

    /// Fills catalog details on a record that was created empty.
    pub fn fill_details(&mut self, product_name: &str, cost_price: i64, mrp: i64) {
        if self.product_name.is_empty() {
            self.product_name = product_name.to_string();
        }
        if self.cost_price == 0 {
            self.cost_price = cost_price;
        }
        if self.mrp == 0 {
            self.mrp = mrp;
        }
    }

    pub fn archive(&mut self, at: DateTime<Utc>) {
        self.lifecycle = Lifecycle::Archived;
        self.updated_at = at;
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.last_stock_update = at;
        self.updated_at = at;
    }
}

impl Entity for InventoryItem {
    type Id = InventoryItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
