use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pharmaledger_core::{
    BasisPoints, DomainResult, Entity, Lifecycle, ProductId, ValidationErrors,
};

/// Markup from cost to the stockist selling price.
const STOCKIST_MARKUP: BasisPoints = BasisPoints::percent(10);
/// Markup from the stockist price to the superstockist price.
const SUPERSTOCKIST_MARKUP: BasisPoints = BasisPoints::percent(10);
/// Markup from the superstockist price to the retailer price.
const RETAILER_MARKUP: BasisPoints = BasisPoints::percent(15);

pub const DEFAULT_MANUFACTURER: &str = "Sanj Healthcare";

/// Command: register a product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    /// Cost in the smallest currency unit.
    pub cost_price: i64,
    pub mrp: i64,
    pub tax_rate: BasisPoints,
    pub hsn_code: String,
    pub manufacturer: Option<String>,
    pub pack_size: String,
    pub min_stock_level: Option<i64>,
    pub max_stock_level: Option<i64>,
    pub occurred_at: DateTime<Utc>,
}

/// Collects every product rule the input breaks.
pub fn validate_product(input: &NewProduct) -> DomainResult<()> {
    let mut errors = ValidationErrors::new();
    errors.check(input.name.trim().is_empty(), "Product name is required");
    errors.check(input.category.trim().is_empty(), "Category is required");
    errors.check(input.cost_price <= 0, "Valid cost price is required");
    errors.check(input.mrp <= 0, "Valid MRP is required");
    errors.check(
        !input.tax_rate.at_most_hundred_percent(),
        "Tax rate must be between 0 and 100",
    );
    errors.check(
        input.cost_price > 0 && input.mrp > 0 && input.cost_price >= input.mrp,
        "Cost price must be less than MRP",
    );
    if let (Some(min), Some(max)) = (input.min_stock_level, input.max_stock_level) {
        errors.check(min > max, "Minimum stock level cannot exceed maximum");
    }
    errors.finish()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: ProductId,
    name: String,
    category: String,
    cost_price: i64,
    mrp: i64,
    tax_rate: BasisPoints,
    hsn_code: String,
    manufacturer: String,
    pack_size: String,
    min_stock_level: i64,
    max_stock_level: i64,
    lifecycle: Lifecycle,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    pub fn create(id: ProductId, input: NewProduct) -> DomainResult<Self> {
        validate_product(&input)?;
        Ok(Self {
            id,
            name: input.name.trim().to_string(),
            category: input.category.trim().to_string(),
            cost_price: input.cost_price,
            mrp: input.mrp,
            tax_rate: input.tax_rate,
            hsn_code: input.hsn_code,
            manufacturer: input
                .manufacturer
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MANUFACTURER.to_string()),
            pack_size: input.pack_size,
            min_stock_level: input.min_stock_level.unwrap_or(10),
            max_stock_level: input.max_stock_level.unwrap_or(100),
            lifecycle: Lifecycle::Active,
            created_at: input.occurred_at,
            updated_at: input.occurred_at,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn cost_price(&self) -> i64 {
        self.cost_price
    }

    pub fn mrp(&self) -> i64 {
        self.mrp
    }

    pub fn tax_rate(&self) -> BasisPoints {
        self.tax_rate
    }

    pub fn hsn_code(&self) -> &str {
        &self.hsn_code
    }

    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    pub fn pack_size(&self) -> &str {
        &self.pack_size
    }

    pub fn min_stock_level(&self) -> i64 {
        self.min_stock_level
    }

    pub fn max_stock_level(&self) -> i64 {
        self.max_stock_level
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Price a stockist pays.
    pub fn selling_price(&self) -> i64 {
        self.cost_price + STOCKIST_MARKUP.apply(self.cost_price)
    }

    pub fn superstockist_price(&self) -> i64 {
        let selling = self.selling_price();
        selling + SUPERSTOCKIST_MARKUP.apply(selling)
    }

    pub fn retailer_price(&self) -> i64 {
        let superstockist = self.superstockist_price();
        superstockist + RETAILER_MARKUP.apply(superstockist)
    }

    /// Tax carried on the MRP.
    pub fn tax_amount(&self) -> i64 {
        self.tax_rate.apply(self.mrp)
    }

    /// `(mrp - cost) / cost` as a percentage.
    pub fn profit_margin(&self) -> f64 {
        if self.cost_price == 0 {
            return 0.0;
        }
        (self.mrp - self.cost_price) as f64 / self.cost_price as f64 * 100.0
    }

    pub fn reprice(&mut self, cost_price: i64, mrp: i64, at: DateTime<Utc>) -> DomainResult<()> {
        let mut errors = ValidationErrors::new();
        errors.check(cost_price <= 0, "Valid cost price is required");
        errors.check(mrp <= 0, "Valid MRP is required");
        errors.check(cost_price >= mrp, "Cost price must be less than MRP");
        errors.finish()?;
        self.cost_price = cost_price;
        self.mrp = mrp;
        self.updated_at = at;
        Ok(())
    }

    pub fn archive(&mut self, at: DateTime<Utc>) {
        self.lifecycle = Lifecycle::Archived;
        self.updated_at = at;
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
