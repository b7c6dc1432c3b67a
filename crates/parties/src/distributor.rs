use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pharmaledger_core::{
    DistributorId, DomainError, DomainResult, Entity, Lifecycle, ProductId,
};

use crate::validation::validate_distributor;

const WARNING_UTILIZATION: f64 = 75.0;
const CRITICAL_UTILIZATION: f64 = 90.0;

/// Which tier of the distribution chain a distributor sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributorKind {
    Stockist,
    Superstockist,
}

impl DistributorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DistributorKind::Stockist => "stockist",
            DistributorKind::Superstockist => "superstockist",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
}

impl Default for Address {
    fn default() -> Self {
        Self {
            street: String::new(),
            city: String::new(),
            state: "Assam".to_string(),
            pincode: String::new(),
            country: "India".to_string(),
        }
    }
}

/// Advisory three-level classification of credit utilization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditStatus {
    Good,
    Warning,
    Critical,
}

/// Credit extended to a distributor and what they currently owe.
///
/// Nothing here blocks a sale; the numbers are for display and warnings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditTerms {
    pub credit_limit: i64,
    pub current_balance: i64,
}

impl CreditTerms {
    pub fn credit_available(&self) -> i64 {
        self.credit_limit - self.current_balance
    }

    /// Balance as a percentage of the limit; `0` when no limit is set.
    pub fn credit_utilization(&self) -> f64 {
        if self.credit_limit > 0 {
            self.current_balance as f64 * 100.0 / self.credit_limit as f64
        } else {
            0.0
        }
    }

    pub fn credit_status(&self) -> CreditStatus {
        let utilization = self.credit_utilization();
        if utilization >= CRITICAL_UTILIZATION {
            CreditStatus::Critical
        } else if utilization >= WARNING_UTILIZATION {
            CreditStatus::Warning
        } else {
            CreditStatus::Good
        }
    }

    /// Whether a further charge of `amount` would fit in the remaining credit.
    pub fn can_absorb(&self, amount: i64) -> bool {
        self.credit_available() >= amount
    }
}

/// Tier-specific data, stored next to the common fields under a `type` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum DistributorRole {
    Stockist {
        retailers: Vec<String>,
        monthly_target: i64,
        achievement: i64,
    },
    Superstockist {
        /// Stockists this superstockist supplies. The only stored side of
        /// the hierarchy; a stockist's parent is looked up from here.
        stockists: Vec<DistributorId>,
        warehouse_capacity: i64,
        current_stock_value: i64,
    },
}

impl DistributorRole {
    pub fn kind(&self) -> DistributorKind {
        match self {
            DistributorRole::Stockist { .. } => DistributorKind::Stockist,
            DistributorRole::Superstockist { .. } => DistributorKind::Superstockist,
        }
    }
}

/// Command: register a distributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDistributor {
    pub kind: DistributorKind,
    pub name: String,
    pub contact_person: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<Address>,
    pub gstin: Option<String>,
    pub pan: Option<String>,
    pub credit_limit: i64,
    pub region: String,
    pub territory: String,
    pub payment_terms: Option<String>,
    /// Stockists only.
    pub monthly_target: i64,
    /// Superstockists only.
    pub warehouse_capacity: i64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distributor {
    id: DistributorId,
    name: String,
    contact_person: String,
    email: String,
    phone: String,
    address: Address,
    gstin: String,
    pan: String,
    #[serde(flatten)]
    credit: CreditTerms,
    region: String,
    territory: String,
    payment_terms: String,
    assigned_products: Vec<ProductId>,
    #[serde(flatten)]
    role: DistributorRole,
    lifecycle: Lifecycle,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Distributor {
    pub fn register(id: DistributorId, input: NewDistributor) -> DomainResult<Self> {
        validate_distributor(&input)?;
        let role = match input.kind {
            DistributorKind::Stockist => DistributorRole::Stockist {
                retailers: Vec::new(),
                monthly_target: input.monthly_target,
                achievement: 0,
            },
            DistributorKind::Superstockist => DistributorRole::Superstockist {
                stockists: Vec::new(),
                warehouse_capacity: input.warehouse_capacity,
                current_stock_value: 0,
            },
        };
        Ok(Self {
            id,
            name: input.name.trim().to_string(),
            contact_person: input.contact_person,
            email: input.email.unwrap_or_default(),
            phone: input.phone,
            address: input.address.unwrap_or_default(),
            gstin: input.gstin.unwrap_or_default(),
            pan: input.pan.unwrap_or_default(),
            credit: CreditTerms {
                credit_limit: input.credit_limit,
                current_balance: 0,
            },
            region: input.region,
            territory: input.territory,
            payment_terms: input
                .payment_terms
                .unwrap_or_else(|| "30 days".to_string()),
            assigned_products: Vec::new(),
            role,
            lifecycle: Lifecycle::Active,
            created_at: input.occurred_at,
            updated_at: input.occurred_at,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contact_person(&self) -> &str {
        &self.contact_person
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn gstin(&self) -> &str {
        &self.gstin
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn territory(&self) -> &str {
        &self.territory
    }

    pub fn payment_terms(&self) -> &str {
        &self.payment_terms
    }

    pub fn credit(&self) -> &CreditTerms {
        &self.credit
    }

    pub fn role(&self) -> &DistributorRole {
        &self.role
    }

    pub fn kind(&self) -> DistributorKind {
        self.role.kind()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    pub fn assigned_products(&self) -> &[ProductId] {
        &self.assigned_products
    }

    /// Stockist ids owned by a superstockist; empty for stockists.
    pub fn owned_stockists(&self) -> &[DistributorId] {
        match &self.role {
            DistributorRole::Superstockist { stockists, .. } => stockists,
            DistributorRole::Stockist { .. } => &[],
        }
    }

    /// Achievement against the monthly target, as a percentage.
    pub fn achievement_percentage(&self) -> f64 {
        match &self.role {
            DistributorRole::Stockist {
                monthly_target,
                achievement,
                ..
            } if *monthly_target > 0 => *achievement as f64 / *monthly_target as f64 * 100.0,
            _ => 0.0,
        }
    }

    /// Stock value held as a percentage of warehouse capacity.
    pub fn stock_utilization(&self) -> f64 {
        match &self.role {
            DistributorRole::Superstockist {
                warehouse_capacity,
                current_stock_value,
                ..
            } if *warehouse_capacity > 0 => {
                *current_stock_value as f64 / *warehouse_capacity as f64 * 100.0
            }
            _ => 0.0,
        }
    }

    pub fn add_balance(&mut self, amount: i64, at: DateTime<Utc>) {
        self.credit.current_balance += amount;
        self.updated_at = at;
    }

    pub fn deduct_balance(&mut self, amount: i64, at: DateTime<Utc>) {
        self.credit.current_balance -= amount;
        self.updated_at = at;
    }

    pub fn update_credit_limit(&mut self, limit: i64, at: DateTime<Utc>) -> DomainResult<()> {
        if limit < 0 {
            return Err(DomainError::validation("Credit limit cannot be negative"));
        }
        self.credit.credit_limit = limit;
        self.updated_at = at;
        Ok(())
    }

    pub fn assign_product(&mut self, product_id: ProductId, at: DateTime<Utc>) {
        if !self.assigned_products.contains(&product_id) {
            self.assigned_products.push(product_id);
            self.updated_at = at;
        }
    }

    pub fn unassign_product(&mut self, product_id: &ProductId, at: DateTime<Utc>) {
        self.assigned_products.retain(|p| p != product_id);
        self.updated_at = at;
    }

    pub fn add_retailer(&mut self, retailer: impl Into<String>, at: DateTime<Utc>) -> DomainResult<()> {
        let retailer = retailer.into();
        match &mut self.role {
            DistributorRole::Stockist { retailers, .. } => {
                if !retailers.contains(&retailer) {
                    retailers.push(retailer);
                    self.updated_at = at;
                }
                Ok(())
            }
            DistributorRole::Superstockist { .. } => Err(DomainError::invariant(
                "retailers can only be attached to a stockist",
            )),
        }
    }

    pub fn record_achievement(&mut self, amount: i64, at: DateTime<Utc>) {
        if let DistributorRole::Stockist { achievement, .. } = &mut self.role {
            *achievement += amount;
            self.updated_at = at;
        }
    }

    pub(crate) fn attach_stockist(&mut self, stockist_id: &DistributorId, at: DateTime<Utc>) {
        if let DistributorRole::Superstockist { stockists, .. } = &mut self.role {
            if !stockists.contains(stockist_id) {
                stockists.push(stockist_id.clone());
                self.updated_at = at;
            }
        }
    }

    /// Returns whether the stockist was attached here.
    pub(crate) fn detach_stockist(&mut self, stockist_id: &DistributorId, at: DateTime<Utc>) -> bool {
        if let DistributorRole::Superstockist { stockists, .. } = &mut self.role {
            let before = stockists.len();
            stockists.retain(|s| s != stockist_id);
            if stockists.len() != before {
                self.updated_at = at;
                return true;
            }
        }
        false
    }

    pub(crate) fn release_all_stockists(&mut self, at: DateTime<Utc>) {
        if let DistributorRole::Superstockist { stockists, .. } = &mut self.role {
            stockists.clear();
            self.updated_at = at;
        }
    }

    pub(crate) fn archive(&mut self, at: DateTime<Utc>) {
        self.lifecycle = Lifecycle::Archived;
        self.updated_at = at;
    }
}

impl Entity for Distributor {
    type Id = DistributorId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
