//! The stock book: authoritative quantity on hand per (product, location).
//!
//! Every mutation validates first and mutates second, so a failed call leaves
//! the book exactly as it was. Each successful mutation returns the movement
//! entry the caller appends to the [`MovementLog`](crate::MovementLog).

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use pharmaledger_core::{
    DomainError, DomainResult, InventoryItemId, MovementId, ProductId, find_by_id, find_by_id_mut,
};

use crate::item::{InventoryItem, NewInventoryItem};
use crate::location::Location;
use crate::movement::{MovementReference, MovementType, StockMovement};

const SYSTEM_USER: &str = "system";

/// Catalog details copied onto a record that has to be created on the fly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSeed {
    pub product_name: String,
    pub cost_price: i64,
    pub mrp: i64,
}

/// Command: move stock into or out of one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockUpdate {
    pub product_id: ProductId,
    pub location: Location,
    pub quantity: i64,
    pub movement_type: MovementType,
    pub reference: Option<MovementReference>,
    /// Replaces the record's cost price on inbound movements.
    pub cost_price: Option<i64>,
    pub seed: Option<ItemSeed>,
    pub notes: String,
    pub occurred_at: DateTime<Utc>,
}

impl StockUpdate {
    pub fn new(
        product_id: ProductId,
        location: Location,
        quantity: i64,
        movement_type: MovementType,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            product_id,
            location,
            quantity,
            movement_type,
            reference: None,
            cost_price: None,
            seed: None,
            notes: String::new(),
            occurred_at,
        }
    }

    pub fn with_reference(mut self, reference: MovementReference) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_seed(mut self, seed: Option<ItemSeed>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_cost_price(mut self, cost_price: i64) -> Self {
        self.cost_price = Some(cost_price);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// Command: move stock between two locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub product_id: ProductId,
    pub from: Location,
    pub to: Location,
    pub quantity: i64,
    pub reference: Option<MovementReference>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSummary {
    pub items: usize,
    pub quantity: i64,
    pub value: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSummary {
    pub total_items: usize,
    pub total_quantity: i64,
    pub total_value: i64,
    pub low_stock: usize,
    pub near_expiry: usize,
    pub expired: usize,
    pub by_location: BTreeMap<Location, LocationSummary>,
}

/// All stock records, persisted under the `inventory` namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockBook {
    items: Vec<InventoryItem>,
}

impl StockBook {
    pub fn new(items: Vec<InventoryItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn active(&self) -> impl Iterator<Item = &InventoryItem> {
        self.items.iter().filter(|i| i.is_active())
    }

    pub fn get(&self, id: &InventoryItemId) -> Option<&InventoryItem> {
        find_by_id(&self.items, id)
    }

    /// The record stock movements for (product, location) land on: the first
    /// active one.
    pub fn find(&self, product_id: &ProductId, location: Location) -> Option<&InventoryItem> {
        self.position(product_id, location).map(|idx| &self.items[idx])
    }

    fn position(&self, product_id: &ProductId, location: Location) -> Option<usize> {
        self.items.iter().position(|i| {
            i.is_active() && i.product_id() == product_id && i.location() == location
        })
    }

    fn get_mut(&mut self, id: &InventoryItemId) -> DomainResult<&mut InventoryItem> {
        find_by_id_mut(&mut self.items, id).ok_or_else(|| DomainError::not_found("inventory item", id))
    }

    /// Sum of quantity over active records of `product_id`, optionally at one location.
    pub fn stock_level(&self, product_id: &ProductId, location: Option<Location>) -> i64 {
        self.active()
            .filter(|i| i.product_id() == product_id)
            .filter(|i| location.is_none_or(|l| i.location() == l))
            .map(InventoryItem::quantity)
            .fold(0i64, i64::saturating_add)
    }

    pub fn add_stock(
        &mut self,
        id: &InventoryItemId,
        quantity: i64,
        cost_price: Option<i64>,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.get_mut(id)?.add_stock(quantity, cost_price, at)
    }

    pub fn remove_stock(&mut self, id: &InventoryItemId, quantity: i64, at: DateTime<Utc>) -> DomainResult<()> {
        self.get_mut(id)?.remove_stock(quantity, at)
    }

    /// Applies one movement at one location.
    ///
    /// Outbound types remove stock, all others add it. A record is created
    /// for a (product, location) pair without one, but only after the
    /// movement has been validated. Repeating a call repeats its effect.
    pub fn update_stock(&mut self, update: StockUpdate) -> DomainResult<StockMovement> {
        if update.quantity < 0 {
            return Err(DomainError::InvalidQuantity(update.quantity));
        }
        let existing = self.position(&update.product_id, update.location);
        let outbound = update.movement_type.is_outbound();

        match (outbound, existing) {
            (true, Some(idx)) => self.items[idx].ensure_can_remove(update.quantity)?,
            (true, None) => {
                return Err(DomainError::InsufficientStock {
                    product_id: update.product_id.to_string(),
                    location: update.location.to_string(),
                    available: 0,
                    requested: update.quantity,
                });
            }
            (false, Some(idx)) => self.items[idx].ensure_can_add(update.quantity)?,
            (false, None) => {}
        }

        let idx = match existing {
            Some(idx) => idx,
            None => self.create_empty(&update.product_id, update.location, update.occurred_at),
        };
        let item = &mut self.items[idx];
        if let Some(seed) = &update.seed {
            item.fill_details(&seed.product_name, seed.cost_price, seed.mrp);
        }
        if outbound {
            item.remove_stock(update.quantity, update.occurred_at)?;
        } else {
            item.add_stock(update.quantity, update.cost_price, update.occurred_at)?;
        }

        tracing::debug!(
            product_id = %update.product_id,
            location = %update.location,
            movement_type = ?update.movement_type,
            quantity = update.quantity,
            on_hand = item.quantity(),
            "stock updated"
        );

        let (from_location, to_location) = if outbound {
            (Some(update.location), None)
        } else {
            (None, Some(update.location))
        };
        Ok(StockMovement {
            id: MovementId::generate_at(MovementId::PREFIX, update.occurred_at),
            product_id: update.product_id,
            batch_number: item.batch_number().to_string(),
            movement_type: update.movement_type,
            quantity: update.quantity,
            from_location,
            to_location,
            reference: update.reference,
            notes: update.notes,
            movement_date: update.occurred_at,
            created_by: SYSTEM_USER.to_string(),
        })
    }

    /// Moves stock between two locations as one step.
    ///
    /// The source must exist and hold the full quantity; otherwise nothing
    /// changes. The destination record is created when missing, inheriting
    /// the source's product details.
    pub fn transfer_stock(&mut self, transfer: Transfer) -> DomainResult<StockMovement> {
        if transfer.from == transfer.to {
            return Err(DomainError::validation(
                "Source and destination locations must differ",
            ));
        }
        if transfer.quantity < 0 {
            return Err(DomainError::InvalidQuantity(transfer.quantity));
        }
        let Some(src) = self.position(&transfer.product_id, transfer.from) else {
            return Err(DomainError::InsufficientStock {
                product_id: transfer.product_id.to_string(),
                location: transfer.from.to_string(),
                available: 0,
                requested: transfer.quantity,
            });
        };
        self.items[src].ensure_can_remove(transfer.quantity)?;
        let existing_dst = self.position(&transfer.product_id, transfer.to);
        if let Some(idx) = existing_dst {
            self.items[idx].ensure_can_add(transfer.quantity)?;
        }

        let dst = match existing_dst {
            Some(idx) => idx,
            None => self.create_empty(&transfer.product_id, transfer.to, transfer.occurred_at),
        };
        let seed = ItemSeed {
            product_name: self.items[src].product_name().to_string(),
            cost_price: self.items[src].cost_price(),
            mrp: self.items[src].mrp(),
        };
        let batch_number = self.items[src].batch_number().to_string();

        self.items[src].remove_stock(transfer.quantity, transfer.occurred_at)?;
        let destination = &mut self.items[dst];
        destination.fill_details(&seed.product_name, seed.cost_price, seed.mrp);
        destination.add_stock(transfer.quantity, None, transfer.occurred_at)?;

        tracing::debug!(
            product_id = %transfer.product_id,
            from = %transfer.from,
            to = %transfer.to,
            quantity = transfer.quantity,
            "stock transferred"
        );

        Ok(StockMovement {
            id: MovementId::generate_at(MovementId::PREFIX, transfer.occurred_at),
            product_id: transfer.product_id,
            batch_number,
            movement_type: MovementType::Transfer,
            quantity: transfer.quantity,
            from_location: Some(transfer.from),
            to_location: Some(transfer.to),
            reference: transfer.reference,
            notes: String::new(),
            movement_date: transfer.occurred_at,
            created_by: SYSTEM_USER.to_string(),
        })
    }

    /// Adds a batch-specific record. A non-zero opening quantity is reported
    /// as a purchase movement.
    pub fn register_item(
        &mut self,
        id: InventoryItemId,
        input: NewInventoryItem,
    ) -> DomainResult<(InventoryItemId, Option<StockMovement>)> {
        let duplicate = self.active().any(|i| {
            i.product_id() == &input.product_id
                && i.batch_number() == input.batch_number
                && i.location() == input.location
        });
        if duplicate {
            return Err(DomainError::invariant(format!(
                "batch {} of {} already stocked at {}",
                input.batch_number, input.product_id, input.location
            )));
        }

        let at = input.occurred_at;
        let item = InventoryItem::create(id.clone(), input)?;
        let opening = (item.quantity() > 0).then(|| StockMovement {
            id: MovementId::generate_at(MovementId::PREFIX, at),
            product_id: item.product_id().clone(),
            batch_number: item.batch_number().to_string(),
            movement_type: MovementType::Purchase,
            quantity: item.quantity(),
            from_location: None,
            to_location: Some(item.location()),
            reference: None,
            notes: "Opening stock".to_string(),
            movement_date: at,
            created_by: SYSTEM_USER.to_string(),
        });
        self.items.push(item);
        Ok((id, opening))
    }

    pub fn update_stock_levels(
        &mut self,
        id: &InventoryItemId,
        min: i64,
        max: i64,
        reorder: i64,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.get_mut(id)?.update_stock_levels(min, max, reorder, at)
    }

    pub fn archive_item(&mut self, id: &InventoryItemId, at: DateTime<Utc>) -> DomainResult<()> {
        self.get_mut(id)?.archive(at);
        Ok(())
    }

    /// Active records at or below their reorder point.
    pub fn low_stock_items(&self) -> Vec<&InventoryItem> {
        self.active().filter(|i| i.needs_reorder()).collect()
    }

    /// Active records expiring between today and `days_threshold` days out.
    pub fn expiring_items(&self, today: NaiveDate, days_threshold: i64) -> Vec<&InventoryItem> {
        self.active()
            .filter(|i| i.expires_within(today, days_threshold))
            .collect()
    }

    pub fn items_by_location(&self, location: Location) -> Vec<&InventoryItem> {
        self.active().filter(|i| i.location() == location).collect()
    }

    pub fn items_by_product(&self, product_id: &ProductId) -> Vec<&InventoryItem> {
        self.active().filter(|i| i.product_id() == product_id).collect()
    }

    pub fn summary(&self, today: NaiveDate) -> StockSummary {
        self.active().fold(StockSummary::default(), |mut acc, item| {
            acc.total_items += 1;
            acc.total_quantity = acc.total_quantity.saturating_add(item.quantity());
            acc.total_value = acc.total_value.saturating_add(item.stock_value());
            acc.low_stock += usize::from(item.needs_reorder());
            acc.near_expiry += usize::from(item.is_near_expiry(today));
            acc.expired += usize::from(item.is_expired(today));
            let loc = acc.by_location.entry(item.location()).or_default();
            loc.items += 1;
            loc.quantity = loc.quantity.saturating_add(item.quantity());
            loc.value = loc.value.saturating_add(item.stock_value());
            acc
        })
    }

    fn create_empty(&mut self, product_id: &ProductId, location: Location, at: DateTime<Utc>) -> usize {
        let id = InventoryItemId::generate_at(InventoryItemId::PREFIX, at);
        tracing::debug!(%product_id, %location, item_id = %id, "creating stock record");
        self.items
            .push(InventoryItem::empty(id, product_id.clone(), location, at));
        self.items.len() - 1
    }
}
