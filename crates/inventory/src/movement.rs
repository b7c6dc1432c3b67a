use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use pharmaledger_core::{MovementId, ProductId};

use crate::location::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    Purchase,
    Sale,
    Transfer,
    Adjustment,
    Return,
    Out,
}

impl MovementType {
    /// Outbound movements remove stock; every other type adds it.
    pub fn is_outbound(self) -> bool {
        matches!(self, MovementType::Sale | MovementType::Out)
    }
}

/// What caused a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Invoice,
    Transfer,
    Purchase,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementReference {
    #[serde(rename = "referenceId")]
    pub id: String,
    #[serde(rename = "referenceType")]
    pub kind: ReferenceKind,
}

impl MovementReference {
    pub fn new(id: impl Into<String>, kind: ReferenceKind) -> Self {
        Self { id: id.into(), kind }
    }

    pub fn invoice(id: impl core::fmt::Display) -> Self {
        Self::new(id.to_string(), ReferenceKind::Invoice)
    }
}

/// Write-once audit entry. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: MovementId,
    pub product_id: ProductId,
    pub batch_number: String,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub from_location: Option<Location>,
    pub to_location: Option<Location>,
    #[serde(flatten)]
    pub reference: Option<MovementReference>,
    pub notes: String,
    pub movement_date: DateTime<Utc>,
    pub created_by: String,
}

/// Append-only movement history, persisted under `stock_movements`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementLog {
    entries: Vec<StockMovement>,
}

impl MovementLog {
    pub fn new(entries: Vec<StockMovement>) -> Self {
        Self { entries }
    }

    pub fn append(&mut self, movement: StockMovement) {
        self.entries.push(movement);
    }

    pub fn extend(&mut self, movements: impl IntoIterator<Item = StockMovement>) {
        self.entries.extend(movements);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[StockMovement] {
        &self.entries
    }

    pub fn for_product<'a>(&'a self, product_id: &'a ProductId) -> impl Iterator<Item = &'a StockMovement> + 'a {
        self.entries.iter().filter(move |m| &m.product_id == product_id)
    }

    pub fn for_reference<'a>(&'a self, reference_id: &'a str) -> impl Iterator<Item = &'a StockMovement> + 'a {
        self.entries
            .iter()
            .filter(move |m| m.reference.as_ref().is_some_and(|r| r.id == reference_id))
    }

    /// Movements dated within `[from, to]`, inclusive.
    pub fn between(&self, from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = &StockMovement> {
        self.entries.iter().filter(move |m| {
            let day = m.movement_date.date_naive();
            day >= from && day <= to
        })
    }
}
