//! Inventory domain module.
//!
//! Stock records per (product, batch, location), the append-only movement
//! log, and the stock book that applies quantity mutations. Deterministic
//! domain logic only (no IO, no storage).

pub mod book;
pub mod item;
pub mod location;
pub mod movement;

pub use book::{ItemSeed, LocationSummary, StockBook, StockSummary, StockUpdate, Transfer};
pub use item::{InventoryItem, NEAR_EXPIRY_DAYS, NewInventoryItem, StockStatus};
pub use location::Location;
pub use movement::{MovementLog, MovementReference, MovementType, ReferenceKind, StockMovement};
