//! `pharmaledger-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod lifecycle;
pub mod value_object;

pub use entity::{Entity, find_by_id, find_by_id_mut};
pub use error::{DomainError, DomainResult, ValidationErrors};
pub use id::{
    DistributorId, ExpenseId, InventoryItemId, InvoiceId, InvoiceItemId, LoanId, MovementId,
    PaymentId, ProductId, generate_id,
};
pub use lifecycle::Lifecycle;
pub use value_object::{BasisPoints, ValueObject};
