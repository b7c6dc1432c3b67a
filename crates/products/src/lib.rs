//! Product catalog domain module.
//!
//! Pure business rules for products and their derived channel prices (no IO).

pub mod catalog;
pub mod product;

pub use catalog::ProductCatalog;
pub use product::{NewProduct, Product, validate_product};
