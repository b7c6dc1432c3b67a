//! Distributor hierarchy domain module.
//!
//! Stockists and superstockists, their credit terms, and the ownership of
//! stockists by superstockists. Pure logic, no IO.

pub mod directory;
pub mod distributor;
pub mod validation;

pub use directory::DistributorDirectory;
pub use distributor::{
    Address, CreditStatus, CreditTerms, Distributor, DistributorKind, DistributorRole,
    NewDistributor,
};
pub use validation::{validate_distributor, valid_email, valid_gstin, valid_phone};
