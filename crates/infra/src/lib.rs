//! Infrastructure layer: storage backends, transactions, services, config.

pub mod config;
pub mod namespace;
pub mod repository;
pub mod seed;
pub mod services;
pub mod store;
pub mod unit_of_work;

#[cfg(test)]
mod integration_tests;

pub use config::{AppConfig, Settings};
pub use namespace::Namespace;
pub use repository::Document;
pub use services::{Outcome, ServiceError, ServiceResult, Services};
pub use store::{InMemoryStore, JsonFileStore, KeyValueStore, StoreError};
pub use unit_of_work::{NamespaceLocks, Storage, UnitOfWork};
