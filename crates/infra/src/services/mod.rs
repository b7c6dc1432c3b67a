//! Application services: load documents, apply pure domain logic, persist.
//!
//! Every mutating operation runs inside one [`crate::unit_of_work::UnitOfWork`],
//! so a failed rule or a failed write leaves storage untouched.

pub mod catalog;
pub mod directory;
pub mod expenses;
pub mod invoice_engine;
pub mod loan_ledger;
pub mod outcome;
pub mod stock_ledger;

pub use catalog::CatalogService;
pub use directory::DirectoryService;
pub use expenses::ExpenseService;
pub use invoice_engine::InvoiceEngine;
pub use loan_ledger::LoanLedger;
pub use outcome::{Outcome, ServiceError, ServiceResult};
pub use stock_ledger::StockLedger;

use std::sync::Arc;

use crate::store::KeyValueStore;
use crate::unit_of_work::Storage;

/// Every service wired to one shared storage.
pub struct Services<S: KeyValueStore> {
    pub storage: Arc<Storage<S>>,
    pub catalog: CatalogService<S>,
    pub directory: DirectoryService<S>,
    pub stock: StockLedger<S>,
    pub invoices: InvoiceEngine<S>,
    pub loans: LoanLedger<S>,
    pub expenses: ExpenseService<S>,
}

impl<S: KeyValueStore> Services<S> {
    pub fn new(store: S) -> Self {
        Self::with_storage(Arc::new(Storage::new(store)))
    }

    pub fn with_storage(storage: Arc<Storage<S>>) -> Self {
        Self {
            catalog: CatalogService::new(storage.clone()),
            directory: DirectoryService::new(storage.clone()),
            stock: StockLedger::new(storage.clone()),
            invoices: InvoiceEngine::new(storage.clone()),
            loans: LoanLedger::new(storage.clone()),
            expenses: ExpenseService::new(storage.clone()),
            storage,
        }
    }
}
