//! Typed documents: which aggregate collection lives under which namespace.

use serde::Serialize;
use serde::de::DeserializeOwned;

use pharmaledger_accounting::{ExpenseBook, LoanBook, PaymentLedger};
use pharmaledger_inventory::{MovementLog, StockBook};
use pharmaledger_invoicing::InvoiceBook;
use pharmaledger_parties::DistributorDirectory;
use pharmaledger_products::ProductCatalog;

use crate::config::Settings;
use crate::namespace::Namespace;
use crate::store::{KeyValueStore, StoreError};
use crate::unit_of_work::{Storage, UnitOfWork};

/// A collection persisted as one JSON document.
pub trait Document: Serialize + DeserializeOwned + Default {
    const NAMESPACE: Namespace;
}

impl Document for ProductCatalog {
    const NAMESPACE: Namespace = Namespace::Products;
}

impl Document for DistributorDirectory {
    const NAMESPACE: Namespace = Namespace::Distributors;
}

impl Document for StockBook {
    const NAMESPACE: Namespace = Namespace::Inventory;
}

impl Document for InvoiceBook {
    const NAMESPACE: Namespace = Namespace::Invoices;
}

impl Document for LoanBook {
    const NAMESPACE: Namespace = Namespace::Loans;
}

impl Document for PaymentLedger {
    const NAMESPACE: Namespace = Namespace::Payments;
}

impl Document for ExpenseBook {
    const NAMESPACE: Namespace = Namespace::Expenses;
}

impl Document for MovementLog {
    const NAMESPACE: Namespace = Namespace::StockMovements;
}

impl Document for Settings {
    const NAMESPACE: Namespace = Namespace::Settings;
}

impl<S: KeyValueStore> UnitOfWork<'_, S> {
    pub fn fetch<D: Document>(&self) -> Result<D, StoreError> {
        self.load(D::NAMESPACE)
    }

    pub fn put<D: Document>(&mut self, document: &D) -> Result<(), StoreError> {
        self.stage(D::NAMESPACE, document)
    }
}

impl<S: KeyValueStore> Storage<S> {
    pub fn fetch<D: Document>(&self) -> Result<D, StoreError> {
        self.read(D::NAMESPACE)
    }

    /// Replaces one document in its own unit of work.
    pub fn replace<D: Document>(&self, document: &D) -> Result<(), StoreError> {
        let mut uow = self.begin(&[D::NAMESPACE])?;
        uow.put(document)?;
        uow.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[test]
    fn documents_land_under_their_namespace_key() {
        let storage = Storage::new(InMemoryStore::new());
        storage.replace(&Settings::default()).unwrap();
        storage.replace(&InvoiceBook::new()).unwrap();

        assert_eq!(storage.store().keys().unwrap(), vec!["invoices", "settings"]);
        let raw = storage.store().get("invoices").unwrap().unwrap();
        assert_eq!(raw, r#"{"stockist":[],"superstockist":[]}"#);
        assert_eq!(storage.fetch::<Settings>().unwrap(), Settings::default());
    }
}
