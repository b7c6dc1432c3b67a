//! Invoice issuing and lifecycle.
//!
//! ## Issuing
//!
//! `create_invoice` is the one operation that spans several namespaces:
//!
//! ```text
//! InvoiceRequest
//!   ↓
//! 1. Validate every line (all broken rules reported together)
//!   ↓
//! 2. Number the invoice, derive totals and bonus quantities
//!   ↓
//! 3. Per line: sale out of the issuer's location,
//!              purchase (quantity + bonus) into the receiver's location
//!   ↓
//! 4. Persist invoice, inventory and movements in one unit of work
//! ```
//!
//! Any stock failure aborts step 4 entirely. The receiver's credit is
//! checked but never blocks: a breach is logged as a warning.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use pharmaledger_core::{DistributorId, DomainError, Entity, InvoiceId, InvoiceItemId};
use pharmaledger_inventory::{MovementLog, MovementReference, MovementType, StockBook, StockUpdate};
use pharmaledger_invoicing::{
    Invoice, InvoiceBook, InvoiceFilter, InvoiceKind, InvoiceLine, InvoiceRequest, InvoiceSummary,
};
use pharmaledger_parties::DistributorDirectory;
use pharmaledger_products::ProductCatalog;

use crate::namespace::Namespace;
use crate::store::KeyValueStore;
use crate::unit_of_work::Storage;

use super::outcome::ServiceResult;
use super::stock_ledger::seed_from;

pub struct InvoiceEngine<S: KeyValueStore> {
    storage: Arc<Storage<S>>,
}

impl<S: KeyValueStore> InvoiceEngine<S> {
    pub fn new(storage: Arc<Storage<S>>) -> Self {
        Self { storage }
    }

    pub fn create_invoice(
        &self,
        kind: InvoiceKind,
        request: InvoiceRequest,
        occurred_at: DateTime<Utc>,
    ) -> ServiceResult<Invoice> {
        let mut uow = self.storage.begin(&[
            Namespace::Products,
            Namespace::Distributors,
            Namespace::Inventory,
            Namespace::Invoices,
            Namespace::StockMovements,
        ])?;
        let catalog: ProductCatalog = uow.fetch()?;
        let directory: DistributorDirectory = uow.fetch()?;
        let mut invoices: InvoiceBook = uow.fetch()?;
        let mut stock: StockBook = uow.fetch()?;
        let mut log: MovementLog = uow.fetch()?;

        let number = invoices.next_number(kind, request.date);
        let id = InvoiceId::generate_at(kind.id_prefix(), occurred_at);
        let mut invoice = Invoice::create(id, number, kind, request, occurred_at)?;
        invoice.fill_product_details(|item| {
            catalog
                .get(item.product_id())
                .map(|p| (p.name(), p.hsn_code()))
        });

        Self::check_credit(&directory, &invoice);

        let reference = MovementReference::invoice(invoice.id());
        for item in invoice.items() {
            let seed = seed_from(&catalog, item.product_id());
            let sale = StockUpdate::new(
                item.product_id().clone(),
                kind.source_location(),
                item.quantity(),
                MovementType::Sale,
                occurred_at,
            )
            .with_reference(reference.clone())
            .with_seed(seed.clone());
            log.append(stock.update_stock(sale)?);

            let receipt = StockUpdate::new(
                item.product_id().clone(),
                kind.destination_location(),
                item.final_quantity(),
                MovementType::Purchase,
                occurred_at,
            )
            .with_reference(reference.clone())
            .with_seed(seed);
            log.append(stock.update_stock(receipt)?);
        }

        invoices.insert(invoice.clone());
        uow.put(&invoices)?;
        uow.put(&stock)?;
        uow.put(&log)?;
        uow.commit()?;

        tracing::info!(
            invoice_id = %invoice.id(),
            invoice_number = invoice.invoice_number(),
            grand_total = invoice.grand_total(),
            lines = invoice.items().len(),
            "invoice issued"
        );
        Ok(invoice)
    }

    fn check_credit(directory: &DistributorDirectory, invoice: &Invoice) {
        let receiver = DistributorId::from_raw(invoice.to_party());
        let Some(distributor) = directory.get_by_id(&receiver) else {
            return;
        };
        let available = distributor.credit().credit_available();
        if available < invoice.grand_total() {
            tracing::warn!(
                distributor_id = %receiver,
                distributor = distributor.name(),
                available,
                grand_total = invoice.grand_total(),
                "invoice exceeds available credit"
            );
        }
    }

    /// Applies `mutate` to one invoice and persists the book.
    fn with_invoice<T>(
        &self,
        id: &InvoiceId,
        mutate: impl FnOnce(&mut Invoice) -> Result<T, DomainError>,
    ) -> ServiceResult<T> {
        let mut uow = self.storage.begin(&[Namespace::Invoices])?;
        let mut invoices: InvoiceBook = uow.fetch()?;
        let invoice = invoices
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("invoice", id))?;
        let value = mutate(invoice)?;
        uow.put(&invoices)?;
        uow.commit()?;
        Ok(value)
    }

    pub fn mark_paid(&self, id: &InvoiceId, payment_date: NaiveDate, at: DateTime<Utc>) -> ServiceResult<()> {
        self.with_invoice(id, |inv| inv.mark_paid(payment_date, at))?;
        tracing::info!(invoice_id = %id, "invoice paid");
        Ok(())
    }

    pub fn cancel(&self, id: &InvoiceId, at: DateTime<Utc>) -> ServiceResult<()> {
        self.with_invoice(id, |inv| inv.cancel(at))?;
        tracing::info!(invoice_id = %id, "invoice cancelled");
        Ok(())
    }

    pub fn add_item(&self, id: &InvoiceId, line: InvoiceLine, at: DateTime<Utc>) -> ServiceResult<Invoice> {
        self.with_invoice(id, |inv| {
            inv.add_item(line, at)?;
            Ok(inv.clone())
        })
    }

    pub fn remove_item(&self, id: &InvoiceId, item_id: &InvoiceItemId, at: DateTime<Utc>) -> ServiceResult<Invoice> {
        self.with_invoice(id, |inv| {
            inv.remove_item(item_id, at)?;
            Ok(inv.clone())
        })
    }

    /// Returns how many invoices moved to overdue.
    pub fn refresh_overdue(&self, today: NaiveDate, at: DateTime<Utc>) -> ServiceResult<usize> {
        let mut uow = self.storage.begin(&[Namespace::Invoices])?;
        let mut invoices: InvoiceBook = uow.fetch()?;
        let moved = invoices.refresh_overdue(today, at);
        if moved > 0 {
            uow.put(&invoices)?;
            uow.commit()?;
            tracing::info!(moved, "invoices marked overdue");
        }
        Ok(moved)
    }

    pub fn get(&self, id: &InvoiceId) -> ServiceResult<Option<Invoice>> {
        Ok(self.storage.fetch::<InvoiceBook>()?.get(id).cloned())
    }

    pub fn list(&self, kind: Option<InvoiceKind>, filter: &InvoiceFilter) -> ServiceResult<Vec<Invoice>> {
        let invoices = self.storage.fetch::<InvoiceBook>()?;
        Ok(invoices.list(kind, filter).into_iter().cloned().collect())
    }

    pub fn summary(&self) -> ServiceResult<InvoiceSummary> {
        Ok(self.storage.fetch::<InvoiceBook>()?.summary())
    }
}
