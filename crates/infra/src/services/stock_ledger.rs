use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use pharmaledger_core::{DomainError, InventoryItemId, ProductId};
use pharmaledger_inventory::{
    InventoryItem, ItemSeed, Location, MovementLog, NewInventoryItem, StockBook, StockMovement,
    StockSummary, StockUpdate, Transfer,
};
use pharmaledger_products::ProductCatalog;

use crate::namespace::Namespace;
use crate::store::KeyValueStore;
use crate::unit_of_work::Storage;

use super::outcome::ServiceResult;

/// Catalog details for a record that has to be created on the fly.
pub(crate) fn seed_from(catalog: &ProductCatalog, product_id: &ProductId) -> Option<ItemSeed> {
    catalog.get(product_id).map(|p| ItemSeed {
        product_name: p.name().to_string(),
        cost_price: p.cost_price(),
        mrp: p.mrp(),
    })
}

/// Inventory service: every stock mutation persists the stock book and its
/// movement log together.
pub struct StockLedger<S: KeyValueStore> {
    storage: Arc<Storage<S>>,
}

impl<S: KeyValueStore> StockLedger<S> {
    pub fn new(storage: Arc<Storage<S>>) -> Self {
        Self { storage }
    }

    fn book(&self) -> ServiceResult<StockBook> {
        Ok(self.storage.fetch::<StockBook>()?)
    }

    /// Runs `mutate` against the stock book and persists the result. Nothing
    /// is written when `mutate` fails.
    fn mutate_book<T>(
        &self,
        mutate: impl FnOnce(&mut StockBook) -> Result<T, DomainError>,
    ) -> ServiceResult<T> {
        let mut uow = self.storage.begin(&[Namespace::Inventory])?;
        let mut book: StockBook = uow.fetch()?;
        let value = mutate(&mut book)?;
        uow.put(&book)?;
        uow.commit()?;
        Ok(value)
    }

    /// Like [`Self::mutate_book`] but also appends the produced movements.
    fn move_stock<T>(
        &self,
        mutate: impl FnOnce(&mut StockBook, &ProductCatalog) -> Result<(T, Vec<StockMovement>), DomainError>,
    ) -> ServiceResult<T> {
        let mut uow = self.storage.begin(&[
            Namespace::Products,
            Namespace::Inventory,
            Namespace::StockMovements,
        ])?;
        let catalog: ProductCatalog = uow.fetch()?;
        let mut book: StockBook = uow.fetch()?;
        let mut log: MovementLog = uow.fetch()?;

        let (value, movements) = mutate(&mut book, &catalog)?;
        let recorded = movements.len();
        log.extend(movements);

        uow.put(&book)?;
        uow.put(&log)?;
        uow.commit()?;
        tracing::info!(movements = recorded, "stock ledger committed");
        Ok(value)
    }

    pub fn stock_level(&self, product_id: &ProductId, location: Option<Location>) -> ServiceResult<i64> {
        Ok(self.book()?.stock_level(product_id, location))
    }

    pub fn get(&self, id: &InventoryItemId) -> ServiceResult<Option<InventoryItem>> {
        Ok(self.book()?.get(id).cloned())
    }

    pub fn add_stock(
        &self,
        id: &InventoryItemId,
        quantity: i64,
        cost_price: Option<i64>,
        at: DateTime<Utc>,
    ) -> ServiceResult<()> {
        self.mutate_book(|book| book.add_stock(id, quantity, cost_price, at))
    }

    pub fn remove_stock(&self, id: &InventoryItemId, quantity: i64, at: DateTime<Utc>) -> ServiceResult<()> {
        self.mutate_book(|book| book.remove_stock(id, quantity, at))
    }

    /// Moves stock into or out of one location, creating the record from
    /// catalog data when the location has none yet.
    pub fn update_stock(&self, update: StockUpdate) -> ServiceResult<StockMovement> {
        self.move_stock(|book, catalog| {
            let seed = update.seed.clone().or_else(|| seed_from(catalog, &update.product_id));
            let movement = book.update_stock(update.with_seed(seed))?;
            Ok((movement.clone(), vec![movement]))
        })
    }

    pub fn transfer_stock(&self, transfer: Transfer) -> ServiceResult<StockMovement> {
        self.move_stock(|book, _| {
            let movement = book.transfer_stock(transfer)?;
            Ok((movement.clone(), vec![movement]))
        })
    }

    pub fn register_item(&self, input: NewInventoryItem) -> ServiceResult<InventoryItem> {
        let id = InventoryItemId::generate_at(InventoryItemId::PREFIX, input.occurred_at);
        self.move_stock(|book, _| {
            let (id, opening) = book.register_item(id, input)?;
            let item = book
                .get(&id)
                .cloned()
                .ok_or_else(|| DomainError::not_found("inventory item", &id))?;
            Ok((item, opening.into_iter().collect()))
        })
    }

    pub fn update_stock_levels(
        &self,
        id: &InventoryItemId,
        min: i64,
        max: i64,
        reorder: i64,
        at: DateTime<Utc>,
    ) -> ServiceResult<()> {
        self.mutate_book(|book| book.update_stock_levels(id, min, max, reorder, at))
    }

    pub fn archive_item(&self, id: &InventoryItemId, at: DateTime<Utc>) -> ServiceResult<()> {
        self.mutate_book(|book| book.archive_item(id, at))
    }

    pub fn low_stock_items(&self) -> ServiceResult<Vec<InventoryItem>> {
        Ok(self.book()?.low_stock_items().into_iter().cloned().collect())
    }

    pub fn expiring_items(&self, today: NaiveDate, days_threshold: i64) -> ServiceResult<Vec<InventoryItem>> {
        Ok(self
            .book()?
            .expiring_items(today, days_threshold)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn items_by_location(&self, location: Location) -> ServiceResult<Vec<InventoryItem>> {
        Ok(self.book()?.items_by_location(location).into_iter().cloned().collect())
    }

    pub fn items_by_product(&self, product_id: &ProductId) -> ServiceResult<Vec<InventoryItem>> {
        Ok(self.book()?.items_by_product(product_id).into_iter().cloned().collect())
    }

    pub fn stock_summary(&self, today: NaiveDate) -> ServiceResult<StockSummary> {
        Ok(self.book()?.summary(today))
    }

    pub fn movements_for(&self, product_id: &ProductId) -> ServiceResult<Vec<StockMovement>> {
        let log = self.storage.fetch::<MovementLog>()?;
        Ok(log.for_product(product_id).cloned().collect())
    }

    pub fn movements_for_reference(&self, reference_id: &str) -> ServiceResult<Vec<StockMovement>> {
        let log = self.storage.fetch::<MovementLog>()?;
        Ok(log.for_reference(reference_id).cloned().collect())
    }
}
