use std::sync::Arc;

use chrono::{DateTime, Utc};

use pharmaledger_core::{DomainError, Entity, ProductId};
use pharmaledger_products::{NewProduct, Product, ProductCatalog};

use crate::namespace::Namespace;
use crate::store::KeyValueStore;
use crate::unit_of_work::Storage;

use super::outcome::ServiceResult;

pub struct CatalogService<S: KeyValueStore> {
    storage: Arc<Storage<S>>,
}

impl<S: KeyValueStore> CatalogService<S> {
    pub fn new(storage: Arc<Storage<S>>) -> Self {
        Self { storage }
    }

    fn catalog(&self) -> ServiceResult<ProductCatalog> {
        Ok(self.storage.fetch::<ProductCatalog>()?)
    }

    fn mutate<T>(&self, mutate: impl FnOnce(&mut ProductCatalog) -> Result<T, DomainError>) -> ServiceResult<T> {
        let mut uow = self.storage.begin(&[Namespace::Products])?;
        let mut catalog: ProductCatalog = uow.fetch()?;
        let value = mutate(&mut catalog)?;
        uow.put(&catalog)?;
        uow.commit()?;
        Ok(value)
    }

    pub fn add(&self, input: NewProduct) -> ServiceResult<Product> {
        let id = ProductId::generate_at(ProductId::PREFIX, input.occurred_at);
        let product = self.mutate(|catalog| catalog.add(id, input).cloned())?;
        tracing::info!(product_id = %product.id(), name = product.name(), "product added");
        Ok(product)
    }

    pub fn get(&self, id: &ProductId) -> ServiceResult<Option<Product>> {
        Ok(self.catalog()?.get(id).cloned())
    }

    pub fn archive(&self, id: &ProductId, at: DateTime<Utc>) -> ServiceResult<()> {
        self.mutate(|catalog| catalog.archive(id, at))
    }

    pub fn reprice(&self, id: &ProductId, cost_price: i64, mrp: i64, at: DateTime<Utc>) -> ServiceResult<()> {
        self.mutate(|catalog| catalog.reprice(id, cost_price, mrp, at))
    }

    pub fn list_active(&self) -> ServiceResult<Vec<Product>> {
        Ok(self.catalog()?.active().cloned().collect())
    }

    pub fn search(&self, needle: &str) -> ServiceResult<Vec<Product>> {
        Ok(self.catalog()?.search(needle).into_iter().cloned().collect())
    }
}
