use std::sync::Arc;

use chrono::{DateTime, Utc};

use pharmaledger_core::{DistributorId, DomainError, Entity};
use pharmaledger_parties::{Distributor, DistributorDirectory, DistributorKind, NewDistributor};

use crate::namespace::Namespace;
use crate::store::KeyValueStore;
use crate::unit_of_work::Storage;

use super::outcome::ServiceResult;

/// Distributor registration, hierarchy and credit bookkeeping.
pub struct DirectoryService<S: KeyValueStore> {
    storage: Arc<Storage<S>>,
}

impl<S: KeyValueStore> DirectoryService<S> {
    pub fn new(storage: Arc<Storage<S>>) -> Self {
        Self { storage }
    }

    fn directory(&self) -> ServiceResult<DistributorDirectory> {
        Ok(self.storage.fetch::<DistributorDirectory>()?)
    }

    fn mutate<T>(
        &self,
        mutate: impl FnOnce(&mut DistributorDirectory) -> Result<T, DomainError>,
    ) -> ServiceResult<T> {
        let mut uow = self.storage.begin(&[Namespace::Distributors])?;
        let mut directory: DistributorDirectory = uow.fetch()?;
        let value = mutate(&mut directory)?;
        uow.put(&directory)?;
        uow.commit()?;
        Ok(value)
    }

    pub fn register(&self, input: NewDistributor) -> ServiceResult<Distributor> {
        let id = DistributorId::generate_at(DistributorId::PREFIX, input.occurred_at);
        let distributor = self.mutate(|dir| dir.register(id, input).cloned())?;
        tracing::info!(
            distributor_id = %distributor.id(),
            kind = distributor.kind().as_str(),
            "distributor registered"
        );
        Ok(distributor)
    }

    pub fn get(&self, id: &DistributorId) -> ServiceResult<Option<Distributor>> {
        Ok(self.directory()?.get_by_id(id).cloned())
    }

    pub fn display_name(&self, id: &DistributorId) -> ServiceResult<String> {
        Ok(self.directory()?.display_name(id))
    }

    pub fn list_active(&self, kind: DistributorKind) -> ServiceResult<Vec<Distributor>> {
        let directory = self.directory()?;
        let active: Vec<Distributor> = match kind {
            DistributorKind::Stockist => directory.active_stockists().cloned().collect(),
            DistributorKind::Superstockist => directory.active_superstockists().cloned().collect(),
        };
        Ok(active)
    }

    pub fn assign(
        &self,
        stockist_id: &DistributorId,
        superstockist_id: &DistributorId,
        at: DateTime<Utc>,
    ) -> ServiceResult<()> {
        self.mutate(|dir| dir.assign(stockist_id, superstockist_id, at))
    }

    /// Returns whether the stockist had a parent.
    pub fn unassign(&self, stockist_id: &DistributorId, at: DateTime<Utc>) -> ServiceResult<bool> {
        self.mutate(|dir| Ok(dir.unassign(stockist_id, at)))
    }

    pub fn superstockist_of(&self, stockist_id: &DistributorId) -> ServiceResult<Option<Distributor>> {
        Ok(self.directory()?.superstockist_of(stockist_id).cloned())
    }

    pub fn stockists_of(&self, superstockist_id: &DistributorId) -> ServiceResult<Vec<Distributor>> {
        Ok(self
            .directory()?
            .stockists_of(superstockist_id)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn archive(&self, id: &DistributorId, at: DateTime<Utc>) -> ServiceResult<()> {
        self.mutate(|dir| dir.archive(id, at))?;
        tracing::info!(distributor_id = %id, "distributor archived");
        Ok(())
    }

    pub fn update_credit_limit(&self, id: &DistributorId, limit: i64, at: DateTime<Utc>) -> ServiceResult<()> {
        self.mutate(|dir| dir.update_credit_limit(id, limit, at))
    }

    pub fn add_balance(&self, id: &DistributorId, amount: i64, at: DateTime<Utc>) -> ServiceResult<()> {
        self.mutate(|dir| dir.add_balance(id, amount, at))
    }

    pub fn deduct_balance(&self, id: &DistributorId, amount: i64, at: DateTime<Utc>) -> ServiceResult<()> {
        self.mutate(|dir| dir.deduct_balance(id, amount, at))
    }

    pub fn credit_alerts(&self) -> ServiceResult<Vec<Distributor>> {
        Ok(self.directory()?.credit_alerts().into_iter().cloned().collect())
    }
}
