//! Distributor directory: identity resolution and the supply hierarchy.
//!
//! The stockist -> superstockist relation is stored once, on the
//! superstockist. `superstockist_of` derives the reverse direction, so there
//! is no back-reference to fall out of sync when a record is archived.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pharmaledger_core::{DistributorId, DomainError, DomainResult, Entity, find_by_id, find_by_id_mut};

use crate::distributor::{CreditStatus, Distributor, DistributorKind, NewDistributor};

/// Both distributor books, persisted under the `distributors` namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributorDirectory {
    #[serde(default)]
    stockists: Vec<Distributor>,
    #[serde(default)]
    superstockists: Vec<Distributor>,
}

impl DistributorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stockists(&self) -> &[Distributor] {
        &self.stockists
    }

    pub fn superstockists(&self) -> &[Distributor] {
        &self.superstockists
    }

    pub fn active_stockists(&self) -> impl Iterator<Item = &Distributor> {
        self.stockists.iter().filter(|d| d.is_active())
    }

    pub fn active_superstockists(&self) -> impl Iterator<Item = &Distributor> {
        self.superstockists.iter().filter(|d| d.is_active())
    }

    /// Searches stockists first, then superstockists.
    ///
    /// An unknown id is an ordinary outcome, not an error.
    pub fn get_by_id(&self, id: &DistributorId) -> Option<&Distributor> {
        find_by_id(&self.stockists, id).or_else(|| find_by_id(&self.superstockists, id))
    }

    fn get_by_id_mut(&mut self, id: &DistributorId) -> Option<&mut Distributor> {
        if let Some(d) = find_by_id_mut(&mut self.stockists, id) {
            return Some(d);
        }
        find_by_id_mut(&mut self.superstockists, id)
    }

    /// Name for display, `"Unknown"` when the id does not resolve.
    pub fn display_name(&self, id: &DistributorId) -> String {
        self.get_by_id(id)
            .map(|d| d.name().to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn register(&mut self, id: DistributorId, input: NewDistributor) -> DomainResult<&Distributor> {
        if self.get_by_id(&id).is_some() {
            return Err(DomainError::invariant(format!("distributor {id} already exists")));
        }
        let distributor = Distributor::register(id, input)?;
        let book = match distributor.kind() {
            DistributorKind::Stockist => &mut self.stockists,
            DistributorKind::Superstockist => &mut self.superstockists,
        };
        book.push(distributor);
        let last = book.len() - 1;
        Ok(&book[last])
    }

    /// Places a stockist under a superstockist, detaching it from any
    /// previous parent.
    pub fn assign(
        &mut self,
        stockist_id: &DistributorId,
        superstockist_id: &DistributorId,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        if !self.active_stockists().any(|d| d.id() == stockist_id) {
            return Err(DomainError::not_found("stockist", stockist_id));
        }
        if !self.active_superstockists().any(|d| d.id() == superstockist_id) {
            return Err(DomainError::not_found("superstockist", superstockist_id));
        }

        for parent in self.superstockists.iter_mut() {
            if parent.id() != superstockist_id {
                parent.detach_stockist(stockist_id, at);
            }
        }
        if let Some(parent) = find_by_id_mut(&mut self.superstockists, superstockist_id) {
            parent.attach_stockist(stockist_id, at);
        }
        Ok(())
    }

    pub fn unassign(&mut self, stockist_id: &DistributorId, at: DateTime<Utc>) -> bool {
        self.superstockists
            .iter_mut()
            .fold(false, |found, parent| parent.detach_stockist(stockist_id, at) || found)
    }

    /// The superstockist currently supplying `stockist_id`, if any.
    pub fn superstockist_of(&self, stockist_id: &DistributorId) -> Option<&Distributor> {
        self.active_superstockists()
            .find(|s| s.owned_stockists().contains(stockist_id))
    }

    pub fn stockists_of(&self, superstockist_id: &DistributorId) -> Vec<&Distributor> {
        let Some(parent) = find_by_id(&self.superstockists, superstockist_id) else {
            return Vec::new();
        };
        parent
            .owned_stockists()
            .iter()
            .filter_map(|id| find_by_id(&self.stockists, id))
            .filter(|d| d.is_active())
            .collect()
    }

    /// Soft-deletes a distributor and clears the hierarchy around it.
    ///
    /// An archived superstockist releases all of its stockists; an archived
    /// stockist is removed from whichever superstockist owned it.
    pub fn archive(&mut self, id: &DistributorId, at: DateTime<Utc>) -> DomainResult<()> {
        let kind = {
            let d = self
                .get_by_id_mut(id)
                .ok_or_else(|| DomainError::not_found("distributor", id))?;
            d.archive(at);
            d.kind()
        };
        match kind {
            DistributorKind::Stockist => {
                self.unassign(id, at);
            }
            DistributorKind::Superstockist => {
                if let Some(parent) = find_by_id_mut(&mut self.superstockists, id) {
                    parent.release_all_stockists(at);
                }
            }
        }
        Ok(())
    }

    pub fn update_credit_limit(
        &mut self,
        id: &DistributorId,
        limit: i64,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.get_by_id_mut(id)
            .ok_or_else(|| DomainError::not_found("distributor", id))?
            .update_credit_limit(limit, at)
    }

    pub fn add_balance(&mut self, id: &DistributorId, amount: i64, at: DateTime<Utc>) -> DomainResult<()> {
        self.get_by_id_mut(id)
            .ok_or_else(|| DomainError::not_found("distributor", id))?
            .add_balance(amount, at);
        Ok(())
    }

    pub fn deduct_balance(&mut self, id: &DistributorId, amount: i64, at: DateTime<Utc>) -> DomainResult<()> {
        self.get_by_id_mut(id)
            .ok_or_else(|| DomainError::not_found("distributor", id))?
            .deduct_balance(amount, at);
        Ok(())
    }

    /// Active distributors whose credit status is warning or critical.
    pub fn credit_alerts(&self) -> Vec<&Distributor> {
        self.active_stockists()
            .chain(self.active_superstockists())
            .filter(|d| d.credit().credit_status() != CreditStatus::Good)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn new_distributor(kind: DistributorKind, name: &str) -> NewDistributor {
        NewDistributor {
            kind,
            name: name.to_string(),
            contact_person: "Anil Roy".to_string(),
            phone: "9435012345".to_string(),
            email: Some("anil@example.in".to_string()),
            address: None,
            gstin: None,
            pan: None,
            credit_limit: 200_000,
            region: "Cachar".to_string(),
            territory: "Silchar".to_string(),
            payment_terms: None,
            monthly_target: 0,
            warehouse_capacity: 1_000_000,
            occurred_at: test_time(),
        }
    }

    fn id(raw: &str) -> DistributorId {
        DistributorId::from_raw(raw)
    }

    fn directory() -> DistributorDirectory {
        let mut dir = DistributorDirectory::new();
        dir.register(id("SS1"), new_distributor(DistributorKind::Superstockist, "North East Pharma"))
            .unwrap();
        dir.register(id("SS2"), new_distributor(DistributorKind::Superstockist, "Valley Medicals"))
            .unwrap();
        dir.register(id("ST1"), new_distributor(DistributorKind::Stockist, "Barak Pharma"))
            .unwrap();
        dir.register(id("ST2"), new_distributor(DistributorKind::Stockist, "Hailakandi Drugs"))
            .unwrap();
        dir
    }

    #[test]
    fn get_by_id_searches_both_books() {
        let dir = directory();
        assert_eq!(dir.get_by_id(&id("ST1")).unwrap().name(), "Barak Pharma");
        assert_eq!(dir.get_by_id(&id("SS2")).unwrap().name(), "Valley Medicals");
        assert!(dir.get_by_id(&id("missing")).is_none());
        assert_eq!(dir.display_name(&id("missing")), "Unknown");
    }

    #[test]
    fn assign_derives_parent_and_moves_between_superstockists() {
        let mut dir = directory();
        dir.assign(&id("ST1"), &id("SS1"), test_time()).unwrap();
        assert_eq!(dir.superstockist_of(&id("ST1")).unwrap().id(), &id("SS1"));

        dir.assign(&id("ST1"), &id("SS2"), test_time()).unwrap();
        assert_eq!(dir.superstockist_of(&id("ST1")).unwrap().id(), &id("SS2"));
        assert!(dir.stockists_of(&id("SS1")).is_empty());
        assert_eq!(dir.stockists_of(&id("SS2")).len(), 1);
    }

    #[test]
    fn assign_is_idempotent() {
        let mut dir = directory();
        dir.assign(&id("ST1"), &id("SS1"), test_time()).unwrap();
        dir.assign(&id("ST1"), &id("SS1"), test_time()).unwrap();
        assert_eq!(dir.stockists_of(&id("SS1")).len(), 1);
    }

    #[test]
    fn assign_rejects_wrong_variants() {
        let mut dir = directory();
        match dir.assign(&id("SS1"), &id("SS2"), test_time()) {
            Err(DomainError::NotFound { entity: "stockist", .. }) => {}
            other => panic!("expected not found, got {other:?}"),
        }
        match dir.assign(&id("ST1"), &id("ST2"), test_time()) {
            Err(DomainError::NotFound { entity: "superstockist", .. }) => {}
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[test]
    fn archiving_superstockist_releases_its_stockists() {
        let mut dir = directory();
        dir.assign(&id("ST1"), &id("SS1"), test_time()).unwrap();
        dir.assign(&id("ST2"), &id("SS1"), test_time()).unwrap();

        dir.archive(&id("SS1"), test_time()).unwrap();

        assert!(dir.superstockist_of(&id("ST1")).is_none());
        assert!(dir.get_by_id(&id("SS1")).unwrap().owned_stockists().is_empty());
        assert!(!dir.get_by_id(&id("SS1")).unwrap().is_active());
    }

    #[test]
    fn archiving_stockist_detaches_it() {
        let mut dir = directory();
        dir.assign(&id("ST1"), &id("SS1"), test_time()).unwrap();
        dir.archive(&id("ST1"), test_time()).unwrap();
        assert!(dir.get_by_id(&id("SS1")).unwrap().owned_stockists().is_empty());
        assert!(dir.assign(&id("ST1"), &id("SS1"), test_time()).is_err());
    }

    #[test]
    fn balances_drive_credit_alerts() {
        let mut dir = directory();
        dir.add_balance(&id("ST1"), 160_000, test_time()).unwrap();
        dir.add_balance(&id("SS1"), 190_000, test_time()).unwrap();
        dir.deduct_balance(&id("SS1"), 100_000, test_time()).unwrap();

        let alerts = dir.credit_alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id(), &id("ST1"));
        assert_eq!(alerts[0].credit().credit_status(), CreditStatus::Warning);
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut dir = directory();
        assert!(dir
            .register(id("ST1"), new_distributor(DistributorKind::Stockist, "Again"))
            .is_err());
    }

    #[test]
    fn update_credit_limit_validates() {
        let mut dir = directory();
        assert!(dir.update_credit_limit(&id("ST1"), -1, test_time()).is_err());
        dir.update_credit_limit(&id("ST1"), 500_000, test_time()).unwrap();
        assert_eq!(dir.get_by_id(&id("ST1")).unwrap().credit().credit_limit, 500_000);
    }
}
