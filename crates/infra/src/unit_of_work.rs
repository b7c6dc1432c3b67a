//! Multi-namespace transactions over a [`KeyValueStore`].
//!
//! A [`UnitOfWork`] is how every service operation touches storage:
//!
//! ```text
//! begin(namespaces)
//!   ↓
//! 1. Lock namespaces (sorted, deduplicated, so two units never deadlock)
//!   ↓
//! 2. Snapshot the current raw value of each locked namespace
//!   ↓
//! 3. load / stage typed documents (staged values shadow the snapshot)
//!   ↓
//! 4. commit: write staged namespaces in lock order
//!      └─ on failure: restore already-written namespaces from the snapshot
//! ```
//!
//! Dropping a unit without calling `commit` discards everything staged.
//! Locks are released when the unit is dropped or committed.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::namespace::Namespace;
use crate::store::{KeyValueStore, StoreError};

/// One mutex per namespace.
#[derive(Debug, Default)]
pub struct NamespaceLocks {
    locks: [Mutex<()>; Namespace::ALL.len()],
}

impl NamespaceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn acquire(&self, ns: Namespace) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.locks[ns.index()]
            .lock()
            .map_err(|_| StoreError::LockPoisoned(format!("namespace {ns}")))
    }
}

/// A store plus the locks that serialize access to it.
///
/// Services share one `Storage` behind an `Arc`.
#[derive(Debug)]
pub struct Storage<S> {
    store: S,
    locks: NamespaceLocks,
}

impl<S: KeyValueStore> Storage<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: NamespaceLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn begin(&self, namespaces: &[Namespace]) -> Result<UnitOfWork<'_, S>, StoreError> {
        UnitOfWork::begin(&self.store, &self.locks, namespaces)
    }

    /// Reads one namespace under its lock without staging anything.
    pub fn read<T>(&self, ns: Namespace) -> Result<T, StoreError>
    where
        T: DeserializeOwned + Default,
    {
        self.begin(&[ns])?.load(ns)
    }

    /// True when no namespace holds a value yet.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        for ns in Namespace::ALL {
            if self.store.get(ns.key())?.is_some() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

pub struct UnitOfWork<'a, S: KeyValueStore> {
    store: &'a S,
    _guards: Vec<MutexGuard<'a, ()>>,
    snapshot: BTreeMap<Namespace, Option<String>>,
    staged: BTreeMap<Namespace, String>,
}

impl<'a, S: KeyValueStore> UnitOfWork<'a, S> {
    pub fn begin(
        store: &'a S,
        locks: &'a NamespaceLocks,
        namespaces: &[Namespace],
    ) -> Result<Self, StoreError> {
        let mut ordered = namespaces.to_vec();
        ordered.sort();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for ns in &ordered {
            guards.push(locks.acquire(*ns)?);
        }

        let mut snapshot = BTreeMap::new();
        for ns in ordered {
            snapshot.insert(ns, store.get(ns.key())?);
        }

        Ok(Self {
            store,
            _guards: guards,
            snapshot,
            staged: BTreeMap::new(),
        })
    }

    fn ensure_locked(&self, ns: Namespace) -> Result<(), StoreError> {
        if self.snapshot.contains_key(&ns) {
            Ok(())
        } else {
            Err(StoreError::Rejected(format!(
                "namespace {ns} is not part of this unit of work"
            )))
        }
    }

    /// Typed view of a namespace; a missing document reads as `T::default()`.
    pub fn load<T>(&self, ns: Namespace) -> Result<T, StoreError>
    where
        T: DeserializeOwned + Default,
    {
        self.ensure_locked(ns)?;
        let raw = match self.staged.get(&ns) {
            Some(staged) => Some(staged.as_str()),
            None => self.snapshot.get(&ns).and_then(|v| v.as_deref()),
        };
        match raw {
            Some(raw) => serde_json::from_str(raw).map_err(|e| StoreError::serialization(ns.key(), e)),
            None => Ok(T::default()),
        }
    }

    pub fn stage<T: Serialize>(&mut self, ns: Namespace, value: &T) -> Result<(), StoreError> {
        self.ensure_locked(ns)?;
        let raw = serde_json::to_string(value).map_err(|e| StoreError::serialization(ns.key(), e))?;
        self.staged.insert(ns, raw);
        Ok(())
    }

    pub fn has_staged(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Flushes staged namespaces in lock order.
    ///
    /// If a write fails, every namespace already written by this commit is
    /// put back to its snapshot value before the error is returned.
    pub fn commit(mut self) -> Result<(), StoreError> {
        let staged = std::mem::take(&mut self.staged);
        let mut written: Vec<Namespace> = Vec::with_capacity(staged.len());

        for (ns, raw) in &staged {
            if let Err(err) = self.store.set(ns.key(), raw) {
                tracing::error!(namespace = %ns, error = %err, "commit failed, restoring snapshot");
                self.restore(&written);
                return Err(err);
            }
            written.push(*ns);
        }

        tracing::debug!(namespaces = written.len(), "unit of work committed");
        Ok(())
    }

    fn restore(&self, written: &[Namespace]) {
        for ns in written {
            let result = match self.snapshot.get(ns).and_then(|v| v.as_deref()) {
                Some(previous) => self.store.set(ns.key(), previous),
                None => self.store.remove(ns.key()),
            };
            if let Err(err) = result {
                tracing::error!(namespace = %ns, error = %err, "snapshot restore failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[test]
    fn missing_namespace_loads_default() {
        let storage = Storage::new(InMemoryStore::new());
        let products: Vec<String> = storage.read(Namespace::Products).unwrap();
        assert!(products.is_empty());
        assert!(storage.is_empty().unwrap());
    }

    #[test]
    fn staged_values_shadow_snapshot_until_commit() {
        let storage = Storage::new(InMemoryStore::new());
        let mut uow = storage.begin(&[Namespace::Products]).unwrap();
        uow.stage(Namespace::Products, &vec!["PROD001"]).unwrap();
        let seen: Vec<String> = uow.load(Namespace::Products).unwrap();
        assert_eq!(seen, vec!["PROD001"]);
        assert_eq!(storage.store().get("products").unwrap(), None);

        uow.commit().unwrap();
        assert_eq!(storage.store().get("products").unwrap().as_deref(), Some(r#"["PROD001"]"#));
    }

    #[test]
    fn dropping_without_commit_discards() {
        let storage = Storage::new(InMemoryStore::new());
        {
            let mut uow = storage.begin(&[Namespace::Loans]).unwrap();
            uow.stage(Namespace::Loans, &vec![1, 2, 3]).unwrap();
            assert!(uow.has_staged());
        }
        assert_eq!(storage.store().get("loans").unwrap(), None);
        // lock was released on drop
        let _again = storage.begin(&[Namespace::Loans]).unwrap();
    }

    #[test]
    fn unlocked_namespace_is_rejected() {
        let storage = Storage::new(InMemoryStore::new());
        let mut uow = storage.begin(&[Namespace::Inventory]).unwrap();
        assert!(matches!(
            uow.stage(Namespace::Invoices, &Vec::<u8>::new()),
            Err(StoreError::Rejected(_))
        ));
        assert!(matches!(
            uow.load::<Vec<u8>>(Namespace::Invoices),
            Err(StoreError::Rejected(_))
        ));
    }

    #[test]
    fn duplicate_namespaces_do_not_self_deadlock() {
        let storage = Storage::new(InMemoryStore::new());
        let uow = storage
            .begin(&[Namespace::Inventory, Namespace::Products, Namespace::Inventory])
            .unwrap();
        drop(uow);
    }

    #[test]
    fn corrupt_document_reports_serialization_error() {
        let storage = Storage::new(InMemoryStore::new());
        storage.store().set("products", "{not json").unwrap();
        let err = storage.read::<Vec<String>>(Namespace::Products).unwrap_err();
        match err {
            StoreError::Serialization { key, .. } if key == "products" => {}
            _ => panic!("unexpected error: {err:?}"),
        }
    }
}
