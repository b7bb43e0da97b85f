//! Repository abstraction and its in-memory implementation.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A record with a store-assigned numeric id.
pub trait Record: Clone + Send + Sync + 'static {
    type New: Send;

    fn id(&self) -> u64;

    /// Build the stored record once the store has chosen an id.
    fn from_new(new: Self::New, id: u64) -> Self;
}

/// Capability set the orchestrators depend on.
pub trait Repository<R: Record>: Send + Sync {
    fn get(&self, id: u64) -> Option<R>;

    /// Records matching `filter`, in id order.
    fn list(&self, filter: &dyn Fn(&R) -> bool) -> Vec<R>;

    /// Store a new record and return it with its assigned id.
    fn create(&self, new: R::New) -> R;
}

/// Map guarded by a single lock. Id allocation and insert share one write
/// critical section, so concurrent creates never reuse an id.
#[derive(Debug)]
pub struct InMemoryRepository<R> {
    records: RwLock<BTreeMap<u64, R>>,
}

impl<R: Record> InMemoryRepository<R> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn with_records(records: impl IntoIterator<Item = R>) -> Self {
        Self {
            records: RwLock::new(records.into_iter().map(|r| (r.id(), r)).collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<u64, R>> {
        self.records.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<u64, R>> {
        self.records.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<R: Record> Default for InMemoryRepository<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> Repository<R> for InMemoryRepository<R> {
    fn get(&self, id: u64) -> Option<R> {
        self.read().get(&id).cloned()
    }

    fn list(&self, filter: &dyn Fn(&R) -> bool) -> Vec<R> {
        self.read().values().filter(|r| filter(r)).cloned().collect()
    }

    fn create(&self, new: R::New) -> R {
        let mut records = self.write();
        let id = records.keys().next_back().map_or(1, |max| max + 1);
        let record = R::from_new(new, id);
        records.insert(id, record.clone());
        record
    }
}
