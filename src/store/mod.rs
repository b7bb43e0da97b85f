//! Record storage subsystem.
//!
//! # Data Flow
//! ```text
//! fixtures.rs (seed records at startup)
//!     → repository.rs (InMemoryRepository: get / list / create)
//!     → shared via Arc<dyn Repository<_>> with the orchestrators
//! ```
//!
//! # Design Decisions
//! - Orchestrators depend on the `Repository` trait, never on the map
//! - Reads share a read lock; create holds the write lock across id
//!   allocation and insert
//! - Records are cloned out; no lock is held across an await

pub mod fixtures;
pub mod repository;
pub mod types;

pub use repository::{InMemoryRepository, Record, Repository};
pub use types::{CatalogEntry, NewCatalogEntry, NewUser, Preferences, UserRecord};

impl Record for CatalogEntry {
    type New = NewCatalogEntry;

    fn id(&self) -> u64 {
        self.id
    }

    fn from_new(new: NewCatalogEntry, id: u64) -> Self {
        new.into_entry(id)
    }
}

impl Record for UserRecord {
    type New = NewUser;

    fn id(&self) -> u64 {
        self.id
    }

    fn from_new(new: NewUser, id: u64) -> Self {
        new.into_record(id)
    }
}

pub type CatalogStore = InMemoryRepository<CatalogEntry>;
pub type UserStore = InMemoryRepository<UserRecord>;
