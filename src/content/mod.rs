//! Content sections and their storage.
//!
//! - [`section`] - Section names, values, update rules and seed content
//! - [`cache`] - Concurrent in-process section map
//! - [`storage`] - Backend trait, in-memory and PostgreSQL backends
//! - [`store`] - `ContentStore`, the get-all / upsert contract

pub mod cache;
pub mod section;
pub mod storage;
pub mod store;

pub use cache::SectionCache;
pub use section::{ContentSnapshot, Section, SectionError, SectionName, SectionUpdate, UpdateRule};
pub use storage::{Storage, StorageError, StorageKind, StorageLayout};
pub use store::{ContentStore, PersistenceStatsSnapshot};
