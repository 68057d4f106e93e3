mod error;
mod memory;
mod postgres_store;
mod redb_store;
mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres_store::PostgresStore;
pub use redb_store::RedbStore;
pub use store::{list_all, ContinuationToken, MetadataStore, Page};
