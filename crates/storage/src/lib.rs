//! Storage layer for slugsync
//!
//! A minimal key-based interface over the slug table: ordered cursor pages,
//! bulk upsert on the natural key, and a few lookups. PostgreSQL in
//! production, an in-memory map for dry runs and tests.

mod error;
mod memory;
mod pg_migrations;
mod pg_storage;
pub mod traits;

pub use error::StorageError;
pub use memory::MemoryStore;
pub use pg_migrations::run_pg_migrations;
pub use pg_storage::PgStorage;
pub use traits::SlugStore;
