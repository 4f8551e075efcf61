pub mod manager;
pub mod memory_store;
pub mod models;
pub mod pg_store;
pub mod schema;
pub mod store;

pub use memory_store::MemoryStore;
pub use pg_store::PgStore;
pub use store::{Store, StoreError};
