pub mod connection;
pub mod migrate;
pub mod queries;
pub mod store;

pub use store::{MemoryStore, RecordStore, SqliteStore};
