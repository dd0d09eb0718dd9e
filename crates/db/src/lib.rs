pub mod errors;
pub mod kv;
pub mod memory;
pub mod models;
pub mod pg;
pub mod repositories;

pub use errors::DbError;
pub use kv::KeyValueStore;
pub use memory::MemoryKeyValueStore;
pub use models::*;
pub use repositories::*;
