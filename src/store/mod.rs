pub mod client;
pub mod error;
pub mod memory;
pub mod types;

pub use client::{HttpRecordStore, RecordStore};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use types::{ChangedEntity, EntityKind};
