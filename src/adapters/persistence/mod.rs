//! Persistence Adapters - JSON File Storage
//!
//! Implements the `RecordStore` port with a single JSON document
//! replaced atomically on every write.

pub mod store;

pub use store::JsonRecordStore;
