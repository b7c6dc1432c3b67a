//! Key-value storage backends.
//!
//! State lives as one JSON document per namespace key. `InMemoryStore` is for
//! tests/dev; `JsonFileStore` persists to a data directory.

pub mod in_memory;
pub mod json_file;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use json_file::JsonFileStore;
pub use r#trait::{KeyValueStore, StoreError};
