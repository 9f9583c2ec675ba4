//! The abstract metadata-store interface and its in-memory implementation.

pub mod memory;
pub mod r#trait;

pub use memory::InMemoryMetadataStore;
pub use r#trait::{ChildChangeListener, ConditionalUpdateResult, MetadataStore};
