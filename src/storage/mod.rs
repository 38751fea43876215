//! History Persistence Abstraction
//!
//! Information Hiding:
//! - Storage backend implementation details hidden behind trait
//! - Values are opaque strings; callers own the (de)serialization
//! - Each backend encapsulates its own layout and protocols

use crate::error::Result;
use async_trait::async_trait;

pub mod filesystem;
pub mod memory;

pub use filesystem::FileStore;
pub use memory::MemoryStore;

/// Key-value persistence port for conversation state.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Drop the value stored under `key`. Removing an absent key is fine.
    async fn remove(&self, key: &str) -> Result<()>;
}
