//! Dashboard state store.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Latest value per dashboard component id.
#[async_trait]
pub trait DashboardStore: Send + Sync {
    /// Current value of a component, if one was ever set.
    async fn get(&self, id: &str) -> crate::Result<Option<Value>>;

    /// Replace the value of a component.
    async fn set(&self, id: &str, value: Value) -> crate::Result<()>;

    /// Copy of every stored value.
    async fn snapshot(&self) -> crate::Result<HashMap<String, Value>>;
}

/// Alias for a shared store (common usage).
pub type Store = Arc<dyn DashboardStore>;
