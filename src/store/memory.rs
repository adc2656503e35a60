use super::DashboardStore;
use crate::{error::StoreError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory dashboard state (lost on restart).
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DashboardStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<Value>> {
        let values = self
            .values
            .read()
            .map_err(|e| StoreError::Load(e.to_string()))?;
        Ok(values.get(id).cloned())
    }

    async fn set(&self, id: &str, value: Value) -> Result<()> {
        self.values
            .write()
            .map_err(|e| StoreError::Save(e.to_string()))?
            .insert(id.to_string(), value);
        Ok(())
    }

    async fn snapshot(&self) -> Result<HashMap<String, Value>> {
        let values = self
            .values
            .read()
            .map_err(|e| StoreError::Load(e.to_string()))?;
        Ok(values.clone())
    }
}
