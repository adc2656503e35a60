//! Browser dashboard protocol.
//!
//! Inbound messages are JSON objects such as `{"id":"slider1","value":"42"}` or
//! `{"id":"joy","value":10,"y":-3}`. Values are stored per component id and the
//! raw message is relayed to every other connected client. Outbound updates are
//! `{"id":..,"prop":..,"value":..}`.

use crate::registry::ClientRegistry;
use crate::session::Session;
use crate::store::Store;
use crate::transport::MessageSink;
use crate::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Outbound component update.
#[derive(Serialize)]
struct Update<'a, T: Serialize> {
    id: &'a str,
    prop: &'a str,
    value: T,
}

/// Integer view of a JSON value: integers, floats truncated toward zero,
/// booleans as 0/1, and strings holding an integer. Anything outside the
/// `i64` range has no integer view.
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .map(f64::trunc)
            .filter(|f| (i64::MIN as f64..i64::MAX as f64).contains(f))
            .map(|f| f as i64),
        Value::Number(n) => n.as_i64(),
        Value::Bool(b) => Some(*b as i64),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Message sink that keeps dashboard state and fans updates out to clients.
pub struct Dashboard {
    registry: Arc<ClientRegistry>,
    store: Store,
}

impl Dashboard {
    pub fn new(registry: Arc<ClientRegistry>, store: Store) -> Self {
        Self { registry, store }
    }

    /// The store holding component values.
    pub fn state(&self) -> &Store {
        &self.store
    }

    /// Push `{"id","prop","value"}` to every connected client.
    pub async fn publish<T: Serialize>(&self, component_id: &str, prop: &str, value: T) -> Result<usize> {
        let msg = serde_json::to_string(&Update {
            id: component_id,
            prop,
            value,
        })
        .map_err(anyhow::Error::from)?;
        Ok(self.registry.broadcast(&msg).await)
    }

    /// Apply one inbound message. Returns `false` if it was not a valid update.
    async fn apply(&self, sender: &Session, text: &str) -> Result<bool> {
        let data = match serde_json::from_str::<Value>(text) {
            Ok(data @ Value::Object(_)) => data,
            Ok(_) => return Ok(false),
            Err(e) => {
                tracing::warn!(session = %sender.id(), error = %e, "invalid dashboard message");
                return Ok(false);
            }
        };
        let Some(id) = data.get("id") else {
            return Ok(true);
        };
        let id = match id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        if let Some(value) = data.get("value") {
            let stored = coerce_int(value).map(Value::from).unwrap_or_else(|| value.clone());
            self.store.set(&id, stored).await?;
        }
        if let Some(y) = data.get("y") {
            let Some(y) = coerce_int(y) else {
                return Ok(false);
            };
            self.store.set(&format!("{id}_y"), Value::from(y)).await?;
        }

        let relayed = self.registry.broadcast_except(sender.id(), text).await;
        tracing::debug!(session = %sender.id(), component = %id, relayed, "dashboard update");
        Ok(true)
    }
}

#[async_trait]
impl MessageSink for Dashboard {
    async fn on_message(&self, session: &Session, text: String) -> Result<()> {
        if !self.apply(session, &text).await? {
            tracing::warn!(session = %session.id(), message = %text, "dashboard message ignored");
        }
        Ok(())
    }
}
