//! Server settings.

use crate::session::SessionConfig;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Page served to plain HTTP requests until replaced.
pub const DEFAULT_PAGE: &str = "<h1>Pico W Server</h1><p>Connect via WebSocket to control.</p>";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address, `host:port`.
    pub bind: String,
    /// Size of the single read that captures the request head.
    pub request_buffer_len: usize,
    /// Initial page body for plain HTTP requests.
    pub page: String,
    pub session: SessionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:80".to_string(),
            request_buffer_len: 1024,
            page: DEFAULT_PAGE.to_string(),
            session: SessionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json).map_err(anyhow::Error::from)?)
    }

    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = bind.into();
        self
    }

    pub fn with_page(mut self, page: impl Into<String>) -> Self {
        self.page = page.into();
        self
    }

    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }
}
