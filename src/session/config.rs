//! Per-session settings.

use crate::frame::DEFAULT_MAX_PAYLOAD;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What a session does when its [`MessageSink`](crate::MessageSink) returns an error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackPolicy {
    /// End the session.
    #[default]
    FailFast,
    /// Log the error and keep reading frames.
    LogAndContinue,
}

/// Settings applied to every session built from this config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Largest payload length a peer may declare.
    pub max_payload_len: u64,
    /// Per-frame read timeout in milliseconds. `None` waits forever.
    pub read_timeout_ms: Option<u64>,
    pub callback_policy: CallbackPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_payload_len: DEFAULT_MAX_PAYLOAD,
            read_timeout_ms: None,
            callback_policy: CallbackPolicy::FailFast,
        }
    }
}

impl SessionConfig {
    pub fn with_max_payload_len(mut self, len: u64) -> Self {
        self.max_payload_len = len;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_callback_policy(mut self, policy: CallbackPolicy) -> Self {
        self.callback_policy = policy;
        self
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }
}
