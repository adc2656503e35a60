//! # picows
//!
//! Minimal WebSocket endpoint for small devices: turns a raw byte connection into
//! a WebSocket session and exchanges short text messages with a browser.
//!
//! ## Features
//!
//! - HTTP-Upgrade handshake from a captured request or read off the connection
//! - Frame decoding with unmasking and a payload-length ceiling
//! - Unmasked, unfragmented text frame encoding
//! - Per-connection sessions with a locked write path and best-effort sends
//! - TCP server with a client registry and broadcast
//! - JSON dashboard protocol with component state
//!
//! Not supported: TLS, fragmented messages, binary payloads, ping/pong replies.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use picows::{ClientRegistry, Dashboard, Server, ServerConfig, store::MemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = Arc::new(ClientRegistry::new());
//!     let dashboard = Arc::new(Dashboard::new(registry.clone(), Arc::new(MemoryStore::new())));
//!     let server = Arc::new(Server::new(ServerConfig::default(), registry, dashboard));
//!     let listener = server.bind().await?;
//!     server.serve(listener).await?;
//!     Ok(())
//! }
//! ```

pub mod dashboard;
pub mod error;
pub mod events;
pub mod frame;
pub mod handshake;
pub mod registry;
pub mod server;
pub mod session;
pub mod store;
pub mod transport;
pub mod types;

pub use dashboard::Dashboard;
pub use error::{Error, Result};
pub use events::Event;
pub use frame::{Frame, Opcode};
pub use handshake::{accept_key, HandshakeRequest};
pub use registry::ClientRegistry;
pub use server::{Page, Server, ServerConfig};
pub use session::{CallbackPolicy, Delivery, Session, SessionConfig, SessionState, SessionTask};
pub use store::{DashboardStore, Store};
pub use transport::{Connection, MessageSink};
pub use types::SessionId;
