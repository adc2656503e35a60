//! Event types emitted by the server.

use crate::types::SessionId;
use std::net::SocketAddr;

/// Events emitted by [Server](crate::Server) to registered handlers.
#[derive(Clone, Debug)]
pub enum Event {
    /// A plain HTTP request was answered with the current page.
    HttpRequest {
        peer: Option<SocketAddr>,
        request_line: String,
    },

    /// A WebSocket upgrade request was accepted and a session registered.
    Connected {
        id: SessionId,
        peer: Option<SocketAddr>,
    },

    /// A session ended (handshake failure, close frame, error or external close).
    Disconnected { id: SessionId },
}
