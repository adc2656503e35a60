//! Capabilities consumed and exposed by a session.
//!
//! A [`Connection`] is any async byte stream the session can own exclusively.
//! A [`MessageSink`] receives the text messages decoded on that connection.

use crate::session::Session;
use crate::Result;
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// Byte-stream resource owned by one session (TCP socket, in-memory pipe, ...).
pub trait Connection: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> Connection for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

/// Receiver for inbound text messages.
///
/// Called from the session's own task, one message at a time and in arrival order.
/// The sink may call [`Session::send`] on the session it is given.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Handle one text message. What an `Err` does depends on the session's
    /// [`CallbackPolicy`](crate::session::CallbackPolicy).
    async fn on_message(&self, session: &Session, text: String) -> Result<()>;
}
