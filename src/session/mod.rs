//! Per-connection WebSocket session.
//!
//! `Handshaking -> Open -> Closed`. [`Session::new`] splits the connection into a
//! buffered read half, driven by [`SessionTask::run`], and a write half behind a
//! per-connection lock that every [`Session`] clone sends through.
//!
//! Only unfragmented text frames are delivered to the sink. Continuation, binary,
//! ping and pong frames are read and dropped without a reply, so a peer relying on
//! ping/pong keep-alive will not get pongs from this endpoint.

mod config;

pub use config::{CallbackPolicy, SessionConfig};

use crate::error::{FrameError, HandshakeError, TransportError};
use crate::frame::{self, Frame, Opcode};
use crate::handshake::{self, HandshakeRequest};
use crate::transport::{Connection, MessageSink};
use crate::types::SessionId;
use crate::{Error, Result};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{watch, Mutex};

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Lifecycle state of a session. `Closed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Handshaking = 0,
    Open = 1,
    Closed = 2,
}

impl SessionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Handshaking,
            1 => Self::Open,
            _ => Self::Closed,
        }
    }
}

/// Outcome of [`Session::send`]. Ignoring it gives fire-and-forget delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Dropped,
}

impl Delivery {
    pub fn is_sent(self) -> bool {
        self == Self::Sent
    }
}

struct Shared {
    id: SessionId,
    state: AtomicU8,
    writer: Mutex<Option<BoxedWriter>>,
    closed: watch::Sender<bool>,
}

/// Cloneable handle to one session, used to send text and to close it.
#[derive(Clone)]
pub struct Session {
    shared: Arc<Shared>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.shared.id)
            .field("state", &self.state())
            .finish()
    }
}

impl Session {
    /// Take ownership of `conn` and build the session and the task that drives it.
    pub fn new<C: Connection>(
        conn: C,
        request: HandshakeRequest,
        sink: Arc<dyn MessageSink>,
        config: SessionConfig,
    ) -> (Session, SessionTask) {
        let (read_half, write_half) = tokio::io::split(conn);
        let reader: BoxedReader = Box::new(read_half);
        let writer: BoxedWriter = Box::new(write_half);
        let session = Session {
            shared: Arc::new(Shared {
                id: SessionId::next(),
                state: AtomicU8::new(SessionState::Handshaking as u8),
                writer: Mutex::new(Some(writer)),
                closed: watch::Sender::new(false),
            }),
        };
        let task = SessionTask {
            session: session.clone(),
            reader: BufReader::new(reader),
            request,
            sink,
            config,
        };
        (session, task)
    }

    pub fn id(&self) -> SessionId {
        self.shared.id
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.shared.state.load(Ordering::SeqCst))
    }

    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    fn mark_open(&self) -> bool {
        self.shared
            .state
            .compare_exchange(
                SessionState::Handshaking as u8,
                SessionState::Open as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Send one text frame. Any failure drops the message and yields
    /// [`Delivery::Dropped`]; the session itself is left alone. A concurrent
    /// [`close`](Session::close) aborts a send blocked on a stalled peer.
    pub async fn send(&self, text: &str) -> Delivery {
        if !self.is_open() {
            tracing::debug!(session = %self.id(), "send on non-open session dropped");
            return Delivery::Dropped;
        }
        let res = tokio::select! {
            res = self.write_text(text) => res,
            _ = self.closed() => Err(TransportError::Closed.into()),
        };
        match res {
            Ok(()) => Delivery::Sent,
            Err(e) => {
                tracing::debug!(session = %self.id(), error = %e, "outbound message dropped");
                Delivery::Dropped
            }
        }
    }

    async fn write_text(&self, text: &str) -> Result<()> {
        let mut writer = self.shared.writer.lock().await;
        let writer = writer.as_mut().ok_or(TransportError::Closed)?;
        frame::write_text(writer, text).await
    }

    /// Resolves once [`close`](Session::close) has been called.
    async fn closed(&self) {
        let mut rx = self.shared.closed.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }

    /// Move to `Closed` and release the connection. Only the first call does any
    /// work and returns `true`; pending reads and sends on this session are cancelled.
    pub async fn close(&self) -> bool {
        if self
            .shared
            .state
            .swap(SessionState::Closed as u8, Ordering::SeqCst)
            == SessionState::Closed as u8
        {
            return false;
        }
        self.shared.closed.send_replace(true);
        let writer = self.shared.writer.lock().await.take();
        if let Some(mut writer) = writer {
            if let Err(e) = writer.shutdown().await {
                tracing::debug!(session = %self.id(), error = %e, "shutdown failed");
            }
        }
        tracing::info!(session = %self.id(), "session closed");
        true
    }
}

/// Drives one session: handshake, then the read/dispatch loop.
pub struct SessionTask {
    session: Session,
    reader: BufReader<BoxedReader>,
    request: HandshakeRequest,
    sink: Arc<dyn MessageSink>,
    config: SessionConfig,
}

impl SessionTask {
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run until the session closes. Always returns [`SessionState::Closed`].
    pub async fn run(self) -> SessionState {
        let SessionTask {
            session,
            mut reader,
            request,
            sink,
            config,
        } = self;
        let id = session.id();

        let negotiated = tokio::select! {
            res = negotiate(&session, request, &mut reader) => res,
            _ = session.closed() => Err(HandshakeError::Io("closed during handshake".into())),
        };
        if let Err(e) = negotiated {
            tracing::warn!(session = %id, error = %e, "websocket handshake failed");
            session.close().await;
            return SessionState::Closed;
        }
        if !session.mark_open() {
            session.close().await;
            return SessionState::Closed;
        }
        tracing::info!(session = %id, "websocket session open");

        while session.is_open() {
            let frame = tokio::select! {
                res = next_frame(&mut reader, &config) => res,
                _ = session.closed() => break,
            };
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::debug!(session = %id, error = %e, "read loop ended");
                    break;
                }
            };
            match frame.opcode {
                Opcode::Close => {
                    tracing::debug!(session = %id, "peer sent close");
                    break;
                }
                Opcode::Text if !frame.payload.is_empty() => {
                    let text = match String::from_utf8(frame.payload) {
                        Ok(text) => text,
                        Err(e) => {
                            let err = Error::from(FrameError::InvalidText(e.to_string()));
                            tracing::warn!(session = %id, error = %err, "closing session");
                            break;
                        }
                    };
                    if let Err(e) = sink.on_message(&session, text).await {
                        match config.callback_policy {
                            CallbackPolicy::FailFast => {
                                tracing::warn!(session = %id, error = %e, "message callback failed, closing session");
                                break;
                            }
                            CallbackPolicy::LogAndContinue => {
                                tracing::warn!(session = %id, error = %e, "message callback failed");
                            }
                        }
                    }
                }
                other => {
                    tracing::debug!(session = %id, opcode = ?other, len = frame.payload.len(), "frame ignored");
                }
            }
        }

        session.close().await;
        SessionState::Closed
    }
}

async fn negotiate(
    session: &Session,
    request: HandshakeRequest,
    reader: &mut BufReader<BoxedReader>,
) -> std::result::Result<(), HandshakeError> {
    let mut writer = session.shared.writer.lock().await;
    let writer = writer
        .as_mut()
        .ok_or_else(|| HandshakeError::Io("connection already closed".into()))?;
    handshake::negotiate(request, reader, writer).await
}

async fn next_frame(reader: &mut BufReader<BoxedReader>, config: &SessionConfig) -> Result<Frame> {
    let read = frame::read_frame(reader, config.max_payload_len);
    match config.read_timeout() {
        Some(limit) => tokio::time::timeout(limit, read)
            .await
            .map_err(|_| TransportError::Timeout)?,
        None => read.await,
    }
}
