//! TCP front end: serves a page to plain HTTP requests and upgrades WebSocket
//! requests into sessions, one task per connection.

mod config;

pub use config::ServerConfig;

use crate::events::Event;
use crate::handshake::HandshakeRequest;
use crate::registry::ClientRegistry;
use crate::session::Session;
use crate::transport::{Connection, MessageSink};
use crate::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::Instrument;

/// Type alias for event handlers so the server field is not overly complex and is Send + Sync.
type EventHandler = Box<dyn Fn(Event) + Send + Sync>;

/// Shared handle to the HTML served for plain HTTP requests.
#[derive(Clone, Default)]
pub struct Page(Arc<std::sync::RwLock<String>>);

impl Page {
    pub fn new(html: impl Into<String>) -> Self {
        Self(Arc::new(std::sync::RwLock::new(html.into())))
    }

    pub fn set(&self, html: impl Into<String>) {
        if let Ok(mut page) = self.0.write() {
            *page = html.into();
        }
    }

    pub fn get(&self) -> String {
        self.0.read().map(|p| p.clone()).unwrap_or_default()
    }
}

/// Whether a raw request carries an `Upgrade: websocket` header.
pub fn is_upgrade_request(request: &str) -> bool {
    request.split("\r\n").any(|line| {
        line.split_once(':').is_some_and(|(name, value)| {
            name.trim().eq_ignore_ascii_case("upgrade")
                && value.to_ascii_lowercase().contains("websocket")
        })
    })
}

/// Accepts connections and hands WebSocket upgrades to sessions.
pub struct Server {
    config: ServerConfig,
    registry: Arc<ClientRegistry>,
    sink: Arc<dyn MessageSink>,
    handlers: Arc<RwLock<Vec<EventHandler>>>,
    page: Page,
}

impl Server {
    /// Sessions are registered in `registry` while they run; every inbound text
    /// message goes to `sink`.
    pub fn new(config: ServerConfig, registry: Arc<ClientRegistry>, sink: Arc<dyn MessageSink>) -> Self {
        let page = Page::new(config.page.clone());
        Self {
            config,
            registry,
            sink,
            handlers: Arc::new(RwLock::new(Vec::new())),
            page,
        }
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Handle to the page served to plain HTTP requests.
    pub fn page(&self) -> Page {
        self.page.clone()
    }

    /// Add an event handler (called for every event).
    pub async fn add_event_handler<F>(&self, f: F)
    where
        F: Fn(Event) + Send + Sync + 'static,
    {
        self.handlers.write().await.push(Box::new(f));
    }

    async fn dispatch_event(&self, evt: Event) {
        let handlers = self.handlers.read().await;
        for f in handlers.iter() {
            f(evt.clone());
        }
    }

    /// Bind the configured listen address.
    pub async fn bind(&self) -> Result<TcpListener> {
        let listener = TcpListener::bind(&self.config.bind).await?;
        tracing::info!(addr = %listener.local_addr()?, "listening");
        Ok(listener)
    }

    /// Accept connections forever, one task per connection.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let server = Arc::clone(&self);
                    tokio::spawn(async move {
                        server.handle_connection(stream, Some(peer)).await;
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }

    /// Read the request once, then either run a session or answer with the page.
    pub async fn handle_connection<C: Connection>(&self, mut conn: C, peer: Option<SocketAddr>) {
        let mut buf = vec![0u8; self.config.request_buffer_len];
        let n = match conn.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                tracing::debug!(peer = ?peer, error = %e, "request read failed");
                return;
            }
        };
        if n == 0 {
            let _ = conn.shutdown().await;
            return;
        }
        let request = String::from_utf8_lossy(&buf[..n]).into_owned();
        if is_upgrade_request(&request) {
            self.run_session(conn, request, peer).await;
        } else {
            self.serve_page(conn, &request, peer).await;
        }
    }

    async fn run_session<C: Connection>(&self, conn: C, request: String, peer: Option<SocketAddr>) {
        let (session, task) = Session::new(
            conn,
            HandshakeRequest::Captured(request),
            Arc::clone(&self.sink),
            self.config.session.clone(),
        );
        let id = session.id();
        tracing::info!(session = %id, peer = ?peer, "accepting websocket connection");
        self.registry.insert(session.clone());
        self.dispatch_event(Event::Connected { id, peer }).await;

        // A panicking sink ends only this task; cleanup below still runs.
        let span = tracing::info_span!("ws_session", id = %id, peer = ?peer);
        if let Err(e) = tokio::spawn(task.run().instrument(span)).await {
            tracing::error!(session = %id, error = %e, "session task aborted");
            session.close().await;
        }

        self.registry.remove(id);
        self.dispatch_event(Event::Disconnected { id }).await;
        tracing::info!(session = %id, "websocket client disconnected");
    }

    async fn serve_page<C: Connection>(&self, mut conn: C, request: &str, peer: Option<SocketAddr>) {
        let request_line = request.lines().next().unwrap_or_default().to_string();
        self.dispatch_event(Event::HttpRequest { peer, request_line }).await;
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n{}",
            self.page.get()
        );
        if let Err(e) = conn.write_all(response.as_bytes()).await {
            tracing::debug!(peer = ?peer, error = %e, "page write failed");
        }
        let _ = conn.shutdown().await;
    }
}
