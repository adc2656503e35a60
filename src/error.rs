use thiserror::Error;

/// Library result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while serving a WebSocket session.
#[derive(Error, Debug)]
pub enum Error {
    #[error("handshake: {0}")]
    Handshake(#[from] HandshakeError),

    #[error("frame: {0}")]
    Frame(#[from] FrameError),

    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// HTTP-Upgrade negotiation errors. No response is written when one occurs.
#[derive(Error, Debug)]
pub enum HandshakeError {
    #[error("Sec-WebSocket-Key header not found")]
    MissingKey,

    #[error("request header block exceeds {0} bytes")]
    RequestTooLarge(usize),

    #[error("io: {0}")]
    Io(String),
}

/// Errors decoding a single frame from the wire.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("truncated {0}")]
    Truncated(&'static str),

    #[error("payload length {len} exceeds maximum {max}")]
    PayloadTooLarge { len: u64, max: u64 },

    #[error("text payload is not valid UTF-8: {0}")]
    InvalidText(String),
}

/// Read/write failures on the underlying connection.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("write failed: {0}")]
    Write(String),

    #[error("read failed: {0}")]
    Read(String),

    #[error("read timed out")]
    Timeout,

    #[error("connection closed")]
    Closed,
}

/// Dashboard state store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("save failed: {0}")]
    Save(String),

    #[error("load failed: {0}")]
    Load(String),
}
