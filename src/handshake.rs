//! HTTP-Upgrade negotiation (RFC 6455 section 4.2).
//!
//! The client key is read either from a request block captured before the session
//! started, or line by line from the connection itself. The accept token is
//! `base64(SHA-1(key ++ GUID))`. Nothing is written unless a key was found.

use crate::error::HandshakeError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sha1::{Digest, Sha1};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Fixed GUID appended to the client key before hashing.
pub const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Upper bound on a request header block read from the connection.
pub const MAX_REQUEST_LEN: usize = 8 * 1024;

const KEY_HEADER: &str = "sec-websocket-key";

/// Where the upgrade request comes from.
#[derive(Clone, Debug, Default)]
pub enum HandshakeRequest {
    /// Request text already read off the connection by the caller.
    Captured(String),
    /// Read CRLF-terminated lines from the connection up to the blank line.
    #[default]
    ReadFromConnection,
}

/// Compute the `Sec-WebSocket-Accept` token for a client key.
pub fn accept_key(client_key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(client_key.as_bytes());
    hasher.update(WS_GUID.as_bytes());
    BASE64.encode(hasher.finalize())
}

/// Key value of a single header line, if the line is a non-empty `Sec-WebSocket-Key`.
fn key_from_line(line: &str) -> Option<String> {
    let (name, value) = line.split_once(':')?;
    if !name.trim().eq_ignore_ascii_case(KEY_HEADER) {
        return None;
    }
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Find the trimmed `Sec-WebSocket-Key` value in a raw request block.
pub fn find_client_key(request: &str) -> Option<String> {
    request.split("\r\n").find_map(key_from_line)
}

/// Read header lines until the blank line (or end of stream) and return the key.
async fn read_client_key<R>(reader: &mut R) -> Result<Option<String>, HandshakeError>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let mut key = None;
    let mut total = 0usize;
    let mut line = String::new();
    loop {
        line.clear();
        let n = reader
            .read_line(&mut line)
            .await
            .map_err(|e| HandshakeError::Io(e.to_string()))?;
        total += n;
        if total > MAX_REQUEST_LEN {
            return Err(HandshakeError::RequestTooLarge(MAX_REQUEST_LEN));
        }
        if n == 0 || line.trim().is_empty() {
            return Ok(key);
        }
        if key.is_none() {
            key = key_from_line(&line);
        }
    }
}

/// The exact `101 Switching Protocols` response for an accept token.
pub fn upgrade_response(accept: &str) -> String {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\r\n",
        accept
    )
}

/// Run the handshake. On success the connection is ready for frame I/O.
///
/// All I/O failures are reported as [`HandshakeError`]; the caller decides
/// what to do with the connection.
pub async fn negotiate<R, W>(
    request: HandshakeRequest,
    reader: &mut R,
    writer: &mut W,
) -> Result<(), HandshakeError>
where
    R: AsyncBufRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let key = match request {
        HandshakeRequest::Captured(text) => find_client_key(&text),
        HandshakeRequest::ReadFromConnection => read_client_key(reader).await?,
    }
    .ok_or(HandshakeError::MissingKey)?;

    let response = upgrade_response(&accept_key(&key));
    writer
        .write_all(response.as_bytes())
        .await
        .map_err(|e| HandshakeError::Io(e.to_string()))?;
    writer
        .flush()
        .await
        .map_err(|e| HandshakeError::Io(e.to_string()))?;
    tracing::debug!("websocket handshake complete");
    Ok(())
}
