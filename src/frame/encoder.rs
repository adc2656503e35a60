//! Frame encoder: one unfragmented, unmasked text frame per message.

use super::{Opcode, FIN_BIT, LEN_16, LEN_64};
use crate::error::TransportError;
use crate::Result;
use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Serialize `text` as a complete server-to-client text frame.
pub fn encode_text(text: &str) -> Bytes {
    let payload = text.as_bytes();
    let len = payload.len();
    let mut out = BytesMut::with_capacity(10 + len);
    out.put_u8(FIN_BIT | Opcode::Text.as_u8());
    if len < LEN_16 as usize {
        out.put_u8(len as u8);
    } else if len < 65536 {
        out.put_u8(LEN_16);
        out.put_u16(len as u16);
    } else {
        out.put_u8(LEN_64);
        out.put_u64(len as u64);
    }
    out.put_slice(payload);
    out.freeze()
}

/// Write `text` as one frame with a single `write_all`, then flush.
pub async fn write_text<W>(writer: &mut W, text: &str) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let frame = encode_text(text);
    writer
        .write_all(&frame)
        .await
        .map_err(|e| TransportError::Write(e.to_string()))?;
    writer
        .flush()
        .await
        .map_err(|e| TransportError::Write(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{read_frame, DEFAULT_MAX_PAYLOAD};

    #[test]
    fn small_frame_layout() {
        let bytes = encode_text("Hello");
        assert_eq!(&bytes[..], &[0x81, 0x05, b'H', b'e', b'l', b'l', b'o']);
    }

    #[test]
    fn medium_and_large_length_encodings() {
        let medium = "a".repeat(200);
        let bytes = encode_text(&medium);
        assert_eq!(bytes[0], 0x81);
        assert_eq!(bytes[1], 126);
        assert_eq!(&bytes[2..4], &200u16.to_be_bytes());
        assert_eq!(bytes.len(), 4 + 200);

        let boundary = "b".repeat(65535);
        assert_eq!(encode_text(&boundary)[1], 126);

        let large = "c".repeat(70000);
        let bytes = encode_text(&large);
        assert_eq!(bytes[1], 127);
        assert_eq!(&bytes[2..10], &70000u64.to_be_bytes());
        assert_eq!(bytes.len(), 10 + 70000);
    }

    #[test]
    fn never_sets_mask_bit() {
        for len in [0usize, 125, 126, 65536] {
            let bytes = encode_text(&"x".repeat(len));
            assert_eq!(bytes[1] & 0x80, 0);
        }
    }

    #[tokio::test]
    async fn decoder_reverses_every_length_path() {
        for len in [0usize, 10, 200, 70000] {
            let text: String = "é".repeat(len / 2) + &"z".repeat(len % 2);
            let bytes = encode_text(&text);
            let frame = read_frame(&mut &bytes[..], DEFAULT_MAX_PAYLOAD)
                .await
                .unwrap();
            assert!(frame.fin);
            assert!(!frame.masked);
            assert_eq!(frame.opcode, Opcode::Text);
            assert_eq!(frame.payload, text.as_bytes(), "len {}", len);
        }
    }

    #[tokio::test]
    async fn write_text_reports_write_failure() {
        let (client, server) = tokio::io::duplex(64);
        drop(client);
        let mut server = server;
        let res = write_text(&mut server, "lost").await;
        assert!(matches!(
            res,
            Err(crate::Error::Transport(TransportError::Write(_)))
        ));
    }
}
