//! Frame decoder: reads exactly one frame from an async byte stream.

use super::{apply_mask, Frame, Opcode, FIN_BIT, LEN_16, LEN_64, MASK_BIT};
use crate::error::{FrameError, TransportError};
use crate::{Error, Result};
use tokio::io::{AsyncRead, AsyncReadExt};

fn read_error(part: &'static str) -> impl FnOnce(std::io::Error) -> Error {
    move |e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::Frame(FrameError::Truncated(part))
        } else {
            Error::Transport(TransportError::Read(e.to_string()))
        }
    }
}

/// Read one frame, unmasking the payload if the peer masked it.
///
/// A stream that ends before the header, extended length, mask key or payload is
/// complete yields [`FrameError::Truncated`]. A declared length above
/// `max_payload` is rejected before anything is allocated.
pub async fn read_frame<R>(reader: &mut R, max_payload: u64) -> Result<Frame>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut header = [0u8; 2];
    reader
        .read_exact(&mut header)
        .await
        .map_err(read_error("header"))?;

    let fin = header[0] & FIN_BIT != 0;
    let opcode = Opcode::from_u8(header[0]);
    let masked = header[1] & MASK_BIT != 0;

    let len = match header[1] & 0x7F {
        LEN_16 => reader
            .read_u16()
            .await
            .map_err(read_error("16-bit length"))? as u64,
        LEN_64 => reader
            .read_u64()
            .await
            .map_err(read_error("64-bit length"))?,
        n => n as u64,
    };
    if len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            len,
            max: max_payload,
        }
        .into());
    }

    let mask_key = if masked {
        let mut key = [0u8; 4];
        reader
            .read_exact(&mut key)
            .await
            .map_err(read_error("mask key"))?;
        Some(key)
    } else {
        None
    };

    let mut payload = vec![0u8; len as usize];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(read_error("payload"))?;
    if let Some(key) = mask_key {
        apply_mask(&mut payload, key);
    }

    Ok(Frame {
        fin,
        opcode,
        masked,
        mask_key,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::DEFAULT_MAX_PAYLOAD;
    use rand::{Rng, RngCore};

    /// Client-style frame: masked, with the minimal length encoding.
    fn masked_frame(byte0: u8, payload: &[u8], key: [u8; 4]) -> Vec<u8> {
        let mut out = vec![byte0];
        let len = payload.len();
        if len < 126 {
            out.push(MASK_BIT | len as u8);
        } else if len < 65536 {
            out.push(MASK_BIT | LEN_16);
            out.extend_from_slice(&(len as u16).to_be_bytes());
        } else {
            out.push(MASK_BIT | LEN_64);
            out.extend_from_slice(&(len as u64).to_be_bytes());
        }
        out.extend_from_slice(&key);
        let mut body = payload.to_vec();
        apply_mask(&mut body, key);
        out.extend_from_slice(&body);
        out
    }

    #[tokio::test]
    async fn decodes_masked_text_frame() {
        let bytes = masked_frame(0x81, b"Hi", [0, 0, 0, 0]);
        let frame = read_frame(&mut &bytes[..], DEFAULT_MAX_PAYLOAD)
            .await
            .unwrap();
        assert!(frame.fin);
        assert!(frame.masked);
        assert_eq!(frame.opcode, Opcode::Text);
        assert_eq!(frame.payload, b"Hi");
    }

    #[tokio::test]
    async fn unmasks_random_payloads_with_random_keys() {
        let mut rng = rand::thread_rng();
        for len in [1usize, 3, 125, 126, 1000, 65536] {
            let mut payload = vec![0u8; len];
            rng.fill_bytes(&mut payload);
            let key: [u8; 4] = rng.gen();
            let bytes = masked_frame(0x82, &payload, key);
            let frame = read_frame(&mut &bytes[..], DEFAULT_MAX_PAYLOAD)
                .await
                .unwrap();
            assert_eq!(frame.mask_key, Some(key));
            assert_eq!(frame.opcode, Opcode::Binary);
            assert_eq!(frame.payload, payload, "len {}", len);
        }
    }

    #[tokio::test]
    async fn exposes_fin_and_reserved_opcodes() {
        let bytes = [0x03u8, 0x00];
        let frame = read_frame(&mut &bytes[..], DEFAULT_MAX_PAYLOAD)
            .await
            .unwrap();
        assert!(!frame.fin);
        assert_eq!(frame.opcode, Opcode::Reserved(3));
        assert!(frame.payload.is_empty());
    }

    #[tokio::test]
    async fn short_header_is_truncated() {
        let bytes = [0x81u8];
        let err = read_frame(&mut &bytes[..], DEFAULT_MAX_PAYLOAD)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Frame(FrameError::Truncated("header"))));
    }

    #[tokio::test]
    async fn empty_stream_is_truncated() {
        let bytes: [u8; 0] = [];
        let err = read_frame(&mut &bytes[..], DEFAULT_MAX_PAYLOAD)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Frame(FrameError::Truncated(_))));
    }

    #[tokio::test]
    async fn declared_length_beyond_stream_is_truncated() {
        // Declares 100 bytes, carries 5.
        let mut bytes = vec![0x81u8, 100];
        bytes.extend_from_slice(b"short");
        let err = read_frame(&mut &bytes[..], DEFAULT_MAX_PAYLOAD)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Frame(FrameError::Truncated("payload"))));
    }

    #[tokio::test]
    async fn truncated_extended_length_and_mask_key() {
        let bytes = [0x81u8, LEN_64, 0, 0, 0];
        let err = read_frame(&mut &bytes[..], DEFAULT_MAX_PAYLOAD)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Frame(FrameError::Truncated("64-bit length"))
        ));

        let bytes = [0x81u8, MASK_BIT | 2, 0xAA, 0xBB];
        let err = read_frame(&mut &bytes[..], DEFAULT_MAX_PAYLOAD)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Frame(FrameError::Truncated("mask key"))));
    }

    #[tokio::test]
    async fn oversized_length_rejected_before_allocation() {
        let mut bytes = vec![0x81u8, LEN_64];
        bytes.extend_from_slice(&u64::MAX.to_be_bytes());
        let err = read_frame(&mut &bytes[..], DEFAULT_MAX_PAYLOAD)
            .await
            .unwrap_err();
        match err {
            Error::Frame(FrameError::PayloadTooLarge { len, max }) => {
                assert_eq!(len, u64::MAX);
                assert_eq!(max, DEFAULT_MAX_PAYLOAD);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
