//! WebSocket frames (RFC 6455 section 5.2).
//!
//! Base header is two bytes: FIN + opcode, then MASK + 7-bit length code.
//! Length codes 126 and 127 announce a 2- or 8-byte big-endian extended length.
//! Client frames carry a 4-byte mask key; frames written by this side never do.

mod decoder;
mod encoder;

pub use decoder::read_frame;
pub use encoder::{encode_text, write_text};

/// Default ceiling on a declared payload length (1 MiB).
pub const DEFAULT_MAX_PAYLOAD: u64 = 1 << 20;

/// FIN bit in header byte 0.
pub(crate) const FIN_BIT: u8 = 0x80;
/// MASK bit in header byte 1.
pub(crate) const MASK_BIT: u8 = 0x80;
/// Length code announcing a 2-byte extended length.
pub(crate) const LEN_16: u8 = 126;
/// Length code announcing an 8-byte extended length.
pub(crate) const LEN_64: u8 = 127;

/// Frame opcode (low 4 bits of header byte 0).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
    /// Reserved opcode; exposed as-is, interpretation is left to the session.
    Reserved(u8),
}

impl Opcode {
    pub fn from_u8(v: u8) -> Self {
        match v & 0x0F {
            0x0 => Self::Continuation,
            0x1 => Self::Text,
            0x2 => Self::Binary,
            0x8 => Self::Close,
            0x9 => Self::Ping,
            0xA => Self::Pong,
            other => Self::Reserved(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::Continuation => 0x0,
            Self::Text => 0x1,
            Self::Binary => 0x2,
            Self::Close => 0x8,
            Self::Ping => 0x9,
            Self::Pong => 0xA,
            Self::Reserved(v) => v & 0x0F,
        }
    }
}

/// One decoded frame. `payload` is always unmasked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub fin: bool,
    pub opcode: Opcode,
    pub masked: bool,
    pub mask_key: Option<[u8; 4]>,
    pub payload: Vec<u8>,
}

/// XOR `payload` with `key` repeated. Applying it twice restores the input.
pub fn apply_mask(payload: &mut [u8], key: [u8; 4]) {
    for (i, b) in payload.iter_mut().enumerate() {
        *b ^= key[i % 4];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_from_u8_covers_known_and_reserved() {
        assert_eq!(Opcode::from_u8(0x1), Opcode::Text);
        assert_eq!(Opcode::from_u8(0x8), Opcode::Close);
        assert_eq!(Opcode::from_u8(0xA), Opcode::Pong);
        assert_eq!(Opcode::from_u8(0x3), Opcode::Reserved(3));
        for v in 0u8..16 {
            assert_eq!(Opcode::from_u8(v).as_u8(), v);
        }
    }

    #[test]
    fn mask_is_an_involution() {
        let original = b"sensor:42cm".to_vec();
        let key = [0x37, 0xfa, 0x21, 0x3d];
        let mut data = original.clone();
        apply_mask(&mut data, key);
        assert_ne!(data, original);
        apply_mask(&mut data, key);
        assert_eq!(data, original);
    }
}
