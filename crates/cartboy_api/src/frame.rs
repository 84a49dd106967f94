//! Metadata frames sent ahead of a transfer, and their decoder.
//!
//! A read command is answered with three frames:
//!
//! ```text
//! 76 <type> 77                 cartridge type
//! 86 <len> 87 <name bytes>     display name
//! 96 <b3> <b2> <b1> <b0> 97    transfer size, big-endian
//! ```

use crate::protocol::{
    CART_TYPE_END, CART_TYPE_START, NAME_END, NAME_START, SIZE_END, SIZE_START,
};

/// Longest name the frame carries.
pub const MAX_NAME_LEN: usize = 17;

pub fn cart_type_frame(cart_type: u8) -> [u8; 3] {
    [CART_TYPE_START, cart_type, CART_TYPE_END]
}

pub fn name_frame(name: &[u8]) -> Vec<u8> {
    let name = &name[..name.len().min(MAX_NAME_LEN)];
    let mut frame = Vec::with_capacity(3 + name.len());
    frame.extend_from_slice(&[NAME_START, name.len() as u8, NAME_END]);
    frame.extend_from_slice(name);
    frame
}

pub fn size_frame(size: u32) -> [u8; 6] {
    let [b3, b2, b1, b0] = size.to_be_bytes();
    [SIZE_START, b3, b2, b1, b0, SIZE_END]
}

/// Decode a size frame at the start of `bytes`.
pub fn decode_size(bytes: &[u8]) -> Option<u32> {
    match bytes {
        [SIZE_START, b3, b2, b1, b0, SIZE_END, ..] => Some(u32::from_be_bytes([*b3, *b2, *b1, *b0])),
        _ => None,
    }
}

/// The three frames preceding a read transfer.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Metadata {
    pub cart_type: u8,
    pub name: Vec<u8>,
    pub size: u32,
}

impl Metadata {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = cart_type_frame(self.cart_type).to_vec();
        out.extend(name_frame(&self.name));
        out.extend_from_slice(&size_frame(self.size));
        out
    }

    /// Decode the frames at the start of `bytes`, returning them with the
    /// number of bytes consumed. `None` if the input is short or a marker
    /// is out of place.
    pub fn decode(bytes: &[u8]) -> Option<(Self, usize)> {
        let cart_type = match bytes {
            [CART_TYPE_START, cart_type, CART_TYPE_END, ..] => *cart_type,
            _ => return None,
        };
        let rest = &bytes[3..];
        let len = match rest {
            [NAME_START, len, NAME_END, ..] => *len as usize,
            _ => return None,
        };
        let name = rest.get(3..3 + len)?.to_vec();
        let consumed = 3 + 3 + len;
        let size = decode_size(bytes.get(consumed..)?)?;
        Some((
            Self {
                cart_type,
                name,
                size,
            },
            consumed + 6,
        ))
    }
}
