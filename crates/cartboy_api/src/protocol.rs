//! Byte values of the host protocol.

pub const HANDSHAKE_REQUEST: u8 = 0x17;
pub const HANDSHAKE_ACCEPT: u8 = 0x06;
/// Reserved for a dumper that refuses the connection.
pub const HANDSHAKE_DENY: u8 = 0x15;

pub const OK: u8 = 0x10;
pub const NOK: u8 = 0x11;
pub const VERIFY: u8 = 0x12;
/// Reserved.
pub const RESET: u8 = 0x13;
pub const TASK_START: u8 = 0x20;
pub const TASK_FINISHED: u8 = 0x21;

/// Capability bytes that may follow a handshake accept.
pub const CART_MODE_AUTO: u8 = 0x22;
pub const CART_MODE_GB: u8 = 0x23;
pub const CART_MODE_GBA: u8 = 0x24;

pub const CART_TYPE_START: u8 = 0x76;
pub const CART_TYPE_END: u8 = 0x77;
pub const CART_GBC_ONLY: u8 = 0x78;
pub const CART_GBC_HYBRID: u8 = 0x79;
pub const CART_GB: u8 = 0x7A;
pub const CART_GBA: u8 = 0x7B;
pub const CART_UNKNOWN: u8 = 0xFF;

pub const NAME_START: u8 = 0x86;
pub const NAME_END: u8 = 0x87;
pub const SIZE_START: u8 = 0x96;
pub const SIZE_END: u8 = 0x97;

pub const ABORT: u8 = 0xF0;

/// Second byte of an abort frame.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AbortKind {
    /// Unknown command, or the cartridge could not be identified.
    Error,
    /// The command cannot be carried out on this cartridge, or the host
    /// declined a write.
    Command,
    /// The host broke the transfer protocol.
    Packet,
}

impl AbortKind {
    pub const fn code(self) -> u8 {
        match self {
            AbortKind::Error => 0xF1,
            AbortKind::Command => 0xF2,
            AbortKind::Packet => 0xF3,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0xF1 => Some(AbortKind::Error),
            0xF2 => Some(AbortKind::Command),
            0xF3 => Some(AbortKind::Packet),
            _ => None,
        }
    }
}
