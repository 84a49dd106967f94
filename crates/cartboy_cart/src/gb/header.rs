use cartboy_common::{CartError, CartResult};

use super::MbcType;

/// Boot logo every licensed 8-bit cartridge carries at 0x104.
pub const NINTENDO_LOGO: [u8; 48] = [
    0xCE, 0xED, 0x66, 0x66, 0xCC, 0x0D, 0x00, 0x0B, 0x03, 0x73, 0x00, 0x83, 0x00, 0x0C, 0x00, 0x0D,
    0x00, 0x08, 0x11, 0x1F, 0x88, 0x89, 0x00, 0x0E, 0xDC, 0xCC, 0x6E, 0xE6, 0xDD, 0xDD, 0xD9, 0x99,
    0xBB, 0xBB, 0x67, 0x63, 0x6E, 0x0E, 0xEC, 0xCC, 0xDD, 0xDC, 0x99, 0x9F, 0xBB, 0xB9, 0x33, 0x3E,
];

/// Colour support advertised in the header.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum CartKind {
    GbOnly,
    /// Runs on both, with colour enhancements.
    Hybrid,
    GbcOnly,
    Unknown,
}

impl CartKind {
    pub const fn from_cart_flag(flag: u8) -> Self {
        match flag {
            0x00 => CartKind::GbOnly,
            0x80 => CartKind::Hybrid,
            0xC0 => CartKind::GbcOnly,
            _ => CartKind::Unknown,
        }
    }
}

/// The 0x50-byte cartridge header at 0x100-0x14F.
///
/// Offsets in the accessors are relative to 0x100.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct GbHeader {
    raw: [u8; GbHeader::LEN],
}

impl GbHeader {
    pub const START: u16 = 0x100;
    pub const LEN: usize = 0x50;

    const LOGO: usize = 0x04;
    const TITLE: usize = 0x34;
    const CGB_FLAG: usize = 0x43;
    const CART_TYPE: usize = 0x47;
    const ROM_SIZE: usize = 0x48;
    const RAM_SIZE: usize = 0x49;
    const OLD_LICENSEE: usize = 0x4B;
    const VERSION: usize = 0x4C;
    const HEADER_CHECKSUM: usize = 0x4D;

    /// Validate the boot logo and wrap the raw bytes.
    pub fn parse(raw: [u8; GbHeader::LEN]) -> CartResult<Self> {
        if raw[Self::LOGO..Self::LOGO + NINTENDO_LOGO.len()] != NINTENDO_LOGO {
            return Err(CartError::LogoCheckFailed);
        }
        Ok(Self { raw })
    }

    pub fn raw(&self) -> &[u8; GbHeader::LEN] {
        &self.raw
    }

    pub fn logo(&self) -> &[u8] {
        &self.raw[Self::LOGO..Self::LOGO + NINTENDO_LOGO.len()]
    }

    /// Cartridges using the new licensee scheme (old code 0x33) shrink the
    /// title to 11 bytes to make room for the manufacturer code and the
    /// colour flag.
    pub fn uses_new_licensee(&self) -> bool {
        self.raw[Self::OLD_LICENSEE] == 0x33
    }

    /// Display name, cut at the first NUL.
    pub fn name(&self) -> &[u8] {
        let len = if self.uses_new_licensee() { 11 } else { 16 };
        let title = &self.raw[Self::TITLE..Self::TITLE + len];
        let end = title.iter().position(|&b| b == 0).unwrap_or(len);
        &title[..end]
    }

    /// Colour flag, only meaningful on new-licensee headers.
    pub fn cart_flag(&self) -> u8 {
        if self.uses_new_licensee() {
            self.raw[Self::CGB_FLAG]
        } else {
            0x00
        }
    }

    pub fn cart_kind(&self) -> CartKind {
        CartKind::from_cart_flag(self.cart_flag())
    }

    pub fn cart_type(&self) -> u8 {
        self.raw[Self::CART_TYPE]
    }

    pub fn mbc(&self) -> MbcType {
        MbcType::from_cart_type(self.cart_type())
    }

    pub fn rom_size_code(&self) -> u8 {
        self.raw[Self::ROM_SIZE]
    }

    pub fn ram_size_code(&self) -> u8 {
        self.raw[Self::RAM_SIZE]
    }

    pub fn version(&self) -> u8 {
        self.raw[Self::VERSION]
    }

    pub fn header_checksum(&self) -> u8 {
        self.raw[Self::HEADER_CHECKSUM]
    }

    /// Checksum over 0x134-0x14C as the boot ROM computes it.
    pub fn computed_header_checksum(&self) -> u8 {
        self.raw[Self::TITLE..Self::HEADER_CHECKSUM]
            .iter()
            .fold(0u8, |acc, &b| acc.wrapping_sub(b).wrapping_sub(1))
    }

    pub fn header_checksum_ok(&self) -> bool {
        self.computed_header_checksum() == self.header_checksum()
    }
}
