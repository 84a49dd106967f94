use cartboy_common::{CartError, CartResult};

use super::MbcType;

/// Size of one switchable ROM bank.
pub const ROM_BANK_SIZE: u32 = 0x4000;

/// Number of 16 KiB ROM banks for the header ROM size code (0x148).
///
/// Unknown codes fall back to the smallest ROM, two banks.
pub fn rom_bank_count(rom_size_code: u8) -> u16 {
    match rom_size_code {
        0x00..=0x07 => 2 << rom_size_code,
        0x52 => 72,
        0x53 => 80,
        0x54 => 96,
        other => {
            log::warn!("unknown ROM size code {other:#04X}, assuming 32 KiB");
            2
        }
    }
}

pub fn rom_file_size(rom_size_code: u8) -> u32 {
    rom_bank_count(rom_size_code) as u32 * ROM_BANK_SIZE
}

/// Where cartridge RAM lives in the 0xA000-0xBFFF window.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct RamGeometry {
    pub banks: u8,
    /// One past the last address of each bank.
    pub end_address: u16,
}

impl RamGeometry {
    pub const START: u16 = 0xA000;
    pub const BANK_SIZE: u32 = 0x2000;

    /// Derive the RAM layout from the header RAM size code (0x149).
    ///
    /// MBC2 carries its own 512 half-byte RAM and ignores the code.
    pub fn new(mbc: MbcType, ram_size_code: u8) -> CartResult<Self> {
        if mbc == MbcType::Mbc2 {
            return Ok(Self {
                banks: 1,
                end_address: 0xA200,
            });
        }
        let (banks, end_address) = match ram_size_code {
            0x00 => return Err(CartError::NoInfo),
            0x01 => (1, 0xA800),
            0x02 => (1, 0xC000),
            0x03 => (4, 0xC000),
            0x04 => (16, 0xC000),
            0x05 => (8, 0xC000),
            _ => return Err(CartError::MbcSaveUnsupported),
        };
        Ok(Self { banks, end_address })
    }

    pub fn file_size(&self) -> u32 {
        if self.end_address < 0xC000 {
            (self.end_address - Self::START) as u32
        } else {
            Self::BANK_SIZE * self.banks as u32
        }
    }
}
