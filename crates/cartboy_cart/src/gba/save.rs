/// Serial EEPROM capacity, which fixes the command address width.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum EepromType {
    /// 4 Kbit, 6-bit block address.
    Kbit4,
    /// 64 Kbit, 14-bit block address.
    Kbit64,
}

impl EepromType {
    pub const fn size(self) -> u32 {
        match self {
            EepromType::Kbit4 => 0x200,
            EepromType::Kbit64 => 0x2000,
        }
    }

    /// Read command and block address packed MSB first, with the number
    /// of bits to clock out.
    pub(super) const fn read_command(self, block: u16) -> (u16, u32) {
        match self {
            EepromType::Kbit4 => (0x00C0 | (block & 0x3F), 8),
            EepromType::Kbit64 => (0xC000 | (block & 0x3FFF), 16),
        }
    }
}

/// Save memory found on a 24-bit cartridge.
///
/// The header does not say, so this is worked out by probing.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum SaveMemoryKind {
    None,
    Eeprom(EepromType),
    Sram,
    /// Something answers on the save bus but it is not known yet whether
    /// it accepts plain writes.
    SramOrFlash,
    Flash,
}

impl SaveMemoryKind {
    /// Parallel save chips that [`probe_ram_size`] can measure.
    ///
    /// [`probe_ram_size`]: super::GbaDriver::probe_ram_size
    pub const fn is_parallel(self) -> bool {
        matches!(
            self,
            SaveMemoryKind::Sram | SaveMemoryKind::SramOrFlash | SaveMemoryKind::Flash
        )
    }
}
