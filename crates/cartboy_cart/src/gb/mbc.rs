/// Bank controller fitted to an 8-bit cartridge.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum MbcType {
    None,
    Unsupported,
    Mbc1,
    Mbc2,
    Mbc3,
    Mbc4,
    Mbc5,
}

impl MbcType {
    /// Classify the cartridge type byte at 0x147.
    pub const fn from_cart_type(code: u8) -> Self {
        match code {
            0x00 => MbcType::None,
            0x01..=0x03 | 0xFF => MbcType::Mbc1,
            0x05 | 0x06 => MbcType::Mbc2,
            0x08 | 0x09 | 0x0B..=0x0D | 0x0F..=0x13 | 0xFC..=0xFE => MbcType::Mbc3,
            0x15..=0x17 => MbcType::Mbc4,
            0x19..=0x1E => MbcType::Mbc5,
            _ => MbcType::Unsupported,
        }
    }

    /// Whether the controller is known well enough to drive its RAM.
    pub const fn has_ram_access(self) -> bool {
        !matches!(self, MbcType::None | MbcType::Unsupported)
    }
}
