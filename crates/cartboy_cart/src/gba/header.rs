use cartboy_common::{CartError, CartResult};

/// Leading bytes of the 24-bit boot logo. Comparing the whole 0x9C-byte
/// bitmap would cost another 74 bus cycles for no real gain.
pub const LOGO_PREFIX: [u8; 8] = [0x24, 0xFF, 0xAE, 0x51, 0x69, 0x9A, 0xA2, 0x21];

/// Value every cartridge stores at 0xB2.
pub const FIXED_VALUE: u8 = 0x96;

/// The first 0xC0 bytes of a 24-bit cartridge.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct GbaHeader {
    raw: [u8; GbaHeader::LEN],
}

impl GbaHeader {
    pub const LEN: usize = 0xC0;

    const LOGO: usize = 0x04;
    const LOGO_LEN: usize = 0x9C;
    const TITLE: usize = 0xA0;
    const GAME_CODE: usize = 0xAC;
    const MAKER_CODE: usize = 0xB0;
    const FIXED: usize = 0xB2;
    const DEVICE_TYPE: usize = 0xB4;
    const VERSION: usize = 0xBC;
    const COMPLEMENT: usize = 0xBD;

    pub fn parse(raw: [u8; GbaHeader::LEN]) -> CartResult<Self> {
        if raw[Self::LOGO..Self::LOGO + LOGO_PREFIX.len()] != LOGO_PREFIX {
            return Err(CartError::LogoCheckFailed);
        }
        if raw[Self::FIXED] != FIXED_VALUE {
            return Err(CartError::FaultCart);
        }
        Ok(Self { raw })
    }

    pub fn raw(&self) -> &[u8; GbaHeader::LEN] {
        &self.raw
    }

    /// ARM branch instruction the BIOS jumps to.
    pub fn entry_point(&self) -> u32 {
        u32::from_le_bytes([self.raw[0], self.raw[1], self.raw[2], self.raw[3]])
    }

    pub fn logo(&self) -> &[u8] {
        &self.raw[Self::LOGO..Self::LOGO + Self::LOGO_LEN]
    }

    /// 12-byte title, cut at the first NUL.
    pub fn name(&self) -> &[u8] {
        let title = &self.raw[Self::TITLE..Self::GAME_CODE];
        let end = title.iter().position(|&b| b == 0).unwrap_or(title.len());
        &title[..end]
    }

    pub fn game_code(&self) -> &[u8] {
        &self.raw[Self::GAME_CODE..Self::MAKER_CODE]
    }

    pub fn maker_code(&self) -> &[u8] {
        &self.raw[Self::MAKER_CODE..Self::FIXED]
    }

    pub fn device_type(&self) -> u8 {
        self.raw[Self::DEVICE_TYPE]
    }

    pub fn version(&self) -> u8 {
        self.raw[Self::VERSION]
    }

    pub fn complement(&self) -> u8 {
        self.raw[Self::COMPLEMENT]
    }

    pub fn computed_complement(&self) -> u8 {
        self.raw[Self::TITLE..Self::COMPLEMENT]
            .iter()
            .fold(0u8, |acc, &b| acc.wrapping_sub(b))
            .wrapping_sub(0x19)
    }

    pub fn complement_ok(&self) -> bool {
        self.computed_complement() == self.complement()
    }
}
