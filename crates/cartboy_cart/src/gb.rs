mod geometry;
mod header;
mod mbc;

#[cfg(test)]
mod tests;

use std::ops::{Deref, DerefMut};

use cartboy_common::{BusTiming, CartBus, CartError, CartResult, Level, Signal};

use crate::strobe;
use crate::DetectConfig;

pub use geometry::{rom_bank_count, rom_file_size, RamGeometry, ROM_BANK_SIZE};
pub use header::{CartKind, GbHeader, NINTENDO_LOGO};
pub use mbc::MbcType;

/// Driver for the 8-bit cartridge family.
///
/// Holds the bus for as long as it lives and remembers which bank
/// controller the inserted cartridge uses, since both bank switching and
/// RAM access depend on it.
pub struct GbDriver<'a, B: CartBus> {
    bus: &'a mut B,
    timing: BusTiming,
    mbc: MbcType,
}

impl<'a, B: CartBus> GbDriver<'a, B> {
    pub fn new(bus: &'a mut B) -> Self {
        Self::with_mbc(bus, MbcType::None)
    }

    /// Driver for a cartridge that has already been identified.
    pub fn with_mbc(bus: &'a mut B, mbc: MbcType) -> Self {
        let timing = bus.timing();
        Self { bus, timing, mbc }
    }

    pub fn mbc(&self) -> MbcType {
        self.mbc
    }

    pub fn set_mbc(&mut self, mbc: MbcType) {
        self.mbc = mbc;
    }

    /// Pulse the reset line, putting every bank register back to its
    /// power-on value.
    pub fn reset(&mut self) {
        self.bus.set_signal(Signal::Cs2, Level::Low);
        self.bus.delay_ns(self.timing.write_pulse_ns);
        self.bus.set_signal(Signal::Cs2, Level::High);
    }

    pub fn read_byte(&mut self, address: u16) -> u8 {
        strobe::read8(self.bus, &self.timing, None, address)
    }

    pub fn write_byte(&mut self, address: u16, value: u8) {
        strobe::write8(self.bus, &self.timing, None, address, value);
    }

    fn check_ram_access(&self) -> CartResult<()> {
        match self.mbc {
            MbcType::None => Err(CartError::NoMbc),
            MbcType::Unsupported => Err(CartError::MbcUnsupported),
            _ => Ok(()),
        }
    }

    /// Read cartridge RAM with the RAM chip select asserted.
    ///
    /// MBC2 only drives the low nibble; the upper bits are reported set.
    pub fn read_ram_byte(&mut self, address: u16) -> CartResult<u8> {
        self.check_ram_access()?;
        let value = strobe::read8(self.bus, &self.timing, Some(Signal::Cs1), address);
        if self.mbc == MbcType::Mbc2 {
            Ok(0xF0 | (value & 0x0F))
        } else {
            Ok(value)
        }
    }

    pub fn write_ram_byte(&mut self, address: u16, value: u8) -> CartResult<()> {
        self.check_ram_access()?;
        strobe::write8(self.bus, &self.timing, Some(Signal::Cs1), address, value);
        Ok(())
    }

    /// Enable cartridge RAM for the lifetime of the returned guard.
    ///
    /// The guard dereferences to the driver and disables RAM again when
    /// dropped, whichever way the caller leaves the scope.
    pub fn open_ram(&mut self) -> CartResult<RamGuard<'_, 'a, B>> {
        self.check_ram_access()?;
        for signal in [Signal::Wr, Signal::Rd, Signal::Cs1] {
            self.bus.set_signal(signal, Level::High);
        }
        match self.mbc {
            // MBC2 sometimes ignores the first write after power-up unless
            // the bus saw a read first.
            MbcType::Mbc2 => {
                self.read_byte(0x0134);
            }
            // RAM banking mode, so 0x4000 selects the RAM bank.
            MbcType::Mbc1 => self.write_byte(0x6000, 0x01),
            _ => {}
        }
        self.write_byte(0x0000, 0x0A);
        Ok(RamGuard { driver: self })
    }

    fn close_ram(&mut self) {
        if self.mbc == MbcType::Mbc1 {
            self.write_byte(0x6000, 0x00);
        }
        self.write_byte(0x0000, 0x00);
    }

    pub fn switch_rom_bank(&mut self, bank: u16) {
        match self.mbc {
            MbcType::None => {}
            MbcType::Mbc1 => {
                self.write_byte(0x2000, (bank & 0x1F) as u8);
                self.write_byte(0x4000, (bank >> 5) as u8);
            }
            MbcType::Mbc2 => self.write_byte(0x2100, (bank & 0x1F) as u8),
            MbcType::Mbc5 => {
                self.write_byte(0x2100, (bank & 0xFF) as u8);
                self.write_byte(0x3000, (bank >> 8) as u8);
            }
            MbcType::Mbc3 | MbcType::Mbc4 | MbcType::Unsupported => {
                self.write_byte(0x2100, bank as u8);
            }
        }
    }

    pub fn switch_ram_bank(&mut self, bank: u8) {
        if self.mbc != MbcType::None {
            self.write_byte(0x4000, bank);
        }
    }

    /// Reset the cartridge, read its header and classify the bank
    /// controller.
    ///
    /// Bails out with [`CartError::FaultCart`] as soon as the first header
    /// bytes look like a floating bus, before reading the rest.
    pub fn read_header(&mut self, config: &DetectConfig) -> CartResult<GbHeader> {
        self.reset();

        let mut raw = [0u8; GbHeader::LEN];
        for offset in 0..GbHeader::LEN {
            raw[offset] = self.read_byte(GbHeader::START + offset as u16);
            if offset == 4 {
                let blank = raw[..5].iter().filter(|&&b| b == 0xFF).count();
                if blank >= config.gb_ff_fault_threshold {
                    log::debug!("header starts with {blank} blank bytes, slot looks empty");
                    return Err(CartError::FaultCart);
                }
            }
        }

        let header = GbHeader::parse(raw)?;
        if !header.header_checksum_ok() {
            log::warn!(
                "header checksum {:#04X} does not match computed {:#04X}",
                header.header_checksum(),
                header.computed_header_checksum()
            );
        }
        self.mbc = header.mbc();
        log::debug!(
            "cartridge type {:#04X} -> {:?}, rom code {:#04X}, ram code {:#04X}",
            header.cart_type(),
            self.mbc,
            header.rom_size_code(),
            header.ram_size_code()
        );
        Ok(header)
    }
}

/// Cartridge RAM held open. Dropping it disables RAM again.
pub struct RamGuard<'d, 'a, B: CartBus> {
    driver: &'d mut GbDriver<'a, B>,
}

impl<'a, B: CartBus> Deref for RamGuard<'_, 'a, B> {
    type Target = GbDriver<'a, B>;

    fn deref(&self) -> &Self::Target {
        &*self.driver
    }
}

impl<B: CartBus> DerefMut for RamGuard<'_, '_, B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.driver
    }
}

impl<B: CartBus> Drop for RamGuard<'_, '_, B> {
    fn drop(&mut self) {
        self.driver.close_ram();
    }
}
