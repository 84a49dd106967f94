mod eeprom;
mod header;
mod probe;
mod save;


use cartboy_common::{BusTiming, CartBus, CartError, CartResult, Direction, Level, Signal};

use crate::strobe;
use crate::DetectConfig;

pub use header::{GbaHeader, FIXED_VALUE, LOGO_PREFIX};
pub use save::{EepromType, SaveMemoryKind};

/// Driver for the 24-bit cartridge family.
///
/// ROM is read as 16-bit words. The low 16 address bits share AD0..AD15
/// with the returned data, the high 8 bits go out on the data lines, and
/// CS1 falling latches the full address into the cartridge. While CS1
/// stays low each RD pulse reveals the next word.
///
/// The save chip sits on a separate 8-bit bus selected by CS2.
pub struct GbaDriver<'a, B: CartBus> {
    bus: &'a mut B,
    timing: BusTiming,
}

impl<'a, B: CartBus> GbaDriver<'a, B> {
    pub fn new(bus: &'a mut B) -> Self {
        let timing = bus.timing();
        Self { bus, timing }
    }

    fn set_address(&mut self, address: u32) {
        self.bus.set_address_direction(Direction::Output);
        self.bus.set_data_direction(Direction::Output);
        self.bus.drive_address((address & 0xFFFF) as u16);
        self.bus.write_data((address >> 16) as u8);
    }

    /// Read the word at `address` (in words).
    ///
    /// With `latch` unset the cartridge's own counter supplies the
    /// address, so this only works straight after another read and only
    /// until the low 16 bits wrap; callers re-latch every 0x10000 words.
    ///
    /// The word is `AD15..AD8 << 8 | AD7..AD0`, i.e. little-endian in the
    /// ROM image.
    pub fn read_word(&mut self, address: u32, latch: bool) -> u16 {
        self.bus.set_signal(Signal::Rd, Level::High);
        self.bus.set_signal(Signal::Wr, Level::High);
        if latch {
            self.bus.set_signal(Signal::Cs1, Level::High);
            self.bus.set_signal(Signal::Cs2, Level::High);
            self.set_address(address);
            self.bus.set_signal(Signal::Cs1, Level::Low);
            self.bus.delay_ns(self.timing.latch_settle_ns);
            // Drive zero before letting go so an empty slot reads 0x0000.
            self.bus.drive_address(0);
            self.bus.set_address_direction(Direction::Input);
        }
        self.bus.set_signal(Signal::Rd, Level::Low);
        self.bus.delay_ns(self.timing.read_settle_ns);
        let word = self.bus.read_address();
        self.bus.set_signal(Signal::Rd, Level::High);
        word
    }

    /// A latched read of a single word, releasing the ROM afterwards.
    pub fn read_word_single(&mut self, address: u32) -> u16 {
        let word = self.read_word(address, true);
        self.release();
        word
    }

    /// End a burst of ROM reads.
    pub fn release(&mut self) {
        self.bus.set_signal(Signal::Cs1, Level::High);
    }

    /// Put the pins into 8-bit mode for save memory access.
    pub fn select_save_bus(&mut self) {
        self.bus.configure_pins();
    }

    pub fn read_save_byte(&mut self, address: u16) -> u8 {
        strobe::read8(self.bus, &self.timing, Some(Signal::Cs2), address)
    }

    pub fn write_save_byte(&mut self, address: u16, value: u8) {
        strobe::write8(self.bus, &self.timing, Some(Signal::Cs2), address, value);
    }

    /// Map 64 KiB bank `bank` of a Flash save into the save window.
    pub fn switch_flash_bank(&mut self, bank: u8) {
        self.write_save_byte(0x5555, 0xAA);
        self.write_save_byte(0x2AAA, 0x55);
        self.write_save_byte(0x5555, 0xB0);
        self.write_save_byte(0x0000, bank);
    }

    /// Read and validate the 0xC0-byte header.
    pub fn read_header(&mut self, config: &DetectConfig) -> CartResult<GbaHeader> {
        let mut raw = [0u8; GbaHeader::LEN];
        let mut zero_words = 0;
        for (index, pair) in raw.chunks_exact_mut(2).enumerate() {
            let word = self.read_word(index as u32, index == 0);
            if word == 0 {
                zero_words += 1;
            }
            pair.copy_from_slice(&word.to_le_bytes());
        }
        self.release();

        if zero_words >= config.gba_zero_fault_threshold {
            log::debug!("{zero_words} zero words in header, slot looks empty");
            return Err(CartError::FaultCart);
        }
        let header = GbaHeader::parse(raw)?;
        if !header.complement_ok() {
            log::warn!(
                "header complement {:#04X} does not match computed {:#04X}",
                header.complement(),
                header.computed_complement()
            );
        }
        Ok(header)
    }
}
