mod eeprom;
mod save;

use crate::bus::Strobes;

pub use eeprom::{EepromSize, SimEeprom};
pub use save::{SimFlash, SimSave};

/// A simulated 24-bit cartridge.
///
/// The ROM is word addressed: CS1 falling latches A0..A23 and every RD
/// rising edge while CS1 stays low moves on to the next word. Only the
/// low 16 bits of the latch count, so the counter wraps inside a 128 KiB
/// window exactly as the real mask ROMs do.
pub struct SimGbaCart {
    rom: Vec<u8>,
    mirror: bool,
    latch: u32,
    save: SimSave,
}

impl SimGbaCart {
    /// A cartridge whose ROM repeats every `rom.len()` bytes.
    pub fn new(rom: Vec<u8>) -> Self {
        Self {
            rom,
            mirror: true,
            latch: 0,
            save: SimSave::None,
        }
    }

    /// Reads past the end of the ROM return open bus (zero) instead of
    /// wrapping around.
    pub fn with_open_bus(mut self) -> Self {
        self.mirror = false;
        self
    }

    pub fn with_save(mut self, save: SimSave) -> Self {
        self.save = save;
        self
    }

    pub fn rom(&self) -> &[u8] {
        &self.rom
    }

    pub fn save(&self) -> &SimSave {
        &self.save
    }

    pub fn save_mut(&mut self) -> &mut SimSave {
        &mut self.save
    }

    pub(crate) fn latch(&mut self, word_address: u32) {
        self.latch = word_address & 0x00FF_FFFF;
    }

    fn rom_word(&self) -> u16 {
        if self.rom.is_empty() {
            return 0;
        }
        let mut index = self.latch as usize * 2;
        if index + 1 >= self.rom.len() {
            if !self.mirror {
                return 0;
            }
            index %= self.rom.len();
        }
        let byte = |i: usize| self.rom.get(i).copied().unwrap_or(0);
        u16::from_le_bytes([byte(index), byte(index + 1)])
    }

    /// Level of AD0..AD15 while the dumper has them as inputs.
    pub(crate) fn ad_lines(&self, low: Strobes) -> u16 {
        if let SimSave::Eeprom(eeprom) = &self.save {
            if let Some(bit) = eeprom.data_out() {
                return bit as u16;
            }
        }
        if low.contains(Strobes::CS1 | Strobes::RD) {
            self.rom_word()
        } else {
            0
        }
    }

    pub(crate) fn rd_clock(&mut self) {
        self.latch = (self.latch & 0x00FF_0000) | ((self.latch + 1) & 0xFFFF);
        if let SimSave::Eeprom(eeprom) = &mut self.save {
            eeprom.clock_out();
        }
    }

    pub(crate) fn wr_clock(&mut self, bit: bool) {
        if let SimSave::Eeprom(eeprom) = &mut self.save {
            eeprom.clock_in(bit);
        }
    }

    pub(crate) fn release(&mut self) {
        if let SimSave::Eeprom(eeprom) = &mut self.save {
            eeprom.deselect();
        }
    }

    pub(crate) fn save_read(&self, addr: u16) -> u8 {
        self.save.read(addr)
    }

    pub(crate) fn save_write(&mut self, addr: u16, value: u8) {
        self.save.write(addr, value);
    }
}
