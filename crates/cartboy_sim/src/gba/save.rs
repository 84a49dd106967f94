use super::eeprom::{EepromSize, SimEeprom};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum FlashState {
    Idle,
    Unlock1,
    Unlock2,
    BankSelect,
}

/// Flash save chip. Plain writes are ignored; only the bank-select
/// command sequence is understood.
pub struct SimFlash {
    data: Vec<u8>,
    bank: usize,
    state: FlashState,
}

impl SimFlash {
    fn read(&self, addr: u16) -> u8 {
        let index = self.bank * 0x10000 + addr as usize;
        self.data.get(index).copied().unwrap_or(0xFF)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.state = match (self.state, addr, value) {
            (FlashState::Idle, 0x5555, 0xAA) => FlashState::Unlock1,
            (FlashState::Unlock1, 0x2AAA, 0x55) => FlashState::Unlock2,
            (FlashState::Unlock2, 0x5555, 0xB0) => FlashState::BankSelect,
            (FlashState::BankSelect, 0x0000, bank) => {
                // 64 KiB parts have no bank register.
                if self.data.len() > 0x10000 {
                    self.bank = (bank & 0x01) as usize;
                }
                FlashState::Idle
            }
            _ => FlashState::Idle,
        };
    }
}

/// Save memory fitted to a simulated 24-bit cartridge.
pub enum SimSave {
    /// Nothing answers; the data lines read back as zero.
    None,
    /// Battery-backed SRAM. A 32 KiB part repeats every 0x8000 bytes.
    Sram(Vec<u8>),
    Flash(SimFlash),
    Eeprom(SimEeprom),
}

impl SimSave {
    pub fn sram(data: Vec<u8>) -> Self {
        SimSave::Sram(data)
    }

    /// Flash of `data.len()` bytes (64 or 128 KiB).
    pub fn flash(data: Vec<u8>) -> Self {
        SimSave::Flash(SimFlash {
            data,
            bank: 0,
            state: FlashState::Idle,
        })
    }

    pub fn eeprom(size: EepromSize, data: Vec<u8>) -> Self {
        SimSave::Eeprom(SimEeprom::new(size, data))
    }

    pub fn data(&self) -> &[u8] {
        match self {
            SimSave::None => &[],
            SimSave::Sram(data) => data,
            SimSave::Flash(flash) => &flash.data,
            SimSave::Eeprom(eeprom) => eeprom.data(),
        }
    }

    pub(crate) fn read(&self, addr: u16) -> u8 {
        match self {
            SimSave::Sram(data) if !data.is_empty() => data[addr as usize % data.len()],
            SimSave::Flash(flash) => flash.read(addr),
            _ => 0x00,
        }
    }

    pub(crate) fn write(&mut self, addr: u16, value: u8) {
        match self {
            SimSave::Sram(data) if !data.is_empty() => {
                let len = data.len();
                data[addr as usize % len] = value;
            }
            SimSave::Flash(flash) => flash.write(addr, value),
            _ => {}
        }
    }
}
