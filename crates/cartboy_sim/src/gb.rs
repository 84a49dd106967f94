mod mbc1;
mod mbc2;
mod mbc3;
mod mbc5;

use mbc1::Mbc1;
use mbc2::Mbc2;
use mbc3::Mbc3;
use mbc5::Mbc5;

/// Count of RAM-enable and RAM-disable commands a cartridge has seen.
///
/// Every enable the dumper issues must eventually be matched by a
/// disable; a cartridge left with RAM enabled can be corrupted when it is
/// pulled out of the slot.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct RamEnableLog {
    pub enables: u32,
    pub disables: u32,
}

impl RamEnableLog {
    pub fn is_balanced(&self) -> bool {
        self.enables == self.disables
    }
}

enum Mapper {
    RomOnly(Vec<u8>),
    Mbc1(Mbc1),
    Mbc2(Mbc2),
    Mbc3(Mbc3),
    Mbc5(Mbc5),
}

/// A simulated 8-bit cartridge, picked from the header's cartridge type.
pub struct SimGbCart {
    mapper: Mapper,
    log: RamEnableLog,
}

/// RAM banks for a header RAM size code. 2 KiB parts are rounded up to a
/// full 8 KiB bank.
fn ram_banks(ram_size_code: u8) -> u8 {
    match ram_size_code {
        0x01 | 0x02 => 1,
        0x03 => 4,
        0x04 => 16,
        0x05 => 8,
        _ => 0,
    }
}

fn rom_banks(rom: &[u8]) -> u16 {
    (rom.len() / 0x4000).max(1) as u16
}

impl SimGbCart {
    pub fn from_rom(rom: &[u8]) -> Self {
        let cart_type = rom.get(0x147).copied().unwrap_or(0);
        let ram_banks = ram_banks(rom.get(0x149).copied().unwrap_or(0));
        let mapper = match cart_type {
            0x01..=0x03 => Mapper::Mbc1(Mbc1::new(rom, ram_banks)),
            0x05 | 0x06 => Mapper::Mbc2(Mbc2::new(rom)),
            0x0F..=0x13 => Mapper::Mbc3(Mbc3::new(rom, ram_banks)),
            0x19..=0x1E => Mapper::Mbc5(Mbc5::new(rom, ram_banks)),
            0x00 => Mapper::RomOnly(rom.to_vec()),
            other => {
                log::warn!("no simulated mapper for cartridge type {other:#04X}, using ROM only");
                Mapper::RomOnly(rom.to_vec())
            }
        };
        Self {
            mapper,
            log: RamEnableLog::default(),
        }
    }

    /// Replace the save RAM contents, e.g. with a `.sav` image.
    pub fn load_ram(&mut self, data: &[u8]) {
        let ram = self.ram_mut();
        let len = ram.len().min(data.len());
        ram[..len].copy_from_slice(&data[..len]);
    }

    pub fn ram(&self) -> &[u8] {
        match &self.mapper {
            Mapper::RomOnly(_) => &[],
            Mapper::Mbc1(m) => &m.ram,
            Mapper::Mbc2(m) => &m.ram,
            Mapper::Mbc3(m) => &m.ram,
            Mapper::Mbc5(m) => &m.ram,
        }
    }

    pub fn ram_mut(&mut self) -> &mut [u8] {
        match &mut self.mapper {
            Mapper::RomOnly(_) => &mut [],
            Mapper::Mbc1(m) => &mut m.ram,
            Mapper::Mbc2(m) => &mut m.ram,
            Mapper::Mbc3(m) => &mut m.ram,
            Mapper::Mbc5(m) => &mut m.ram,
        }
    }

    pub fn ram_enabled(&self) -> bool {
        match &self.mapper {
            Mapper::RomOnly(_) => false,
            Mapper::Mbc1(m) => m.ram_enable,
            Mapper::Mbc2(m) => m.ram_enable,
            Mapper::Mbc3(m) => m.ram_enable,
            Mapper::Mbc5(m) => m.ram_enable,
        }
    }

    pub fn ram_enable_log(&self) -> RamEnableLog {
        self.log
    }

    /// Power-on state of the bank registers, as after a reset pulse.
    pub(crate) fn reset(&mut self) {
        match &mut self.mapper {
            Mapper::RomOnly(_) => {}
            Mapper::Mbc1(m) => m.reset(),
            Mapper::Mbc2(m) => m.reset(),
            Mapper::Mbc3(m) => m.reset(),
            Mapper::Mbc5(m) => m.reset(),
        }
    }

    fn is_ram_gate(&self, addr: u16) -> bool {
        match self.mapper {
            Mapper::RomOnly(_) => false,
            // MBC2 decodes the register from address bit 8.
            Mapper::Mbc2(_) => addr < 0x4000 && addr & 0x0100 == 0,
            _ => addr < 0x2000,
        }
    }

    pub(crate) fn rom_read(&self, addr: u16) -> u8 {
        match &self.mapper {
            Mapper::RomOnly(rom) => rom.get(addr as usize).copied().unwrap_or(0xFF),
            Mapper::Mbc1(m) => m.rom_read(addr),
            Mapper::Mbc2(m) => m.rom_read(addr),
            Mapper::Mbc3(m) => m.rom_read(addr),
            Mapper::Mbc5(m) => m.rom_read(addr),
        }
    }

    pub(crate) fn rom_write(&mut self, addr: u16, value: u8) {
        if self.is_ram_gate(addr) {
            if value & 0x0F == 0x0A {
                self.log.enables += 1;
            } else {
                self.log.disables += 1;
            }
        }
        match &mut self.mapper {
            Mapper::RomOnly(_) => {}
            Mapper::Mbc1(m) => m.rom_write(addr, value),
            Mapper::Mbc2(m) => m.rom_write(addr, value),
            Mapper::Mbc3(m) => m.rom_write(addr, value),
            Mapper::Mbc5(m) => m.rom_write(addr, value),
        }
    }

    pub(crate) fn ram_read(&self, addr: u16) -> u8 {
        match &self.mapper {
            Mapper::RomOnly(_) => 0xFF,
            Mapper::Mbc1(m) => m.ram_read(addr),
            Mapper::Mbc2(m) => m.ram_read(addr),
            Mapper::Mbc3(m) => m.ram_read(addr),
            Mapper::Mbc5(m) => m.ram_read(addr),
        }
    }

    pub(crate) fn ram_write(&mut self, addr: u16, value: u8) {
        match &mut self.mapper {
            Mapper::RomOnly(_) => {}
            Mapper::Mbc1(m) => m.ram_write(addr, value),
            Mapper::Mbc2(m) => m.ram_write(addr, value),
            Mapper::Mbc3(m) => m.ram_write(addr, value),
            Mapper::Mbc5(m) => m.ram_write(addr, value),
        }
    }
}
