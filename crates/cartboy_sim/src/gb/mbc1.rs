/// MBC1 with both banking modes.
///
/// In mode 0 the two high bits only extend the ROM bank number and RAM is
/// pinned to bank 0; mode 1 routes them to the RAM bank instead. Dumpers
/// must switch to mode 1 before touching any RAM bank but the first.
pub(super) struct Mbc1 {
    rom: Vec<u8>,
    pub(super) ram: Vec<u8>,
    num_rom_banks: u16,
    num_ram_banks: u8,
    rom_bank_low5: u8,
    bank_high2: u8,
    pub(super) ram_enable: bool,
    banking_mode: u8,
}

impl Mbc1 {
    pub(super) fn new(rom: &[u8], num_ram_banks: u8) -> Self {
        Self {
            rom: rom.to_vec(),
            ram: vec![0xFF; num_ram_banks as usize * 0x2000],
            num_rom_banks: super::rom_banks(rom),
            num_ram_banks,
            rom_bank_low5: 1,
            bank_high2: 0,
            ram_enable: false,
            banking_mode: 0,
        }
    }

    pub(super) fn reset(&mut self) {
        self.rom_bank_low5 = 1;
        self.bank_high2 = 0;
        self.ram_enable = false;
        self.banking_mode = 0;
    }

    fn effective_rom_bank(&self, addr: u16) -> u16 {
        let bank = if addr < 0x4000 {
            // Mode 1 also applies the high bits to the lower window.
            if self.banking_mode == 1 {
                (self.bank_high2 as u16) << 5
            } else {
                0
            }
        } else {
            // A low register of zero selects bank 1, which is why banks
            // 0x20, 0x40 and 0x60 are unreachable on this controller.
            let low = match self.rom_bank_low5 & 0x1F {
                0 => 1,
                n => n,
            };
            ((self.bank_high2 as u16) << 5) | low as u16
        };
        bank % self.num_rom_banks
    }

    fn ram_offset(&self, addr: u16) -> Option<usize> {
        if !self.ram_enable || self.num_ram_banks == 0 {
            return None;
        }
        let bank = if self.banking_mode == 1 {
            self.bank_high2 % self.num_ram_banks
        } else {
            0
        };
        let offset = (addr as usize - 0xA000) & 0x1FFF;
        Some(bank as usize * 0x2000 + offset).filter(|&i| i < self.ram.len())
    }

    pub(super) fn rom_read(&self, addr: u16) -> u8 {
        let bank = self.effective_rom_bank(addr);
        let index = bank as usize * 0x4000 + (addr & 0x3FFF) as usize;
        self.rom.get(index).copied().unwrap_or(0xFF)
    }

    pub(super) fn rom_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram_enable = (value & 0x0F) == 0x0A,
            0x2000..=0x3FFF => self.rom_bank_low5 = value & 0x1F,
            0x4000..=0x5FFF => self.bank_high2 = value & 0x03,
            0x6000..=0x7FFF => self.banking_mode = value & 0x01,
            _ => {}
        }
    }

    pub(super) fn ram_read(&self, addr: u16) -> u8 {
        self.ram_offset(addr)
            .map(|i| self.ram[i])
            .unwrap_or(0xFF)
    }

    pub(super) fn ram_write(&mut self, addr: u16, value: u8) {
        if let Some(i) = self.ram_offset(addr) {
            self.ram[i] = value;
        }
    }
}
