/// MBC5: 9-bit ROM bank number and up to 16 RAM banks. Rumble is not
/// modelled.
pub(super) struct Mbc5 {
    rom: Vec<u8>,
    pub(super) ram: Vec<u8>,
    num_rom_banks: u16,
    num_ram_banks: u8,
    rom_bank_low8: u8,
    rom_bank_high1: u8,
    ram_bank: u8,
    pub(super) ram_enable: bool,
}

impl Mbc5 {
    pub(super) fn new(rom: &[u8], num_ram_banks: u8) -> Self {
        Self {
            rom: rom.to_vec(),
            ram: vec![0xFF; num_ram_banks as usize * 0x2000],
            num_rom_banks: super::rom_banks(rom),
            num_ram_banks,
            rom_bank_low8: 1,
            rom_bank_high1: 0,
            ram_bank: 0,
            ram_enable: false,
        }
    }

    pub(super) fn reset(&mut self) {
        self.rom_bank_low8 = 1;
        self.rom_bank_high1 = 0;
        self.ram_bank = 0;
        self.ram_enable = false;
    }

    fn ram_offset(&self, addr: u16) -> Option<usize> {
        if !self.ram_enable || self.num_ram_banks == 0 {
            return None;
        }
        let bank = (self.ram_bank & 0x0F) % self.num_ram_banks;
        Some(bank as usize * 0x2000 + ((addr as usize - 0xA000) & 0x1FFF))
    }

    pub(super) fn rom_read(&self, addr: u16) -> u8 {
        let bank = if addr < 0x4000 {
            0
        } else {
            // Unlike MBC1, bank 0 can be mapped into the upper window.
            (((self.rom_bank_high1 as u16) << 8) | self.rom_bank_low8 as u16) % self.num_rom_banks
        };
        let index = bank as usize * 0x4000 + (addr & 0x3FFF) as usize;
        self.rom.get(index).copied().unwrap_or(0xFF)
    }

    pub(super) fn rom_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram_enable = (value & 0x0F) == 0x0A,
            0x2000..=0x2FFF => self.rom_bank_low8 = value,
            0x3000..=0x3FFF => self.rom_bank_high1 = value & 0x01,
            0x4000..=0x5FFF => self.ram_bank = value & 0x0F,
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
