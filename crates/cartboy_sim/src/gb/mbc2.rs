/// MBC2: up to 16 ROM banks and 512 half-bytes of built-in RAM.
///
/// Both registers sit in 0x0000-0x3FFF and are told apart by address
/// bit 8. Only the low nibble of each RAM cell exists; the upper data
/// lines float and are modelled as zero here.
pub(super) struct Mbc2 {
    rom: Vec<u8>,
    pub(super) ram: Vec<u8>,
    num_rom_banks: u16,
    rom_bank: u8,
    pub(super) ram_enable: bool,
}

impl Mbc2 {
    pub(super) fn new(rom: &[u8]) -> Self {
        Self {
            rom: rom.to_vec(),
            ram: vec![0x0F; 0x200],
            num_rom_banks: super::rom_banks(rom),
            rom_bank: 1,
            ram_enable: false,
        }
    }

    pub(super) fn reset(&mut self) {
        self.rom_bank = 1;
        self.ram_enable = false;
    }

    pub(super) fn rom_read(&self, addr: u16) -> u8 {
        let bank = if addr < 0x4000 {
            0
        } else {
            self.rom_bank as u16 % self.num_rom_banks
        };
        let index = bank as usize * 0x4000 + (addr & 0x3FFF) as usize;
        self.rom.get(index).copied().unwrap_or(0xFF)
    }

    pub(super) fn rom_write(&mut self, addr: u16, value: u8) {
        if addr >= 0x4000 {
            return;
        }
        if addr & 0x0100 == 0 {
            self.ram_enable = (value & 0x0F) == 0x0A;
        } else {
            self.rom_bank = match value & 0x0F {
                0 => 1,
                n => n,
            };
        }
    }

    pub(super) fn ram_read(&self, addr: u16) -> u8 {
        if !self.ram_enable {
            return 0xFF;
        }
        self.ram[(addr as usize - 0xA000) & 0x1FF] & 0x0F
    }

    pub(super) fn ram_write(&mut self, addr: u16, value: u8) {
        if self.ram_enable {
            self.ram[(addr as usize - 0xA000) & 0x1FF] = value & 0x0F;
        }
    }
}
