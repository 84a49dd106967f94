use cartboy_common::CartBus;

use super::{GbaDriver, SaveMemoryKind};
use crate::DetectConfig;

/// Smallest ROM the size probe considers, in words (2 MiB).
const FIRST_CANDIDATE: u32 = 0x0010_0000;
/// Largest addressable ROM, in words (32 MiB).
const LAST_CANDIDATE: u32 = 0x0100_0000;

const SAVE_BLOCKS: u16 = 32;
const SAVE_BLOCK_LEN: u16 = 64;
const SAVE_BLOCK_STRIDE: u16 = 0x400;

impl<B: CartBus> GbaDriver<'_, B> {
    /// Whether the ROM ends at `candidate` words: either the window there
    /// mirrors the start of the ROM, or nothing drives the bus at all.
    fn rom_ends_at(&mut self, candidate: u32, window: u32) -> bool {
        let mut open_bus = 0;
        let mut mirrored = false;
        for offset in 0..window {
            let data = self.read_word_single(candidate + offset);
            if data == 0 {
                open_bus += 1;
            } else if data != self.read_word_single(offset) {
                return false;
            } else {
                mirrored = true;
            }
        }
        mirrored || open_bus == window
    }

    /// ROM size in bytes, found by doubling a candidate size until the
    /// cartridge's address decoder wraps around.
    pub fn probe_rom_size(&mut self, config: &DetectConfig) -> u32 {
        let mut candidate = FIRST_CANDIDATE;
        while candidate < LAST_CANDIDATE {
            if self.rom_ends_at(candidate, config.open_bus_window) {
                break;
            }
            candidate <<= 1;
        }
        log::debug!("rom ends at word {candidate:#X}");
        candidate * 2
    }

    /// Look for any save chip on the CS2 bus.
    ///
    /// An empty save bus reads back as zero; a first block that is all
    /// (or all but one) zero bytes means nothing is fitted.
    pub fn probe_save_kind(&mut self) -> SaveMemoryKind {
        self.select_save_bus();
        let mut kind = SaveMemoryKind::SramOrFlash;
        let mut address = 0u16;
        for block in 0..SAVE_BLOCKS {
            let zeroes = (0..SAVE_BLOCK_LEN)
                .filter(|&i| self.read_save_byte(address + i) == 0)
                .count();
            if block == 0 && zeroes >= 63 {
                kind = SaveMemoryKind::None;
                break;
            }
            address += SAVE_BLOCK_STRIDE;
        }
        self.bus.configure_pins();
        log::debug!("save probe: {kind:?}");
        kind
    }

    /// Tell SRAM from Flash by writing a test byte to address 0.
    ///
    /// Flash ignores plain writes, so only SRAM reads the byte back; the
    /// original value is then written back.
    pub fn disambiguate_sram_vs_flash(&mut self) -> SaveMemoryKind {
        let original = self.read_save_byte(0);
        let test_byte = if original == 0xDA { 0xED } else { 0xDA };
        self.write_save_byte(0, test_byte);
        if self.read_save_byte(0) == test_byte {
            self.write_save_byte(0, original);
            return SaveMemoryKind::Sram;
        }
        SaveMemoryKind::Flash
    }

    /// Save size in bytes, refining `kind` along the way.
    ///
    /// Returns a size of zero for anything that is not a parallel save
    /// chip.
    pub fn probe_ram_size(&mut self, kind: SaveMemoryKind) -> (SaveMemoryKind, u32) {
        if !kind.is_parallel() {
            return (kind, 0);
        }
        self.select_save_bus();

        // A 32 KiB SRAM repeats at 0x8000.
        let duplicates = (0..0x400u16)
            .filter(|&i| self.read_save_byte(i) == self.read_save_byte(i + 0x8000))
            .count();
        if duplicates == 0x400 {
            return (SaveMemoryKind::Sram, 0x8000);
        }

        match self.disambiguate_sram_vs_flash() {
            SaveMemoryKind::Sram => return (SaveMemoryKind::Sram, 0x10000),
            SaveMemoryKind::Flash => {}
            other => return (other, 0),
        }

        // 64 KiB parts ignore the bank command, so bank 1 mirrors bank 0.
        let mut bank0 = [0u8; SAVE_BLOCK_LEN as usize];
        let mut duplicates = 0;
        for block in 0..SAVE_BLOCKS {
            let base = block * SAVE_BLOCK_STRIDE;
            self.switch_flash_bank(0);
            for (i, byte) in bank0.iter_mut().enumerate() {
                *byte = self.read_save_byte(base + i as u16);
            }
            self.switch_flash_bank(1);
            duplicates += bank0
                .iter()
                .enumerate()
                .filter(|&(i, &byte)| self.read_save_byte(base + i as u16) == byte)
                .count();
        }
        log::debug!("flash bank duplicates: {duplicates:#X}");
        if duplicates >= 0x800 {
            (SaveMemoryKind::Flash, 0x10000)
        } else {
            (SaveMemoryKind::Flash, 0x20000)
        }
    }
}
