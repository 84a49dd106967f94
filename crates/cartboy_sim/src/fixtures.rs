//! Builders for well-formed cartridge images.

const GB_LOGO: [u8; 48] = [
    0xCE, 0xED, 0x66, 0x66, 0xCC, 0x0D, 0x00, 0x0B, 0x03, 0x73, 0x00, 0x83, 0x00, 0x0C, 0x00, 0x0D,
    0x00, 0x08, 0x11, 0x1F, 0x88, 0x89, 0x00, 0x0E, 0xDC, 0xCC, 0x6E, 0xE6, 0xDD, 0xDD, 0xD9, 0x99,
    0xBB, 0xBB, 0x67, 0x63, 0x6E, 0x0E, 0xEC, 0xCC, 0xDD, 0xDC, 0x99, 0x9F, 0xBB, 0xB9, 0x33, 0x3E,
];

const GBA_LOGO_PREFIX: [u8; 8] = [0x24, 0xFF, 0xAE, 0x51, 0x69, 0x9A, 0xA2, 0x21];

/// Distinct, never-zero filler so banks and mirrors are told apart.
fn filler(index: usize) -> u8 {
    let mixed = (index as u32).wrapping_mul(0x9E37_79B1) >> 13;
    (mixed as u8) | 0x01
}

/// An 8-bit ROM image of `2 << rom_size_code` banks with a valid header.
///
/// `title` longer than 11 bytes switches to the old licensee scheme,
/// where the title may use all 16 bytes and no colour flag exists.
pub fn gb_rom(cart_type: u8, rom_size_code: u8, ram_size_code: u8, title: &str, cgb_flag: u8) -> Vec<u8> {
    let banks = 2usize << rom_size_code.min(8);
    let mut rom: Vec<u8> = (0..banks * 0x4000).map(filler).collect();
    rom[0x100..0x104].copy_from_slice(&[0x00, 0xC3, 0x50, 0x01]);
    rom[0x104..0x134].copy_from_slice(&GB_LOGO);
    rom[0x134..0x144].fill(0);
    let title = title.as_bytes();
    if title.len() > 11 {
        let len = title.len().min(16);
        rom[0x134..0x134 + len].copy_from_slice(&title[..len]);
        rom[0x14B] = 0x01;
    } else {
        rom[0x134..0x134 + title.len()].copy_from_slice(title);
        rom[0x143] = cgb_flag;
        rom[0x14B] = 0x33;
    }
    rom[0x144..0x146].copy_from_slice(b"01");
    rom[0x146] = 0x00;
    rom[0x147] = cart_type;
    rom[0x148] = rom_size_code;
    rom[0x149] = ram_size_code;
    rom[0x14A] = 0x01;
    rom[0x14C] = 0x00;
    rom[0x14D] = rom[0x134..0x14D]
        .iter()
        .fold(0u8, |acc, &b| acc.wrapping_sub(b).wrapping_sub(1));
    rom
}

/// A 24-bit ROM image of `len` bytes with a valid header.
pub fn gba_rom(len: usize, title: &str) -> Vec<u8> {
    let mut rom: Vec<u8> = (0..len).map(filler).collect();
    rom[0x00..0x04].copy_from_slice(&[0x2E, 0x00, 0x00, 0xEA]);
    rom[0x04..0x0C].copy_from_slice(&GBA_LOGO_PREFIX);
    rom[0xA0..0xAC].fill(0);
    let title = &title.as_bytes()[..title.len().min(12)];
    rom[0xA0..0xA0 + title.len()].copy_from_slice(title);
    rom[0xAC..0xB0].copy_from_slice(b"ABCE");
    rom[0xB0..0xB2].copy_from_slice(b"01");
    rom[0xB2] = 0x96;
    rom[0xB3..0xBD].fill(0);
    rom[0xBD] = rom[0xA0..0xBD]
        .iter()
        .fold(0u8, |acc, &b| acc.wrapping_sub(b))
        .wrapping_sub(0x19);
    rom
}
