use cartboy_common::{BusTiming, CartBus, CartError};
use cartboy_sim::{fixtures, SimBus, SimGbCart};

use super::*;
use crate::DetectConfig;

fn gb_bus(cart_type: u8, rom_size_code: u8, ram_size_code: u8) -> SimBus {
    let rom = fixtures::gb_rom(cart_type, rom_size_code, ram_size_code, "CARTBOY", 0x80);
    sim_bus(&rom)
}

fn sim_bus(rom: &[u8]) -> SimBus {
    let mut bus = SimBus::with_gb(SimGbCart::from_rom(rom));
    bus.configure_pins();
    bus
}

fn header_bytes(rom: &[u8]) -> [u8; GbHeader::LEN] {
    let mut raw = [0u8; GbHeader::LEN];
    raw.copy_from_slice(&rom[0x100..0x150]);
    raw
}

/// Every single-bit corruption of the boot logo must be caught.
#[test]
fn logo_single_bit_flip_is_rejected() {
    let rom = fixtures::gb_rom(0x01, 0, 0, "LOGO", 0x00);
    let raw = header_bytes(&rom);
    assert!(GbHeader::parse(raw).is_ok());

    for offset in 0x04..0x34 {
        for bit in 0..8 {
            let mut corrupted = raw;
            corrupted[offset] ^= 1 << bit;
            assert_eq!(
                GbHeader::parse(corrupted),
                Err(CartError::LogoCheckFailed),
                "flip of bit {bit} at {:#05X} went unnoticed",
                0x100 + offset
            );
        }
    }
}

#[test]
fn header_detect_reads_title_and_classifies_mbc() {
    let mut bus = gb_bus(0x13, 0x01, 0x03);
    let mut driver = GbDriver::new(&mut bus);
    let header = driver.read_header(&DetectConfig::default()).unwrap();

    assert_eq!(header.name(), b"CARTBOY");
    assert_eq!(header.cart_flag(), 0x80);
    assert_eq!(header.cart_kind(), CartKind::Hybrid);
    assert_eq!(header.rom_size_code(), 0x01);
    assert!(header.header_checksum_ok());
    assert_eq!(driver.mbc(), MbcType::Mbc3);
}

#[test]
fn old_licensee_header_uses_full_title_without_colour_flag() {
    let rom = fixtures::gb_rom(0x00, 0x00, 0x00, "SIXTEEN BYTES OK", 0x00);
    let mut bus = sim_bus(&rom);
    let header = GbDriver::new(&mut bus)
        .read_header(&DetectConfig::default())
        .unwrap();

    assert!(!header.uses_new_licensee());
    assert_eq!(header.name(), b"SIXTEEN BYTES OK");
    assert_eq!(header.cart_flag(), 0x00);
    assert_eq!(header.cart_kind(), CartKind::GbOnly);
    assert_eq!(header.mbc(), MbcType::None);
}

#[test]
fn header_checksum_mismatch_is_tolerated() {
    let mut rom = fixtures::gb_rom(0x01, 0x00, 0x00, "BADSUM", 0x00);
    rom[0x14D] ^= 0xFF;
    let mut bus = sim_bus(&rom);
    let header = GbDriver::new(&mut bus)
        .read_header(&DetectConfig::default())
        .unwrap();
    assert!(!header.header_checksum_ok());
}

#[test]
fn empty_slot_is_a_faulty_cart() {
    let mut bus = SimBus::empty();
    bus.configure_pins();
    let result = GbDriver::new(&mut bus).read_header(&DetectConfig::default());
    assert_eq!(result, Err(CartError::FaultCart));
}

#[test]
fn fault_threshold_is_tunable() {
    // Two blank bytes in the entry point are fine with the default
    // threshold of three, but not with a stricter one.
    let mut rom = fixtures::gb_rom(0x01, 0x00, 0x00, "BLANKS", 0x00);
    rom[0x100] = 0xFF;
    rom[0x101] = 0xFF;
    let mut bus = sim_bus(&rom);
    assert!(GbDriver::new(&mut bus)
        .read_header(&DetectConfig::default())
        .is_ok());

    let strict = DetectConfig::builder().gb_ff_fault_threshold(2).build();
    assert_eq!(
        GbDriver::new(&mut bus).read_header(&strict),
        Err(CartError::FaultCart)
    );
}

#[test]
fn mbc2_geometry_ignores_ram_size_code() {
    for code in 0x00..=0x05 {
        let geometry = RamGeometry::new(MbcType::Mbc2, code).unwrap();
        assert_eq!(
            geometry,
            RamGeometry {
                banks: 1,
                end_address: 0xA200
            }
        );
        assert_eq!(geometry.file_size(), 0x200);
    }
}

#[test]
fn mbc3_battery_cart_with_32k_ram() {
    let mbc = MbcType::from_cart_type(0x13);
    assert_eq!(mbc, MbcType::Mbc3);

    let geometry = RamGeometry::new(mbc, 0x03).unwrap();
    assert_eq!(
        geometry,
        RamGeometry {
            banks: 4,
            end_address: 0xC000
        }
    );
    assert_eq!(geometry.file_size(), 32768);
}

#[test]
fn ram_geometry_table() {
    assert_eq!(RamGeometry::new(MbcType::Mbc1, 0x00), Err(CartError::NoInfo));
    assert_eq!(
        RamGeometry::new(MbcType::Mbc5, 0x06),
        Err(CartError::MbcSaveUnsupported)
    );

    let sizes = [(0x01, 0x800), (0x02, 0x2000), (0x04, 0x20000), (0x05, 0x10000)];
    for (code, size) in sizes {
        let geometry = RamGeometry::new(MbcType::Mbc5, code).unwrap();
        assert_eq!(geometry.file_size(), size, "ram code {code:#04X}");
    }
}

#[test]
fn rom_bank_count_table() {
    assert_eq!(rom_bank_count(0x00), 2);
    assert_eq!(rom_bank_count(0x05), 64);
    assert_eq!(rom_bank_count(0x08), 2);
    assert_eq!(rom_bank_count(0x52), 72);
    assert_eq!(rom_bank_count(0x53), 80);
    assert_eq!(rom_bank_count(0x54), 96);
    assert_eq!(rom_file_size(0x03), 16 * 0x4000);
}

#[test]
fn mbc1_rom_bank_switching() {
    let rom = fixtures::gb_rom(0x01, 0x02, 0x00, "BANKS", 0x00);
    let mut bus = sim_bus(&rom);
    let mut driver = GbDriver::with_mbc(&mut bus, MbcType::Mbc1);

    for bank in 1..8u16 {
        driver.switch_rom_bank(bank);
        let base = bank as usize * 0x4000;
        assert_eq!(driver.read_byte(0x4000), rom[base]);
        assert_eq!(driver.read_byte(0x7FFF), rom[base + 0x3FFF]);
        assert_eq!(driver.read_byte(0x0150), rom[0x0150]);
    }
}

/// Bank 0x1AB needs the ninth bank bit in the 0x3000 register.
#[test]
fn mbc5_nine_bit_rom_bank() {
    let rom = fixtures::gb_rom(0x19, 0x08, 0x00, "BIGROM", 0x00);
    let mut bus = sim_bus(&rom);
    let mut driver = GbDriver::with_mbc(&mut bus, MbcType::Mbc5);

    driver.switch_rom_bank(0x1AB);
    let base = 0x1AB * 0x4000;
    assert_eq!(driver.read_byte(0x4000), rom[base]);
    assert_eq!(driver.read_byte(0x4123), rom[base + 0x123]);

    driver.switch_rom_bank(0x0AB);
    assert_eq!(driver.read_byte(0x4123), rom[0x0AB * 0x4000 + 0x123]);
}

#[test]
fn ram_guard_closes_ram_on_drop() {
    let mut bus = gb_bus(0x03, 0x00, 0x03);
    {
        let mut driver = GbDriver::with_mbc(&mut bus, MbcType::Mbc1);
        let mut ram = driver.open_ram().unwrap();
        ram.switch_ram_bank(2);
        ram.write_ram_byte(0xA000, 0x77).unwrap();
        assert_eq!(ram.read_ram_byte(0xA000), Ok(0x77));
    }

    let cart = bus.gb_cart().unwrap();
    assert!(!cart.ram_enabled());
    assert!(cart.ram_enable_log().is_balanced());
    assert_eq!(cart.ram()[2 * 0x2000], 0x77);
}

#[test]
fn ram_guard_closes_ram_on_error_path() {
    fn failing_write<B: CartBus>(driver: &mut GbDriver<'_, B>) -> Result<(), CartError> {
        let mut ram = driver.open_ram()?;
        ram.write_ram_byte(0xA000, 0x12)?;
        Err(CartError::PacketFailure)
    }

    let mut bus = gb_bus(0x1B, 0x00, 0x02);
    {
        let mut driver = GbDriver::with_mbc(&mut bus, MbcType::Mbc5);
        assert_eq!(failing_write(&mut driver), Err(CartError::PacketFailure));
    }

    let cart = bus.gb_cart().unwrap();
    assert!(!cart.ram_enabled());
    assert_eq!(cart.ram_enable_log().enables, 1);
    assert!(cart.ram_enable_log().is_balanced());
}

/// Opening RAM without ever closing it must show up in the cartridge's
/// enable log.
#[test]
fn leaked_ram_opens_are_flagged() {
    let mut bus = gb_bus(0x03, 0x00, 0x02);
    {
        let mut driver = GbDriver::with_mbc(&mut bus, MbcType::Mbc1);
        for _ in 0..3 {
            std::mem::forget(driver.open_ram().unwrap());
        }
    }

    let cart = bus.gb_cart().unwrap();
    let log = cart.ram_enable_log();
    assert_eq!(log.enables, 3);
    assert_eq!(log.disables, 0);
    assert!(!log.is_balanced());
    assert!(cart.ram_enabled());
}

#[test]
fn mbc2_ram_reads_report_high_nibble_set() {
    let mut bus = gb_bus(0x06, 0x00, 0x00);
    {
        let mut driver = GbDriver::with_mbc(&mut bus, MbcType::Mbc2);
        let mut ram = driver.open_ram().unwrap();
        ram.write_ram_byte(0xA010, 0x5A).unwrap();
        assert_eq!(ram.read_ram_byte(0xA010), Ok(0xFA));
    }
    assert_eq!(bus.gb_cart().unwrap().ram()[0x10], 0x0A);
}

#[test]
fn ram_access_needs_a_known_mbc() {
    let mut bus = gb_bus(0x00, 0x00, 0x00);
    let mut driver = GbDriver::with_mbc(&mut bus, MbcType::None);
    assert_eq!(driver.read_ram_byte(0xA000), Err(CartError::NoMbc));
    assert!(matches!(driver.open_ram(), Err(CartError::NoMbc)));

    driver.set_mbc(MbcType::Unsupported);
    assert_eq!(
        driver.write_ram_byte(0xA000, 0),
        Err(CartError::MbcUnsupported)
    );
}

#[test]
fn strobes_wait_for_the_configured_timing() {
    let mut bus = gb_bus(0x00, 0x00, 0x00);
    bus.set_timing(BusTiming::builder().read_settle_ns(100).write_pulse_ns(40).build());
    {
        let mut driver = GbDriver::new(&mut bus);
        driver.read_byte(0x0100);
        driver.write_byte(0x2000, 0x01);
    }
    assert_eq!(bus.waited_ns(), 140);
}
