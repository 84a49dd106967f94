use cartboy_common::{CartBus, CartError, CartFamily, TransportError};
use cartboy_sim::{fixtures, ScriptedTransport, SimBus, SimGbCart, SimGbaCart, SimSave, Slot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::transfer::{write_verify, RamPort, WriteLayout};
use super::*;
use crate::frame::Metadata;
use crate::protocol::{CART_MODE_AUTO, NOK, TASK_FINISHED, TASK_START, VERIFY};

type SimEngine = HostEngine<SimBus, ScriptedTransport>;

fn engine(bus: SimBus) -> SimEngine {
    HostEngine::new(bus, ScriptedTransport::default(), EngineConfig::default())
}

fn gb_engine(rom: &[u8]) -> SimEngine {
    engine(SimBus::with_gb(SimGbCart::from_rom(rom)))
}

fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen()).collect()
}

/// Queue the host's replies, send the command line and run it.
fn run_command<B: CartBus>(
    engine: &mut HostEngine<B, ScriptedTransport>,
    line: &str,
    host: &[u8],
) -> Result<(), EngineError> {
    engine.transport_mut().push_input(host);
    for byte in line.bytes().chain([b'\n']) {
        engine.feed(byte).unwrap();
    }
    engine.poll().expect("command line is complete")
}

/// Host bytes for writing `data`: an OK per byte plus the closing OK.
fn write_stream(data: &[u8]) -> Vec<u8> {
    let mut host = vec![OK];
    for &byte in data {
        host.extend_from_slice(&[OK, byte]);
    }
    host.extend_from_slice(&[OK, 0x00]);
    host
}

/// Split a read response into its metadata and the payload after the OK.
fn split_read_response(output: &[u8]) -> (Metadata, &[u8]) {
    let (metadata, consumed) = Metadata::decode(output).expect("metadata frames");
    assert_eq!(output[consumed], OK);
    (metadata, &output[consumed + 1..])
}

fn abort_frame(kind: AbortKind, diagnostic: &str) -> Vec<u8> {
    let mut frame = vec![ABORT, kind.code()];
    frame.extend_from_slice(diagnostic.as_bytes());
    frame.extend_from_slice(b"\r\n");
    frame
}

#[test]
fn gb_rom_dump_streams_every_bank() {
    let rom = fixtures::gb_rom(0x01, 0x02, 0x00, "DUMPTEST", 0x80);
    let mut engine = gb_engine(&rom);

    run_command(&mut engine, "API_READ_ROM", &[OK]).unwrap();

    let (metadata, payload) = split_read_response(engine.transport().output());
    assert_eq!(metadata.cart_type, CART_GBC_HYBRID);
    assert_eq!(metadata.name, b"DUMPTEST");
    assert_eq!(metadata.size, 0x20000);
    assert_eq!(payload, &rom[..]);
    assert!(!engine.session().is_populated());
}

#[test]
fn gb_ram_dump_covers_all_banks_and_closes_ram() {
    let rom = fixtures::gb_rom(0x03, 0x00, 0x03, "SAVEGAME", 0x00);
    let save = random_bytes(0x8000, 11);
    let mut cart = SimGbCart::from_rom(&rom);
    cart.load_ram(&save);
    let mut engine = engine(SimBus::with_gb(cart));

    run_command(&mut engine, "API_READ_RAM", &[OK]).unwrap();

    let (metadata, payload) = split_read_response(engine.transport().output());
    assert_eq!(metadata.cart_type, CART_GB);
    assert_eq!(metadata.size, 0x8000);
    assert_eq!(payload, &save[..]);

    let cart = engine.bus().gb_cart().unwrap();
    assert!(!cart.ram_enabled());
    assert!(cart.ram_enable_log().is_balanced());
}

#[test]
fn mbc2_ram_dump_sets_high_nibbles() {
    let rom = fixtures::gb_rom(0x06, 0x00, 0x00, "NIBBLES", 0x00);
    let save = random_bytes(0x200, 12);
    let mut cart = SimGbCart::from_rom(&rom);
    cart.load_ram(&save);
    let mut engine = engine(SimBus::with_gb(cart));

    run_command(&mut engine, "API_READ_RAM", &[OK]).unwrap();

    let (metadata, payload) = split_read_response(engine.transport().output());
    assert_eq!(metadata.size, 0x200);
    let expected: Vec<u8> = save.iter().map(|b| 0xF0 | (b & 0x0F)).collect();
    assert_eq!(payload, &expected[..]);
}

#[test]
fn gb_ram_write_takes_one_ok_more_than_bytes() {
    let rom = fixtures::gb_rom(0x1B, 0x00, 0x01, "WRITER", 0x00);
    let data = random_bytes(0x800, 13);
    let mut engine = gb_engine(&rom);

    run_command(&mut engine, "API_WRITE_RAM", &write_stream(&data)).unwrap();

    let mut expected = size_frame(0x800).to_vec();
    expected.extend_from_slice(&[OK, TASK_START]);
    for &byte in &data {
        expected.extend_from_slice(&[VERIFY, byte]);
    }
    expected.push(TASK_FINISHED);
    assert_eq!(engine.transport().output(), &expected[..]);
    assert_eq!(engine.transport().remaining_input(), 0);

    let cart = engine.bus().gb_cart().unwrap();
    assert_eq!(&cart.ram()[..0x800], &data[..]);
    assert!(!cart.ram_enabled());
    assert!(cart.ram_enable_log().is_balanced());
}

#[test]
fn nok_rewrites_and_bad_ack_aborts_the_write() {
    let rom = fixtures::gb_rom(0x1B, 0x00, 0x01, "RETRY", 0x00);
    let mut engine = gb_engine(&rom);
    let host = [OK, OK, 0x11, NOK, 0x22, OK, 0x33, 0x55, 0x00];

    let result = run_command(&mut engine, "API_WRITE_RAM", &host);
    assert!(matches!(result, Err(EngineError::Cart(CartError::PacketFailure))));

    let mut expected = size_frame(0x800).to_vec();
    expected.extend_from_slice(&[OK, TASK_START, VERIFY, 0x11, VERIFY, 0x22, VERIFY, 0x33]);
    expected.extend(abort_frame(AbortKind::Packet, "PCKT_FAILURE"));
    assert_eq!(engine.transport().output(), &expected[..]);

    let cart = engine.bus().gb_cart().unwrap();
    assert_eq!(&cart.ram()[..2], &[0x22, 0x33]);
    assert!(!cart.ram_enabled());
    assert!(cart.ram_enable_log().is_balanced());
    assert!(!engine.session().is_populated());
}

#[test]
fn nok_before_any_byte_is_a_packet_failure() {
    let rom = fixtures::gb_rom(0x13, 0x00, 0x02, "EARLYNOK", 0x00);
    let mut engine = gb_engine(&rom);

    let result = run_command(&mut engine, "API_WRITE_RAM", &[OK, NOK, 0x42]);
    assert!(matches!(result, Err(EngineError::Cart(CartError::PacketFailure))));
    assert!(engine.bus().gb_cart().unwrap().ram().iter().all(|&b| b != 0x42));
    assert!(engine.bus().gb_cart().unwrap().ram_enable_log().is_balanced());
}

#[test]
fn declined_transfer_aborts_before_streaming() {
    let rom = fixtures::gb_rom(0x00, 0x00, 0x00, "DECLINE", 0x00);
    let mut engine = gb_engine(&rom);

    let result = run_command(&mut engine, "API_READ_ROM", &[NOK]);
    assert!(matches!(result, Err(EngineError::Cart(CartError::NokReturned))));

    let output = engine.transport().output();
    let (_, rest) = split_read_response(output);
    assert_eq!(rest, &abort_frame(AbortKind::Packet, "NOK_RET")[..]);
}

#[test]
fn declined_write_never_opens_ram() {
    let rom = fixtures::gb_rom(0x03, 0x00, 0x02, "NOWRITE", 0x00);
    let mut engine = gb_engine(&rom);

    let result = run_command(&mut engine, "API_WRITE_RAM", &[0xF0]);
    assert!(matches!(result, Err(EngineError::Cart(CartError::NokReturned))));

    let mut expected = size_frame(0x2000).to_vec();
    expected.push(OK);
    expected.extend(abort_frame(AbortKind::Packet, "NOK_RET"));
    assert_eq!(engine.transport().output(), &expected[..]);
    assert_eq!(engine.bus().gb_cart().unwrap().ram_enable_log().enables, 0);
}

#[test]
fn unknown_command_leaves_cache_alone() {
    let rom = fixtures::gb_rom(0x01, 0x00, 0x00, "CACHED", 0x00);
    let mut engine = gb_engine(&rom);
    let info = engine.identify().unwrap();
    assert_eq!(info.name, b"CACHED");
    assert!(engine.session().is_populated());

    let result = run_command(&mut engine, "PING", &[]);
    assert!(matches!(result, Err(EngineError::UnknownCommand(ref line)) if line == "PING"));
    assert_eq!(
        engine.transport().output(),
        &abort_frame(AbortKind::Error, "COMMAND 'PING' UNKNOWN")[..]
    );
    assert!(engine.session().is_populated());
}

#[test]
fn handshake_is_answered_mid_line() {
    let rom = fixtures::gb_rom(0x00, 0x00, 0x00, "SHAKE", 0x00);
    let mut engine = gb_engine(&rom);

    for &byte in b"PI\x17NG\n" {
        engine.feed(byte).unwrap();
    }
    assert_eq!(engine.transport().output(), &[HANDSHAKE_ACCEPT]);
    assert!(matches!(
        engine.poll(),
        Some(Err(EngineError::UnknownCommand(ref line))) if line == "PING"
    ));
    assert!(engine.poll().is_none());
}

#[test]
fn handshake_capability_follows_accept() {
    let config = EngineConfig::builder()
        .handshake_capability(CART_MODE_AUTO)
        .build();
    let mut engine = HostEngine::new(SimBus::empty(), ScriptedTransport::default(), config);
    engine.feed(HANDSHAKE_REQUEST).unwrap();
    assert_eq!(engine.transport().output(), &[HANDSHAKE_ACCEPT, CART_MODE_AUTO]);
}

#[test]
fn empty_slot_aborts_with_fault_cart() {
    let mut engine = engine(SimBus::empty());

    let result = run_command(&mut engine, "API_READ_ROM", &[]);
    assert!(matches!(result, Err(EngineError::Cart(CartError::FaultCart))));
    assert_eq!(result.unwrap_err().code(), Some(-10));
    assert_eq!(
        engine.transport().output(),
        &abort_frame(AbortKind::Error, "FAULT_CART")[..]
    );
    assert!(!engine.session().is_populated());
}

#[test]
fn diagnostics_can_be_switched_off() {
    let config = EngineConfig::builder().diagnostics(false).build();
    let mut engine = HostEngine::new(SimBus::empty(), ScriptedTransport::default(), config);

    let _ = run_command(&mut engine, "API_READ_RAM", &[]);
    assert_eq!(engine.transport().output(), &[ABORT, AbortKind::Error.code()]);
}

#[test]
fn ram_commands_need_a_bank_controller() {
    let rom = fixtures::gb_rom(0x00, 0x00, 0x02, "ROMONLY", 0x00);
    let mut engine = gb_engine(&rom);

    let result = run_command(&mut engine, "API_READ_RAM", &[]);
    assert!(matches!(result, Err(EngineError::Cart(CartError::NoMbc))));
    assert_eq!(
        engine.transport().output(),
        &abort_frame(AbortKind::Command, "NO_MBC")[..]
    );
}

#[test]
fn cart_without_ram_reports_no_save() {
    let rom = fixtures::gb_rom(0x01, 0x00, 0x00, "NORAM", 0x00);
    let mut engine = gb_engine(&rom);

    let result = run_command(&mut engine, "API_WRITE_RAM", &[]);
    assert!(matches!(result, Err(EngineError::Cart(CartError::NoSave))));
    assert_eq!(
        engine.transport().output(),
        &abort_frame(AbortKind::Command, "NO_SAV")[..]
    );
}

#[test]
fn swapping_families_drops_the_cache() {
    let rom = fixtures::gb_rom(0x01, 0x00, 0x00, "FIRST", 0x00);
    let mut engine = gb_engine(&rom);
    assert!(matches!(
        engine.identify().unwrap().details,
        CartDetails::Gb { mbc: MbcType::Mbc1, .. }
    ));

    let gba = SimGbaCart::new(fixtures::gba_rom(0x1000, "SECOND"));
    engine.bus_mut().insert(Slot::Gba(gba));
    let info = engine.identify().unwrap();
    assert_eq!(info.name, b"SECOND");
    assert_eq!(
        info.details,
        CartDetails::Gba {
            save: SaveMemoryKind::None
        }
    );
}

#[test]
fn fixed_family_skips_mode_sense() {
    let config = EngineConfig::builder()
        .family(FamilySelect::Fixed(CartFamily::Gb))
        .build();
    let gba = SimGbaCart::new(fixtures::gba_rom(0x1000, "WRONGSLOT"));
    let mut engine = HostEngine::new(SimBus::with_gba(gba), ScriptedTransport::default(), config);
    assert!(engine.identify().is_err());
}

#[test]
fn gba_rom_dump_is_little_endian_words() {
    let rom = fixtures::gba_rom(0x20_0000, "ADVANCE");
    let mut engine = engine(SimBus::with_gba(SimGbaCart::new(rom.clone())));

    run_command(&mut engine, "API_READ_ROM", &[OK]).unwrap();

    let (metadata, payload) = split_read_response(engine.transport().output());
    assert_eq!(metadata.cart_type, CART_GBA);
    assert_eq!(metadata.name, b"ADVANCE");
    assert_eq!(metadata.size, 0x20_0000);
    assert!(payload == &rom[..], "ROM image differs");
}

#[test]
fn gba_sram_dump() {
    let rom = fixtures::gba_rom(0x1000, "SRAMDUMP");
    let save = random_bytes(0x8000, 14);
    let cart = SimGbaCart::new(rom).with_save(SimSave::sram(save.clone()));
    let mut engine = engine(SimBus::with_gba(cart));

    run_command(&mut engine, "API_READ_RAM", &[OK]).unwrap();

    let (metadata, payload) = split_read_response(engine.transport().output());
    assert_eq!(metadata.size, 0x8000);
    assert_eq!(payload, &save[..]);
}

#[test]
fn gba_flash_dump_reads_both_banks() {
    let rom = fixtures::gba_rom(0x1000, "FLASHDUMP");
    let save = random_bytes(0x20000, 15);
    let cart = SimGbaCart::new(rom).with_save(SimSave::flash(save.clone()));
    let mut engine = engine(SimBus::with_gba(cart));

    run_command(&mut engine, "API_READ_RAM", &[OK]).unwrap();

    let (metadata, payload) = split_read_response(engine.transport().output());
    assert_eq!(metadata.size, 0x20000);
    assert!(payload == &save[..], "flash image differs");
    assert_eq!(engine.bus().gba_cart().unwrap().save().data(), &save[..]);
}

#[test]
fn gba_sram_write_round_trips_through_the_cart() {
    let rom = fixtures::gba_rom(0x1000, "SRAMWRITE");
    let old = random_bytes(0x8000, 16);
    let new = random_bytes(0x8000, 17);
    let cart = SimGbaCart::new(rom).with_save(SimSave::sram(old));
    let mut engine = engine(SimBus::with_gba(cart));

    run_command(&mut engine, "API_WRITE_RAM", &write_stream(&new)).unwrap();

    let output = engine.transport().output();
    assert_eq!(&output[..6], &size_frame(0x8000));
    assert_eq!(&output[6..8], &[OK, TASK_START]);
    assert_eq!(output.last(), Some(&TASK_FINISHED));
    assert_eq!(output.len(), 8 + 2 * 0x8000 + 1);
    assert!(engine.bus().gba_cart().unwrap().save().data() == &new[..]);
}

#[test]
fn gba_flash_and_missing_saves_are_not_written() {
    let rom = fixtures::gba_rom(0x1000, "NOWRITE");
    let flash = SimSave::flash(random_bytes(0x10000, 18));
    let mut flash_engine = engine(SimBus::with_gba(SimGbaCart::new(rom.clone()).with_save(flash)));
    let result = run_command(&mut flash_engine, "API_WRITE_RAM", &[]);
    assert!(matches!(result, Err(EngineError::Cart(CartError::MbcSaveUnsupported))));
    assert_eq!(
        flash_engine.transport().output(),
        &abort_frame(AbortKind::Command, "MBC_SAVE_UNSUPPORTED")[..]
    );

    let mut bare_engine = engine(SimBus::with_gba(SimGbaCart::new(rom)));
    let result = run_command(&mut bare_engine, "API_READ_RAM", &[]);
    assert!(matches!(result, Err(EngineError::Cart(CartError::NoSave))));
    assert_eq!(
        bare_engine.transport().output(),
        &abort_frame(AbortKind::Command, "NO_SAV")[..]
    );
}

#[test]
fn serve_runs_until_the_host_hangs_up() {
    let rom = fixtures::gb_rom(0x00, 0x00, 0x00, "SERVE", 0xC0);
    let mut input = vec![HANDSHAKE_REQUEST];
    input.extend_from_slice(b"API_READ_ROM\n");
    input.push(OK);
    let transport = ScriptedTransport::new(input);
    let mut engine = HostEngine::new(
        SimBus::with_gb(SimGbCart::from_rom(&rom)),
        transport,
        EngineConfig::default(),
    );

    engine.serve().unwrap();

    let (_, output) = engine.into_parts();
    assert_eq!(output.output()[0], HANDSHAKE_ACCEPT);
    let (metadata, payload) = split_read_response(&output.output()[1..]);
    assert_eq!(metadata.cart_type, CART_GBC_ONLY);
    assert_eq!(payload, &rom[..]);
}

#[derive(Default)]
struct RecordingPort {
    bank: u8,
    writes: Vec<(u8, u32, u8)>,
}

impl RamPort for RecordingPort {
    fn select_bank(&mut self, bank: u8) {
        self.bank = bank;
    }

    fn write_and_verify(&mut self, address: u32, value: u8) -> CartResult<u8> {
        self.writes.push((self.bank, address, value));
        Ok(value)
    }
}

#[test]
fn write_verify_wraps_into_the_second_bank() {
    let layout = WriteLayout {
        start: 0xA000,
        end: 0xA004,
        banks: 2,
    };
    let data: Vec<u8> = (1..=8).collect();
    let mut host = write_stream(&data);
    host.remove(0);
    let mut transport = ScriptedTransport::new(host);
    let mut port = RecordingPort::default();

    let written = write_verify(&mut transport, &mut port, layout).unwrap();

    assert_eq!(written, 8);
    let expected: Vec<(u8, u32, u8)> = (0..8u8)
        .map(|i| (i / 4, 0xA000 + (i % 4) as u32, i + 1))
        .collect();
    assert_eq!(port.writes, expected);
    let verify: Vec<u8> = data.iter().flat_map(|&b| [VERIFY, b]).collect();
    assert_eq!(transport.output(), &verify[..]);
}

#[test]
fn write_verify_stops_when_the_host_goes_away() {
    let layout = WriteLayout {
        start: 0,
        end: 0x10,
        banks: 1,
    };
    let mut transport = ScriptedTransport::new([OK, 0x01, OK]);
    let mut port = RecordingPort::default();

    let result = write_verify(&mut transport, &mut port, layout);
    assert!(matches!(
        result,
        Err(EngineError::Transport(TransportError::Closed))
    ));
    assert_eq!(port.writes, vec![(0, 0, 0x01)]);
}
