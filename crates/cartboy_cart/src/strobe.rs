//! Byte-wide strobe sequences shared by the 8-bit slot and the 24-bit
//! save bus.

use cartboy_common::{BusTiming, CartBus, Direction, Level, Signal};

/// Read one byte. The chip select, if any, is asserted after the address
/// is stable because MBC2 latches the address on it.
pub(crate) fn read8<B: CartBus>(
    bus: &mut B,
    timing: &BusTiming,
    select: Option<Signal>,
    address: u16,
) -> u8 {
    bus.drive_address(address);
    if let Some(cs) = select {
        bus.set_signal(cs, Level::Low);
    }
    bus.set_signal(Signal::Rd, Level::Low);
    bus.delay_ns(timing.read_settle_ns);
    let value = bus.read_data();
    bus.set_signal(Signal::Rd, Level::High);
    if let Some(cs) = select {
        bus.set_signal(cs, Level::High);
    }
    value
}

/// Write one byte, then hand the data lines back to the cartridge with
/// the pull-ups on.
pub(crate) fn write8<B: CartBus>(
    bus: &mut B,
    timing: &BusTiming,
    select: Option<Signal>,
    address: u16,
    value: u8,
) {
    bus.set_data_direction(Direction::Output);
    bus.write_data(value);
    bus.drive_address(address);
    if let Some(cs) = select {
        bus.set_signal(cs, Level::Low);
    }
    bus.set_signal(Signal::Wr, Level::Low);
    bus.delay_ns(timing.write_pulse_ns);
    bus.set_signal(Signal::Wr, Level::High);
    if let Some(cs) = select {
        bus.set_signal(cs, Level::High);
    }
    bus.set_data_direction(Direction::Input);
}
