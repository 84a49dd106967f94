use crate::{BusTiming, Direction, Level, Signal};

/// Abstraction over the cartridge slot pins.
///
/// Implementations only change electrical state; every protocol detail
/// (strobe order, latching, bank registers) lives in the drivers built on
/// top of this trait. Real GPIO back-ends, port expanders and the
/// simulated slot used by the tests are all interchangeable here.
pub trait CartBus {
    fn set_signal(&mut self, signal: Signal, level: Level);
    fn read_signal(&mut self, signal: Signal) -> Level;

    /// Drive the 16 address lines (AD0..AD15 on the 24-bit family).
    fn drive_address(&mut self, value: u16);
    fn set_address_direction(&mut self, direction: Direction);
    /// Sample the 16 address lines. Only meaningful while they are inputs.
    fn read_address(&mut self) -> u16;

    fn set_data_direction(&mut self, direction: Direction);
    fn write_data(&mut self, value: u8);
    fn read_data(&mut self) -> u8;

    /// Setup and hold times of this wiring.
    fn timing(&self) -> BusTiming;

    /// Busy-wait for at least `ns` nanoseconds.
    ///
    /// The default does nothing, which is correct for back-ends whose
    /// pin accesses are already slower than the cartridge.
    fn delay_ns(&mut self, _ns: u32) {}

    /// Put the slot into its idle state: address lines driven to zero,
    /// data lines pulled up, every control strobe released.
    ///
    /// Both families share the same idle configuration.
    fn configure_pins(&mut self) {
        self.set_address_direction(Direction::Output);
        self.drive_address(0);
        self.set_data_direction(Direction::Input);
        for signal in Signal::CONTROL {
            self.set_signal(signal, Level::High);
        }
    }
}

/// Bus decorator that logs every pin transition at `trace` level.
///
/// Handy when bringing up a new wiring: `RUST_LOG=cartboy_common=trace`
/// prints the exact strobe sequence each driver produces.
pub struct TracingBus<B> {
    inner: B,
}

impl<B: CartBus> TracingBus<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut B {
        &mut self.inner
    }

    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B: CartBus> CartBus for TracingBus<B> {
    fn set_signal(&mut self, signal: Signal, level: Level) {
        log::trace!("{:?} <- {:?}", signal, level);
        self.inner.set_signal(signal, level);
    }

    fn read_signal(&mut self, signal: Signal) -> Level {
        let level = self.inner.read_signal(signal);
        log::trace!("{:?} -> {:?}", signal, level);
        level
    }

    fn drive_address(&mut self, value: u16) {
        log::trace!("addr <- {:#06X}", value);
        self.inner.drive_address(value);
    }

    fn set_address_direction(&mut self, direction: Direction) {
        log::trace!("addr dir {:?}", direction);
        self.inner.set_address_direction(direction);
    }

    fn read_address(&mut self) -> u16 {
        let value = self.inner.read_address();
        log::trace!("addr -> {:#06X}", value);
        value
    }

    fn set_data_direction(&mut self, direction: Direction) {
        log::trace!("data dir {:?}", direction);
        self.inner.set_data_direction(direction);
    }

    fn write_data(&mut self, value: u8) {
        log::trace!("data <- {:#04X}", value);
        self.inner.write_data(value);
    }

    fn read_data(&mut self) -> u8 {
        let value = self.inner.read_data();
        log::trace!("data -> {:#04X}", value);
        value
    }

    fn timing(&self) -> BusTiming {
        self.inner.timing()
    }

    fn delay_ns(&mut self, ns: u32) {
        self.inner.delay_ns(ns);
    }
}
