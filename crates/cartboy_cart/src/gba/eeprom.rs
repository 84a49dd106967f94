use cartboy_common::{CartBus, Direction, Level, Signal};

use super::{EepromType, GbaDriver};

impl<B: CartBus> GbaDriver<'_, B> {
    fn clock_bit(&mut self, bit: bool) {
        self.bus.drive_address(bit as u16);
        self.bus.set_signal(Signal::Wr, Level::Low);
        self.bus.delay_ns(self.timing.serial_clock_ns);
        self.bus.set_signal(Signal::Wr, Level::High);
        self.bus.delay_ns(self.timing.serial_clock_ns);
    }

    fn clock_in(&mut self) -> bool {
        self.bus.set_signal(Signal::Rd, Level::Low);
        self.bus.delay_ns(self.timing.serial_clock_ns);
        self.bus.set_signal(Signal::Rd, Level::High);
        self.bus.delay_ns(self.timing.serial_clock_ns);
        self.bus.read_address() & 0x0001 != 0
    }

    /// Read one 8-byte block from a serial EEPROM.
    ///
    /// The command goes out MSB first on AD0, one WR pulse per bit,
    /// followed by a zero stop bit. The EEPROM answers with four dummy
    /// bits and then 64 data bits, one per RD pulse.
    pub fn eeprom_read(&mut self, block: u16, kind: EepromType, buffer: &mut [u8; 8]) {
        let (command, bits) = kind.read_command(block);
        let mask = 1u16 << (bits - 1);

        self.bus.set_signal(Signal::Rd, Level::High);
        self.bus.set_signal(Signal::Wr, Level::High);
        self.bus.set_signal(Signal::Cs2, Level::High);
        self.bus.set_address_direction(Direction::Output);
        self.bus.set_signal(Signal::Cs1, Level::Low);
        for i in 0..bits {
            self.clock_bit((command << i) & mask != 0);
        }
        self.clock_bit(false);
        self.bus.set_signal(Signal::Cs1, Level::High);

        self.bus.set_address_direction(Direction::Input);
        self.bus.set_signal(Signal::Cs1, Level::Low);
        for _ in 0..4 {
            self.clock_in();
        }
        for byte in buffer.iter_mut() {
            *byte = (0..8).fold(0u8, |acc, _| (acc << 1) | self.clock_in() as u8);
        }
        self.bus.set_signal(Signal::Cs1, Level::High);
    }
}
