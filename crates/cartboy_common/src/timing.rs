use typed_builder::TypedBuilder;

/// Setup and hold times a bus wiring needs between strobes.
///
/// The defaults match a direct-GPIO wiring on a 16 MHz part, where each
/// value corresponds to a couple of `nop`s. Slower wirings (port
/// expanders, shift registers) can set everything to zero because the
/// pin accesses themselves take longer than the cartridge needs.
#[derive(TypedBuilder, Copy, Clone, Eq, PartialEq, Debug)]
pub struct BusTiming {
    /// Delay between pulling RD low and sampling the data lines.
    #[builder(default = 250)]
    pub read_settle_ns: u32,
    /// Width of the WR low pulse.
    #[builder(default = 125)]
    pub write_pulse_ns: u32,
    /// Delay after CS1 falls on the 24-bit family before the first read.
    #[builder(default = 250)]
    pub latch_settle_ns: u32,
    /// Half period of the EEPROM serial clock.
    #[builder(default = 0)]
    pub serial_clock_ns: u32,
}

impl BusTiming {
    /// No waits at all, for simulated or inherently slow buses.
    pub const NONE: BusTiming = BusTiming {
        read_settle_ns: 0,
        write_pulse_ns: 0,
        latch_settle_ns: 0,
        serial_clock_ns: 0,
    };
}

impl Default for BusTiming {
    fn default() -> Self {
        Self::builder().build()
    }
}
