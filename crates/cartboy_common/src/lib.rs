mod bus;
mod error;
mod timing;
mod transport;

pub use bus::{CartBus, TracingBus};
pub use error::{CartError, CartResult};
pub use timing::BusTiming;
pub use transport::{IoTransport, Transport, TransportError};

/// Electrical level of a single control line.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Level {
    Low,
    High,
}

impl Level {
    #[inline]
    pub const fn is_low(self) -> bool {
        matches!(self, Level::Low)
    }

    #[inline]
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

/// Direction of a group of bus lines, seen from the dumper.
///
/// `Input` leaves the lines floating with the pull-ups enabled, so an
/// undriven data bus reads back as `0xFF`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Direction {
    Input,
    Output,
}

/// Named control lines of the cartridge slot.
///
/// The chip selects change meaning with the cartridge family:
///
/// | signal | 8-bit family      | 24-bit family        |
/// |--------|-------------------|----------------------|
/// | `Cs1`  | SRAM select       | ROM select / latch   |
/// | `Cs2`  | cartridge reset   | SRAM / Flash select  |
///
/// `ModeSense` is an input only; it is pulled up and grounded by the
/// 24-bit slot adapter.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Signal {
    Rd,
    Wr,
    Cs1,
    Cs2,
    ModeSense,
}

impl Signal {
    pub const CONTROL: [Signal; 4] = [Signal::Rd, Signal::Wr, Signal::Cs1, Signal::Cs2];
}

/// The two cartridge families the slot accepts.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum CartFamily {
    /// 16-bit address bus with an 8-bit data bus and bank controllers.
    Gb,
    /// 24-bit latched address bus with 16-bit words.
    Gba,
}

impl CartFamily {
    /// Family selected by the level of the mode-sense line.
    #[inline]
    pub const fn from_mode_sense(level: Level) -> Self {
        match level {
            Level::Low => CartFamily::Gba,
            Level::High => CartFamily::Gb,
        }
    }
}

impl std::fmt::Display for CartFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CartFamily::Gb => write!(f, "8-bit"),
            CartFamily::Gba => write!(f, "24-bit"),
        }
    }
}
