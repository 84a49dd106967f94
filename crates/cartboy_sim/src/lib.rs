//! A cartridge slot simulated at the pin level.
//!
//! [`SimBus`] implements [`cartboy_common::CartBus`] and reacts to strobe
//! edges the way real cartridges do: bank controller registers latch on
//! WR, 24-bit carts latch their address on CS1 and auto-increment on RD,
//! Flash chips only accept unlock sequences, and EEPROMs are clocked one
//! bit at a time. Together with [`ScriptedTransport`] it lets the drivers
//! and the protocol engine run end to end without hardware.

mod bus;
pub mod fixtures;
mod gb;
mod gba;
mod transport;

pub use bus::{SimBus, Slot, Strobes};
pub use gb::{RamEnableLog, SimGbCart};
pub use gba::{EepromSize, SimEeprom, SimFlash, SimGbaCart, SimSave};
pub use transport::ScriptedTransport;
