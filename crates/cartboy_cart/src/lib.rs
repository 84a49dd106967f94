//! Cartridge drivers for both slot families.
//!
//! The drivers borrow a [`CartBus`](cartboy_common::CartBus) for the
//! duration of one operation and turn it into byte/word reads, bank
//! switching and the identification and geometry probes.

mod config;
pub mod gb;
pub mod gba;
mod strobe;

pub use config::DetectConfig;
pub use gb::{CartKind, GbDriver, GbHeader, MbcType, RamGeometry, RamGuard};
pub use gba::{EepromType, GbaDriver, GbaHeader, SaveMemoryKind};
