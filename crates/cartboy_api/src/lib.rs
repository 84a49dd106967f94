//! Host side of the dumper: line commands in, framed binary responses out.
//!
//! [`HostEngine`] owns the cartridge bus and the host link. Bytes from the
//! host are fed in one at a time; a handshake byte is answered on the
//! spot, everything else is collected into a command line which is then
//! run to completion before the next byte is looked at.

mod command;
mod config;
mod engine;
pub mod frame;
pub mod protocol;
mod session;

pub use command::{Command, LineBuffer};
pub use config::{EngineConfig, FamilySelect};
pub use engine::{EngineError, HostEngine};
pub use session::{CachedGameInfo, CartDetails, Session};
