use thiserror::Error;

pub type CartResult<T> = Result<T, CartError>;

/// Failures reported by the cartridge drivers and the protocol engine.
///
/// Every variant maps onto the small negative code the firmware has
/// always reported, see [`CartError::code`].
#[derive(Error, Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum CartError {
    #[error("boot logo does not match")]
    LogoCheckFailed,
    #[error("header declares no RAM")]
    NoInfo,
    #[error("cartridge missing or not responding")]
    FaultCart,
    #[error("cartridge has no memory bank controller")]
    NoMbc,
    #[error("memory bank controller not supported")]
    MbcUnsupported,
    #[error("save size not supported by this controller")]
    MbcSaveUnsupported,
    #[error("cartridge has no save memory")]
    NoSave,
    #[error("unexpected acknowledgment packet from host")]
    PacketFailure,
    #[error("host did not acknowledge")]
    NokReturned,
}

impl CartError {
    pub const fn code(self) -> i8 {
        match self {
            CartError::LogoCheckFailed => -8,
            CartError::NoInfo => -9,
            CartError::FaultCart => -10,
            CartError::NoMbc => -20,
            CartError::MbcUnsupported => -21,
            CartError::MbcSaveUnsupported => -22,
            CartError::NoSave => -29,
            CartError::PacketFailure => -30,
            CartError::NokReturned => -31,
        }
    }

    /// Short tag written to the host after an abort frame.
    pub const fn diagnostic(self) -> &'static str {
        match self {
            CartError::LogoCheckFailed => "LOGO_CHECK",
            CartError::NoInfo => "NO_INFO",
            CartError::FaultCart => "FAULT_CART",
            CartError::NoMbc => "NO_MBC",
            CartError::MbcUnsupported => "MBC_UNSUPPORTED",
            CartError::MbcSaveUnsupported => "MBC_SAVE_UNSUPPORTED",
            CartError::NoSave => "NO_SAV",
            CartError::PacketFailure => "PCKT_FAILURE",
            CartError::NokReturned => "NOK_RET",
        }
    }
}
