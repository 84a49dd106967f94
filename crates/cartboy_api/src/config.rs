use cartboy_cart::DetectConfig;
use cartboy_common::CartFamily;
use typed_builder::TypedBuilder;

/// How the engine decides which cartridge family is inserted.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum FamilySelect {
    /// Read the slot's mode-sense line before every command.
    Sense,
    /// Single-slot hardware without a mode-sense line.
    Fixed(CartFamily),
}

#[derive(TypedBuilder, Clone, Debug)]
pub struct EngineConfig {
    #[builder(default = FamilySelect::Sense)]
    pub family: FamilySelect,
    /// Byte sent right after the handshake accept, if any. Auto-detecting
    /// dumpers announce themselves with `CART_MODE_AUTO`.
    #[builder(default, setter(strip_option))]
    pub handshake_capability: Option<u8>,
    /// Follow every abort frame with a short ASCII reason and CRLF.
    #[builder(default = true)]
    pub diagnostics: bool,
    /// Size of the command line buffer. Two bytes are reserved, so at most
    /// `command_capacity - 2` characters of a line are kept.
    #[builder(default = 0x21)]
    pub command_capacity: usize,
    #[builder(default)]
    pub detect: DetectConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
