use typed_builder::TypedBuilder;

/// Thresholds used to tell a real cartridge from an empty slot.
///
/// Firmware revisions disagreed on these, so they are tunable; the
/// defaults are the ones the current hardware ships with.
#[derive(TypedBuilder, Copy, Clone, Eq, PartialEq, Debug)]
pub struct DetectConfig {
    /// 0xFF bytes among the first five header bytes (0x100..=0x104) that
    /// mark an 8-bit slot as empty.
    #[builder(default = 3)]
    pub gb_ff_fault_threshold: usize,
    /// Zero words in the 0xC0-byte 24-bit header that mark the slot as
    /// empty.
    #[builder(default = 0x30)]
    pub gba_zero_fault_threshold: usize,
    /// Words compared per candidate size by the ROM size probe. A window
    /// that reads back entirely as zero is taken as the end of the ROM.
    #[builder(default = 0x500)]
    pub open_bus_window: u32,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
