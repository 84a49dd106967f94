use cartboy_cart::{MbcType, SaveMemoryKind};

/// Family-specific facts learned during identification.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum CartDetails {
    Gb {
        /// CGB flag (0x143), zero for old-licensee headers.
        cart_flag: u8,
        mbc: MbcType,
        rom_size_code: u8,
        ram_size_code: u8,
    },
    Gba {
        save: SaveMemoryKind,
    },
}

/// What the engine knows about the inserted cartridge.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct CachedGameInfo {
    pub name: Vec<u8>,
    pub details: CartDetails,
    /// Size of the last transfer prepared for this cartridge, zero until
    /// one has been.
    pub file_size: u32,
}

impl CachedGameInfo {
    pub fn display_name(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }
}

/// Identification computed once per cartridge insertion.
///
/// The engine fills it on the first command after an insertion and drops
/// it whenever the cartridge may have changed.
#[derive(Clone, Debug, Default)]
pub struct Session {
    info: Option<CachedGameInfo>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_populated(&self) -> bool {
        self.info.is_some()
    }

    pub fn invalidate(&mut self) {
        if self.info.take().is_some() {
            log::debug!("cartridge info invalidated");
        }
    }

    pub fn info(&self) -> Option<&CachedGameInfo> {
        self.info.as_ref()
    }

    pub fn populate(&mut self, info: CachedGameInfo) {
        self.info = Some(info);
    }

    pub(crate) fn record_file_size(&mut self, size: u32) {
        if let Some(info) = self.info.as_mut() {
            info.file_size = size;
        }
    }

    pub(crate) fn record_save_kind(&mut self, kind: SaveMemoryKind) {
        if let Some(CachedGameInfo {
            details: CartDetails::Gba { save },
            ..
        }) = self.info.as_mut()
        {
            *save = kind;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn populate_then_invalidate() {
        let mut session = Session::new();
        assert!(!session.is_populated());

        session.populate(CachedGameInfo {
            name: b"TETRIS".to_vec(),
            details: CartDetails::Gb {
                cart_flag: 0,
                mbc: MbcType::None,
                rom_size_code: 0,
                ram_size_code: 0,
            },
            file_size: 0,
        });
        session.record_file_size(0x8000);
        assert!(session.is_populated());
        assert_eq!(session.info().map(|i| i.file_size), Some(0x8000));
        assert_eq!(session.info().map(|i| i.display_name()).as_deref(), Some("TETRIS"));

        session.invalidate();
        assert!(!session.is_populated());
        session.invalidate();
        assert!(session.info().is_none());
    }
}
