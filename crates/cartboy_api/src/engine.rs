mod transfer;

#[cfg(test)]
mod tests;

use cartboy_cart::gb::{rom_bank_count, RamGeometry, ROM_BANK_SIZE};
use cartboy_cart::{CartKind, GbDriver, GbaDriver, MbcType, SaveMemoryKind};
use cartboy_common::{
    CartBus, CartError, CartFamily, CartResult, Signal, Transport, TransportError,
};
use thiserror::Error;

use crate::command::{Command, LineBuffer};
use crate::config::{EngineConfig, FamilySelect};
use crate::frame::{size_frame, Metadata};
use crate::protocol::{
    AbortKind, ABORT, CART_GB, CART_GBA, CART_GBC_HYBRID, CART_GBC_ONLY, CART_UNKNOWN,
    HANDSHAKE_ACCEPT, HANDSHAKE_REQUEST, OK,
};
use crate::session::{CachedGameInfo, CartDetails, Session};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Cart(#[from] CartError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
}

impl EngineError {
    /// Firmware error code, for failures that have one.
    pub fn code(&self) -> Option<i8> {
        match self {
            EngineError::Cart(error) => Some(error.code()),
            _ => None,
        }
    }
}

/// Protocol engine serving one host over one cartridge slot.
///
/// Commands run one at a time and to completion; while one runs, the
/// transport is only read by the command itself.
pub struct HostEngine<B: CartBus, T: Transport> {
    bus: B,
    transport: T,
    config: EngineConfig,
    session: Session,
    line: LineBuffer,
    family: Option<CartFamily>,
}

impl<B: CartBus, T: Transport> HostEngine<B, T> {
    pub fn new(bus: B, transport: T, config: EngineConfig) -> Self {
        let line = LineBuffer::new(config.command_capacity);
        Self {
            bus,
            transport,
            config,
            session: Session::new(),
            line,
            family: None,
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Direct access to the slot, e.g. to swap a simulated cartridge.
    /// Follow up with [`HostEngine::invalidate`] if the cartridge changed.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn invalidate(&mut self) {
        self.session.invalidate();
    }

    pub fn into_parts(self) -> (B, T) {
        (self.bus, self.transport)
    }

    /// Serve the host until it closes the link.
    ///
    /// Failed commands are reported to the host and logged; only transport
    /// errors other than a closed link or a timeout end the loop early.
    pub fn serve(&mut self) -> Result<(), EngineError> {
        log::info!("waiting for host commands");
        loop {
            let byte = match self.transport.recv() {
                Ok(byte) => byte,
                Err(TransportError::Closed) => break,
                Err(TransportError::TimedOut) => continue,
                Err(error) => return Err(error.into()),
            };
            self.feed(byte)?;
            match self.poll() {
                None | Some(Ok(())) => {}
                Some(Err(EngineError::Transport(TransportError::Closed))) => break,
                Some(Err(EngineError::Transport(TransportError::TimedOut))) => {
                    log::warn!("host stopped answering, command dropped");
                }
                Some(Err(EngineError::Transport(error))) => return Err(error.into()),
                Some(Err(error)) => log::debug!("command failed: {error}"),
            }
        }
        log::info!("host closed the link");
        Ok(())
    }

    /// Hand one byte from the host to the engine.
    ///
    /// A handshake request is answered right away and never reaches the
    /// command line.
    pub fn feed(&mut self, byte: u8) -> Result<(), TransportError> {
        if byte == HANDSHAKE_REQUEST {
            log::debug!("handshake");
            self.transport.send(HANDSHAKE_ACCEPT)?;
            if let Some(capability) = self.config.handshake_capability {
                self.transport.send(capability)?;
            }
            return self.transport.flush();
        }
        self.line.push(byte);
        Ok(())
    }

    /// Run the pending command line, if one is complete.
    pub fn poll(&mut self) -> Option<Result<(), EngineError>> {
        let line = self.line.take()?;
        Some(self.process_line(&line))
    }

    pub fn process_line(&mut self, line: &str) -> Result<(), EngineError> {
        let Some(command) = Command::parse(line) else {
            log::warn!("unknown command {line:?}");
            self.send_abort(AbortKind::Error, &format!("COMMAND '{line}' UNKNOWN"))?;
            return Err(EngineError::UnknownCommand(line.to_owned()));
        };

        log::info!("{} started", command.keyword());
        let family = self.select_family();
        let result = self.execute(command, family);
        self.session.invalidate();
        self.transport.flush()?;
        match &result {
            Ok(()) => log::info!("{} finished", command.keyword()),
            Err(error) => log::warn!("{} failed: {error}", command.keyword()),
        }
        result
    }

    /// Identify the inserted cartridge, or return what is already known
    /// about it.
    pub fn identify(&mut self) -> CartResult<CachedGameInfo> {
        let family = self.select_family();
        self.identify_as(family)
    }

    fn select_family(&mut self) -> CartFamily {
        let family = match self.config.family {
            FamilySelect::Sense => {
                CartFamily::from_mode_sense(self.bus.read_signal(Signal::ModeSense))
            }
            FamilySelect::Fixed(family) => family,
        };
        if self.family != Some(family) {
            log::info!("{family} cartridge slot selected");
            self.bus.configure_pins();
            self.session.invalidate();
            self.family = Some(family);
        }
        family
    }

    fn identify_as(&mut self, family: CartFamily) -> CartResult<CachedGameInfo> {
        if let Some(info) = self.session.info() {
            return Ok(info.clone());
        }
        let result = match family {
            CartFamily::Gb => self.identify_gb(),
            CartFamily::Gba => self.identify_gba(),
        };
        match result {
            Ok(info) => {
                log::debug!("identified {:?} as {:?}", info.display_name(), info.details);
                self.session.populate(info.clone());
                Ok(info)
            }
            Err(error) => {
                self.session.invalidate();
                Err(error)
            }
        }
    }

    fn identify_gb(&mut self) -> CartResult<CachedGameInfo> {
        let header = GbDriver::new(&mut self.bus).read_header(&self.config.detect)?;
        Ok(CachedGameInfo {
            name: header.name().to_vec(),
            details: CartDetails::Gb {
                cart_flag: header.cart_flag(),
                mbc: header.mbc(),
                rom_size_code: header.rom_size_code(),
                ram_size_code: header.ram_size_code(),
            },
            file_size: 0,
        })
    }

    fn identify_gba(&mut self) -> CartResult<CachedGameInfo> {
        let mut driver = GbaDriver::new(&mut self.bus);
        let header = driver.read_header(&self.config.detect)?;
        let save = driver.probe_save_kind();
        Ok(CachedGameInfo {
            name: header.name().to_vec(),
            details: CartDetails::Gba { save },
            file_size: 0,
        })
    }

    fn execute(&mut self, command: Command, family: CartFamily) -> Result<(), EngineError> {
        let info = match self.identify_as(family) {
            Ok(info) => info,
            Err(error) => return Err(self.abort(AbortKind::Error, error)),
        };
        log::info!("{family} cartridge {:?}", info.display_name());

        match (command, info.details.clone()) {
            (Command::ReadRom, CartDetails::Gb { mbc, rom_size_code, .. }) => {
                self.read_gb_rom(&info, mbc, rom_size_code)
            }
            (Command::ReadRam, CartDetails::Gb { mbc, ram_size_code, .. }) => {
                self.read_gb_ram(&info, mbc, ram_size_code)
            }
            (Command::WriteRam, CartDetails::Gb { mbc, ram_size_code, .. }) => {
                self.write_gb_ram(mbc, ram_size_code)
            }
            (Command::ReadRom, CartDetails::Gba { .. }) => self.read_gba_rom(&info),
            (Command::ReadRam, CartDetails::Gba { save }) => self.read_gba_save(&info, save),
            (Command::WriteRam, CartDetails::Gba { save }) => self.write_gba_save(save),
        }
    }

    fn read_gb_rom(
        &mut self,
        info: &CachedGameInfo,
        mbc: MbcType,
        rom_size_code: u8,
    ) -> Result<(), EngineError> {
        let banks = rom_bank_count(rom_size_code);
        let size = banks as u32 * ROM_BANK_SIZE;
        GbDriver::new(&mut self.bus).reset();
        self.announce(info, size)?;

        let mut driver = GbDriver::with_mbc(&mut self.bus, mbc);
        let sent = transfer::stream_gb_rom(&mut driver, &mut self.transport, banks)?;
        log::debug!("sent {sent:#X} bytes of ROM in {banks} banks");
        Ok(())
    }

    fn read_gb_ram(
        &mut self,
        info: &CachedGameInfo,
        mbc: MbcType,
        ram_size_code: u8,
    ) -> Result<(), EngineError> {
        let geometry = match gb_ram_geometry(mbc, ram_size_code) {
            Ok(geometry) => geometry,
            Err(error) => return Err(self.abort(AbortKind::Command, error)),
        };
        GbDriver::new(&mut self.bus).reset();
        self.announce(info, geometry.file_size())?;

        let mut driver = GbDriver::with_mbc(&mut self.bus, mbc);
        let mut ram = driver.open_ram()?;
        let sent = transfer::stream_gb_ram(&mut ram, &mut self.transport, geometry)?;
        log::debug!("sent {sent:#X} bytes of RAM in {} banks", geometry.banks);
        Ok(())
    }

    fn write_gb_ram(&mut self, mbc: MbcType, ram_size_code: u8) -> Result<(), EngineError> {
        let geometry = match gb_ram_geometry(mbc, ram_size_code) {
            Ok(geometry) => geometry,
            Err(error) => return Err(self.abort(AbortKind::Command, error)),
        };
        let size = geometry.file_size();
        self.session.record_file_size(size);
        GbDriver::new(&mut self.bus).reset();
        self.transport.send_all(&size_frame(size))?;
        self.await_host_ok()?;

        let outcome = transfer::write_gb_ram(&mut self.bus, &mut self.transport, mbc, geometry);
        GbDriver::new(&mut self.bus).reset();
        self.finish_write(outcome)
    }

    fn read_gba_rom(&mut self, info: &CachedGameInfo) -> Result<(), EngineError> {
        let size = GbaDriver::new(&mut self.bus).probe_rom_size(&self.config.detect);
        self.announce(info, size)?;

        let mut driver = GbaDriver::new(&mut self.bus);
        let sent = transfer::stream_gba_rom(&mut driver, &mut self.transport, size)?;
        log::debug!("sent {sent:#X} bytes of ROM");
        Ok(())
    }

    fn read_gba_save(
        &mut self,
        info: &CachedGameInfo,
        save: SaveMemoryKind,
    ) -> Result<(), EngineError> {
        let (kind, size) = GbaDriver::new(&mut self.bus).probe_ram_size(save);
        self.session.record_save_kind(kind);
        if size == 0 {
            return Err(self.abort(AbortKind::Command, CartError::NoSave));
        }
        log::debug!("{kind:?} save of {size:#X} bytes");
        self.announce(info, size)?;

        let mut driver = GbaDriver::new(&mut self.bus);
        let sent = transfer::stream_gba_save(&mut driver, &mut self.transport, kind, size)?;
        log::debug!("sent {sent:#X} bytes of save memory");
        Ok(())
    }

    fn write_gba_save(&mut self, save: SaveMemoryKind) -> Result<(), EngineError> {
        let (kind, size) = GbaDriver::new(&mut self.bus).probe_ram_size(save);
        self.session.record_save_kind(kind);
        match kind {
            SaveMemoryKind::Sram => {}
            SaveMemoryKind::Flash | SaveMemoryKind::Eeprom(_) => {
                log::warn!("writing {kind:?} saves is not supported");
                return Err(self.abort(AbortKind::Command, CartError::MbcSaveUnsupported));
            }
            SaveMemoryKind::None | SaveMemoryKind::SramOrFlash => {
                return Err(self.abort(AbortKind::Command, CartError::NoSave));
            }
        }
        self.session.record_file_size(size);
        self.transport.send_all(&size_frame(size))?;
        self.await_host_ok()?;

        let outcome = transfer::write_gba_sram(&mut self.bus, &mut self.transport, size);
        self.finish_write(outcome)
    }

    fn finish_write(&mut self, outcome: Result<u32, EngineError>) -> Result<(), EngineError> {
        match outcome {
            Ok(written) => {
                log::info!("wrote {written:#X} bytes");
                Ok(())
            }
            Err(EngineError::Cart(error)) => {
                let kind = match error {
                    CartError::PacketFailure => AbortKind::Packet,
                    _ => AbortKind::Command,
                };
                Err(self.abort(kind, error))
            }
            Err(error) => Err(error),
        }
    }

    /// Send the metadata frames and wait for the host to accept them.
    fn announce(&mut self, info: &CachedGameInfo, size: u32) -> Result<(), EngineError> {
        self.session.record_file_size(size);
        let metadata = Metadata {
            cart_type: cart_type_code(&info.details),
            name: info.name.clone(),
            size,
        };
        self.transport.send_all(&metadata.encode())?;
        self.await_host_ok()
    }

    /// Offer OK and read the host's answer. Anything but OK aborts.
    fn await_host_ok(&mut self) -> Result<(), EngineError> {
        self.transport.send(OK)?;
        self.transport.flush()?;
        match self.transport.recv() {
            Ok(OK) => Ok(()),
            Ok(other) => {
                log::warn!("host answered {other:#04X} instead of OK");
                Err(self.abort(AbortKind::Packet, CartError::NokReturned))
            }
            Err(error) => {
                log::warn!("no answer from host: {error}");
                Err(self.abort(AbortKind::Packet, CartError::NokReturned))
            }
        }
    }

    /// Report `error` to the host. Returns the error to propagate, which
    /// is the transport failure if the abort frame could not be sent.
    fn abort(&mut self, kind: AbortKind, error: CartError) -> EngineError {
        log::warn!("abort {kind:?}: {error} ({})", error.code());
        match self.send_abort(kind, error.diagnostic()) {
            Ok(()) => error.into(),
            Err(transport) => transport.into(),
        }
    }

    fn send_abort(&mut self, kind: AbortKind, diagnostic: &str) -> Result<(), TransportError> {
        self.transport.send_all(&[ABORT, kind.code()])?;
        if self.config.diagnostics {
            self.transport.send_all(diagnostic.as_bytes())?;
            self.transport.send_all(b"\r\n")?;
        }
        self.transport.flush()
    }
}

/// RAM layout of an 8-bit cartridge, checking the controller first.
fn gb_ram_geometry(mbc: MbcType, ram_size_code: u8) -> CartResult<RamGeometry> {
    match mbc {
        MbcType::None => Err(CartError::NoMbc),
        MbcType::Unsupported => Err(CartError::MbcUnsupported),
        _ => RamGeometry::new(mbc, ram_size_code).map_err(|error| match error {
            CartError::NoInfo => CartError::NoSave,
            other => other,
        }),
    }
}

fn cart_type_code(details: &CartDetails) -> u8 {
    match details {
        CartDetails::Gba { .. } => CART_GBA,
        CartDetails::Gb { cart_flag, .. } => match CartKind::from_cart_flag(*cart_flag) {
            CartKind::GbOnly => CART_GB,
            CartKind::Hybrid => CART_GBC_HYBRID,
            CartKind::GbcOnly => CART_GBC_ONLY,
            CartKind::Unknown => CART_UNKNOWN,
        },
    }
}
