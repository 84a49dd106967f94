//! Bench firmware: the dumper protocol served against a simulated slot.
//!
//! Host tools can be developed without hardware by pointing them at a
//! pseudo terminal (`--device`) or at this process's stdin/stdout. Logs go
//! to stderr and never mix with the protocol stream.

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use cartboy_api::protocol::CART_MODE_AUTO;
use cartboy_api::{EngineConfig, FamilySelect, HostEngine};
use cartboy_cart::gba::FIXED_VALUE;
use cartboy_common::{CartBus, CartFamily, IoTransport, TracingBus, Transport};
use cartboy_sim::{EepromSize, SimBus, SimGbCart, SimGbaCart, SimSave, Slot};
use typed_builder::TypedBuilder;

#[derive(TypedBuilder, Clone, Debug)]
pub struct RunOptions {
    pub rom: PathBuf,
    /// Save image loaded into the cartridge and written back when the
    /// host disconnects.
    #[builder(default)]
    pub save: Option<PathBuf>,
    /// Serial device or pseudo terminal. Stdin/stdout when unset.
    #[builder(default)]
    pub device: Option<PathBuf>,
    /// Cartridge family of the image. Guessed from the image when unset.
    #[builder(default)]
    pub family: Option<CartFamily>,
    /// Model a 64 KiB 24-bit save as Flash instead of SRAM.
    #[builder(default = false)]
    pub flash: bool,
    /// Log every bus transition at trace level.
    #[builder(default = false)]
    pub trace: bool,
    #[builder(default = true)]
    pub diagnostics: bool,
}

pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<RunOptions, String> {
    let mut args = args.into_iter();
    let mut rom = None;
    let mut save = None;
    let mut device = None;
    let mut family = None;
    let mut flash = false;
    let mut trace = false;
    let mut diagnostics = true;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--save" | "-s" => save = Some(PathBuf::from(value_of(&mut args, &arg)?)),
            "--device" | "-d" => device = Some(PathBuf::from(value_of(&mut args, &arg)?)),
            "--gb" => family = Some(CartFamily::Gb),
            "--gba" => family = Some(CartFamily::Gba),
            "--flash" => flash = true,
            "--trace" => trace = true,
            "--no-diagnostics" => diagnostics = false,
            other if other.starts_with('-') => return Err(format!("unknown option '{other}'")),
            _ if rom.is_some() => return Err(format!("unexpected argument '{arg}'")),
            _ => rom = Some(PathBuf::from(&arg)),
        }
    }

    let Some(rom) = rom else {
        return Err("no ROM image given".to_string());
    };
    Ok(RunOptions::builder()
        .rom(rom)
        .save(save)
        .device(device)
        .family(family)
        .flash(flash)
        .trace(trace)
        .diagnostics(diagnostics)
        .build())
}

fn value_of(args: &mut impl Iterator<Item = String>, option: &str) -> Result<String, String> {
    args.next().ok_or_else(|| format!("'{option}' needs a value"))
}

/// 24-bit images carry the fixed header value at 0xB2.
pub fn guess_family(rom: &[u8]) -> CartFamily {
    match rom.get(0xB2) {
        Some(&FIXED_VALUE) => CartFamily::Gba,
        _ => CartFamily::Gb,
    }
}

/// Save chip modelled for a 24-bit save image of this size.
fn gba_save(data: &[u8], flash: bool) -> SimSave {
    match data.len() {
        0x200 => SimSave::eeprom(EepromSize::Kbit4, data.to_vec()),
        0x2000 => SimSave::eeprom(EepromSize::Kbit64, data.to_vec()),
        0x20000 => SimSave::flash(data.to_vec()),
        0x10000 if flash => SimSave::flash(data.to_vec()),
        _ => SimSave::sram(data.to_vec()),
    }
}

pub fn build_slot(family: CartFamily, rom: Vec<u8>, save: Option<&[u8]>, flash: bool) -> Slot {
    match family {
        CartFamily::Gb => {
            let mut cart = SimGbCart::from_rom(&rom);
            if let Some(save) = save {
                cart.load_ram(save);
            }
            Slot::Gb(cart)
        }
        CartFamily::Gba => {
            let cart = SimGbaCart::new(rom);
            match save {
                Some(save) => Slot::Gba(cart.with_save(gba_save(save, flash))),
                None => Slot::Gba(cart),
            }
        }
    }
}

/// Current contents of the inserted cartridge's save memory.
pub fn save_contents(slot: &Slot) -> Option<&[u8]> {
    match slot {
        Slot::Empty => None,
        Slot::Gb(cart) => Some(cart.ram()),
        Slot::Gba(cart) => Some(cart.save().data()),
    }
}

pub fn run(options: RunOptions) -> Result<()> {
    let rom = fs::read(&options.rom)
        .with_context(|| format!("failed to read ROM image {}", options.rom.display()))?;
    if rom.is_empty() {
        bail!("ROM image {} is empty", options.rom.display());
    }
    let save = match &options.save {
        Some(path) => Some(
            fs::read(path).with_context(|| format!("failed to read save {}", path.display()))?,
        ),
        None => None,
    };

    let family = options.family.unwrap_or_else(|| guess_family(&rom));
    log::info!("serving {family} image of {:#X} bytes", rom.len());
    let bus = SimBus::new(build_slot(family, rom, save.as_deref(), options.flash));
    let config = EngineConfig::builder()
        .family(FamilySelect::Sense)
        .handshake_capability(CART_MODE_AUTO)
        .diagnostics(options.diagnostics)
        .build();

    let bus = if options.trace {
        serve_on(TracingBus::new(bus), options.device.as_deref(), config)?.into_inner()
    } else {
        serve_on(bus, options.device.as_deref(), config)?
    };

    if let (Some(path), Some(data)) = (&options.save, save_contents(bus.slot())) {
        fs::write(path, data).with_context(|| format!("failed to write save {}", path.display()))?;
        log::info!("save written back to {}", path.display());
    }
    Ok(())
}

fn serve_on<B: CartBus>(bus: B, device: Option<&Path>, config: EngineConfig) -> Result<B> {
    match device {
        Some(path) => {
            let port = OpenOptions::new()
                .read(true)
                .write(true)
                .open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            let writer = port.try_clone().context("failed to clone device handle")?;
            log::info!("listening on {}", path.display());
            serve(bus, IoTransport::new(port, BufWriter::new(writer)), config)
        }
        None => {
            let transport = IoTransport::new(io::stdin().lock(), BufWriter::new(io::stdout().lock()));
            serve(bus, transport, config)
        }
    }
}

/// Run the engine until the host hangs up and hand the bus back.
pub fn serve<B: CartBus, T: Transport>(bus: B, transport: T, config: EngineConfig) -> Result<B> {
    let mut engine = HostEngine::new(bus, transport, config);
    engine.serve().context("protocol engine stopped")?;
    let (bus, _) = engine.into_parts();
    Ok(bus)
}
