use cartboy_cart::gb::{RamGeometry, ROM_BANK_SIZE};
use cartboy_cart::{GbDriver, GbaDriver, MbcType, RamGuard, SaveMemoryKind};
use cartboy_common::{CartBus, CartError, CartResult, Transport, TransportError};

use super::EngineError;
use crate::protocol::{NOK, OK, TASK_FINISHED, TASK_START, VERIFY};

/// Words read between re-latches of the 24-bit address. The cartridge
/// counter only covers the low 16 bits.
const LATCH_SPAN: u32 = 0x10000;
const FLASH_BANK_SIZE: u32 = 0x10000;

/// Stream `banks` ROM banks: bank 0 from the fixed window, every other
/// bank through the switchable one.
pub(crate) fn stream_gb_rom<B: CartBus, T: Transport>(
    driver: &mut GbDriver<'_, B>,
    transport: &mut T,
    banks: u16,
) -> Result<u32, TransportError> {
    let mut buffer = Vec::with_capacity(ROM_BANK_SIZE as usize);
    for bank in 0..banks {
        let window = if bank == 0 {
            0x0000..0x4000u16
        } else {
            driver.switch_rom_bank(bank);
            0x4000..0x8000u16
        };
        buffer.clear();
        buffer.extend(window.map(|address| driver.read_byte(address)));
        transport.send_all(&buffer)?;
    }
    Ok(banks as u32 * ROM_BANK_SIZE)
}

pub(crate) fn stream_gb_ram<B: CartBus, T: Transport>(
    ram: &mut RamGuard<'_, '_, B>,
    transport: &mut T,
    geometry: RamGeometry,
) -> Result<u32, EngineError> {
    let mut buffer = Vec::with_capacity(RamGeometry::BANK_SIZE as usize);
    for bank in 0..geometry.banks {
        if ram.mbc() != MbcType::Mbc2 {
            ram.switch_ram_bank(bank);
        }
        buffer.clear();
        for address in RamGeometry::START..geometry.end_address {
            buffer.push(ram.read_ram_byte(address)?);
        }
        transport.send_all(&buffer)?;
    }
    Ok(geometry.file_size())
}

/// Stream `size` bytes of 24-bit ROM using incrementing reads.
pub(crate) fn stream_gba_rom<B: CartBus, T: Transport>(
    driver: &mut GbaDriver<'_, B>,
    transport: &mut T,
    size: u32,
) -> Result<u32, TransportError> {
    let result = send_rom_words(driver, transport, size / 2);
    driver.release();
    result.map(|()| size / 2 * 2)
}

fn send_rom_words<B: CartBus, T: Transport>(
    driver: &mut GbaDriver<'_, B>,
    transport: &mut T,
    words: u32,
) -> Result<(), TransportError> {
    let mut buffer = Vec::with_capacity(LATCH_SPAN as usize * 2);
    let mut start = 0;
    while start < words {
        let end = (start + LATCH_SPAN).min(words);
        buffer.clear();
        for address in start..end {
            let word = driver.read_word(address, address == start);
            buffer.extend_from_slice(&word.to_le_bytes());
        }
        transport.send_all(&buffer)?;
        start = end;
    }
    Ok(())
}

/// Stream a parallel save chip. 128 KiB Flash is read as two banks.
pub(crate) fn stream_gba_save<B: CartBus, T: Transport>(
    driver: &mut GbaDriver<'_, B>,
    transport: &mut T,
    kind: SaveMemoryKind,
    size: u32,
) -> Result<u32, TransportError> {
    driver.select_save_bus();
    let banked = kind == SaveMemoryKind::Flash && size > FLASH_BANK_SIZE;
    let (banks, bank_len) = if banked {
        (size / FLASH_BANK_SIZE, FLASH_BANK_SIZE)
    } else {
        (1, size)
    };

    let mut buffer = Vec::with_capacity(bank_len as usize);
    for bank in 0..banks {
        if banked {
            driver.switch_flash_bank(bank as u8);
        }
        buffer.clear();
        buffer.extend((0..bank_len).map(|address| driver.read_save_byte(address as u16)));
        transport.send_all(&buffer)?;
    }
    if banked {
        driver.switch_flash_bank(0);
    }
    Ok(banks * bank_len)
}

/// Write side of the verify loop: something that can map a bank, store a
/// byte and read it back.
pub(crate) trait RamPort {
    fn select_bank(&mut self, bank: u8);
    fn write_and_verify(&mut self, address: u32, value: u8) -> CartResult<u8>;
}

impl<B: CartBus> RamPort for RamGuard<'_, '_, B> {
    fn select_bank(&mut self, bank: u8) {
        if self.mbc() != MbcType::Mbc2 {
            self.switch_ram_bank(bank);
        }
    }

    fn write_and_verify(&mut self, address: u32, value: u8) -> CartResult<u8> {
        self.write_ram_byte(address as u16, value)?;
        self.read_ram_byte(address as u16)
    }
}

impl<B: CartBus> RamPort for GbaDriver<'_, B> {
    fn select_bank(&mut self, _bank: u8) {}

    fn write_and_verify(&mut self, address: u32, value: u8) -> CartResult<u8> {
        self.write_save_byte(address as u16, value);
        Ok(self.read_save_byte(address as u16))
    }
}

/// Address range written by the verify loop, repeated for every bank.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) struct WriteLayout {
    pub start: u32,
    /// One past the last address of a bank.
    pub end: u32,
    pub banks: u8,
}

impl From<RamGeometry> for WriteLayout {
    fn from(geometry: RamGeometry) -> Self {
        Self {
            start: RamGeometry::START as u32,
            end: geometry.end_address as u32,
            banks: geometry.banks,
        }
    }
}

/// Receive `{ack, value}` pairs from the host and write them out.
///
/// `OK` moves to the next address (the first one to `start` of bank 0)
/// and writes `value` there; `NOK` writes `value` to the current address
/// again. Both are answered with `[VERIFY, readback]`. The `OK` that would
/// move past the last bank ends the loop, so `n` bytes take `n + 1` OKs.
///
/// Returns the number of distinct addresses written.
pub(crate) fn write_verify<T: Transport, P: RamPort>(
    transport: &mut T,
    port: &mut P,
    layout: WriteLayout,
) -> Result<u32, EngineError> {
    port.select_bank(0);
    let mut bank = 0u8;
    let mut current: Option<u32> = None;
    let mut written = 0;
    loop {
        let ack = transport.recv()?;
        let value = transport.recv()?;
        let address = match (ack, current) {
            (OK, _) => {
                let mut next = current.map_or(layout.start, |address| address + 1);
                if next >= layout.end {
                    bank += 1;
                    if bank >= layout.banks {
                        break;
                    }
                    port.select_bank(bank);
                    next = layout.start;
                }
                written += 1;
                current = Some(next);
                next
            }
            (NOK, Some(address)) => address,
            (NOK, None) => {
                log::warn!("host sent NOK before any byte was written");
                return Err(CartError::PacketFailure.into());
            }
            (other, _) => {
                log::warn!("unexpected ack {other:#04X} from host");
                return Err(CartError::PacketFailure.into());
            }
        };
        let readback = port.write_and_verify(address, value)?;
        transport.send_all(&[VERIFY, readback])?;
    }
    Ok(written)
}

/// The whole 8-bit save write: RAM held open around the verify loop.
pub(crate) fn write_gb_ram<B: CartBus, T: Transport>(
    bus: &mut B,
    transport: &mut T,
    mbc: MbcType,
    geometry: RamGeometry,
) -> Result<u32, EngineError> {
    let mut driver = GbDriver::with_mbc(bus, mbc);
    let mut ram = driver.open_ram()?;
    transport.send(TASK_START)?;
    let written = write_verify(transport, &mut ram, geometry.into())?;
    transport.send(TASK_FINISHED)?;
    Ok(written)
}

/// Single-bank SRAM write on the 24-bit save bus.
pub(crate) fn write_gba_sram<B: CartBus, T: Transport>(
    bus: &mut B,
    transport: &mut T,
    size: u32,
) -> Result<u32, EngineError> {
    let mut driver = GbaDriver::new(bus);
    driver.select_save_bus();
    transport.send(TASK_START)?;
    let layout = WriteLayout {
        start: 0,
        end: size,
        banks: 1,
    };
    let written = write_verify(transport, &mut driver, layout)?;
    transport.send(TASK_FINISHED)?;
    Ok(written)
}
