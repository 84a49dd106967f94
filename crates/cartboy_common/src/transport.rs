use std::io::{ErrorKind, Read, Write};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("link closed by the host")]
    Closed,
    #[error("timed out waiting for the host")]
    TimedOut,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Byte link to the host computer.
///
/// `recv` blocks until a byte arrives; implementations with a liveness
/// limit report [`TransportError::TimedOut`] instead of blocking forever.
pub trait Transport {
    fn send(&mut self, byte: u8) -> Result<(), TransportError>;
    fn recv(&mut self) -> Result<u8, TransportError>;

    fn send_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        for &byte in bytes {
            self.send(byte)?;
        }
        Ok(())
    }

    /// Push buffered output to the host.
    fn flush(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, byte: u8) -> Result<(), TransportError> {
        (**self).send(byte)
    }

    fn recv(&mut self) -> Result<u8, TransportError> {
        (**self).recv()
    }

    fn send_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).send_all(bytes)
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        (**self).flush()
    }
}

/// Transport over any `std::io` reader/writer pair (serial device,
/// stdin/stdout, a socket split in two).
pub struct IoTransport<R, W> {
    reader: R,
    writer: W,
}

impl<R: Read, W: Write> IoTransport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl<R: Read, W: Write> Transport for IoTransport<R, W> {
    fn send(&mut self, byte: u8) -> Result<(), TransportError> {
        self.writer.write_all(&[byte])?;
        Ok(())
    }

    fn send_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.writer.write_all(bytes)?;
        Ok(())
    }

    fn recv(&mut self) -> Result<u8, TransportError> {
        // The host only answers what it has seen.
        self.writer.flush()?;
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(_) => return Ok(buf[0]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    return Err(TransportError::TimedOut)
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.writer.flush()?;
        Ok(())
    }
}
