/// Commands the host can send, one per line.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Command {
    ReadRom,
    ReadRam,
    WriteRam,
}

impl Command {
    pub const ALL: [Command; 3] = [Command::ReadRom, Command::ReadRam, Command::WriteRam];

    pub const fn keyword(self) -> &'static str {
        match self {
            Command::ReadRom => "API_READ_ROM",
            Command::ReadRam => "API_READ_RAM",
            Command::WriteRam => "API_WRITE_RAM",
        }
    }

    /// Match a received line. Trailing characters after the keyword are
    /// ignored.
    pub fn parse(line: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|command| line.starts_with(command.keyword()))
    }
}

/// Collects host bytes into a command line.
///
/// CR or LF ends a non-empty line. Once a line is ready further bytes are
/// dropped until it is taken, and characters past the buffer limit are
/// dropped as well.
pub struct LineBuffer {
    buf: Vec<u8>,
    limit: usize,
    ready: bool,
}

impl LineBuffer {
    /// A buffer of `capacity` bytes, two of which are reserved.
    pub fn new(capacity: usize) -> Self {
        let limit = capacity.saturating_sub(2);
        Self {
            buf: Vec::with_capacity(limit),
            limit,
            ready: false,
        }
    }

    /// Append a byte. Returns whether a complete line is waiting.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.ready {
            return true;
        }
        match byte {
            b'\n' | b'\r' => self.ready = !self.buf.is_empty(),
            _ if self.buf.len() < self.limit => self.buf.push(byte),
            _ => {}
        }
        self.ready
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn take(&mut self) -> Option<String> {
        if !self.ready {
            return None;
        }
        self.ready = false;
        let line = std::mem::take(&mut self.buf);
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.ready = false;
    }
}
