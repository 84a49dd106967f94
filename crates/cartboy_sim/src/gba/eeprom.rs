use std::collections::VecDeque;

/// Serial EEPROM capacity. The size decides the width of the address
/// field in each command.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum EepromSize {
    /// 4 Kbit, 64 blocks of 8 bytes, 6 address bits.
    Kbit4,
    /// 64 Kbit, 1024 blocks of 8 bytes, 14 address bits.
    Kbit64,
}

impl EepromSize {
    pub const fn bytes(self) -> usize {
        match self {
            EepromSize::Kbit4 => 0x200,
            EepromSize::Kbit64 => 0x2000,
        }
    }

    const fn address_bits(self) -> usize {
        match self {
            EepromSize::Kbit4 => 6,
            EepromSize::Kbit64 => 14,
        }
    }
}

/// Bit-serial EEPROM. Command bits arrive on AD0 clocked by WR; a read
/// answers with 4 dummy bits and 64 data bits clocked by RD.
pub struct SimEeprom {
    size: EepromSize,
    data: Vec<u8>,
    incoming: Vec<bool>,
    outgoing: VecDeque<bool>,
    current: Option<bool>,
}

impl SimEeprom {
    pub(super) fn new(size: EepromSize, mut data: Vec<u8>) -> Self {
        data.resize(size.bytes(), 0xFF);
        Self {
            size,
            data,
            incoming: Vec::new(),
            outgoing: VecDeque::new(),
            current: None,
        }
    }

    pub(super) fn data(&self) -> &[u8] {
        &self.data
    }

    /// Bit currently presented on AD0, if a read is being answered.
    pub(super) fn data_out(&self) -> Option<bool> {
        self.current
    }

    pub(super) fn clock_in(&mut self, bit: bool) {
        self.incoming.push(bit);
        let read_len = 2 + self.size.address_bits() + 1;
        if self.incoming.len() == read_len && self.incoming[0] && self.incoming[1] {
            let address = self.incoming[2..read_len - 1]
                .iter()
                .fold(0usize, |acc, &b| (acc << 1) | b as usize);
            let block = address % (self.size.bytes() / 8);
            self.outgoing = std::iter::repeat(false)
                .take(4)
                .chain(
                    self.data[block * 8..block * 8 + 8]
                        .iter()
                        .flat_map(|byte| (0..8).rev().map(move |i| byte & (1 << i) != 0)),
                )
                .collect();
            self.current = Some(true);
        }
    }

    pub(super) fn clock_out(&mut self) {
        if self.current.is_some() {
            self.current = Some(self.outgoing.pop_front().unwrap_or(true));
        }
    }

    pub(super) fn deselect(&mut self) {
        self.incoming.clear();
        if self.outgoing.is_empty() {
            self.current = None;
        }
    }
}
