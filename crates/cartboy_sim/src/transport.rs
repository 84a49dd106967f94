use std::collections::VecDeque;

use cartboy_common::{Transport, TransportError};

/// In-memory host link.
///
/// Input bytes are queued up front; everything the engine sends is
/// appended to `output`. Running out of input reads as a closed link.
#[derive(Default)]
pub struct ScriptedTransport {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

impl ScriptedTransport {
    pub fn new(input: impl IntoIterator<Item = u8>) -> Self {
        Self {
            input: input.into_iter().collect(),
            output: Vec::new(),
        }
    }

    pub fn push_input(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied());
    }

    pub fn remaining_input(&self) -> usize {
        self.input.len()
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, byte: u8) -> Result<(), TransportError> {
        self.output.push(byte);
        Ok(())
    }

    fn recv(&mut self) -> Result<u8, TransportError> {
        self.input.pop_front().ok_or(TransportError::Closed)
    }
}
