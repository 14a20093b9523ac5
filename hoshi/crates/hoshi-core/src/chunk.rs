//! The compiled unit: code bytes, constant pool, and line index.
//!
//! A [`Chunk`] is what the assembler produces, what the VM executes, and
//! what the chunk file format persists. The line index is run-length
//! compressed: a [`LineStart`] is appended only when the source line
//! changes, and [`Chunk::get_line`] recovers the line for any instruction
//! offset by binary search.

use thiserror::Error;

use crate::opcode::OpCode;
use crate::value::Value;

/// Marks the code offset where a source line begins.
///
/// Successive records have strictly increasing offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineStart {
    /// Index into [`Chunk::code`] of the first byte written for the line.
    pub offset: usize,
    /// The 1-based source line.
    pub line: u32,
}

/// Constant pool indices are encoded in at most three bytes.
pub const MAX_CONSTANTS: usize = 1 << 24;

/// The chunk cannot represent more constants.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ChunkError {
    /// The constant pool reached [`MAX_CONSTANTS`].
    #[error("too many constants in one chunk (limit {MAX_CONSTANTS})")]
    TooManyConstants,
}

/// A unit of compiled bytecode.
///
/// # Examples
///
/// ```
/// use hoshi_core::{Chunk, OpCode, Value};
///
/// let mut chunk = Chunk::new();
/// chunk.write_constant(Value::Number(1.2), 1).unwrap();
/// chunk.write(OpCode::Return.into(), 1);
///
/// assert_eq!(chunk.code, [OpCode::Constant as u8, 0, OpCode::Return as u8]);
/// assert_eq!(chunk.get_line(2), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Chunk {
    /// Opcode bytes and inline operands.
    pub code: Vec<u8>,
    /// The constant pool. Indices are stable within the chunk.
    pub constants: Vec<Value>,
    /// Run-length-compressed line index, strictly increasing by offset.
    pub lines: Vec<LineStart>,
}

impl Chunk {
    /// Creates an empty chunk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one byte, recording `line` if it differs from the last
    /// recorded line.
    pub fn write(&mut self, byte: u8, line: u32) {
        self.code.push(byte);

        if self.lines.last().map(|start| start.line) == Some(line) {
            return;
        }
        self.lines.push(LineStart {
            offset: self.code.len() - 1,
            line,
        });
    }

    /// Appends a value to the constant pool and returns its index.
    pub fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    /// Adds `value` to the pool and emits the instruction that loads it:
    /// `CONSTANT` with a one-byte index when it fits, `CONSTANT_LONG` with a
    /// three-byte little-endian index otherwise.
    pub fn write_constant(&mut self, value: Value, line: u32) -> Result<(), ChunkError> {
        let index = self.add_constant(value);
        if index < 256 {
            self.write(OpCode::Constant.into(), line);
            self.write(index as u8, line);
        } else if index < MAX_CONSTANTS {
            self.write(OpCode::ConstantLong.into(), line);
            self.write(index as u8, line);
            self.write((index >> 8) as u8, line);
            self.write((index >> 16) as u8, line);
        } else {
            return Err(ChunkError::TooManyConstants);
        }
        Ok(())
    }

    /// The source line owning the instruction at `offset`: the line of the
    /// greatest record whose offset is not past it. Returns 0 for a chunk
    /// with no line records.
    pub fn get_line(&self, offset: usize) -> u32 {
        let following = self.lines.partition_point(|start| start.offset <= offset);
        match following {
            0 => 0,
            i => self.lines[i - 1].line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn write_tracks_line_changes_only() {
        let mut chunk = Chunk::new();
        chunk.write(1, 10);
        chunk.write(2, 10);
        chunk.write(3, 11);
        chunk.write(4, 11);
        chunk.write(5, 13);

        assert_eq!(
            chunk.lines,
            [
                LineStart { offset: 0, line: 10 },
                LineStart { offset: 2, line: 11 },
                LineStart { offset: 4, line: 13 },
            ]
        );
    }

    #[test]
    fn get_line_finds_owning_record() {
        let mut chunk = Chunk::new();
        for (byte, line) in [(0u8, 1), (1, 1), (2, 2), (3, 4), (4, 4), (5, 4)] {
            chunk.write(byte, line);
        }

        assert_eq!(chunk.get_line(0), 1);
        assert_eq!(chunk.get_line(1), 1);
        assert_eq!(chunk.get_line(2), 2);
        assert_eq!(chunk.get_line(3), 4);
        assert_eq!(chunk.get_line(5), 4);
        // Offsets past the end still land in the last run.
        assert_eq!(chunk.get_line(100), 4);
    }

    #[test]
    fn get_line_on_empty_chunk() {
        assert_eq!(Chunk::new().get_line(0), 0);
    }

    #[test]
    fn small_constant_uses_short_form() {
        let mut chunk = Chunk::new();
        chunk.write_constant(Value::Number(1.0), 1).unwrap();
        assert_eq!(chunk.code, [OpCode::Constant as u8, 0]);
    }

    #[test]
    fn constant_256_uses_long_form() {
        let mut chunk = Chunk::new();
        for i in 0..256 {
            chunk.write_constant(Value::Number(i as f64), 1).unwrap();
        }
        // The 255th index was still short form...
        let short_len = 256 * 2;
        assert_eq!(chunk.code.len(), short_len);

        // ...and the 256th switches to CONSTANT_LONG with index 0x000100.
        chunk.write_constant(Value::Number(256.0), 1).unwrap();
        assert_eq!(
            &chunk.code[short_len..],
            [OpCode::ConstantLong as u8, 0x00, 0x01, 0x00]
        );
    }

    #[test]
    fn offsets_strictly_increase() {
        let mut chunk = Chunk::new();
        for i in 0..50u8 {
            chunk.write(i, u32::from(i / 3) + 1);
        }
        for pair in chunk.lines.windows(2) {
            assert!(pair[0].offset < pair[1].offset);
        }
    }

    proptest! {
        /// `get_line` agrees with a naive scan over the records.
        #[test]
        fn get_line_matches_linear_scan(
            lines in proptest::collection::vec(1u32..200, 1..40),
            probe in 0usize..300,
        ) {
            let mut chunk = Chunk::new();
            for i in 0..lines.len() {
                // Prefix sums keep the line numbers monotone; two bytes per line.
                let line = lines[..=i].iter().sum::<u32>();
                chunk.write(i as u8, line);
                chunk.write(i as u8, line);
            }

            let expected = chunk
                .lines
                .iter()
                .take_while(|start| start.offset <= probe)
                .last()
                .map_or(0, |start| start.line);
            prop_assert_eq!(chunk.get_line(probe), expected);
        }
    }
}
