//! hoshi-core - Values, chunks, and the string heap of the Hoshi runtime.
//!
//! This crate defines everything the VM executes and the assembler emits,
//! without containing either of them:
//!
//! - [`value::Value`]: the tagged runtime value (number, bool, nil, string).
//! - [`heap::Heap`]: the arena that owns every string object and interns
//!   identical contents down to one [`heap::StrId`].
//! - [`table::Table`]: the open-addressed hash table used for interning and
//!   for mapping global names to pool indices.
//! - [`chunk::Chunk`]: the compiled unit - instruction bytes, constant pool,
//!   and a run-length-compressed line index.
//! - [`opcode::OpCode`]: the instruction set.
//! - [`chunk_io`]: the binary chunk file format (magic, version gate,
//!   constants, code, line markers).
//! - [`disasm`]: a human-readable chunk listing.
//!
//! The dependency direction is strictly upward: the VM and the assembler
//! both build on this crate and never the other way around.

pub mod chunk;
pub mod chunk_io;
pub mod disasm;
pub mod heap;
pub mod opcode;
pub mod table;
pub mod value;

pub use chunk::{Chunk, ChunkError, LineStart};
pub use chunk_io::{read_chunk, write_chunk, ChunkIoError, MAGIC, MIN_READ_VERSION};
pub use heap::{EscapeError, Heap, StrId};
pub use opcode::{OpCode, UnknownOpcode};
pub use table::Table;
pub use value::Value;
