//! hoshi-asm - The single-pass HIR assembler.
//!
//! The assembler turns HIR text into a [`Chunk`] in one pass over the token
//! stream: literals become constants, mnemonics become opcode bytes, and
//! identifiers and labels are resolved against symbol tables as they are
//! seen. Compilation runs against a [`Vm`] because the symbol side is the
//! VM's: string literals intern into the VM's heap and global names get
//! their pool indices from [`Vm::add_global`].
//!
//! Forward `goto` references are legal; they emit a placeholder operand
//! that is back-patched when the label is defined. Labels still undefined
//! at the end of input fail compilation.
//!
//! After the first compile error the parser enters panic mode and reports
//! nothing further; the chunk it was building is abandoned.

pub mod parser;

use thiserror::Error;

use hoshi_core::chunk::Chunk;
use hoshi_util::CompileFailed;
use hoshi_vm::{RuntimeError, Vm};

pub use parser::compile;

/// Why a compile-and-run failed: either phase's error, unchanged.
#[derive(Debug, Error)]
pub enum InterpretError {
    /// The source did not compile.
    #[error(transparent)]
    Compile(#[from] CompileFailed),
    /// The compiled program panicked.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Compiles `source` and immediately executes it on `vm`.
///
/// # Examples
///
/// ```
/// use hoshi_vm::Vm;
///
/// let mut vm = Vm::new();
/// hoshi_asm::run_source("1 2 add exit", &mut vm).unwrap();
/// assert_eq!(vm.exit_code(), 3);
/// ```
pub fn run_source(source: &str, vm: &mut Vm) -> Result<(), InterpretError> {
    let chunk: Chunk = compile(source, vm)?;
    vm.run_chunk(&chunk)?;
    Ok(())
}
