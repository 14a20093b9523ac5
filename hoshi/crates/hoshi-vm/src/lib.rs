//! hoshi-vm - The Hoshi stack machine.
//!
//! One [`Vm`] owns everything a program can touch at run time: the value
//! stack, the locals array and its scope stack, the global pool, and the
//! string heap. A [`Vm::run_chunk`] call borrows a compiled chunk, executes
//! it to completion, and returns either `Ok(())` or the
//! [`RuntimeError`] that stopped it; the chunk itself is never mutated.
//!
//! The machine is strictly single-threaded and synchronous. There are no
//! suspension points and no interleaving: every side effect (printing,
//! setting the exit code, allocation) happens in bytecode order.
//!
//! Set the `RUST_LOG` filter to `trace` to watch the stack and each decoded
//! instruction as the loop runs.

pub mod config;
pub mod error;
mod vm;

pub use error::{RuntimeError, RuntimeErrorKind};
pub use vm::Vm;
