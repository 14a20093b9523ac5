//! Build-time sizing of the machine.
//!
//! These are deliberately fixed arrays rather than growable vectors: a
//! runaway program hits a checked limit instead of eating the host's
//! memory.

/// Maximum value-stack depth.
pub const STACK_SIZE: usize = 256;

/// Number of local variable slots.
pub const LOCALS_SIZE: usize = 256;

/// Maximum nesting of `NEWSCOPE` frames.
pub const MAX_SCOPE_DEPTH: usize = 64;

/// Maximum number of distinct global variables; global operands are one
/// byte.
pub const MAX_GLOBALS: usize = 256;
