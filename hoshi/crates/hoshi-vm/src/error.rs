//! Runtime panics.
//!
//! A runtime error stops the current program; the loop never unwinds
//! bytecode. The error carries the source line recovered from the chunk's
//! line index so the report points at the offending instruction.

use thiserror::Error;

/// What went wrong.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// An arithmetic or comparison instruction saw a non-number operand.
    #[error("operands must be numbers")]
    ExpectedNumbers,

    /// A boolean instruction (including conditional jumps) saw a
    /// non-boolean operand.
    #[error("operands must be booleans")]
    ExpectedBooleans,

    /// `CONCAT` saw a non-string operand.
    #[error("operands must be strings")]
    ExpectedStrings,

    /// `EXIT` saw a non-number exit code.
    #[error("operand to 'exit' must be a number")]
    ExpectedExitCode,

    /// A value was popped from an empty stack.
    #[error("pop from an empty stack")]
    StackUnderflow,

    /// The value stack is full.
    #[error("stack overflow")]
    StackOverflow,

    /// A global was read or assigned before being defined.
    #[error("undefined variable '{name}'")]
    UndefinedVariable {
        /// The global's name, or a `#index` placeholder when the chunk was
        /// loaded without one.
        name: String,
    },

    /// A local-slot operand is outside the locals array.
    #[error("local slot {slot} out of range")]
    BadLocalSlot {
        /// The offending slot index.
        slot: usize,
    },

    /// A constant operand is outside the chunk's pool.
    #[error("constant index {index} out of range")]
    BadConstant {
        /// The offending pool index.
        index: usize,
    },

    /// `NEWSCOPE` at the maximum nesting depth.
    #[error("scope overflow")]
    ScopeOverflow,

    /// `ENDSCOPE` with no open scope.
    #[error("endscope without a matching newscope")]
    ScopeUnderflow,

    /// A jump resolved to before the start of the code.
    #[error("jump out of bounds")]
    BadJump,

    /// The code ended in the middle of an instruction's operands.
    #[error("truncated instruction")]
    TruncatedInstruction,

    /// A code byte that names no instruction.
    #[error("unknown opcode: {opcode}")]
    UnknownOpcode {
        /// The undecodable byte.
        opcode: u8,
    },

    /// The reserved `PUSH` opcode was executed.
    #[error("push is unimplemented")]
    PushUnimplemented,
}

/// A runtime panic, located at its source line.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("[line {line}] runtime error: {kind}")]
pub struct RuntimeError {
    /// What went wrong.
    pub kind: RuntimeErrorKind,
    /// Source line of the failing instruction, from the chunk's line index.
    pub line: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_includes_line_and_kind() {
        let error = RuntimeError {
            kind: RuntimeErrorKind::StackUnderflow,
            line: 7,
        };
        assert_eq!(
            error.to_string(),
            "[line 7] runtime error: pop from an empty stack"
        );
    }

    #[test]
    fn undefined_variable_names_the_global() {
        let error = RuntimeError {
            kind: RuntimeErrorKind::UndefinedVariable {
                name: "x".to_string(),
            },
            line: 2,
        };
        assert_eq!(
            error.to_string(),
            "[line 2] runtime error: undefined variable 'x'"
        );
    }
}
