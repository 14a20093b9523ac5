//! Compile-error collection and rendering.
//!
//! The assembler is single-pass and keeps going after the first error so a
//! source file's problems surface in one run. Errors are accumulated in a
//! [`Diagnostics`] collector and rendered line-by-line in the toolchain's
//! standard format:
//!
//! ```text
//! [line 3] error at 'jmup': invalid operator
//! [line 7] error at end: expected a label after 'goto'
//! ```

use std::fmt;

use thiserror::Error;

/// Where in the source an error points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorAt {
    /// A concrete lexeme, quoted in the rendered message.
    Token(String),
    /// End of input.
    End,
    /// No usable location (e.g. the lexeme itself was the problem and is
    /// already part of the message).
    Nowhere,
}

/// A single compile error with its source line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based source line the error was detected on.
    pub line: u32,
    /// What the error points at.
    pub at: ErrorAt,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.at {
            ErrorAt::Token(lexeme) => {
                write!(f, "[line {}] error at '{}': {}", self.line, lexeme, self.message)
            }
            ErrorAt::End => write!(f, "[line {}] error at end: {}", self.line, self.message),
            ErrorAt::Nowhere => write!(f, "[line {}] error: {}", self.line, self.message),
        }
    }
}

/// Collector for compile errors.
///
/// # Examples
///
/// ```
/// use hoshi_util::{Diagnostics, ErrorAt};
///
/// let mut diagnostics = Diagnostics::new();
/// diagnostics.error(3, ErrorAt::Token("jmup".to_string()), "invalid operator");
///
/// assert!(diagnostics.has_errors());
/// assert_eq!(
///     diagnostics.to_string(),
///     "[line 3] error at 'jmup': invalid operator",
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error.
    pub fn error(&mut self, line: u32, at: ErrorAt, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            line,
            at,
            message: message.into(),
        });
    }

    /// Whether any error was recorded.
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Number of recorded errors.
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Whether the collector is empty.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Iterates the recorded errors in report order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Wraps the collector into the error type compilation returns.
    pub fn into_failure(self) -> CompileFailed {
        CompileFailed { diagnostics: self }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

/// Compilation failed with one or more diagnostics.
///
/// Returned by the assembler when the source did not compile. Rendering the
/// error prints every diagnostic, one per line.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{diagnostics}")]
pub struct CompileFailed {
    /// The errors that caused the failure, in report order.
    pub diagnostics: Diagnostics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_token_location() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.error(12, ErrorAt::Token("$x".to_string()), "unknown local");
        assert_eq!(
            diagnostics.to_string(),
            "[line 12] error at '$x': unknown local"
        );
    }

    #[test]
    fn renders_end_location() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.error(4, ErrorAt::End, "expected an offset after 'jump'");
        assert_eq!(
            diagnostics.to_string(),
            "[line 4] error at end: expected an offset after 'jump'"
        );
    }

    #[test]
    fn renders_bare_location() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.error(1, ErrorAt::Nowhere, "unterminated string");
        assert_eq!(diagnostics.to_string(), "[line 1] error: unterminated string");
    }

    #[test]
    fn multiple_errors_one_per_line() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.error(1, ErrorAt::Nowhere, "first");
        diagnostics.error(2, ErrorAt::Nowhere, "second");
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(
            diagnostics.to_string(),
            "[line 1] error: first\n[line 2] error: second"
        );
    }

    #[test]
    fn empty_collector_has_no_errors() {
        let diagnostics = Diagnostics::new();
        assert!(!diagnostics.has_errors());
        assert!(diagnostics.is_empty());
        assert_eq!(diagnostics.to_string(), "");
    }

    #[test]
    fn failure_renders_diagnostics() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.error(9, ErrorAt::Token("push".to_string()), "push is reserved");
        let failure = diagnostics.into_failure();
        assert_eq!(
            failure.to_string(),
            "[line 9] error at 'push': push is reserved"
        );
    }
}
