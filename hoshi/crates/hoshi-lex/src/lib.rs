//! hoshi-lex - Scanner for HIR, the Hoshi assembly language.
//!
//! HIR source is a flat stream of whitespace-separated tokens: lowercase
//! mnemonics, decimal number literals, `"..."` string literals, `$name`
//! identifiers, and `:name` labels. `#` starts a comment that runs to the
//! end of the line.
//!
//! The scanner is deliberately dumb about strings: escape sequences pass
//! through untouched and are resolved later, when the assembler interns the
//! literal. Tokens borrow their lexemes from the source, so scanning
//! allocates nothing.

pub mod lexer;
pub mod token;

pub use lexer::{dump_tokens, Lexer};
pub use token::{Token, TokenKind};
