//! The HIR scanner.
//!
//! Byte-oriented, zero-allocation: tokens borrow slices of the source. The
//! scanner never reports through a diagnostics channel itself - a scan
//! problem becomes a [`TokenKind::Error`] token whose lexeme is the
//! message, and the parser decides what to do with it.

use std::fmt::Write as _;

use crate::token::{keyword, Token, TokenKind};

fn is_alpha(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

fn is_digit(byte: u8) -> bool {
    byte.is_ascii_digit()
}

/// Identifier continuation set: letters, digits, `$`, and `-`.
fn is_ident(byte: u8) -> bool {
    is_alpha(byte) || is_digit(byte) || byte == b'$' || byte == b'-'
}

/// The scanner.
///
/// # Examples
///
/// ```
/// use hoshi_lex::{Lexer, TokenKind};
///
/// let mut lexer = Lexer::new("1 2 add print return");
/// assert_eq!(lexer.scan_token().kind, TokenKind::Number);
/// assert_eq!(lexer.scan_token().kind, TokenKind::Number);
/// assert_eq!(lexer.scan_token().kind, TokenKind::Add);
/// ```
pub struct Lexer<'src> {
    source: &'src str,
    /// Start of the token being scanned.
    start: usize,
    /// Next unconsumed byte.
    current: usize,
    /// 1-based current line.
    line: u32,
}

impl<'src> Lexer<'src> {
    /// Creates a scanner over `source`.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            start: 0,
            current: 0,
            line: 1,
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn peek(&self) -> u8 {
        self.source.as_bytes().get(self.current).copied().unwrap_or(0)
    }

    fn advance(&mut self) -> u8 {
        let byte = self.peek();
        self.current += 1;
        byte
    }

    fn lexeme_from(&self, start: usize) -> &'src str {
        &self.source[start..self.current]
    }

    fn make_token(&self, kind: TokenKind) -> Token<'src> {
        Token {
            kind,
            lexeme: self.lexeme_from(self.start),
            line: self.line,
        }
    }

    fn error_token(&self, message: &'static str) -> Token<'src> {
        Token {
            kind: TokenKind::Error,
            lexeme: message,
            line: self.line,
        }
    }

    fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                b' ' | b'\r' | b'\t' => {
                    self.current += 1;
                }
                b'\n' => {
                    self.line += 1;
                    self.current += 1;
                }
                b'#' => {
                    while !self.is_at_end() && self.peek() != b'\n' {
                        self.current += 1;
                    }
                }
                _ => return,
            }
        }
    }

    /// Scans the next token. Returns an `Eof` token forever once the source
    /// is exhausted.
    pub fn scan_token(&mut self) -> Token<'src> {
        self.skip_whitespace();
        self.start = self.current;

        if self.is_at_end() {
            return self.make_token(TokenKind::Eof);
        }

        let byte = self.advance();
        if is_alpha(byte) {
            return self.operator();
        }
        if is_digit(byte) {
            return self.number();
        }
        match byte {
            b'$' => self.sigiled(TokenKind::Ident),
            b':' => self.sigiled(TokenKind::Label),
            b'"' => self.string(),
            _ => self.error_token("unexpected character"),
        }
    }

    /// A word that must be a mnemonic.
    fn operator(&mut self) -> Token<'src> {
        while is_alpha(self.peek()) || is_digit(self.peek()) {
            self.current += 1;
        }
        match keyword(self.lexeme_from(self.start)) {
            Some(kind) => self.make_token(kind),
            None => self.error_token("invalid operator"),
        }
    }

    /// Decimal digits with an optional fractional part.
    fn number(&mut self) -> Token<'src> {
        while is_digit(self.peek()) {
            self.current += 1;
        }

        if self.peek() == b'.' {
            let next = self.source.as_bytes().get(self.current + 1).copied();
            if next.is_some_and(|b| is_digit(b)) {
                self.current += 1; // the '.'
                while is_digit(self.peek()) {
                    self.current += 1;
                }
            }
        }

        self.make_token(TokenKind::Number)
    }

    /// An identifier or label; the sigil is excluded from the lexeme.
    fn sigiled(&mut self, kind: TokenKind) -> Token<'src> {
        let name_start = self.current;
        while is_ident(self.peek()) {
            self.current += 1;
        }
        Token {
            kind,
            lexeme: self.lexeme_from(name_start),
            line: self.line,
        }
    }

    /// A string literal. No escape interpretation happens here; the
    /// assembler resolves escapes when it interns the contents.
    fn string(&mut self) -> Token<'src> {
        let contents_start = self.current;
        while !self.is_at_end() && self.peek() != b'"' {
            if self.peek() == b'\n' {
                self.line += 1;
            }
            self.current += 1;
        }

        if self.is_at_end() {
            return self.error_token("unterminated string");
        }

        let token = Token {
            kind: TokenKind::Str,
            lexeme: self.lexeme_from(contents_start),
            line: self.line,
        };
        self.current += 1; // closing quote
        token
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Token<'src>> {
        let token = self.scan_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}

/// Renders the token stream as a debug listing, one token per line with the
/// source line in the left column (`|` for repeats):
///
/// ```text
///    1 NUMBER '1'
///    | ADD 'add'
///    2 EOF ''
/// ```
pub fn dump_tokens(source: &str) -> String {
    let mut lexer = Lexer::new(source);
    let mut out = String::new();
    let mut last_line = 0;

    loop {
        let token = lexer.scan_token();
        if token.line != last_line {
            let _ = write!(out, "{:4} ", token.line);
            last_line = token.line;
        } else {
            out.push_str("   | ");
        }
        let _ = writeln!(out, "{} '{}'", token.kind.name(), token.lexeme);

        if token.kind == TokenKind::Eof {
            return out;
        }
    }
}
