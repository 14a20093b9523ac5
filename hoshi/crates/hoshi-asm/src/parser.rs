//! The single-pass parser.
//!
//! One token of lookahead (`current`), the token just consumed
//! (`previous`), and a rule per construct. Errors go through
//! [`Parser::error_at`], which flips panic mode: after the first error the
//! parser keeps consuming tokens but reports nothing more until the end of
//! input.

use indexmap::IndexMap;

use hoshi_core::chunk::Chunk;
use hoshi_core::heap::{format_string, StrId};
use hoshi_core::opcode::OpCode;
use hoshi_core::value::Value;
use hoshi_lex::{Lexer, Token, TokenKind};
use hoshi_util::{CompileFailed, Diagnostics, ErrorAt};
use hoshi_vm::config::{LOCALS_SIZE, MAX_SCOPE_DEPTH};
use hoshi_vm::Vm;

/// A local the parser has allocated a slot for. The slot index is the
/// local's position in the parser's list, mirroring the VM's allocation
/// order.
struct LocalSym {
    name: StrId,
    depth: u32,
}

/// A label and the `goto` sites waiting on it.
struct LabelSym {
    /// Code offset of the definition, once seen.
    target: Option<u32>,
    /// Operand offsets of forward references to patch at definition.
    patches: Vec<usize>,
    /// Spelling and line of the first mention, for unresolved-label errors.
    text: String,
    line: u32,
}

struct Parser<'src, 'vm> {
    lexer: Lexer<'src>,
    current: Token<'src>,
    previous: Token<'src>,
    had_error: bool,
    panic_mode: bool,
    diagnostics: Diagnostics,
    chunk: Chunk,
    vm: &'vm mut Vm,
    locals: Vec<LocalSym>,
    scope_depth: u32,
    labels: IndexMap<StrId, LabelSym>,
}

/// Compiles HIR source into a chunk.
///
/// Interns string literals into `vm`'s heap and registers global names
/// through [`Vm::add_global`], so the chunk must be run on the same VM
/// (or saved to disk, where names are no longer needed).
///
/// # Examples
///
/// ```
/// use hoshi_core::OpCode;
/// use hoshi_vm::Vm;
///
/// let mut vm = Vm::new();
/// let chunk = hoshi_asm::compile("1 2 add print return", &mut vm).unwrap();
/// assert_eq!(chunk.code.last(), Some(&(OpCode::Return as u8)));
/// ```
pub fn compile(source: &str, vm: &mut Vm) -> Result<Chunk, CompileFailed> {
    let placeholder = Token {
        kind: TokenKind::Eof,
        lexeme: "",
        line: 1,
    };
    let mut parser = Parser {
        lexer: Lexer::new(source),
        current: placeholder,
        previous: placeholder,
        had_error: false,
        panic_mode: false,
        diagnostics: Diagnostics::new(),
        chunk: Chunk::new(),
        vm,
        locals: Vec::new(),
        scope_depth: 0,
        labels: IndexMap::new(),
    };

    parser.advance();
    while !parser.check(TokenKind::Eof) {
        parser.operation();
    }
    parser.finish()
}

impl<'src> Parser<'src, '_> {
    // ------------------------------------------------------------------
    // Token plumbing
    // ------------------------------------------------------------------

    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.lexer.scan_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            let token = self.current;
            self.error_at(token, token.lexeme);
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Consumes the next token if it has the expected kind, reporting
    /// `message` otherwise. Returns the consumed token on success.
    fn expect(&mut self, kind: TokenKind, message: &str) -> Option<Token<'src>> {
        if self.check(kind) {
            self.advance();
            Some(self.previous)
        } else {
            let token = self.current;
            self.error_at(token, message);
            None
        }
    }

    // ------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------

    fn error_at(&mut self, token: Token<'src>, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.had_error = true;

        let at = match token.kind {
            TokenKind::Eof => ErrorAt::End,
            // The lexeme is the scan error's own message; repeating it as a
            // location would be noise.
            TokenKind::Error => ErrorAt::Nowhere,
            _ => ErrorAt::Token(token.lexeme.to_string()),
        };
        self.diagnostics.error(token.line, at, message);
    }

    fn error(&mut self, message: &str) {
        let token = self.previous;
        self.error_at(token, message);
    }

    // ------------------------------------------------------------------
    // Emit helpers
    // ------------------------------------------------------------------

    fn emit(&mut self, op: OpCode) {
        self.chunk.write(op.into(), self.previous.line);
    }

    fn emit_byte(&mut self, byte: u8) {
        self.chunk.write(byte, self.previous.line);
    }

    fn emit_constant(&mut self, value: Value) {
        if self
            .chunk
            .write_constant(value, self.previous.line)
            .is_err()
        {
            self.error("too many constants in one chunk");
        }
    }

    fn intern(&mut self, text: &str) -> StrId {
        self.vm.heap_mut().intern(text.as_bytes())
    }

    // ------------------------------------------------------------------
    // Rules
    // ------------------------------------------------------------------

    /// One top-level operation: a literal, a mnemonic with its operands, or
    /// a label definition.
    fn operation(&mut self) {
        self.advance();
        match self.previous.kind {
            TokenKind::Number => self.number_literal(),
            TokenKind::Str => self.string_literal(),
            TokenKind::Label => self.define_label(),

            TokenKind::True => self.emit(OpCode::True),
            TokenKind::False => self.emit(OpCode::False),
            TokenKind::Nil => self.emit(OpCode::Nil),

            TokenKind::Pop => self.emit(OpCode::Pop),
            TokenKind::Add => self.emit(OpCode::Add),
            TokenKind::Sub => self.emit(OpCode::Sub),
            TokenKind::Mul => self.emit(OpCode::Mul),
            TokenKind::Div => self.emit(OpCode::Div),
            TokenKind::Negate => self.emit(OpCode::Negate),
            TokenKind::Not => self.emit(OpCode::Not),
            TokenKind::And => self.emit(OpCode::And),
            TokenKind::Or => self.emit(OpCode::Or),
            TokenKind::Xor => self.emit(OpCode::Xor),
            TokenKind::Eq => self.emit(OpCode::Eq),
            TokenKind::Neq => self.emit(OpCode::Neq),
            TokenKind::Gt => self.emit(OpCode::Gt),
            TokenKind::Lt => self.emit(OpCode::Lt),
            TokenKind::GtEq => self.emit(OpCode::GtEq),
            TokenKind::LtEq => self.emit(OpCode::LtEq),
            TokenKind::Concat => self.emit(OpCode::Concat),
            TokenKind::Print => self.emit(OpCode::Print),
            TokenKind::Return => self.emit(OpCode::Return),
            TokenKind::Exit => self.emit(OpCode::Exit),

            TokenKind::DefGlobal => self.global_op(OpCode::DefGlobal),
            TokenKind::SetGlobal => self.global_op(OpCode::SetGlobal),
            TokenKind::GetGlobal => self.global_op(OpCode::GetGlobal),

            TokenKind::DefLocal => self.def_local(),
            TokenKind::SetLocal => self.local_op(OpCode::SetLocal),
            TokenKind::GetLocal => self.local_op(OpCode::GetLocal),

            TokenKind::NewScope => self.new_scope(),
            TokenKind::EndScope => self.end_scope(),

            TokenKind::Jump => self.jump_op(OpCode::Jump, false),
            TokenKind::JumpIf => self.jump_op(OpCode::JumpIf, false),
            TokenKind::BackJump => self.jump_op(OpCode::Jump, true),
            TokenKind::BackJumpIf => self.jump_op(OpCode::JumpIf, true),
            TokenKind::Goto => self.goto_op(OpCode::Goto),
            TokenKind::GotoIf => self.goto_op(OpCode::GotoIf),

            TokenKind::Push => self.error("push is reserved"),
            TokenKind::Ident => self.error("expected an operation"),

            // `advance` never hands these out as `previous` here: errors
            // are skipped and EOF ends the loop in `compile`.
            TokenKind::Error | TokenKind::Eof => {}
        }
    }

    fn number_literal(&mut self) {
        match self.previous.lexeme.parse::<f64>() {
            Ok(value) => self.emit_constant(Value::Number(value)),
            Err(_) => self.error("invalid number literal"),
        }
    }

    /// A string literal: resolve escapes, intern, emit as a constant.
    fn string_literal(&mut self) {
        match format_string(self.previous.lexeme.as_bytes()) {
            Ok(bytes) => {
                let id = self.vm.heap_mut().intern_owned(bytes);
                self.emit_constant(Value::Str(id));
            }
            Err(escape_error) => {
                let message = escape_error.to_string();
                self.error(&message);
            }
        }
    }

    fn global_op(&mut self, op: OpCode) {
        let Some(token) = self.expect(TokenKind::Ident, "expected a variable name") else {
            return;
        };
        let name = self.intern(token.lexeme);
        match self.vm.add_global(name) {
            Some(index) => {
                self.emit(op);
                self.emit_byte(index);
            }
            None => self.error_at(token, "too many globals"),
        }
    }

    fn def_local(&mut self) {
        let Some(token) = self.expect(TokenKind::Ident, "expected a variable name") else {
            return;
        };
        let name = self.intern(token.lexeme);

        if self
            .locals
            .iter()
            .any(|local| local.depth == self.scope_depth && local.name == name)
        {
            self.error_at(token, "a local with this name already exists in this scope");
            return;
        }
        if self.locals.len() >= LOCALS_SIZE {
            self.error_at(token, "too many locals");
            return;
        }

        let slot = self.locals.len() as u8;
        self.locals.push(LocalSym {
            name,
            depth: self.scope_depth,
        });
        self.emit(OpCode::DefLocal);
        self.emit_byte(slot);
    }

    fn local_op(&mut self, op: OpCode) {
        let Some(token) = self.expect(TokenKind::Ident, "expected a variable name") else {
            return;
        };
        let name = self.intern(token.lexeme);

        // Nearest enclosing definition wins.
        match self.locals.iter().rposition(|local| local.name == name) {
            Some(slot) => {
                self.emit(op);
                self.emit_byte(slot as u8);
            }
            None => self.error_at(token, "unknown local"),
        }
    }

    fn new_scope(&mut self) {
        if self.scope_depth as usize >= MAX_SCOPE_DEPTH {
            self.error("too many nested scopes");
            return;
        }
        self.scope_depth += 1;
        self.emit(OpCode::NewScope);
    }

    fn end_scope(&mut self) {
        if self.scope_depth == 0 {
            self.error("endscope without a matching newscope");
            return;
        }
        self.scope_depth -= 1;
        while self
            .locals
            .last()
            .is_some_and(|local| local.depth > self.scope_depth)
        {
            self.locals.pop();
        }
        self.emit(OpCode::EndScope);
    }

    /// `jump`/`jump_if` take a literal byte offset; the `back_` spellings
    /// emit the same opcodes with the offset negated (two's-complement
    /// wrapping, decoded as a signed 16-bit value by the VM).
    fn jump_op(&mut self, op: OpCode, backwards: bool) {
        let Some(token) = self.expect(TokenKind::Number, "expected a jump offset") else {
            return;
        };
        let Ok(offset) = token.lexeme.parse::<u32>() else {
            self.error_at(token, "invalid jump offset");
            return;
        };
        if offset >= u32::from(u16::MAX) {
            self.error_at(token, "jump offset out of range");
            return;
        }

        let mut encoded = offset as u16;
        if backwards {
            encoded = encoded.wrapping_neg();
        }
        self.emit(op);
        let [lo, hi] = encoded.to_le_bytes();
        self.emit_byte(lo);
        self.emit_byte(hi);
    }

    /// `goto`/`goto_if` take a `:label` reference. A reference to a label
    /// defined later emits a placeholder and records the patch site.
    fn goto_op(&mut self, op: OpCode) {
        let Some(token) = self.expect(TokenKind::Label, "expected a label") else {
            return;
        };
        let name = self.intern(token.lexeme);

        let resolved = self.labels.get(&name).and_then(|label| label.target);
        self.emit(op);
        let site = self.chunk.code.len();
        for byte in resolved.unwrap_or(0).to_le_bytes() {
            self.emit_byte(byte);
        }

        if resolved.is_none() {
            let label = self.labels.entry(name).or_insert_with(|| LabelSym {
                target: None,
                patches: Vec::new(),
                text: token.lexeme.to_string(),
                line: token.line,
            });
            label.patches.push(site);
        }
    }

    /// A bare `:label` binds the name to the current code offset and
    /// patches every forward reference recorded so far.
    fn define_label(&mut self) {
        let token = self.previous;
        let name = self.intern(token.lexeme);
        let target = self.chunk.code.len() as u32;

        match self.labels.get_mut(&name) {
            Some(label) => {
                if label.target.is_some() {
                    self.error_at(token, "label already defined");
                    return;
                }
                label.target = Some(target);
                let patches = std::mem::take(&mut label.patches);
                for site in patches {
                    self.chunk.code[site..site + 4].copy_from_slice(&target.to_le_bytes());
                }
            }
            None => {
                self.labels.insert(
                    name,
                    LabelSym {
                        target: Some(target),
                        patches: Vec::new(),
                        text: token.lexeme.to_string(),
                        line: token.line,
                    },
                );
            }
        }
    }

    // ------------------------------------------------------------------
    // Wrap-up
    // ------------------------------------------------------------------

    fn finish(mut self) -> Result<Chunk, CompileFailed> {
        // Labels referenced but never defined, in first-use order.
        let unresolved: Vec<(String, u32)> = self
            .labels
            .values()
            .filter(|label| label.target.is_none())
            .map(|label| (label.text.clone(), label.line))
            .collect();
        for (text, line) in unresolved {
            self.had_error = true;
            self.diagnostics
                .error(line, ErrorAt::Token(format!(":{text}")), "unresolved label");
        }

        if self.had_error {
            Err(self.diagnostics.into_failure())
        } else {
            Ok(self.chunk)
        }
    }
}
