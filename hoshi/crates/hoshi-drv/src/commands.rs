//! Command implementations and their exit-code mapping.
//!
//! Each command returns the process exit code: `0`/the program's `exit`
//! operand on success, `65` for compile errors, `70` for runtime errors,
//! `74` for anything filesystem- or format-shaped. Errors print to stderr;
//! stdout belongs to the program being run (and to listings).

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::Context;
use tracing::debug;

use hoshi_asm::compile;
use hoshi_core::chunk::Chunk;
use hoshi_core::chunk_io::{read_chunk, write_chunk};
use hoshi_core::disasm::disassemble_chunk;
use hoshi_lex::dump_tokens;
use hoshi_vm::Vm;

const EX_COMPILE: i32 = 65;
const EX_RUNTIME: i32 = 70;
const EX_IO: i32 = 74;

fn read_source(path: &Path) -> Result<String, i32> {
    fs::read_to_string(path).map_err(|error| {
        eprintln!("error: could not read file {}: {error}", path.display());
        EX_IO
    })
}

fn emit_token_dump(source: &str) {
    println!("== Token Dump ==");
    print!("{}", dump_tokens(source));
    println!("== End Token Dump ==");
}

/// Assembles `source`, printing diagnostics on failure.
fn assemble(source: &str, vm: &mut Vm) -> Result<Chunk, i32> {
    compile(source, vm).map_err(|failure| {
        eprintln!("{failure}");
        EX_COMPILE
    })
}

/// Runs a chunk to completion, mapping panics to the runtime exit code.
fn execute(vm: &mut Vm, chunk: &Chunk) -> i32 {
    match vm.run_chunk(chunk) {
        Ok(()) => vm.exit_code(),
        Err(error) => {
            eprintln!("{error}");
            EX_RUNTIME
        }
    }
}

/// `hoshi run`: assemble and execute in one process.
pub fn run(file: &Path, emit_tokens: bool) -> i32 {
    let source = match read_source(file) {
        Ok(source) => source,
        Err(code) => return code,
    };
    if emit_tokens {
        emit_token_dump(&source);
    }

    let mut vm = Vm::new();
    debug!(file = %file.display(), "assembling");
    let chunk = match assemble(&source, &mut vm) {
        Ok(chunk) => chunk,
        Err(code) => return code,
    };
    debug!(
        code_bytes = chunk.code.len(),
        constants = chunk.constants.len(),
        "executing"
    );
    execute(&mut vm, &chunk)
}

fn write_chunk_file(path: &Path, vm: &Vm, chunk: &Chunk) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("could not create output file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_chunk(&mut writer, vm.heap(), chunk)
        .with_context(|| format!("could not write chunk to {}", path.display()))?;
    Ok(())
}

/// `hoshi build`: assemble and persist the chunk.
pub fn build(file: &Path, output: &Path, emit_tokens: bool, disasm: bool) -> i32 {
    let source = match read_source(file) {
        Ok(source) => source,
        Err(code) => return code,
    };
    if emit_tokens {
        emit_token_dump(&source);
    }

    let mut vm = Vm::new();
    debug!(file = %file.display(), "assembling");
    let chunk = match assemble(&source, &mut vm) {
        Ok(chunk) => chunk,
        Err(code) => return code,
    };

    if disasm {
        print!("{}", disassemble_chunk(&chunk, vm.heap(), &listing_name(file)));
    }

    debug!(output = %output.display(), code_bytes = chunk.code.len(), "writing chunk");
    if let Err(error) = write_chunk_file(output, &vm, &chunk) {
        eprintln!("error: {error:#}");
        return EX_IO;
    }
    0
}

fn load_chunk(path: &Path, vm: &mut Vm) -> Result<Chunk, i32> {
    let file = File::open(path).map_err(|error| {
        eprintln!("error: could not open file {}: {error}", path.display());
        EX_IO
    })?;
    let mut reader = BufReader::new(file);
    read_chunk(&mut reader, vm.heap_mut()).map_err(|error| {
        eprintln!("error: failed to read chunk from {}: {error}", path.display());
        EX_IO
    })
}

/// `hoshi exec`: load a compiled chunk and execute it.
pub fn exec(file: &Path) -> i32 {
    let mut vm = Vm::new();
    let chunk = match load_chunk(file, &mut vm) {
        Ok(chunk) => chunk,
        Err(code) => return code,
    };
    debug!(file = %file.display(), code_bytes = chunk.code.len(), "executing");
    execute(&mut vm, &chunk)
}

fn listing_name(file: &Path) -> String {
    file.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string())
}

/// `hoshi disasm`: print a chunk listing. HIR sources are assembled
/// first; anything else is loaded as a chunk file.
pub fn disassemble(file: &Path) -> i32 {
    let mut vm = Vm::new();

    let is_source = file
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("hir"));

    let chunk = if is_source {
        let source = match read_source(file) {
            Ok(source) => source,
            Err(code) => return code,
        };
        match assemble(&source, &mut vm) {
            Ok(chunk) => chunk,
            Err(code) => return code,
        }
    } else {
        match load_chunk(file, &mut vm) {
            Ok(chunk) => chunk,
            Err(code) => return code,
        }
    };

    print!("{}", disassemble_chunk(&chunk, vm.heap(), &listing_name(file)));
    0
}
