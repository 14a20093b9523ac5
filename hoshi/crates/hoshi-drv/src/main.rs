//! The `hoshi` command-line driver.
//!
//! A thin shell around the toolchain crates:
//!
//! - `hoshi run file.hir` assembles and executes HIR source.
//! - `hoshi build file.hir -o file.hoshi` assembles and saves the chunk.
//! - `hoshi exec file.hoshi` loads a compiled chunk and executes it.
//! - `hoshi disasm file` prints a chunk listing (from source or binary).
//!
//! Exit codes: `0` on success, `65` on compile errors, `70` on runtime
//! errors, `74` on file I/O failures - unless the program itself ran
//! `exit`, in which case its operand becomes the process exit code.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Assemble, run, and inspect Hoshi bytecode.
#[derive(Parser, Debug)]
#[command(name = "hoshi")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Assemble, run, and inspect Hoshi bytecode", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (repeatable via RUST_LOG for finer control)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assemble a HIR source file and execute it
    Run(RunCommand),

    /// Assemble a HIR source file into a binary chunk file
    Build(BuildCommand),

    /// Execute a compiled chunk file
    Exec(ExecCommand),

    /// Print a human-readable listing of a chunk
    ///
    /// Accepts either a compiled chunk file or HIR source (assembled on
    /// the fly).
    Disasm(DisasmCommand),
}

#[derive(Parser, Debug)]
struct RunCommand {
    /// HIR source file to run
    file: PathBuf,

    /// Print the token stream before assembling
    #[arg(long)]
    emit_tokens: bool,
}

#[derive(Parser, Debug)]
struct BuildCommand {
    /// HIR source file to assemble
    file: PathBuf,

    /// Output path for the chunk file
    #[arg(short, long, default_value = "out.hoshi")]
    output: PathBuf,

    /// Print the token stream before assembling
    #[arg(long)]
    emit_tokens: bool,

    /// Print the assembled chunk's listing
    #[arg(short, long)]
    disasm: bool,
}

#[derive(Parser, Debug)]
struct ExecCommand {
    /// Compiled chunk file to execute
    file: PathBuf,
}

#[derive(Parser, Debug)]
struct DisasmCommand {
    /// Chunk file (or HIR source) to list
    file: PathBuf,
}

/// Logging goes to stderr so program output owns stdout.
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match cli.command {
        Commands::Run(args) => commands::run(&args.file, args.emit_tokens),
        Commands::Build(args) => {
            commands::build(&args.file, &args.output, args.emit_tokens, args.disasm)
        }
        Commands::Exec(args) => commands::exec(&args.file),
        Commands::Disasm(args) => commands::disassemble(&args.file),
    };
    process::exit(code);
}
