//! End-to-end tests of the `hoshi` binary: assemble, run, persist, reload,
//! and the exit-code contract.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn hoshi() -> Command {
    Command::cargo_bin("hoshi").expect("binary should build")
}

fn write_source(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("temp write should succeed");
    path
}

#[test]
fn run_prints_the_sum() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "add.hir", "1 2 add print return\n");

    hoshi()
        .arg("run")
        .arg(&file)
        .assert()
        .success()
        .stdout("3\n")
        .stderr("");
}

#[test]
fn exit_opcode_becomes_the_process_exit_code() {
    let dir = TempDir::new().unwrap();
    let file = write_source(
        &dir,
        "globals.hir",
        "7 defglobal $x 9 setglobal $x pop getglobal $x exit\n",
    );

    hoshi().arg("run").arg(&file).assert().code(9);
}

#[test]
fn concat_prints_the_joined_string() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "concat.hir", "\"hel\" \"lo\" concat print return\n");

    hoshi()
        .arg("run")
        .arg(&file)
        .assert()
        .success()
        .stdout("hello\n");
}

#[test]
fn locals_print_inside_their_scope() {
    let dir = TempDir::new().unwrap();
    let file = write_source(
        &dir,
        "locals.hir",
        "newscope 5 deflocal $n getlocal $n print endscope return\n",
    );

    hoshi()
        .arg("run")
        .arg(&file)
        .assert()
        .success()
        .stdout("5\n");
}

#[test]
fn jump_if_skips_the_first_print() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "jump.hir", "true jump_if 3 1 print 2 print return\n");

    hoshi()
        .arg("run")
        .arg(&file)
        .assert()
        .success()
        .stdout("2\n");
}

#[test]
fn escape_sequences_survive_to_output() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "escapes.hir", "\"a\\tb\" print return\n");

    hoshi()
        .arg("run")
        .arg(&file)
        .assert()
        .success()
        .stdout("a\tb\n");
}

#[test]
fn built_chunk_replays_identically() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "add.hir", "1 2 add print return\n");
    let output = dir.path().join("add.hoshi");

    hoshi()
        .arg("build")
        .arg(&source)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    hoshi()
        .arg("exec")
        .arg(&output)
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn built_chunk_preserves_exit_codes() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "exit.hir", "6 7 mul exit\n");
    let output = dir.path().join("exit.hoshi");

    hoshi()
        .arg("build")
        .arg(&source)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    hoshi().arg("exec").arg(&output).assert().code(42);
}

#[test]
fn build_defaults_to_out_hoshi() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "tiny.hir", "return\n");

    hoshi()
        .current_dir(dir.path())
        .arg("build")
        .arg(&source)
        .assert()
        .success();

    assert!(dir.path().join("out.hoshi").exists());
}

#[test]
fn compile_errors_exit_65() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "bad.hir", "jmup 3\n");

    hoshi()
        .arg("run")
        .arg(&file)
        .assert()
        .code(65)
        .stderr(predicate::str::contains("invalid operator"));
}

#[test]
fn runtime_errors_exit_70() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "underflow.hir", "pop\n");

    hoshi()
        .arg("run")
        .arg(&file)
        .assert()
        .code(70)
        .stderr(predicate::str::contains("runtime error"));
}

#[test]
fn missing_input_exits_74() {
    hoshi()
        .arg("run")
        .arg("no/such/file.hir")
        .assert()
        .code(74)
        .stderr(predicate::str::contains("could not read file"));
}

#[test]
fn exec_rejects_non_chunk_files_with_74() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "fake.hoshi", "this is not a chunk file at all");

    hoshi()
        .arg("exec")
        .arg(&file)
        .assert()
        .code(74)
        .stderr(predicate::str::contains("magic"));
}

#[test]
fn exec_rejects_chunks_older_than_the_minimum_version() {
    let dir = TempDir::new().unwrap();
    // Magic, version 0.0, then empty constants/code/lines sections.
    let mut bytes = vec![0x7F, b'H', b'O', b'S', b'H', b'I', 0x7F];
    bytes.extend_from_slice(&[0, 0, 0, 0]); // version 0.0
    bytes.extend_from_slice(&[0, 0]); // constant count
    bytes.extend_from_slice(&[0, 0, 0, 0]); // code count
    bytes.extend_from_slice(&[0, 0, 0, 0]); // line count
    let path = dir.path().join("old.hoshi");
    fs::write(&path, bytes).unwrap();

    hoshi()
        .arg("exec")
        .arg(&path)
        .assert()
        .code(74)
        .stderr(predicate::str::contains("older"));
}

#[test]
fn disasm_lists_a_built_chunk() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "listing.hir", "1 2 add print return\n");
    let output = dir.path().join("listing.hoshi");

    hoshi()
        .arg("build")
        .arg(&source)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    hoshi()
        .arg("disasm")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("== listing =="))
        .stdout(predicate::str::contains("CONSTANT"))
        .stdout(predicate::str::contains("RETURN"));
}

#[test]
fn disasm_assembles_hir_sources_on_the_fly() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "direct.hir", "true not pop return\n");

    hoshi()
        .arg("disasm")
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("NOT"));
}

#[test]
fn emit_tokens_dumps_the_stream() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "tokens.hir", "1 add\n");

    hoshi()
        .arg("run")
        .arg(&file)
        .arg("--emit-tokens")
        .assert()
        .stdout(predicate::str::contains("== Token Dump =="))
        .stdout(predicate::str::contains("NUMBER '1'"))
        .stdout(predicate::str::contains("ADD 'add'"));
}

#[test]
fn empty_source_runs_zero_steps() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "empty.hir", "");

    hoshi()
        .arg("run")
        .arg(&file)
        .assert()
        .success()
        .stdout("");
}

#[test]
fn unresolved_forward_label_fails_the_build() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "dangling.hir", "goto :nowhere return\n");

    hoshi()
        .arg("build")
        .arg(&file)
        .arg("-o")
        .arg(dir.path().join("dangling.hoshi"))
        .assert()
        .code(65)
        .stderr(predicate::str::contains("unresolved label"));
}

#[test]
fn goto_loop_counts_down_to_zero() {
    let dir = TempDir::new().unwrap();
    // i = 3; loop: i -= 1, print i; while i > 0
    let file = write_source(
        &dir,
        "loop.hir",
        "3 defglobal $i\n\
         :loop\n\
         getglobal $i 1 sub setglobal $i pop\n\
         getglobal $i print\n\
         getglobal $i 0 gt goto_if :loop\n\
         return\n",
    );

    hoshi()
        .arg("run")
        .arg(&file)
        .assert()
        .success()
        .stdout("2\n1\n0\n");
}

#[test]
fn run_with_emit_tokens_fails_cleanly_on_runtime_error() {
    // The token dump happens even when execution later fails; exit code
    // still reports the runtime failure.
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "both.hir", "pop\n");

    hoshi()
        .arg("run")
        .arg(&file)
        .arg("--emit-tokens")
        .assert()
        .code(70)
        .stdout(predicate::str::contains("POP 'pop'"));
}
