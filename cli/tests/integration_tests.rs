use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

/// Three RV32I NOPs (`ADDI x0, x0, 0`, word `0x00000013`), little-endian.
fn nop_stream(words: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for _ in 0..words {
        file.write_all(&0x0000_0013u32.to_le_bytes()).unwrap();
    }
    file.flush().unwrap();
    file
}

fn cli() -> Command {
    Command::cargo_bin("rv32im-ckt").unwrap()
}

#[test]
fn help_lists_the_compile_and_info_subcommands() {
    cli().arg("--help").assert().success().stdout(predicate::str::contains("compile").and(predicate::str::contains("info")));
}

#[test]
fn version_flag_prints_a_version() {
    cli().arg("--version").assert().success();
}

#[test]
fn compile_writes_a_flat_gate_list() {
    let input = nop_stream(3);
    let output_dir = tempdir().unwrap();
    let output_path = output_dir.path().join("out.ckt");

    cli()
        .arg("compile")
        .arg(input.path())
        .arg("-o")
        .arg(&output_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("compiled 3 instructions"));

    let contents = fs::read_to_string(&output_path).unwrap();
    assert!(contents.contains("CIRCUIT_INPUTS"));
    assert!(contents.contains("CIRCUIT_GATES"));
}

#[test]
fn compile_then_info_round_trips_gate_and_boundary_counts() {
    let input = nop_stream(2);
    let output_dir = tempdir().unwrap();
    let output_path = output_dir.path().join("out.ckt");

    cli().arg("compile").arg(input.path()).arg("-o").arg(&output_path).assert().success();

    cli()
        .arg("info")
        .arg(&output_path)
        .arg("--detailed")
        .assert()
        .success()
        .stdout(predicate::str::contains("inputs:"))
        .stdout(predicate::str::contains("AND gates:"))
        .stdout(predicate::str::contains("XOR gates:"));
}

#[test]
fn compile_accepts_the_layered_format() {
    let input = nop_stream(2);
    let output_dir = tempdir().unwrap();
    let output_path = output_dir.path().join("out.lckt");

    cli().arg("compile").arg(input.path()).arg("--format").arg("layered").arg("-o").arg(&output_path).assert().success();

    let contents = fs::read_to_string(&output_path).unwrap();
    assert!(contents.contains("layer 1"));

    cli().arg("info").arg(&output_path).arg("--format").arg("layered").assert().success().stdout(predicate::str::contains("gates:"));
}

#[test]
fn a_misaligned_instruction_stream_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&[0, 1, 2]).unwrap();
    file.flush().unwrap();

    cli().arg("compile").arg(file.path()).assert().failure();
}
