//! Equivalence properties (spec's "for each lowered instruction family and
//! each of a large random sample of `(rs1_value, rs2_value)` pairs" clause):
//! for every register-register ALU/MUL family plus ADDI, five sampled-input
//! spot checks comparing the compiled circuit's output against
//! [`rv32im_difftest::reference_step`], an independently reimplemented
//! interpreter rather than `lowerer.rs` itself.

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rv32im_compiler::decoder::decode;
use rv32im_compiler::{compile, CompilerConfig, MachineState, MemoryTierKind};
use rv32im_difftest::{reference_step, run_program};

const SAMPLES: usize = 5;

fn r_type(opcode: u32, f3: u32, f7: u32, rd: u32, rs1: u32, rs2: u32) -> u32 {
    opcode | (rd << 7) | (f3 << 12) | (rs1 << 15) | (rs2 << 20) | (f7 << 25)
}

fn i_type(opcode: u32, f3: u32, rd: u32, rs1: u32, imm: i32) -> u32 {
    opcode | (rd << 7) | (f3 << 12) | (rs1 << 15) | ((imm as u32) << 20)
}

const OP: u32 = 0x33;
const OP_IMM: u32 = 0x13;
const ALT: u32 = 0x20;
const MULDIV: u32 = 0x01;

/// Compiles `word` once, then checks its `rd` output against the reference
/// interpreter for `SAMPLES` random `(x1, x2)` pairs.
fn check_register_family(name: &str, word: u32) {
    let config = CompilerConfig { memory_tier: MemoryTierKind::Ultra, ..CompilerConfig::default() };
    let program = compile(&[word], 0, config).unwrap();
    let instr = decode(word).unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(0xC0FF_EE00 ^ word as u64);
    for sample in 0..SAMPLES {
        let x1: u32 = rng.next_u32();
        let x2: u32 = rng.next_u32();

        let mut state = MachineState { pc: 0, regs: [0u32; 32], memory: vec![0u8; MemoryTierKind::Ultra.capacity_bytes()] };
        state.regs[1] = x1;
        state.regs[2] = x2;

        let expected = reference_step(&state, 0, instr);
        let actual = run_program(&program, &state);
        assert_eq!(actual.regs[3], expected.regs[3], "{name} sample {sample}: x1={x1:#010x} x2={x2:#010x}");
    }
}

fn check_addi_family(name: &str, imm: i32) {
    let word = i_type(OP_IMM, 0b000, 3, 1, imm);
    let config = CompilerConfig { memory_tier: MemoryTierKind::Ultra, ..CompilerConfig::default() };
    let program = compile(&[word], 0, config).unwrap();
    let instr = decode(word).unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(0xADD1_0000 ^ imm as u32 as u64);
    for sample in 0..SAMPLES {
        let x1: u32 = rng.next_u32();

        let mut state = MachineState { pc: 0, regs: [0u32; 32], memory: vec![0u8; MemoryTierKind::Ultra.capacity_bytes()] };
        state.regs[1] = x1;

        let expected = reference_step(&state, 0, instr);
        let actual = run_program(&program, &state);
        assert_eq!(actual.regs[3], expected.regs[3], "{name} sample {sample}: x1={x1:#010x} imm={imm}");
    }
}

#[test]
fn add_matches_the_reference_interpreter() {
    check_register_family("ADD", r_type(OP, 0b000, 0, 3, 1, 2));
}

#[test]
fn sub_matches_the_reference_interpreter() {
    check_register_family("SUB", r_type(OP, 0b000, ALT, 3, 1, 2));
}

#[test]
fn xor_matches_the_reference_interpreter() {
    check_register_family("XOR", r_type(OP, 0b100, 0, 3, 1, 2));
}

#[test]
fn and_matches_the_reference_interpreter() {
    check_register_family("AND", r_type(OP, 0b111, 0, 3, 1, 2));
}

#[test]
fn or_matches_the_reference_interpreter() {
    check_register_family("OR", r_type(OP, 0b110, 0, 3, 1, 2));
}

#[test]
fn sll_matches_the_reference_interpreter() {
    check_register_family("SLL", r_type(OP, 0b001, 0, 3, 1, 2));
}

#[test]
fn srl_matches_the_reference_interpreter() {
    check_register_family("SRL", r_type(OP, 0b101, 0, 3, 1, 2));
}

#[test]
fn sra_matches_the_reference_interpreter() {
    check_register_family("SRA", r_type(OP, 0b101, ALT, 3, 1, 2));
}

#[test]
fn slt_matches_the_reference_interpreter() {
    check_register_family("SLT", r_type(OP, 0b010, 0, 3, 1, 2));
}

#[test]
fn sltu_matches_the_reference_interpreter() {
    check_register_family("SLTU", r_type(OP, 0b011, 0, 3, 1, 2));
}

#[test]
fn mul_matches_the_reference_interpreter() {
    check_register_family("MUL", r_type(OP, 0b000, MULDIV, 3, 1, 2));
}

#[test]
fn addi_matches_the_reference_interpreter() {
    check_addi_family("ADDI", 0x123);
    check_addi_family("ADDI negative immediate", -1);
}
