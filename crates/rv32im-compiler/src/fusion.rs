//! The fusion peephole (§4.5): recognizes fixed two-instruction windows and
//! emits their collapsed lowering instead of two independent ones.
//!
//! Disabling fusion must never change what a program computes — only how
//! many gates it costs. Every pattern here falls back to ordinary
//! per-instruction lowering when it doesn't match.

use rv32im_circuit::WireId;
use rv32im_kernels::ripple_carry_add;

use crate::decoder::{AluOp, Instruction, ShiftOp};
use crate::error::CompileError;
use crate::lowerer::{const_word, Lowerer};

/// Tries to lower `first`/`second` (consecutive instruction words at
/// `first_index`/`first_index + 1`) as one recognized fused pair.
///
/// Returns `Ok(true)` if a pattern matched and both instructions were fully
/// lowered (registers, PC, and gates all updated for both words). Returns
/// `Ok(false)` without touching `lowerer` if no pattern matched — the caller
/// should fall back to lowering `first` alone and retry fusion starting at
/// `second`.
pub fn try_fuse(
    lowerer: &mut Lowerer<'_>,
    first_index: usize,
    first: Instruction,
    second: Instruction,
) -> Result<bool, CompileError> {
    match (first, second) {
        (Instruction::Lui { rd: rd1, imm: u }, Instruction::OpImm { kind: AluOp::Add, rd: rd2, rs1, imm: i })
            if rd1 == rd2 && rs1 == rd1 =>
        {
            fuse_lui_addi(lowerer, rd1, u, i);
            Ok(true)
        }
        (Instruction::Auipc { rd: rd1, imm: u }, Instruction::OpImm { kind: AluOp::Add, rd: rd2, rs1, imm: i })
            if rd1 == rd2 && rs1 == rd1 =>
        {
            fuse_auipc_addi(lowerer, rd1, u, i);
            Ok(true)
        }
        (
            Instruction::Op { kind: AluOp::Add, rd: rd1, rs1: a, rs2: b },
            Instruction::Op { kind: AluOp::Add, rd: rd2, rs1: c_lhs, rs2: c },
        ) if rd1 == rd2 && c_lhs == rd1 => {
            fuse_add_add(lowerer, rd1, a, b, c);
            Ok(true)
        }
        (
            Instruction::ShiftImm { kind, rd: rd1, rs1, shamt },
            Instruction::OpImm { kind: AluOp::And, rd: rd2, rs1: rs1b, imm: mask },
        ) if rd1 == rd2 && rs1b == rd1 => {
            match fuse_shift_andi(lowerer, kind, rd1, rs1, shamt, mask as u32) {
                true => Ok(true),
                false => Ok(false),
            }
        }
        _ => {
            let _ = first_index;
            Ok(false)
        }
    }
}

/// `rd ← (u << 12) + sign_ext(i)`: both operands are compile-time constants
/// once the instructions are decoded, so the combined value is just wired
/// in directly — zero gates.
fn fuse_lui_addi(lowerer: &mut Lowerer<'_>, rd: u8, u: i32, i: i32) {
    let combined = u.wrapping_add(i) as u32;
    lowerer.regs_mut().set_reg(rd, const_word(combined));
    advance_pc_twice(lowerer);
}

/// `rd ← PC + ((u << 12) + sign_ext(i))`: the immediate side collapses to
/// one constant, so only a single adder is needed instead of two.
fn fuse_auipc_addi(lowerer: &mut Lowerer<'_>, rd: u8, u: i32, i: i32) {
    let combined = u.wrapping_add(i) as u32;
    let pc = lowerer.regs().pc();
    let sum = ripple_carry_add(lowerer.emitter_mut(), &pc, &const_word(combined), WireId::FALSE).0;
    lowerer.regs_mut().set_reg(rd, sum);
    advance_pc_twice(lowerer);
}

/// `rd ← a + b + c` via a 3:2 carry-save compression followed by one
/// ripple-carry adder, instead of two independent ripple-carry adds.
fn fuse_add_add(lowerer: &mut Lowerer<'_>, rd: u8, a: u8, b: u8, c: u8) {
    let av = lowerer.regs().reg(a);
    let bv = lowerer.regs().reg(b);
    let cv = lowerer.regs().reg(c);
    let e = lowerer.emitter_mut();

    let mut partial_sum = [WireId::FALSE; 32];
    let mut carry = [WireId::FALSE; 32];
    for i in 0..32 {
        let ab = e.xor(av[i], bv[i]);
        partial_sum[i] = e.xor(ab, cv[i]);
        let ab_and = e.and(av[i], bv[i]);
        let c_and = e.and(ab, cv[i]);
        carry[i] = e.or(ab_and, c_and);
    }
    let shifted_carry: [WireId; 32] = std::array::from_fn(|i| if i == 0 { WireId::FALSE } else { carry[i - 1] });
    let sum = ripple_carry_add(e, &partial_sum, &shifted_carry, WireId::FALSE).0;
    lowerer.regs_mut().set_reg(rd, sum);
    advance_pc_twice(lowerer);
}

/// `rd ← (rs << k) & m` (or the right-shift forms): when `m` is a contiguous
/// run of ones, the whole thing is a bit-field extract with both ends
/// known at compile time — pure rewiring, no gates. Returns `false` (no
/// mutation performed) when `m` isn't contiguous, so the caller can fall
/// back to independent lowering of both instructions.
fn fuse_shift_andi(lowerer: &mut Lowerer<'_>, kind: ShiftOp, rd: u8, rs1: u8, shamt: u32, mask: u32) -> bool {
    if !is_contiguous_ones(mask) {
        return false;
    }
    let value = lowerer.regs().reg(rs1);
    let shifted: [WireId; 32] = std::array::from_fn(|out_bit| match kind {
        ShiftOp::Left => match out_bit.checked_sub(shamt as usize) {
            Some(b) if b < 32 => value[b],
            _ => WireId::FALSE,
        },
        ShiftOp::RightLogical => {
            let src = out_bit + shamt as usize;
            if src < 32 {
                value[src]
            } else {
                WireId::FALSE
            }
        }
        // Vacated high bits read the sign bit, matching the non-fused
        // barrel-shift lowering's sign extension.
        ShiftOp::RightArithmetic => value[(out_bit + shamt as usize).min(31)],
    });
    let masked: [WireId; 32] = std::array::from_fn(|i| if (mask >> i) & 1 == 1 { shifted[i] } else { WireId::FALSE });
    lowerer.regs_mut().set_reg(rd, masked);
    advance_pc_twice(lowerer);
    true
}

fn is_contiguous_ones(mask: u32) -> bool {
    if mask == 0 {
        return true;
    }
    let trailing = mask.trailing_zeros();
    let shifted = mask >> trailing;
    (shifted & (shifted + 1)) == 0
}

fn advance_pc_twice(lowerer: &mut Lowerer<'_>) {
    for _ in 0..2 {
        let pc = lowerer.regs().pc();
        let next = rv32im_kernels::ripple_carry_add(lowerer.emitter_mut(), &pc, &const_word(4), WireId::FALSE).0;
        lowerer.regs_mut().set_pc(next);
    }
}
