//! Radix-4 Booth-encoded multiplier with Wallace-tree reduction.

use rv32im_circuit::WireId;

use crate::adder::{ripple_carry_add, sparse_kogge_stone_add};
use crate::emitter::Emitter;

/// Which 32 bits of the 64-bit product a multiply instruction wants.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MulOutput {
    /// `MUL`: the low 32 bits, signedness doesn't matter.
    Low,
    /// `MULH`: the high 32 bits of a signed × signed product.
    HighSigned,
    /// `MULHU`: the high 32 bits of an unsigned × unsigned product.
    HighUnsigned,
    /// `MULHSU`: the high 32 bits of a signed (first operand) × unsigned
    /// (second operand) product.
    HighSignedUnsigned,
}

/// Computes the requested half of the 64-bit product of `a` and `b`.
///
/// Both operands are sign- or zero-extended to 33 bits per `out`'s
/// signedness (Booth encoding needs one guard bit above the MSB), then
/// Booth-encoded, reduced through a Wallace tree, and summed with a final
/// carry-propagate add. The low 32 bits of the product don't depend on
/// signedness, so `Low` extends both operands uniformly.
pub fn multiply(
    e: &mut Emitter<'_>,
    a: &[WireId; 32],
    b: &[WireId; 32],
    out: MulOutput,
) -> [WireId; 32] {
    let a_signed = matches!(out, MulOutput::HighSigned | MulOutput::HighSignedUnsigned | MulOutput::Low);
    let b_signed = matches!(out, MulOutput::HighSigned | MulOutput::Low);

    let a_ext = sign_extend_33(e, a, a_signed);
    let b_ext = sign_extend_33(e, b, b_signed);

    let product = booth_multiply_33(e, &a_ext, &b_ext);

    match out {
        MulOutput::Low => std::array::from_fn(|i| product[i]),
        _ => std::array::from_fn(|i| product[32 + i]),
    }
}

/// Sign- or zero-extends a 32-bit operand to 33 bits.
fn sign_extend_33(e: &mut Emitter<'_>, x: &[WireId; 32], signed: bool) -> [WireId; 33] {
    let top = if signed { x[31] } else { WireId::FALSE };
    let _ = e;
    std::array::from_fn(|i| if i < 32 { x[i] } else { top })
}

/// One radix-4 Booth window's encoding: selects `{0, +M, -M, +2M, -2M}` via
/// `(negate, one, two)`.
struct BoothDigit {
    negate: WireId,
    one: WireId,
    two: WireId,
}

/// Standard radix-4 Booth table on `(b[2i+1], b[2i], b[2i-1])`:
/// ```text
/// 000 -> 0     001 -> +M    010 -> +M    011 -> +2M
/// 100 -> -2M   101 -> -M    110 -> -M    111 -> 0
/// ```
fn booth_encode(e: &mut Emitter<'_>, b_minus1: WireId, b0: WireId, b_plus1: WireId) -> BoothDigit {
    let negate = b_plus1;
    let one = e.xor(b0, b_minus1);

    let both_low = e.and(b0, b_minus1);
    let not_plus1 = e.not(b_plus1);
    let term1 = e.and(both_low, not_plus1);

    let not_b0 = e.not(b0);
    let not_bm1 = e.not(b_minus1);
    let neither_low = e.and(not_b0, not_bm1);
    let term2 = e.and(neither_low, b_plus1);

    let two = e.or(term1, term2);
    BoothDigit { negate, one, two }
}

/// Builds the exact signed 34-bit value `d_i * M` for one Booth window,
/// where `M` is the 33-bit (sign-extended) multiplicand: selects `M` or
/// `M << 1` per `(one, two)`, then two's-complement-negates the result when
/// `negate` is set (an XOR with the replicated negate bit, plus a +1
/// correction folded in via a 34-bit add whose carry-out is discarded —
/// standard two's-complement wraparound, not a real higher-order carry).
fn booth_partial_product(e: &mut Emitter<'_>, m: &[WireId; 33], digit: &BoothDigit) -> [WireId; 34] {
    let selected: [WireId; 34] = std::array::from_fn(|i| {
        let one_bit = if i < 33 { m[i] } else { m[32] };
        let two_bit = if i == 0 { WireId::FALSE } else { m[i - 1] };
        let one_term = e.and(digit.one, one_bit);
        let two_term = e.and(digit.two, two_bit);
        e.xor(one_term, two_term)
    });

    let flipped: [WireId; 34] = std::array::from_fn(|i| e.xor(selected[i], digit.negate));
    let correction: [WireId; 34] = std::array::from_fn(|i| if i == 0 { digit.negate } else { WireId::FALSE });
    let (corrected, _carry_out) = ripple_carry_add(e, &flipped, &correction, WireId::FALSE);
    corrected
}

/// Full adder: returns `(sum, carry)`.
fn full_adder(e: &mut Emitter<'_>, a: WireId, b: WireId, c: WireId) -> (WireId, WireId) {
    let ab = e.xor(a, b);
    let sum = e.xor(ab, c);
    let ab_and = e.and(a, b);
    let c_and = e.and(ab, c);
    let carry = e.or(ab_and, c_and);
    (sum, carry)
}

/// Radix-4 Booth multiply of two 33-bit (pre-sign-extended) operands,
/// producing the low 64 bits of the product (the only bits RV32IM needs).
fn booth_multiply_33(e: &mut Emitter<'_>, a: &[WireId; 33], b: &[WireId; 33]) -> [WireId; 64] {
    // 17 windows of 2 bits each cover the 33 (sign-extended) multiplier
    // bits, with an implicit b[-1] = 0.
    const WINDOWS: usize = 17;
    const WIDTH: usize = 64;
    let mut columns: Vec<Vec<WireId>> = vec![Vec::new(); WIDTH];

    for w in 0..WINDOWS {
        let b_minus1 = if w == 0 { WireId::FALSE } else { b[2 * w - 1] };
        let b0 = if 2 * w < 33 { b[2 * w] } else { b[32] };
        let b_plus1 = if 2 * w + 1 < 33 { b[2 * w + 1] } else { b[32] };
        let digit = booth_encode(e, b_minus1, b0, b_plus1);
        let corrected = booth_partial_product(e, a, &digit);

        let shift = 2 * w;
        for col in shift..WIDTH {
            let local_i = col - shift;
            let bit = if local_i < 34 { corrected[local_i] } else { corrected[33] };
            columns[col].push(bit);
        }
    }

    reduce_columns(e, &mut columns);

    let mut row0 = [WireId::FALSE; WIDTH];
    let mut row1 = [WireId::FALSE; WIDTH];
    for (col, bits) in columns.iter().enumerate() {
        row0[col] = bits.first().copied().unwrap_or(WireId::FALSE);
        row1[col] = bits.get(1).copied().unwrap_or(WireId::FALSE);
    }

    let (sum, _) = sparse_kogge_stone_add(e, &row0, &row1, WireId::FALSE);
    sum
}

/// Wallace-tree-style reduction: while any column has 3 or more bits,
/// compress 4-at-a-time with a 4:2 compressor where possible, otherwise 3:2
/// (full adder), carrying into the column to the left. Stops once every
/// column has at most 2 bits.
fn reduce_columns(e: &mut Emitter<'_>, columns: &mut Vec<Vec<WireId>>) {
    loop {
        let max_len = columns.iter().map(Vec::len).max().unwrap_or(0);
        if max_len <= 2 {
            break;
        }
        let mut next: Vec<Vec<WireId>> = vec![Vec::new(); columns.len()];
        for (col_idx, col) in columns.iter().enumerate() {
            let mut remaining = col.clone();
            while remaining.len() >= 4 {
                let d = remaining.pop().unwrap();
                let c = remaining.pop().unwrap();
                let b = remaining.pop().unwrap();
                let a = remaining.pop().unwrap();
                let (sum, carry, cout) = compressor_4to2(e, a, b, c, d);
                next[col_idx].push(sum);
                if col_idx + 1 < next.len() {
                    next[col_idx + 1].push(carry);
                    next[col_idx + 1].push(cout);
                }
            }
            while remaining.len() >= 3 {
                let c = remaining.pop().unwrap();
                let b = remaining.pop().unwrap();
                let a = remaining.pop().unwrap();
                let (sum, carry) = full_adder(e, a, b, c);
                next[col_idx].push(sum);
                if col_idx + 1 < next.len() {
                    next[col_idx + 1].push(carry);
                }
            }
            next[col_idx].extend(remaining);
        }
        *columns = next;
    }
}

/// A 4:2 compressor built from two chained full adders: reduces 4 bits in
/// one column down to a sum bit in the same column and two carries into the
/// next column.
fn compressor_4to2(
    e: &mut Emitter<'_>,
    a: WireId,
    b: WireId,
    c: WireId,
    d: WireId,
) -> (WireId, WireId, WireId) {
    let (s1, c1) = full_adder(e, a, b, c);
    let (sum, c2) = full_adder(e, s1, d, WireId::FALSE);
    (sum, c1, c2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv32im_circuit::Circuit;

    fn eval_mul(a_val: u32, b_val: u32, out: MulOutput) -> u32 {
        let mut circuit = Circuit::new(2, 32).unwrap();
        let mut e = Emitter::new(&mut circuit, true, true);
        let a: [WireId; 32] = std::array::from_fn(|i| WireId::constant((a_val >> i) & 1 == 1));
        let b: [WireId; 32] = std::array::from_fn(|i| WireId::constant((b_val >> i) & 1 == 1));
        let result = multiply(&mut e, &a, &b, out);

        let mut values = vec![false; circuit.num_wires() as usize];
        values[1] = true;
        for gate in circuit.gates() {
            let l = values[u32::from(gate.left()) as usize];
            let r = values[u32::from(gate.right()) as usize];
            values[u32::from(gate.output()) as usize] = gate.kind().eval(l, r);
        }
        let mut packed = 0u32;
        for (i, &w) in result.iter().enumerate() {
            if values[u32::from(w) as usize] {
                packed |= 1 << i;
            }
        }
        packed
    }

    #[test]
    fn mul_low_matches_wrapping_mul() {
        assert_eq!(eval_mul(6, 7, MulOutput::Low), 42);
        assert_eq!(eval_mul(0xFFFF_FFFF, 2, MulOutput::Low), 0xFFFF_FFFEu32);
        assert_eq!(eval_mul(0, 0, MulOutput::Low), 0);
        assert_eq!(eval_mul(0x1234_5678, 0x9ABC_DEF0, MulOutput::Low), 0x1234_5678u32.wrapping_mul(0x9ABC_DEF0));
    }

    #[test]
    fn mulhu_matches_u64_high_half() {
        let a = 0xFFFF_FFFFu32;
        let b = 0xFFFF_FFFFu32;
        let expected = ((a as u64 * b as u64) >> 32) as u32;
        assert_eq!(eval_mul(a, b, MulOutput::HighUnsigned), expected);
    }

    #[test]
    fn mulh_matches_i64_high_half() {
        let a = -5i32 as u32;
        let b = 3i32 as u32;
        let expected = (((a as i32 as i64) * (b as i32 as i64)) >> 32) as u32;
        assert_eq!(eval_mul(a, b, MulOutput::HighSigned), expected);
    }

    #[test]
    fn mulh_int_min_squared() {
        let a = 0x8000_0000u32;
        let expected = (((a as i32 as i64) * (a as i32 as i64)) >> 32) as u32;
        assert_eq!(eval_mul(a, a, MulOutput::HighSigned), expected);
    }

    #[test]
    fn mulhsu_matches_mixed_sign_high_half() {
        let a = -5i32 as u32;
        let b = 3_000_000_000u32;
        let expected = (((a as i32 as i64) * (b as u64 as i64)) >> 32) as u32;
        assert_eq!(eval_mul(a, b, MulOutput::HighSignedUnsigned), expected);
    }
}
