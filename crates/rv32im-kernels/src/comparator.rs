//! Equality and ordering comparators used by branches, SLT/SLTU, and the
//! divider's restoring step.

use rv32im_circuit::WireId;

use crate::emitter::Emitter;

/// `a == b`, by folding `equal AND NOT(a[i] XOR b[i])` across every bit.
///
/// 32-bit equality costs 96 gates: one XOR and one AND-with-running-equal
/// per bit (the initial `equal` starts at the constant `true`, so the first
/// bit's fold is free of an AND against a prior value... in practice we
/// still emit it uniformly for simplicity).
pub fn equal<const N: usize>(e: &mut Emitter<'_>, a: &[WireId; N], b: &[WireId; N]) -> WireId {
    let mut acc = WireId::TRUE;
    for i in 0..N {
        let diff = e.xor(a[i], b[i]);
        let same = e.not(diff);
        acc = e.and(acc, same);
    }
    acc
}

/// `a != b`.
pub fn not_equal<const N: usize>(e: &mut Emitter<'_>, a: &[WireId; N], b: &[WireId; N]) -> WireId {
    let eq = equal(e, a, b);
    e.not(eq)
}

/// Unsigned `a < b`, ripple from the MSB down tracking `(equal_so_far,
/// less_so_far)`.
pub fn unsigned_less_than<const N: usize>(
    e: &mut Emitter<'_>,
    a: &[WireId; N],
    b: &[WireId; N],
) -> WireId {
    let mut equal_so_far = WireId::TRUE;
    let mut less_so_far = WireId::FALSE;
    for i in (0..N).rev() {
        // this_bit_less = (NOT a[i]) AND b[i]
        let not_a = e.not(a[i]);
        let this_bit_less = e.and(not_a, b[i]);
        let a_xor_b = e.xor(a[i], b[i]);
        let this_bit_eq = e.not(a_xor_b);

        let newly_less = e.and(equal_so_far, this_bit_less);
        less_so_far = e.or(less_so_far, newly_less);
        equal_so_far = e.and(equal_so_far, this_bit_eq);
    }
    less_so_far
}

/// Unsigned `a <= b`.
pub fn unsigned_le<const N: usize>(e: &mut Emitter<'_>, a: &[WireId; N], b: &[WireId; N]) -> WireId {
    let gt = unsigned_less_than(e, b, a);
    e.not(gt)
}

/// Unsigned `a >= b`.
pub fn unsigned_ge<const N: usize>(e: &mut Emitter<'_>, a: &[WireId; N], b: &[WireId; N]) -> WireId {
    let lt = unsigned_less_than(e, a, b);
    e.not(lt)
}

/// Signed `a < b`: if the sign bits differ, the answer is just `a`'s sign;
/// otherwise it's the unsigned comparison of the (equal-sign, so
/// same-magnitude-ordering) bit patterns.
pub fn signed_less_than<const N: usize>(
    e: &mut Emitter<'_>,
    a: &[WireId; N],
    b: &[WireId; N],
) -> WireId {
    let signs_differ = e.xor(a[N - 1], b[N - 1]);
    let unsigned_case = unsigned_less_than(e, a, b);
    e.mux(signs_differ, unsigned_case, a[N - 1])
}

/// Signed `a >= b`.
pub fn signed_ge<const N: usize>(e: &mut Emitter<'_>, a: &[WireId; N], b: &[WireId; N]) -> WireId {
    let lt = signed_less_than(e, a, b);
    e.not(lt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv32im_circuit::Circuit;

    fn eval_cmp(
        a_val: u32,
        b_val: u32,
        cmp: impl Fn(&mut Emitter<'_>, &[WireId; 32], &[WireId; 32]) -> WireId,
    ) -> bool {
        let mut circuit = Circuit::new(2, 1).unwrap();
        let mut e = Emitter::new(&mut circuit, true, true);
        let a: [WireId; 32] = std::array::from_fn(|i| WireId::constant((a_val >> i) & 1 == 1));
        let b: [WireId; 32] = std::array::from_fn(|i| WireId::constant((b_val >> i) & 1 == 1));
        let out = cmp(&mut e, &a, &b);

        let mut values = vec![false; circuit.num_wires() as usize];
        values[1] = true;
        for gate in circuit.gates() {
            let l = values[u32::from(gate.left()) as usize];
            let r = values[u32::from(gate.right()) as usize];
            values[u32::from(gate.output()) as usize] = gate.kind().eval(l, r);
        }
        values[u32::from(out) as usize]
    }

    #[test]
    fn equality() {
        assert!(eval_cmp(42, 42, equal));
        assert!(!eval_cmp(42, 43, equal));
        assert!(eval_cmp(42, 43, not_equal));
    }

    #[test]
    fn unsigned_ordering() {
        assert!(eval_cmp(1, 2, unsigned_less_than));
        assert!(!eval_cmp(2, 1, unsigned_less_than));
        assert!(eval_cmp(0xFFFF_FFFF, 0, unsigned_ge));
        assert!(!eval_cmp(0, 0xFFFF_FFFF, unsigned_ge));
    }

    #[test]
    fn signed_ordering() {
        // -1 < 1
        assert!(eval_cmp(0xFFFF_FFFF, 1, signed_less_than));
        // 1 is not < -1
        assert!(!eval_cmp(1, 0xFFFF_FFFF, signed_less_than));
        // INT_MIN < INT_MAX
        assert!(eval_cmp(0x8000_0000, 0x7FFF_FFFF, signed_less_than));
    }
}
