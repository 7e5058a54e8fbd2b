//! Two's-complement subtraction and negation, built on the ripple-carry
//! adder.

use rv32im_circuit::WireId;

use crate::adder::ripple_carry_add;
use crate::emitter::Emitter;

/// `a - b = a + (~b) + 1`: invert every bit of `b` and feed the adder an
/// initial carry of 1.
pub fn subtract<const N: usize>(
    e: &mut Emitter<'_>,
    a: &[WireId; N],
    b: &[WireId; N],
) -> ([WireId; N], WireId) {
    let not_b: [WireId; N] = std::array::from_fn(|i| e.not(b[i]));
    ripple_carry_add(e, a, &not_b, WireId::TRUE)
}

/// Two's-complement negation, `-x = (~x) + 1`.
pub fn negate<const N: usize>(e: &mut Emitter<'_>, x: &[WireId; N]) -> [WireId; N] {
    let zero = [WireId::FALSE; N];
    let (diff, _) = subtract(e, &zero, x);
    diff
}

/// `sign ? (x XOR sign_replicated) + sign : x`, the two's-complement
/// absolute value: conditionally negates `x` using a single replicated sign
/// bit rather than the source's incomplete "XOR with sign" shortcut (see the
/// design notes on signed division). Returns the magnitude and the sign bit
/// that was used.
pub fn abs_value<const N: usize>(e: &mut Emitter<'_>, x: &[WireId; N]) -> ([WireId; N], WireId) {
    let sign = x[N - 1];
    let flipped: [WireId; N] = std::array::from_fn(|i| e.xor(x[i], sign));
    let sign_word = [sign; N];
    let zero = [WireId::FALSE; N];
    let (magnitude, _) = ripple_carry_add(e, &flipped, &zero, sign);
    let _ = sign_word;
    (magnitude, sign)
}
