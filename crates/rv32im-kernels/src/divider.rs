//! Restoring division, shared by DIV/DIVU/REM/REMU.

use rv32im_circuit::WireId;

use crate::comparator::unsigned_ge;
use crate::emitter::Emitter;
use crate::subtractor::{abs_value, negate, subtract};

/// Which half of a division an instruction wants.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DivOutput {
    Quotient,
    Remainder,
}

/// Computes DIV/DIVU/REM/REMU per `signed` and `out`.
///
/// Unsigned division by zero falls straight out of the restoring loop with
/// no extra circuitry: comparing against an all-zero divisor is always
/// "greater or equal", so every quotient bit sets and the remainder is
/// reconstructed unchanged, giving quotient `0xFFFF_FFFF` and remainder
/// `dividend` for free. Signed division by zero needs one explicit
/// override on the quotient only — see the comment below.
pub fn divide(
    e: &mut Emitter<'_>,
    dividend: &[WireId; 32],
    divisor: &[WireId; 32],
    signed: bool,
    out: DivOutput,
) -> [WireId; 32] {
    if !signed {
        let (quotient, remainder) = unsigned_divide(e, dividend, divisor);
        return match out {
            DivOutput::Quotient => quotient,
            DivOutput::Remainder => remainder,
        };
    }

    let dividend_sign = dividend[31];
    let divisor_sign = divisor[31];
    let (abs_dividend, _) = abs_value(e, dividend);
    let (abs_divisor, _) = abs_value(e, divisor);
    let (mag_quotient, mag_remainder) = unsigned_divide(e, &abs_dividend, &abs_divisor);

    let quotient_sign = e.xor(dividend_sign, divisor_sign);
    let neg_quotient = negate(e, &mag_quotient);
    let signed_quotient: [WireId; 32] =
        std::array::from_fn(|i| e.mux(quotient_sign, mag_quotient[i], neg_quotient[i]));

    let neg_remainder = negate(e, &mag_remainder);
    let signed_remainder: [WireId; 32] =
        std::array::from_fn(|i| e.mux(dividend_sign, mag_remainder[i], neg_remainder[i]));

    // The remainder's sign-reconstruction already lands on `dividend` when
    // the divisor is zero (abs(0) = 0, so mag_remainder = abs_dividend, and
    // re-applying dividend's own sign reconstructs it exactly). The
    // quotient doesn't get the same free ride: negating the unsigned
    // by-zero result (0xFFFF_FFFF) when dividend is negative would give 1,
    // not -1, so it's forced explicitly instead.
    let divisor_is_zero = nor_reduce(e, divisor);
    let all_ones = [WireId::TRUE; 32];
    let final_quotient: [WireId; 32] =
        std::array::from_fn(|i| e.mux(divisor_is_zero, signed_quotient[i], all_ones[i]));

    match out {
        DivOutput::Quotient => final_quotient,
        DivOutput::Remainder => signed_remainder,
    }
}

/// Unsigned restoring division: 32 steps over a 33-bit remainder register
/// (wide enough to hold the doubling-plus-incoming-bit shift without
/// overflow, since the remainder always stays below the 33-bit
/// zero-extended divisor).
fn unsigned_divide(
    e: &mut Emitter<'_>,
    dividend: &[WireId; 32],
    divisor: &[WireId; 32],
) -> ([WireId; 32], [WireId; 32]) {
    let divisor_33: [WireId; 33] = std::array::from_fn(|i| if i < 32 { divisor[i] } else { WireId::FALSE });

    let mut remainder = [WireId::FALSE; 33];
    let mut quotient = [WireId::FALSE; 32];

    for i in (0..32).rev() {
        let shifted: [WireId; 33] =
            std::array::from_fn(|k| if k == 0 { dividend[i] } else { remainder[k - 1] });

        let can_subtract = unsigned_ge(e, &shifted, &divisor_33);
        let (subtracted, _) = subtract(e, &shifted, &divisor_33);

        remainder = std::array::from_fn(|k| e.mux(can_subtract, shifted[k], subtracted[k]));
        quotient[i] = can_subtract;
    }

    let remainder_32: [WireId; 32] = std::array::from_fn(|i| remainder[i]);
    (quotient, remainder_32)
}

fn nor_reduce<const N: usize>(e: &mut Emitter<'_>, x: &[WireId; N]) -> WireId {
    let mut acc = WireId::FALSE;
    for &bit in x.iter() {
        acc = e.or(acc, bit);
    }
    e.not(acc)
}
