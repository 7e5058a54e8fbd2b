//! Log-depth barrel shifter shared by SLL/SRL/SRA, for both register and
//! immediate shift-amount operands.

use rv32im_circuit::WireId;

use crate::emitter::Emitter;

/// The three RV32I shift flavors; they differ only in what bits shift in and
/// whether the shift amount is applied with the running value sliding left
/// or right.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ShiftKind {
    /// Logical left shift: zero-fill from the LSB side.
    Logical,
    /// Logical right shift: zero-fill from the MSB side.
    LogicalRight,
    /// Arithmetic right shift: sign-extend from the MSB side.
    Arithmetic,
}

/// Shifts `value` by the amount encoded in the low 5 bits of `amount`
/// (`amount[5..]`, if present, is ignored — RV32I shifts only ever consult 5
/// bits).
///
/// For each of the 5 shift-amount bits `s[k]` (`k = 0..4`), builds a
/// candidate shifted by `2^k` positions and muxes it against the running
/// value with `s[k]`; ~4 gates per bit per level, ~640 gates total for a
/// 32-bit operand.
pub fn barrel_shift<const N: usize>(
    e: &mut Emitter<'_>,
    value: &[WireId; N],
    amount: &[WireId],
    kind: ShiftKind,
) -> [WireId; N] {
    let fill = match kind {
        ShiftKind::Logical | ShiftKind::LogicalRight => WireId::FALSE,
        ShiftKind::Arithmetic => value[N - 1],
    };

    let mut current = *value;
    for k in 0..amount.len() {
        let shift_amount = 1usize << k;
        if shift_amount >= N {
            // Shifting by >= N always yields the fill value; still mux on
            // this level's bit so the result is correct even for amounts
            // that set high shift-amount bits.
            let candidate = [fill; N];
            current = mux_array(e, amount[k], &current, &candidate);
            continue;
        }

        let candidate: [WireId; N] = std::array::from_fn(|i| match kind {
            ShiftKind::Logical => {
                if i < shift_amount {
                    fill
                } else {
                    current[i - shift_amount]
                }
            }
            ShiftKind::LogicalRight | ShiftKind::Arithmetic => {
                if i + shift_amount < N {
                    current[i + shift_amount]
                } else {
                    fill
                }
            }
        });

        current = mux_array(e, amount[k], &current, &candidate);
    }
    current
}

fn mux_array<const N: usize>(
    e: &mut Emitter<'_>,
    sel: WireId,
    on_false: &[WireId; N],
    on_true: &[WireId; N],
) -> [WireId; N] {
    std::array::from_fn(|i| e.mux(sel, on_false[i], on_true[i]))
}
