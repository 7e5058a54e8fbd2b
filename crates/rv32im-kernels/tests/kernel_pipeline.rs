//! Cross-kernel integration tests: each test wires several kernels together
//! in the way the instruction lowerer eventually will (e.g. "compute a
//! product, then divide it back apart"), rather than exercising one kernel
//! in isolation.

use rv32im_circuit::{Circuit, WireId};
use rv32im_kernels::{
    barrel_shift, divide, multiply, signed_less_than, subtract, unsigned_ge, DivOutput, Emitter, MemoryTier,
    MulOutput, ShiftKind, SimpleMemory, UltraMemory,
};

fn const_word(value: u32) -> [WireId; 32] {
    std::array::from_fn(|b| WireId::constant((value >> b) & 1 == 1))
}

fn eval_all(circuit: &Circuit) -> Vec<bool> {
    let mut values = vec![false; circuit.num_wires() as usize];
    values[1] = true;
    for gate in circuit.gates() {
        let l = values[u32::from(gate.left()) as usize];
        let r = values[u32::from(gate.right()) as usize];
        values[u32::from(gate.output()) as usize] = gate.kind().eval(l, r);
    }
    values
}

fn word_of(values: &[bool], out: &[WireId; 32]) -> u32 {
    let mut result = 0u32;
    for (i, &w) in out.iter().enumerate() {
        if values[u32::from(w) as usize] {
            result |= 1 << i;
        }
    }
    result
}

fn bit_of(values: &[bool], w: WireId) -> bool {
    values[u32::from(w) as usize]
}

#[test]
fn multiply_then_unsigned_divide_recovers_one_factor() {
    let mut circuit = Circuit::new(2, 32).unwrap();
    let mut e = Emitter::new(&mut circuit, true, true);

    let a = const_word(641);
    let b = const_word(6700417);
    let product = multiply(&mut e, &a, &b, MulOutput::Low);

    let quotient = divide(&mut e, &product, &b, false, DivOutput::Quotient);

    let values = eval_all(&circuit);
    assert_eq!(word_of(&values, &quotient), 641);
}

#[test]
fn subtract_then_compare_detects_underflow() {
    let mut circuit = Circuit::new(2, 1).unwrap();
    let mut e = Emitter::new(&mut circuit, true, true);

    let a = const_word(5);
    let b = const_word(10);
    let (diff, _borrow) = subtract(&mut e, &a, &b);

    // 5 - 10 wraps to a large unsigned value but is still negative as i32.
    let is_negative_as_signed = signed_less_than(&mut e, &diff, &const_word(0));

    let values = eval_all(&circuit);
    assert!(bit_of(&values, is_negative_as_signed));
}

#[test]
fn shift_then_unsigned_ge_matches_native_shift_compare() {
    let mut circuit = Circuit::new(2, 1).unwrap();
    let mut e = Emitter::new(&mut circuit, true, true);

    let v = const_word(1);
    let amt: [WireId; 5] = std::array::from_fn(|i| WireId::constant((16 >> i) & 1 == 1));
    let shifted = barrel_shift(&mut e, &v, &amt, ShiftKind::Logical);
    let threshold = const_word(1 << 16);
    let ge = unsigned_ge(&mut e, &shifted, &threshold);

    let values = eval_all(&circuit);
    assert!(bit_of(&values, ge));
}

#[test]
fn ultra_store_then_simple_store_are_independent_address_spaces() {
    let mut circuit = Circuit::new(2, 32).unwrap();
    let mut e = Emitter::new(&mut circuit, true, true);

    let mut ultra = UltraMemory::new(std::array::from_fn(|_| const_word(0)));
    let mut simple = SimpleMemory::zeroed();

    let addr3 = const_word(3);
    ultra.access(&mut e, &addr3, &const_word(0xAAAA_AAAA), WireId::TRUE);
    simple.access(&mut e, &addr3, &const_word(0x5555_5555), WireId::TRUE);

    let ultra_read = ultra.access(&mut e, &addr3, &const_word(0), WireId::FALSE);
    let simple_read = simple.access(&mut e, &addr3, &const_word(0), WireId::FALSE);

    let values = eval_all(&circuit);
    assert_eq!(word_of(&values, &ultra_read), 0xAAAA_AAAA);
    assert_eq!(word_of(&values, &simple_read), 0x5555_5555);
}

#[test]
fn divide_by_product_of_itself_and_constant_one_is_identity() {
    let mut circuit = Circuit::new(2, 32).unwrap();
    let mut e = Emitter::new(&mut circuit, true, true);

    let a = const_word(0xDEAD_BEEF);
    let one = const_word(1);
    let product = multiply(&mut e, &a, &one, MulOutput::Low);
    let quotient = divide(&mut e, &product, &one, false, DivOutput::Quotient);

    let values = eval_all(&circuit);
    assert_eq!(word_of(&values, &quotient), 0xDEAD_BEEF);
}
