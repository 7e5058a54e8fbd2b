//! The `Ultra` tier: 8 words, addressed by the low 3 bits. ~200 gates per
//! access.

use rv32im_circuit::WireId;

use crate::emitter::Emitter;

use super::{word_memory_access, MemoryTier};

const WORDS: usize = 8;
const ADDR_BITS: usize = 3;

/// The smallest memory tier: 8 words of state, all held directly as
/// [`WireId`] arrays with no addressing indirection beyond a 3-bit decoder.
pub struct UltraMemory {
    cells: [[WireId; 32]; WORDS],
}

impl UltraMemory {
    /// Builds an `Ultra` memory seeded from `words` (bottom bits of each
    /// input wire's address), wiring cell `i` to `initial[i]`.
    pub fn new(initial: [[WireId; 32]; WORDS]) -> Self {
        Self { cells: initial }
    }

    /// The current wire representation of every cell, in address order —
    /// used by the state codec to bind the final memory image to circuit
    /// outputs.
    pub fn cells(&self) -> &[[WireId; 32]; WORDS] {
        &self.cells
    }
}

impl MemoryTier for UltraMemory {
    fn access(
        &mut self,
        e: &mut Emitter<'_>,
        address: &[WireId; 32],
        write_data: &[WireId; 32],
        write_enable: WireId,
    ) -> [WireId; 32] {
        word_memory_access::<WORDS, ADDR_BITS>(e, &mut self.cells, address, write_data, write_enable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv32im_circuit::Circuit;

    fn words_from(values: [u32; WORDS]) -> [[WireId; 32]; WORDS] {
        std::array::from_fn(|i| std::array::from_fn(|b| WireId::constant((values[i] >> b) & 1 == 1)))
    }

    fn eval32(circuit: &Circuit, out: &[WireId; 32]) -> u32 {
        let mut values = vec![false; circuit.num_wires() as usize];
        values[1] = true;
        for gate in circuit.gates() {
            let l = values[u32::from(gate.left()) as usize];
            let r = values[u32::from(gate.right()) as usize];
            values[u32::from(gate.output()) as usize] = gate.kind().eval(l, r);
        }
        let mut result = 0u32;
        for (i, &w) in out.iter().enumerate() {
            if values[u32::from(w) as usize] {
                result |= 1 << i;
            }
        }
        result
    }

    #[test]
    fn reads_back_seeded_word() {
        let mut circuit = Circuit::new(2, 32).unwrap();
        let mut e = Emitter::new(&mut circuit, true, true);
        let mut mem = UltraMemory::new(words_from([10, 20, 30, 40, 50, 60, 70, 80]));
        let addr: [WireId; 32] = std::array::from_fn(|b| WireId::constant(b == 1)); // address 2
        let write_data = [WireId::FALSE; 32];
        let out = mem.access(&mut e, &addr, &write_data, WireId::FALSE);
        assert_eq!(eval32(&circuit, &out), 30);
    }

    #[test]
    fn write_then_read_same_address_sees_new_value() {
        let mut circuit = Circuit::new(2, 32).unwrap();
        let mut e = Emitter::new(&mut circuit, true, true);
        let mut mem = UltraMemory::new(words_from([0; WORDS]));
        let addr: [WireId; 32] = std::array::from_fn(|b| WireId::constant(b == 0)); // address 1
        let write_data: [WireId; 32] = std::array::from_fn(|b| WireId::constant((0xDEAD_BEEFu32 >> b) & 1 == 1));
        mem.access(&mut e, &addr, &write_data, WireId::TRUE);
        let out = mem.access(&mut e, &addr, &[WireId::FALSE; 32], WireId::FALSE);
        assert_eq!(eval32(&circuit, &out), 0xDEAD_BEEF);
    }

    #[test]
    fn write_does_not_disturb_other_cells() {
        let mut circuit = Circuit::new(2, 32).unwrap();
        let mut e = Emitter::new(&mut circuit, true, true);
        let mut mem = UltraMemory::new(words_from([1, 2, 3, 4, 5, 6, 7, 8]));
        let addr0: [WireId; 32] = [WireId::FALSE; 32];
        let write_data: [WireId; 32] = std::array::from_fn(|b| WireId::constant(b == 0));
        mem.access(&mut e, &addr0, &write_data, WireId::TRUE);
        let addr1: [WireId; 32] = std::array::from_fn(|b| WireId::constant(b == 0));
        let out = mem.access(&mut e, &addr1, &[WireId::FALSE; 32], WireId::FALSE);
        assert_eq!(eval32(&circuit, &out), 2);
    }
}
