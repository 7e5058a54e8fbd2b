//! The register/PC wire map and the `MachineState` bit codec.
//!
//! The register wire map is a value, not a pointer graph: 32 fixed-size
//! slots of 32 [`WireId`]s each, mutated in place as instructions lower.
//! Overwriting a slot never disturbs gates that already consumed its old
//! WireIds — those wires stay valid for the circuit's whole lifetime.

use rv32im_circuit::{WireLayout, WireId, NUM_REGS, WORD_BITS};

/// The live symbolic state an instruction sequence lowers against: which
/// wire currently represents each register bit and each PC bit.
///
/// Starts pointing every slot at its corresponding input wire (per
/// [`WireLayout`]); each instruction that writes `rd` (or updates the PC)
/// overwrites the relevant slot with fresh WireIds.
pub struct RegisterFile {
    regs: [[WireId; WORD_BITS]; NUM_REGS],
    pc: [WireId; WORD_BITS],
}

impl RegisterFile {
    /// Builds the initial wire map: every slot points at its input wire.
    pub fn new(layout: &WireLayout) -> Self {
        Self {
            regs: std::array::from_fn(|r| layout.reg_wires(r)),
            pc: layout.pc_wires(),
        }
    }

    /// The current 32 wires backing register `reg`.
    #[inline]
    pub fn reg(&self, reg: u8) -> [WireId; WORD_BITS] {
        self.regs[reg as usize]
    }

    /// Overwrites register `reg`'s wire slot, unless `reg` is `x0` (invariant
    /// I3: register 0 always reads as the constant-0 wire).
    pub fn set_reg(&mut self, reg: u8, value: [WireId; WORD_BITS]) {
        if reg == 0 {
            return;
        }
        self.regs[reg as usize] = value;
    }

    /// The current 32 wires backing the program counter.
    #[inline]
    pub fn pc(&self) -> [WireId; WORD_BITS] {
        self.pc
    }

    /// Overwrites the PC's wire slot.
    pub fn set_pc(&mut self, value: [WireId; WORD_BITS]) {
        self.pc = value;
    }
}

/// A complete RISC-V machine snapshot, used only at the circuit boundary
/// (encoding inputs, decoding outputs) — never referenced mid-compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineState {
    pub pc: u32,
    pub regs: [u32; 32],
    pub memory: Vec<u8>,
}

impl MachineState {
    /// Encodes this state into a full input-bit vector matching `layout`
    /// (PC before registers before memory, LSB first within each field).
    pub fn encode_inputs(&self, layout: &WireLayout) -> Vec<bool> {
        assert_eq!(self.memory.len(), layout.memory_bytes(), "memory image length must match the layout");
        let mut bits = vec![false; layout.num_inputs()];
        bits[0] = false; // wire 0: constant false
        bits[1] = true; // wire 1: constant true

        for b in 0..WORD_BITS {
            bits[u32::from(layout.pc_wire(b)) as usize] = (self.pc >> b) & 1 == 1;
        }
        for r in 0..NUM_REGS {
            for b in 0..WORD_BITS {
                bits[u32::from(layout.reg_wire(r, b)) as usize] = (self.regs[r] >> b) & 1 == 1;
            }
        }
        for (byte_idx, &byte) in self.memory.iter().enumerate() {
            for b in 0..8 {
                bits[u32::from(layout.memory_bit_wire(byte_idx, b)) as usize] = (byte >> b) & 1 == 1;
            }
        }
        bits
    }

    /// Decodes a post-execution state from a full wire-value vector, reading
    /// PC from `pc_out`, registers from `reg_out` (one 32-wire array per
    /// register, in order), and memory from `memory_out` bytes worth of
    /// 8-wire arrays.
    pub fn decode_outputs(
        values: &[bool],
        pc_out: &[WireId; WORD_BITS],
        reg_out: &[[WireId; WORD_BITS]; NUM_REGS],
        memory_out: &[[WireId; 8]],
    ) -> Self {
        let pc = pack(values, pc_out);
        let regs: [u32; 32] = std::array::from_fn(|r| pack(values, &reg_out[r]));
        let memory = memory_out.iter().map(|byte_wires| pack8(values, byte_wires)).collect();
        Self { pc, regs, memory }
    }
}

fn pack(values: &[bool], wires: &[WireId; WORD_BITS]) -> u32 {
    let mut word = 0u32;
    for (b, &w) in wires.iter().enumerate() {
        if values[u32::from(w) as usize] {
            word |= 1 << b;
        }
    }
    word
}

fn pack8(values: &[bool], wires: &[WireId; 8]) -> u8 {
    let mut byte = 0u8;
    for (b, &w) in wires.iter().enumerate() {
        if values[u32::from(w) as usize] {
            byte |= 1 << b;
        }
    }
    byte
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv32im_circuit::Circuit;

    #[test]
    fn reset_file_points_at_input_wires() {
        let layout = WireLayout::new(16);
        let file = RegisterFile::new(&layout);
        assert_eq!(file.pc(), layout.pc_wires());
        assert_eq!(file.reg(5), layout.reg_wires(5));
    }

    #[test]
    fn writing_register_zero_is_a_no_op() {
        let layout = WireLayout::new(16);
        let mut file = RegisterFile::new(&layout);
        let original = file.reg(0);
        file.set_reg(0, [WireId::TRUE; WORD_BITS]);
        assert_eq!(file.reg(0), original);
    }

    #[test]
    fn encode_round_trips_through_a_pass_through_circuit() {
        let layout = WireLayout::new(4);
        let mut circuit = Circuit::new(layout.num_inputs(), layout.num_inputs() - 2).unwrap();

        for b in 0..WORD_BITS {
            circuit.push_output(layout.pc_wire(b));
        }
        for r in 0..NUM_REGS {
            for b in 0..WORD_BITS {
                circuit.push_output(layout.reg_wire(r, b));
            }
        }
        for byte_idx in 0..4 {
            for b in 0..8 {
                circuit.push_output(layout.memory_bit_wire(byte_idx, b));
            }
        }

        let state = MachineState {
            pc: 0x0000_1000,
            regs: std::array::from_fn(|r| r as u32 * 7),
            memory: vec![0xAB, 0xCD, 0xEF, 0x01],
        };
        let inputs = state.encode_inputs(&layout);

        let pc_out: [WireId; WORD_BITS] = layout.pc_wires();
        let reg_out: [[WireId; WORD_BITS]; NUM_REGS] = std::array::from_fn(|r| layout.reg_wires(r));
        let memory_out: Vec<[WireId; 8]> = (0..4)
            .map(|byte_idx| std::array::from_fn(|b| layout.memory_bit_wire(byte_idx, b)))
            .collect();

        let decoded = MachineState::decode_outputs(&inputs, &pc_out, &reg_out, &memory_out);
        assert_eq!(decoded, state);
    }
}
