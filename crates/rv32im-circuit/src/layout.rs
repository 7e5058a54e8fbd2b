//! Fixed input-wire layout: PC bits, register bits, and memory bits.
//!
//! Wires 0 and 1 are the boolean constants. Remaining input bits, in order,
//! are 32 PC bits (LSB first), then 32×32 register bits (register `r` bit
//! `b` at offset `2 + 32 + 32*r + b`), then the memory image
//! (`memory_bytes * 8` bits).

use crate::wire::WireId;

/// Number of bits in a RISC-V word.
pub const WORD_BITS: usize = 32;

/// Number of general-purpose registers (x0..=x31).
pub const NUM_REGS: usize = 32;

/// Offset of the first PC input bit (after the two constant wires).
pub const PC_OFFSET: usize = 2;

/// Offset of the first register input bit.
pub const REGS_OFFSET: usize = PC_OFFSET + WORD_BITS;

/// Describes how machine state bits map onto a circuit's fixed input range.
#[derive(Debug, Clone, Copy)]
pub struct WireLayout {
    memory_bytes: usize,
}

impl WireLayout {
    /// Builds a layout for a machine with `memory_bytes` bytes of memory.
    pub fn new(memory_bytes: usize) -> Self {
        Self { memory_bytes }
    }

    /// The number of memory bytes this layout was built for.
    #[inline]
    pub fn memory_bytes(&self) -> usize {
        self.memory_bytes
    }

    /// Offset of the first memory input bit.
    #[inline]
    pub fn memory_offset(&self) -> usize {
        REGS_OFFSET + NUM_REGS * WORD_BITS
    }

    /// Total number of input bits (the circuit's `num_inputs`).
    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.memory_offset() + self.memory_bytes * 8
    }

    /// The input wire for PC bit `bit` (0 = LSB).
    #[inline]
    pub fn pc_wire(&self, bit: usize) -> WireId {
        assert!(bit < WORD_BITS);
        WireId::from((PC_OFFSET + bit) as u32)
    }

    /// The input wire for register `reg` bit `bit` (0 = LSB).
    #[inline]
    pub fn reg_wire(&self, reg: usize, bit: usize) -> WireId {
        assert!(reg < NUM_REGS);
        assert!(bit < WORD_BITS);
        WireId::from((REGS_OFFSET + reg * WORD_BITS + bit) as u32)
    }

    /// The input wire for byte `byte_idx`, bit `bit` of the memory image.
    #[inline]
    pub fn memory_bit_wire(&self, byte_idx: usize, bit: usize) -> WireId {
        assert!(byte_idx < self.memory_bytes);
        assert!(bit < 8);
        WireId::from((self.memory_offset() + byte_idx * 8 + bit) as u32)
    }

    /// All 32 input wires for PC, LSB first.
    pub fn pc_wires(&self) -> [WireId; WORD_BITS] {
        std::array::from_fn(|b| self.pc_wire(b))
    }

    /// All 32 input wires for register `reg`, LSB first.
    pub fn reg_wires(&self, reg: usize) -> [WireId; WORD_BITS] {
        std::array::from_fn(|b| self.reg_wire(reg, b))
    }
}
