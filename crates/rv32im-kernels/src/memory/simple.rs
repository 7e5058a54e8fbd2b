//! The `Simple` tier: 256 words, addressed by the low 8 bits. ~2,200 gates
//! per access — the same decoder/mux-tree structure as [`super::ultra`],
//! just wider.

use rv32im_circuit::WireId;

use crate::emitter::Emitter;

use super::{word_memory_access, MemoryTier};

const WORDS: usize = 256;
const ADDR_BITS: usize = 8;

/// The default memory tier: 256 words, each held as a [`WireId`] array.
pub struct SimpleMemory {
    cells: [[WireId; 32]; WORDS],
}

impl SimpleMemory {
    /// Builds a `Simple` memory seeded with `initial`.
    pub fn new(initial: [[WireId; 32]; WORDS]) -> Self {
        Self { cells: initial }
    }

    /// Builds a `Simple` memory with every cell wired to the constant zero
    /// word — the common case for a program whose initial memory image is
    /// all-zero data/bss.
    pub fn zeroed() -> Self {
        Self {
            cells: [[WireId::FALSE; 32]; WORDS],
        }
    }

    /// The current wire representation of every cell, in address order —
    /// used by the state codec to bind the final memory image to circuit
    /// outputs.
    pub fn cells(&self) -> &[[WireId; 32]; WORDS] {
        &self.cells
    }
}

impl MemoryTier for SimpleMemory {
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
