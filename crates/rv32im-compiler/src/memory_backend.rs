//! Builds the selected [`MemoryTier`] from the compiler's configuration and
//! the machine's memory input wires.

use rv32im_circuit::{WireLayout, WireId};
use rv32im_kernels::memory::secure::PRODUCTION_LEVELS;
use rv32im_kernels::{Emitter, MemoryTier, SecureMemory, SimpleMemory, UltraMemory};

use crate::config::MemoryTierKind;

/// The three memory tiers behind one interface, chosen once at compiler
/// construction (spec.md §9's "polymorphism of the memory tier" note: a
/// capability interface rather than the source's function-pointer
/// indirection).
pub enum MemoryBackend {
    Ultra(UltraMemory),
    Simple(SimpleMemory),
    Secure(SecureMemory<PRODUCTION_LEVELS>),
}

impl MemoryBackend {
    /// Builds the backend named by `kind`, seeding its cells from `layout`'s
    /// memory input wires.
    pub fn new(kind: MemoryTierKind, e: &mut Emitter<'_>, layout: &WireLayout) -> Self {
        match kind {
            MemoryTierKind::Ultra => {
                let cells: [[WireId; 32]; 8] = std::array::from_fn(|i| word_wires(layout, i));
                MemoryBackend::Ultra(UltraMemory::new(cells))
            }
            MemoryTierKind::Simple => {
                let cells: [[WireId; 32]; 256] = std::array::from_fn(|i| word_wires(layout, i));
                MemoryBackend::Simple(SimpleMemory::new(cells))
            }
            MemoryTierKind::Secure => {
                let leaves: Vec<[WireId; 32]> = (0..1 << PRODUCTION_LEVELS).map(|i| word_wires(layout, i)).collect();
                MemoryBackend::Secure(SecureMemory::new(e, leaves))
            }
        }
    }
}

impl MemoryBackend {
    /// The bits the state codec should bind to circuit outputs: every cell
    /// of `Ultra`/`Simple`, or the single Merkle root of `Secure`.
    pub fn output_bits(&self) -> Vec<WireId> {
        match self {
            MemoryBackend::Ultra(m) => m.cells().iter().flatten().copied().collect(),
            MemoryBackend::Simple(m) => m.cells().iter().flatten().copied().collect(),
            MemoryBackend::Secure(m) => m.root().to_vec(),
        }
    }
}

fn word_wires(layout: &WireLayout, word_index: usize) -> [WireId; 32] {
    std::array::from_fn(|bit| {
        let byte_idx = word_index * 4 + bit / 8;
        layout.memory_bit_wire(byte_idx, bit % 8)
    })
}

impl MemoryTier for MemoryBackend {
    fn access(
        &mut self,
        e: &mut Emitter<'_>,
        address: &[WireId; 32],
        write_data: &[WireId; 32],
        write_enable: WireId,
    ) -> [WireId; 32] {
        match self {
            MemoryBackend::Ultra(m) => m.access(e, address, write_data, write_enable),
            MemoryBackend::Simple(m) => m.access(e, address, write_data, write_enable),
            MemoryBackend::Secure(m) => m.access(e, address, write_data, write_enable),
        }
    }
}
