//! The polymorphic memory tier: one `access` interface, three gate-cost
//! profiles.
//!
//! Every tier reads the addressed word (before any write this cycle takes
//! effect) and, when `write_enable` is set, rebinds the addressed cell to
//! `write_data`. "Rebinding" is a Rust-level operation — the underlying
//! circuit is append-only, so a write doesn't mutate a gate, it just
//! changes which [`WireId`] represents that cell from this access onward,
//! via a mux between the old and new value gated on a decoder hit.

pub mod keccak;
pub mod secure;
pub mod simple;
pub mod ultra;

use rv32im_circuit::WireId;

use crate::emitter::Emitter;

pub use secure::SecureMemory;
pub use simple::SimpleMemory;
pub use ultra::UltraMemory;

/// A memory implementation pluggable into the instruction lowerer.
pub trait MemoryTier {
    /// Reads the word at `address`, and if `write_enable` is set, rebinds
    /// that word to `write_data`. Returns the word as it read *before* the
    /// write (the tiers are single-port, read-before-write per access).
    fn access(
        &mut self,
        e: &mut Emitter<'_>,
        address: &[WireId; 32],
        write_data: &[WireId; 32],
        write_enable: WireId,
    ) -> [WireId; 32];
}

/// Builds a one-hot "this cell matches `address`'s low `ADDR_BITS` bits"
/// signal for cell index `index`.
fn decoder_hit<const ADDR_BITS: usize>(e: &mut Emitter<'_>, address: &[WireId; 32], index: usize) -> WireId {
    let mut hit = WireId::TRUE;
    for b in 0..ADDR_BITS {
        let index_bit = WireId::constant((index >> b) & 1 == 1);
        let addr_xor_index = e.xor(address[b], index_bit);
        let same = e.not(addr_xor_index);
        hit = e.and(hit, same);
    }
    hit
}

/// Selects one word out of `cells` via a log-depth binary mux tree over
/// `addr_bits` (MSB-first: the final split bit is `addr_bits[0]`).
fn select_word(e: &mut Emitter<'_>, cells: &[[WireId; 32]], addr_bits: &[WireId]) -> [WireId; 32] {
    if cells.len() == 1 {
        return cells[0];
    }
    let half = cells.len() / 2;
    let sel = addr_bits[addr_bits.len() - 1];
    let rest = &addr_bits[..addr_bits.len() - 1];
    let lo = select_word(e, &cells[..half], rest);
    let hi = select_word(e, &cells[half..], rest);
    std::array::from_fn(|i| e.mux(sel, lo[i], hi[i]))
}

/// Shared implementation behind both [`ultra::UltraMemory`] and
/// [`simple::SimpleMemory`]: a flat array of `WORDS` 32-bit cells addressed
/// by the low `ADDR_BITS` bits, read via a binary mux tree and written via
/// a one-hot decoder-gated mux per cell.
fn word_memory_access<const WORDS: usize, const ADDR_BITS: usize>(
    e: &mut Emitter<'_>,
    cells: &mut [[WireId; 32]; WORDS],
    address: &[WireId; 32],
    write_data: &[WireId; 32],
    write_enable: WireId,
) -> [WireId; 32] {
    let addr_bits: [WireId; ADDR_BITS] = std::array::from_fn(|b| address[b]);
    let read_data = select_word(e, cells, &addr_bits);

    for i in 0..WORDS {
        let hit = decoder_hit::<ADDR_BITS>(e, address, i);
        let do_write = e.and(write_enable, hit);
        cells[i] = std::array::from_fn(|b| e.mux(do_write, cells[i][b], write_data[b]));
    }

    read_data
}
