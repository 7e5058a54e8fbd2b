//! Arithmetic, logic, and memory kernels: every module here builds gates
//! through an [`Emitter`], never touching a [`rv32im_circuit::Circuit`]
//! directly, so structural deduplication and pattern caching apply
//! uniformly across the whole kernel set.

mod adder;
mod comparator;
mod divider;
mod emitter;
mod fnv;
pub mod memory;
mod multiplier;
mod pattern_cache;
mod shifter;
mod subtractor;

pub use adder::{ripple_carry_add, sparse_kogge_stone_add};
pub use comparator::{equal, not_equal, signed_ge, signed_less_than, unsigned_ge, unsigned_le, unsigned_less_than};
pub use divider::{divide, DivOutput};
pub use emitter::Emitter;
pub use memory::{MemoryTier, SecureMemory, SimpleMemory, UltraMemory};
pub use multiplier::{multiply, MulOutput};
pub use pattern_cache::PatternCache;
pub use shifter::{barrel_shift, ShiftKind};
pub use subtractor::{abs_value, negate, subtract};
