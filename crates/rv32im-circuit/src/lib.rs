//! Circuit arena and wire layout for the RV32IM-to-gates compiler.
//!
//! This crate owns the lowest level of the stack: a dense wire allocator, an
//! append-only list of two-input AND/XOR gates, and the fixed input-wire
//! layout (PC, registers, memory) that every instruction lowering is built
//! against. Everything above this crate (kernels, the instruction lowerer,
//! memory tiers) is expressed purely in terms of [`WireId`]s and [`Circuit`]
//! operations.

mod arena;
mod error;
mod gate;
mod layout;
mod wire;

pub use arena::{Circuit, MAX_BOUNDARY_BITS};
pub use error::CircuitError;
pub use gate::{Gate, GateKind};
pub use layout::{NUM_REGS, WORD_BITS, WireLayout};
pub use wire::WireId;
