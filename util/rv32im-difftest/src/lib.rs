//! In-process differential testing support for the rest of the workspace:
//! a bit-level circuit simulator and a from-scratch RV32IM reference
//! interpreter. Used exclusively by tests — nothing in the compiler or CLI
//! depends on this crate.

mod interpreter;
mod simulate;

pub use interpreter::{reference_run, reference_run_words, reference_step};
pub use simulate::{run_program, simulate};
