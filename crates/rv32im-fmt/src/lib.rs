//! Gate-list text formats for a finished circuit: a flat emission-order
//! listing, and a layered listing grouped by longest-input-path layer for
//! consumers that want to process gates level by level.

mod error;
mod flat;
mod layered;
mod parsed;

pub use error::FmtError;
pub use flat::{read_flat, write_flat};
pub use layered::{read_layered, write_layered};
pub use parsed::{ParsedCircuit, ParsedGate};
