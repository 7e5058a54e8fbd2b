//! Parse and I/O failures for the flat and layered gate-list formats.

use rv32im_circuit::CircuitError;
use thiserror::Error;

/// Failures reading or writing a gate-list file.
#[derive(Debug, Error)]
pub enum FmtError {
    /// The underlying file or buffer failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The parsed header described a circuit too large for the platform.
    #[error(transparent)]
    Circuit(#[from] CircuitError),

    /// A line didn't match the expected header or gate shape.
    #[error("line {line}: {reason}")]
    Malformed {
        /// 1-indexed line number within the file.
        line: usize,
        /// What was expected instead.
        reason: String,
    },

    /// A gate referenced a wire before the file defined it.
    #[error("line {line}: wire {wire} used before it was defined")]
    UseBeforeDefinition {
        /// 1-indexed line number within the file.
        line: usize,
        /// The offending wire id.
        wire: u32,
    },
}
