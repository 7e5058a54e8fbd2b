//! The compiler's error taxonomy.

use rv32im_circuit::CircuitError;

/// Everything that can keep a program from lowering to a circuit.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The circuit arena rejected an input/output boundary as too wide.
    #[error(transparent)]
    CircuitTooLarge(#[from] CircuitError),

    /// A decoded instruction has no lowering — either the opcode/funct3/
    /// funct7 combination isn't part of RV32IM, or it names a feature this
    /// compiler doesn't implement (e.g. FENCE, CSR access).
    #[error("instruction at word {word_index} ({encoding:#010x}) is unsupported: {reason}")]
    UnsupportedOpcode {
        word_index: usize,
        encoding: u32,
        reason: String,
    },

    /// A load, store, or `SecureMemory` access landed outside what the
    /// configured memory tier can address.
    #[error("memory constraint exceeded at word {word_index}: {reason}")]
    MemoryConstraintExceeded { word_index: usize, reason: String },

    /// The program exceeds the configured instruction-count bound.
    #[error("program has {actual} instructions, exceeding the configured limit of {limit}")]
    OutOfMemory { actual: usize, limit: usize },
}
