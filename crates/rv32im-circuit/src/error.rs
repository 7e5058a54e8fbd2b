//! Error taxonomy for the circuit arena.

/// Errors the circuit arena can surface.
///
/// Kernels never fail — they only emit gates. Only boundary construction
/// (size caps) can fail here; unknown-opcode failures belong to the lowerer
/// in `rv32im-compiler`.
#[derive(Debug, thiserror::Error)]
pub enum CircuitError {
    /// A requested input or output boundary exceeds the platform's maximum
    /// boundary width of 10 MiB (in bits).
    #[error(
        "circuit boundary too large: requested {requested_bits} bits, maximum is {max_bits} bits"
    )]
    CircuitTooLarge {
        /// The boundary width that was requested, in bits.
        requested_bits: u64,
        /// The platform's maximum boundary width, in bits.
        max_bits: u64,
    },

    /// The underlying allocator failed while growing the gate vector.
    #[error("out of memory while allocating circuit storage")]
    OutOfMemory,
}
