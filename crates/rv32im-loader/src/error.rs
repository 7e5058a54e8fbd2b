//! Loader failures.

use thiserror::Error;

/// Failures building a [`crate::ProgramImage`] from raw bytes.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The code segment's length wasn't a multiple of 4 bytes.
    #[error("code segment is {len} bytes, not a multiple of the 4-byte instruction width")]
    MisalignedCode {
        /// The offending segment length.
        len: usize,
    },
}
