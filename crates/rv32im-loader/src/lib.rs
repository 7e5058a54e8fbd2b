//! The boundary type the compiler's program supplier hands over (§6.1),
//! plus a minimal raw-word loader.
//!
//! The core compiler does not parse ELF — an upstream collaborator is
//! expected to do that and hand over a [`ProgramImage`]. This crate's own
//! loader exists so the CLI and integration tests have a working
//! end-to-end path without a real ELF toolchain dependency; it reads a flat
//! little-endian instruction stream, nothing more.

mod error;

pub use error::LoaderError;

/// Everything the compiler needs about a loaded program, independent of how
/// it was produced.
///
/// Loadable segments are marked text (executable) or data (writable); only
/// text ever supplies instructions. `code_start`/`code_end` and
/// `data_start`/`data_size` are addresses in the target's flat memory space,
/// not offsets into `instructions`/`data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramImage {
    pub instructions: Vec<u32>,
    pub entry_point: u32,
    pub code_start: u32,
    pub code_end: u32,
    pub data_start: u32,
    pub data_size: u32,
    pub data: Vec<u8>,
}

impl ProgramImage {
    /// Builds an image with no data segment: the whole byte stream is
    /// code, loaded at address 0, and execution starts at the first
    /// instruction.
    ///
    /// `bytes.len()` must be a multiple of 4; each 4-byte little-endian
    /// chunk becomes one instruction word.
    pub fn from_raw_code(bytes: &[u8]) -> Result<Self, LoaderError> {
        if bytes.len() % 4 != 0 {
            return Err(LoaderError::MisalignedCode { len: bytes.len() });
        }

        let instructions: Vec<u32> = bytes.chunks_exact(4).map(|chunk| u32::from_le_bytes(chunk.try_into().unwrap())).collect();
        let code_end = instructions.len() as u32 * 4;

        tracing::debug!(words = instructions.len(), "loaded raw instruction stream");
        Ok(Self { instructions, entry_point: 0, code_start: 0, code_end, data_start: code_end, data_size: 0, data: Vec::new() })
    }

    /// Builds an image from already-decoded instruction words (the same
    /// layout the compiler's `compile()` entry point takes directly) plus a
    /// data segment placed immediately after the code.
    pub fn from_words_and_data(instructions: Vec<u32>, data: Vec<u8>) -> Self {
        let code_end = instructions.len() as u32 * 4;
        let data_size = data.len() as u32;
        Self { instructions, entry_point: 0, code_start: 0, code_end, data_start: code_end, data_size, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_code_decodes_little_endian_words_in_order() {
        let bytes = [0x01, 0x02, 0x03, 0x04, 0xAA, 0xBB, 0xCC, 0xDD];
        let image = ProgramImage::from_raw_code(&bytes).unwrap();
        assert_eq!(image.instructions, vec![0x0403_0201, 0xDDCC_BBAA]);
        assert_eq!(image.code_start, 0);
        assert_eq!(image.code_end, 8);
        assert_eq!(image.data_size, 0);
    }

    #[test]
    fn a_misaligned_byte_stream_is_rejected() {
        let err = ProgramImage::from_raw_code(&[0, 1, 2]).unwrap_err();
        assert!(matches!(err, LoaderError::MisalignedCode { len: 3 }));
    }

    #[test]
    fn words_and_data_places_the_data_segment_right_after_code() {
        let image = ProgramImage::from_words_and_data(vec![1, 2, 3], vec![0xFF; 16]);
        assert_eq!(image.code_end, 12);
        assert_eq!(image.data_start, 12);
        assert_eq!(image.data_size, 16);
    }
}
