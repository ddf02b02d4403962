//! Codec error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("index {index} out of bounds (capacity {capacity})")]
    IndexOutOfBounds { index: usize, capacity: usize },

    #[error("value {value} does not fit in {bits} bits")]
    ValueTooLarge { value: u32, bits: u8 },

    #[error("packed data has {got} words, expected {expected} for {bits} bits per entry")]
    LengthMismatch { expected: usize, got: usize, bits: u8 },

    #[error("packed data has {got} words, which matches no width able to index {palette_len} entries")]
    NoMatchingWidth { got: usize, palette_len: usize },

    #[error("stored palette index {index} at cell {cell}, palette has {palette_len} entries")]
    PaletteIndex {
        cell: usize,
        index: u32,
        palette_len: usize,
    },

    #[error("palette is empty")]
    EmptyPalette,

    #[error("palette of {bits} bits cannot hold every state of the grid")]
    PaletteOverflow { bits: u8 },
}

impl CodecError {
    /// Whether the error stems from corrupt input data rather than a caller bug.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            CodecError::LengthMismatch { .. }
                | CodecError::NoMatchingWidth { .. }
                | CodecError::PaletteIndex { .. }
                | CodecError::EmptyPalette
        )
    }
}
