//! Java -> Bedrock chunk conversion: per-chunk translation and the parallel
//! driver over region units.

pub mod config;
pub mod converter;
pub mod error;
pub mod source;
pub mod translator;

pub use config::ConvertConfig;
pub use converter::{ConversionStats, Converter};
pub use error::{ChunkReadError, ConvertError};
pub use source::{ChunkSource, MemorySource, SourceChunk};
pub use translator::{ChunkOutcome, ChunkStats, ChunkTranslator, SkipReason};
