use mc_conv_codec::CodecError;
use mc_conv_states::StateError;
use mc_conv_world::SinkError;
use thiserror::Error;

/// Errors that abort a conversion unit.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// A source state or biome has no destination counterpart.
    #[error("mapping gap: {0}")]
    MappingGap(String),

    /// Internal contract violation.
    #[error("usage error: {0}")]
    Usage(String),

    #[error("sink: {0}")]
    Sink(#[from] SinkError),

    /// A conversion task panicked or was cancelled.
    #[error("conversion task failed: {0}")]
    TaskFailed(String),
}

impl From<StateError> for ConvertError {
    fn from(err: StateError) -> Self {
        if err.is_usage_error() {
            ConvertError::Usage(err.to_string())
        } else {
            ConvertError::MappingGap(err.to_string())
        }
    }
}

impl From<CodecError> for ConvertError {
    fn from(err: CodecError) -> Self {
        ConvertError::Usage(err.to_string())
    }
}

/// A chunk record that could not be read from its container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed chunk record: {reason}")]
pub struct ChunkReadError {
    pub reason: String,
}

impl ChunkReadError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
