//! State table errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("unknown source state {0}")]
    UnknownState(String),

    #[error("unknown state id {0}")]
    UnknownId(u32),

    #[error("unknown biome {0}")]
    UnknownBiome(String),

    #[error("property {key}: unsupported value type {found}")]
    InvalidPropertyType { key: String, found: &'static str },

    #[error("malformed state key {0:?}")]
    MalformedKey(String),

    #[error("mapping entry {key}: {reason}")]
    MalformedEntry { key: String, reason: String },

    #[error("mapping JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("mapping file: {0}")]
    Io(#[from] std::io::Error),
}

impl StateError {
    /// Whether the error is a property typing violation rather than a lookup miss
    /// or a broken resource.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, StateError::InvalidPropertyType { .. })
    }
}
