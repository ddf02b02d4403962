//! Where converted chunks go.

use std::sync::Mutex;

use thiserror::Error;

use crate::chunk::{ChunkColumn, ChunkPos, Dimension};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("LevelDB: {0}")]
    Db(String),

    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink is closed")]
    Closed,

    #[error("sink lock poisoned")]
    Poisoned,
}

/// World-level metadata carried over from the source level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldSettings {
    pub name: String,
    pub time: i64,
    pub spawn: (i32, i32, i32),
}

/// Destination storage contract. Called concurrently from every conversion
/// unit; implementations do their own locking.
pub trait ChunkSink: Send + Sync {
    fn save_chunk(
        &self,
        pos: ChunkPos,
        chunk: &ChunkColumn,
        dimension: Dimension,
    ) -> Result<(), SinkError>;

    fn save_settings(&self, settings: &WorldSettings) -> Result<(), SinkError>;
}

/// Keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    chunks: Mutex<Vec<(ChunkPos, Dimension, ChunkColumn)>>,
    settings: Mutex<Option<WorldSettings>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saved chunks in save order.
    pub fn chunks(&self) -> Vec<(ChunkPos, Dimension, ChunkColumn)> {
        self.chunks.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.lock().map(|c| c.len()).unwrap_or_default()
    }

    pub fn settings(&self) -> Option<WorldSettings> {
        self.settings.lock().ok().and_then(|s| s.clone())
    }
}

impl ChunkSink for MemorySink {
    fn save_chunk(
        &self,
        pos: ChunkPos,
        chunk: &ChunkColumn,
        dimension: Dimension,
    ) -> Result<(), SinkError> {
        self.chunks
            .lock()
            .map_err(|_| SinkError::Poisoned)?
            .push((pos, dimension, chunk.clone()));
        Ok(())
    }

    fn save_settings(&self, settings: &WorldSettings) -> Result<(), SinkError> {
        *self.settings.lock().map_err(|_| SinkError::Poisoned)? = Some(settings.clone());
        Ok(())
    }
}
