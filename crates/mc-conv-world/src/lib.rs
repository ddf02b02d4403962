//! Destination world: Bedrock chunk columns, runtime ids and chunk sinks.

pub mod block_hash;
pub mod chunk;
pub mod level_dat;
pub mod sink;
pub mod storage;

pub use block_hash::{HashedRegistry, RuntimeIdRegistry};
pub use chunk::{ChunkColumn, ChunkPos, Dimension, PalettedStorage, SubChunk};
pub use sink::{ChunkSink, MemorySink, SinkError, WorldSettings};
pub use storage::LevelDbSink;
