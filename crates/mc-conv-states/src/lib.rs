//! Java <-> Bedrock block state and biome mapping tables.
//!
//! Tables are loaded once and never mutated; share them behind an `Arc`.

pub mod biome;
pub mod error;
pub mod state;
pub mod table;

use std::path::Path;

pub use biome::{BiomeTable, FALLBACK_BIOME, VOID_BIOME};
pub use error::StateError;
pub use state::{BlockState, PropertyValue, StateKey};
pub use table::{StateTable, Translation};

/// Both mapping tables used by a conversion.
#[derive(Debug, Default)]
pub struct Mappings {
    pub blocks: StateTable,
    pub biomes: BiomeTable,
}

impl Mappings {
    pub fn from_json(blocks: &str, biomes: &str) -> Result<Self, StateError> {
        Ok(Self {
            blocks: StateTable::from_json(blocks)?,
            biomes: BiomeTable::from_json(biomes)?,
        })
    }

    /// Read both mapping files from disk.
    pub fn load(blocks: &Path, biomes: &Path) -> Result<Self, StateError> {
        let blocks = std::fs::read_to_string(blocks)?;
        let biomes = std::fs::read_to_string(biomes)?;
        Self::from_json(&blocks, &biomes)
    }
}
