//! Java chunk records as handed over by the region reader.
//!
//! Field names follow the Java chunk NBT, so any serde-driven NBT decoder can
//! produce these records directly.

use std::collections::{BTreeMap, VecDeque};

use mc_conv_states::{BlockState, PropertyValue};
use serde::Deserialize;

use crate::error::ChunkReadError;

/// One decoded Java chunk.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SourceChunk {
    /// Generation status, `"minecraft:full"` (or `"full"`) once finished.
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "xPos")]
    pub x_pos: i32,
    #[serde(rename = "zPos")]
    pub z_pos: i32,
    /// Lowest section index.
    #[serde(rename = "yPos", default)]
    pub y_pos: i32,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// A 16-block tall slab of a chunk.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Section {
    #[serde(rename = "Y")]
    pub y: i32,
    #[serde(default)]
    pub block_states: Option<BlockStates>,
    #[serde(default)]
    pub biomes: Option<Biomes>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BlockStates {
    pub palette: Vec<PaletteEntry>,
    /// Packed palette indices, absent when the palette has a single entry.
    #[serde(default)]
    pub data: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PaletteEntry {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Properties", default)]
    pub properties: BTreeMap<String, String>,
}

impl PaletteEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Java properties are always strings.
    pub fn to_block_state(&self) -> BlockState {
        BlockState {
            name: self.name.clone(),
            properties: self
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), PropertyValue::Text(v.clone())))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Biomes {
    pub palette: Vec<String>,
    #[serde(default)]
    pub data: Option<Vec<i64>>,
}

/// A unit of work, typically one region file: a sequence of chunk records.
pub trait ChunkSource: Send {
    /// Unit coordinates, used for logging.
    fn position(&self) -> (i32, i32);

    /// The next record, `None` when the unit is exhausted. A record that
    /// cannot be decoded yields an error and the unit continues.
    fn next_chunk(&mut self) -> Option<Result<SourceChunk, ChunkReadError>>;
}

/// Chunk records held in memory.
#[derive(Debug, Default)]
pub struct MemorySource {
    position: (i32, i32),
    records: VecDeque<Result<SourceChunk, ChunkReadError>>,
}

impl MemorySource {
    pub fn new(position: (i32, i32), chunks: Vec<SourceChunk>) -> Self {
        Self::from_records(position, chunks.into_iter().map(Ok).collect())
    }

    /// Records including read failures.
    pub fn from_records(
        position: (i32, i32),
        records: Vec<Result<SourceChunk, ChunkReadError>>,
    ) -> Self {
        Self {
            position,
            records: records.into(),
        }
    }
}

impl ChunkSource for MemorySource {
    fn position(&self) -> (i32, i32) {
        self.position
    }

    fn next_chunk(&mut self) -> Option<Result<SourceChunk, ChunkReadError>> {
        self.records.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_java_layout() {
        let json = r#"{
            "Status": "minecraft:full",
            "xPos": 3,
            "zPos": -7,
            "yPos": -4,
            "sections": [
                {
                    "Y": -4,
                    "block_states": {
                        "palette": [
                            { "Name": "minecraft:air" },
                            { "Name": "minecraft:oak_log", "Properties": { "axis": "y" } }
                        ],
                        "data": [1, -1]
                    },
                    "biomes": { "palette": ["minecraft:plains"] }
                },
                { "Y": 5 }
            ]
        }"#;
        let chunk: SourceChunk = serde_json::from_str(json).unwrap();
        assert_eq!(chunk.status, "minecraft:full");
        assert_eq!((chunk.x_pos, chunk.z_pos, chunk.y_pos), (3, -7, -4));
        assert_eq!(chunk.sections.len(), 2);

        let blocks = chunk.sections[0].block_states.as_ref().unwrap();
        assert_eq!(blocks.data, Some(vec![1, -1]));
        assert_eq!(
            blocks.palette[1].to_block_state().to_string(),
            "minecraft:oak_log[axis=y]"
        );
        let biomes = chunk.sections[0].biomes.as_ref().unwrap();
        assert_eq!(biomes.data, None);
        assert!(chunk.sections[1].block_states.is_none());
    }

    #[test]
    fn palette_entry_matches_compact_form() {
        let entry = PaletteEntry::new("minecraft:oak_stairs")
            .with("half", "top")
            .with("facing", "east");
        let parsed = BlockState::parse_compact("minecraft:oak_stairs[facing=east,half=top]").unwrap();
        assert_eq!(entry.to_block_state().key(), parsed.key());
    }

    #[test]
    fn memory_source_drains_in_order() {
        let mut source = MemorySource::from_records(
            (1, 2),
            vec![
                Ok(SourceChunk::default()),
                Err(ChunkReadError::new("bad sector")),
            ],
        );
        assert_eq!(source.position(), (1, 2));
        assert!(matches!(source.next_chunk(), Some(Ok(_))));
        assert!(matches!(source.next_chunk(), Some(Err(_))));
        assert!(source.next_chunk().is_none());
    }
}
