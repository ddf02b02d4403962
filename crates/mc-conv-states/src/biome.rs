//! Java biome name -> Bedrock biome id.
//!
//! Resource format: `{ "minecraft:plains": { "bedrock_id": 1 }, ... }`.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::error::StateError;
use crate::table::id_bits;

/// Java-only biome with no Bedrock counterpart.
pub const VOID_BIOME: &str = "minecraft:the_void";
/// Biome used in place of [`VOID_BIOME`].
pub const FALLBACK_BIOME: &str = "minecraft:ocean";

#[derive(Debug, Deserialize)]
struct BiomeEntry {
    bedrock_id: u32,
}

#[derive(Debug, Default)]
pub struct BiomeTable {
    ids: HashMap<String, u32>,
    names: Vec<String>,
    bedrock_ids: Vec<u32>,
}

impl BiomeTable {
    pub fn from_json(json: &str) -> Result<Self, StateError> {
        let root: Map<String, Value> = serde_json::from_str(json)?;
        let mut table = Self::default();

        for (name, value) in root {
            let entry: BiomeEntry =
                serde_json::from_value(value).map_err(|e| StateError::MalformedEntry {
                    key: name.clone(),
                    reason: e.to_string(),
                })?;
            let id = table.names.len() as u32;
            table.ids.insert(name.clone(), id);
            table.names.push(name);
            table.bedrock_ids.push(entry.bedrock_id);
        }

        info!("Loaded {} biome mappings", table.len());
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn id_bits(&self) -> u8 {
        id_bits(self.len())
    }

    /// Dense id of a Java biome. The void biome resolves to the fallback's id
    /// when the table does not list it.
    pub fn source_biome_to_id(&self, name: &str) -> Result<u32, StateError> {
        self.ids
            .get(name)
            .or_else(|| (name == VOID_BIOME).then(|| self.ids.get(FALLBACK_BIOME)).flatten())
            .copied()
            .ok_or_else(|| StateError::UnknownBiome(name.to_string()))
    }

    pub fn id_to_source_biome(&self, id: u32) -> Result<&str, StateError> {
        self.names
            .get(id as usize)
            .map(String::as_str)
            .ok_or(StateError::UnknownId(id))
    }

    /// Bedrock id for a Java biome name, `None` on a mapping gap.
    pub fn translate_to_destination(&self, name: &str) -> Option<u32> {
        let name = if name == VOID_BIOME { FALLBACK_BIOME } else { name };
        let id = *self.ids.get(name)?;
        self.bedrock_ids.get(id as usize).copied()
    }

    /// Bedrock id for a dense biome id.
    pub fn translate_id(&self, id: u32) -> Option<u32> {
        let name = self.names.get(id as usize)?;
        self.translate_to_destination(name)
    }
}
