//! Java block state <-> dense id table and Java -> Bedrock translation.
//!
//! Built once from the block mapping resource: a JSON object keyed by compact
//! Java states, in the Java registry order, each value naming the Bedrock state.
//!
//! ```json
//! { "minecraft:oak_log[axis=y]": { "bedrock_identifier": "minecraft:oak_log",
//!                                  "bedrock_states": { "pillar_axis": "y" } } }
//! ```

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::error::StateError;
use crate::state::{BlockState, PropertyValue, StateKey};

/// Java blocks that always carry water on Bedrock.
const ALWAYS_WATERLOGGED: [&str; 2] = ["minecraft:bubble_column", "minecraft:kelp"];

/// Destination state for one source state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub state: BlockState,
    /// A water layer has to be written alongside the block.
    pub waterlogged: bool,
}

#[derive(Debug, Deserialize)]
struct DestinationEntry {
    bedrock_identifier: String,
    #[serde(default)]
    bedrock_states: Map<String, Value>,
}

#[derive(Debug, Default)]
pub struct StateTable {
    ids: HashMap<StateKey, u32>,
    states: Vec<BlockState>,
    translations: Vec<Translation>,
}

impl StateTable {
    /// Parse the block mapping JSON. Ids follow the order of the object's keys.
    pub fn from_json(json: &str) -> Result<Self, StateError> {
        let root: Map<String, Value> = serde_json::from_str(json)?;
        let mut table = Self {
            ids: HashMap::with_capacity(root.len()),
            states: Vec::with_capacity(root.len()),
            translations: Vec::with_capacity(root.len()),
        };

        for (key, value) in root {
            let source = BlockState::parse_compact(&key)?;
            let entry: DestinationEntry =
                serde_json::from_value(value).map_err(|e| StateError::MalformedEntry {
                    key: key.clone(),
                    reason: e.to_string(),
                })?;

            let mut destination = BlockState::new(entry.bedrock_identifier);
            for (name, value) in &entry.bedrock_states {
                destination
                    .properties
                    .insert(name.clone(), PropertyValue::from_json(name, value)?);
            }

            let waterlogged = ALWAYS_WATERLOGGED.contains(&source.name.as_str())
                || key.contains("waterlogged=true")
                || key.contains("seagrass");

            let id = table.states.len() as u32;
            if table.ids.insert(source.key(), id).is_some() {
                return Err(StateError::MalformedEntry {
                    key,
                    reason: "duplicate source state".into(),
                });
            }
            table.states.push(source);
            table.translations.push(Translation {
                state: destination,
                waterlogged,
            });
        }

        info!("Loaded {} block state mappings", table.len());
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Bits needed to address every id in the table.
    pub fn id_bits(&self) -> u8 {
        id_bits(self.len())
    }

    pub fn source_state_to_id(&self, state: &BlockState) -> Result<u32, StateError> {
        self.ids
            .get(&state.key())
            .copied()
            .ok_or_else(|| StateError::UnknownState(state.to_string()))
    }

    pub fn id_to_source_state(&self, id: u32) -> Result<&BlockState, StateError> {
        self.states
            .get(id as usize)
            .ok_or(StateError::UnknownId(id))
    }

    /// Bedrock state for a Java state. `None` means the mapping table has no
    /// entry, which callers must treat as an error.
    pub fn translate_to_destination(&self, state: &BlockState) -> Option<&Translation> {
        let id = *self.ids.get(&state.key())?;
        self.translations.get(id as usize)
    }

    /// Same as [`translate_to_destination`](Self::translate_to_destination) by dense id.
    pub fn translate_id(&self, id: u32) -> Option<&Translation> {
        self.translations.get(id as usize)
    }
}

/// Bits needed to store ids `0..len`, at least one.
pub(crate) fn id_bits(len: usize) -> u8 {
    let max = len.saturating_sub(1) as u32;
    ((u32::BITS - max.leading_zeros()) as u8).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCKS: &str = r#"{
        "minecraft:air": { "bedrock_identifier": "minecraft:air" },
        "minecraft:stone": { "bedrock_identifier": "minecraft:stone" },
        "minecraft:oak_log[axis=y]": {
            "bedrock_identifier": "minecraft:oak_log",
            "bedrock_states": { "pillar_axis": "y" }
        },
        "minecraft:oak_stairs[facing=east,half=top,waterlogged=true]": {
            "bedrock_identifier": "minecraft:oak_stairs",
            "bedrock_states": { "upside_down_bit": true, "weirdo_direction": 0.0 }
        },
        "minecraft:kelp[age=3]": {
            "bedrock_identifier": "minecraft:kelp",
            "bedrock_states": { "kelp_age": 3 }
        },
        "minecraft:seagrass": { "bedrock_identifier": "minecraft:seagrass" }
    }"#;

    fn java(text: &str) -> BlockState {
        BlockState::parse_compact(text).unwrap()
    }

    #[test]
    fn ids_follow_file_order() {
        let table = StateTable::from_json(BLOCKS).unwrap();
        assert_eq!(table.len(), 6);
        assert_eq!(table.source_state_to_id(&java("minecraft:air")).unwrap(), 0);
        assert_eq!(table.source_state_to_id(&java("minecraft:stone")).unwrap(), 1);
        assert_eq!(
            table.source_state_to_id(&java("minecraft:oak_log[axis=y]")).unwrap(),
            2
        );
        assert_eq!(table.id_to_source_state(5).unwrap().name, "minecraft:seagrass");
    }

    #[test]
    fn id_and_state_are_inverse() {
        let table = StateTable::from_json(BLOCKS).unwrap();
        for id in 0..table.len() as u32 {
            let state = table.id_to_source_state(id).unwrap();
            assert_eq!(table.source_state_to_id(state).unwrap(), id);
        }
    }

    #[test]
    fn unknown_lookups_fail() {
        let table = StateTable::from_json(BLOCKS).unwrap();
        assert!(matches!(
            table.source_state_to_id(&java("minecraft:dirt")),
            Err(StateError::UnknownState(_))
        ));
        assert!(matches!(table.id_to_source_state(6), Err(StateError::UnknownId(6))));
        assert!(table.translate_to_destination(&java("minecraft:dirt")).is_none());
    }

    #[test]
    fn translation_normalizes_properties() {
        let table = StateTable::from_json(BLOCKS).unwrap();
        let source = java("minecraft:oak_stairs[half=top,waterlogged=true,facing=east]");
        let t = table.translate_to_destination(&source).unwrap();
        assert_eq!(t.state.name, "minecraft:oak_stairs");
        assert_eq!(
            t.state.properties.get("upside_down_bit"),
            Some(&PropertyValue::Bool(true))
        );
        assert_eq!(
            t.state.properties.get("weirdo_direction"),
            Some(&PropertyValue::Int(0))
        );
        assert!(t.waterlogged);
    }

    #[test]
    fn waterlogged_flags() {
        let table = StateTable::from_json(BLOCKS).unwrap();
        let flag = |text: &str| table.translate_to_destination(&java(text)).unwrap().waterlogged;
        assert!(!flag("minecraft:stone"));
        assert!(!flag("minecraft:oak_log[axis=y]"));
        assert!(flag("minecraft:kelp[age=3]"));
        assert!(flag("minecraft:seagrass"));
    }

    #[test]
    fn bad_resources_are_errors() {
        assert!(matches!(
            StateTable::from_json("[1, 2]"),
            Err(StateError::Json(_))
        ));
        assert!(matches!(
            StateTable::from_json(r#"{"minecraft:x": {"bedrock_states": {}}}"#),
            Err(StateError::MalformedEntry { .. })
        ));
        assert!(StateTable::from_json(
            r#"{"minecraft:x": {"bedrock_identifier": "minecraft:x", "bedrock_states": {"a": [1]}}}"#
        )
        .unwrap_err()
        .is_usage_error());
        assert!(matches!(
            StateTable::from_json(r#"{"minecraft:x[a]": {"bedrock_identifier": "minecraft:x"}}"#),
            Err(StateError::MalformedKey(_))
        ));
    }

    #[test]
    fn id_bit_widths() {
        assert_eq!(id_bits(0), 1);
        assert_eq!(id_bits(2), 1);
        assert_eq!(id_bits(3), 2);
        assert_eq!(id_bits(64), 6);
        assert_eq!(id_bits(65), 7);
        assert_eq!(id_bits(27_000), 15);
    }
}
