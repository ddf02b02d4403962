use std::path::{Path, PathBuf};

use mc_conv_states::{Mappings, StateError};
use mc_conv_world::{Dimension, LevelDbSink, SinkError, WorldSettings};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ConvertConfig {
    pub mappings: MappingsSection,
    pub output: OutputSection,
    #[serde(default)]
    pub world: WorldSection,
}

/// Paths of the JSON mapping tables.
#[derive(Debug, Deserialize)]
pub struct MappingsSection {
    pub blocks: PathBuf,
    pub biomes: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct OutputSection {
    /// Bedrock world directory.
    pub path: PathBuf,
    #[serde(default)]
    pub dimension: Dimension,
}

#[derive(Debug, Deserialize)]
pub struct WorldSection {
    #[serde(default = "default_world_name")]
    pub name: String,
    #[serde(default)]
    pub time: i64,
    #[serde(default = "default_spawn")]
    pub spawn: [i32; 3],
}

fn default_world_name() -> String {
    "Converted World".into()
}

fn default_spawn() -> [i32; 3] {
    [0, 64, 0]
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            time: 0,
            spawn: default_spawn(),
        }
    }
}

impl WorldSection {
    pub fn to_settings(&self) -> WorldSettings {
        WorldSettings {
            name: self.name.clone(),
            time: self.time,
            spawn: (self.spawn[0], self.spawn[1], self.spawn[2]),
        }
    }
}

impl ConvertConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load both mapping tables named by the config.
    pub fn load_mappings(&self) -> Result<Mappings, StateError> {
        Mappings::load(&self.mappings.blocks, &self.mappings.biomes)
    }

    pub fn open_sink(&self) -> Result<LevelDbSink, SinkError> {
        LevelDbSink::open(&self.output.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config() {
        let toml_str = r#"
            [mappings]
            blocks = "mappings/blocks.json"
            biomes = "mappings/biomes.json"

            [output]
            path = "out/world"
        "#;
        let config: ConvertConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.mappings.blocks, PathBuf::from("mappings/blocks.json"));
        assert_eq!(config.output.path, PathBuf::from("out/world"));
        // defaults when absent
        assert_eq!(config.output.dimension, Dimension::Overworld);
        assert_eq!(config.world.name, "Converted World");
        assert_eq!(config.world.to_settings().spawn, (0, 64, 0));
    }

    #[test]
    fn parse_config_with_world() {
        let toml_str = r#"
            [mappings]
            blocks = "b.json"
            biomes = "m.json"

            [output]
            path = "nether"
            dimension = "nether"

            [world]
            name = "Old Survival"
            time = 1200
            spawn = [100, 72, -40]
        "#;
        let config: ConvertConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.output.dimension, Dimension::Nether);
        let settings = config.world.to_settings();
        assert_eq!(settings.name, "Old Survival");
        assert_eq!(settings.time, 1200);
        assert_eq!(settings.spawn, (100, 72, -40));
    }

    #[test]
    fn missing_mapping_files_are_errors() {
        let config: ConvertConfig = toml::from_str(
            r#"
            [mappings]
            blocks = "/nonexistent/blocks.json"
            biomes = "/nonexistent/biomes.json"
            [output]
            path = "out"
            "#,
        )
        .unwrap();
        assert!(matches!(config.load_mappings(), Err(StateError::Io(_))));
    }

    #[test]
    fn unknown_dimension_rejected() {
        let result: Result<ConvertConfig, _> = toml::from_str(
            r#"
            [mappings]
            blocks = "b"
            biomes = "m"
            [output]
            path = "out"
            dimension = "aether"
            "#,
        );
        assert!(result.is_err());
    }
}
