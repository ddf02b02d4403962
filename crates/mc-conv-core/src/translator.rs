//! Per-chunk Java -> Bedrock translation.
//!
//! Each section's block and biome palettes are rebuilt into compact grids of
//! dense table ids, every cell is resolved to a Bedrock runtime id, and the
//! finished column is handed to the sink.

use std::collections::HashMap;
use std::sync::Arc;

use mc_conv_codec::{CodecError, CompactStateGrid, GridKind};
use mc_conv_states::{BlockState, Mappings, PropertyValue, FALLBACK_BIOME};
use mc_conv_world::chunk::{BLOCK_LAYER, LIQUID_LAYER};
use mc_conv_world::{ChunkColumn, ChunkPos, ChunkSink, Dimension, RuntimeIdRegistry};
use tracing::{trace, warn};

use crate::error::ConvertError;
use crate::source::{Biomes, BlockStates, Section, SourceChunk};

/// Side of a biome sample cube in blocks.
const BIOME_SCALE: u8 = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkStats {
    /// Non-air blocks written to layer 0.
    pub blocks: usize,
    /// Cells that also received a water layer.
    pub waterlogged: usize,
    pub sections: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Status is not `full`; partially generated terrain is never emitted.
    NotFullyGenerated(String),
    Malformed(CodecError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    Translated(ChunkStats),
    Skipped(SkipReason),
}

/// Why building a column stopped.
enum Failure {
    Malformed(CodecError),
    Fatal(ConvertError),
}

impl From<ConvertError> for Failure {
    fn from(err: ConvertError) -> Self {
        Failure::Fatal(err)
    }
}

impl From<mc_conv_states::StateError> for Failure {
    fn from(err: mc_conv_states::StateError) -> Self {
        Failure::Fatal(err.into())
    }
}

impl From<CodecError> for Failure {
    fn from(err: CodecError) -> Self {
        if err.is_malformed_input() {
            Failure::Malformed(err)
        } else {
            Failure::Fatal(err.into())
        }
    }
}

/// A resolved block: what goes into the column for one dense id.
#[derive(Debug, Clone, Copy)]
struct Resolved {
    runtime_id: u32,
    waterlogged: bool,
}

/// Translates Java chunks into Bedrock columns of one dimension. Shared by
/// every conversion unit.
pub struct ChunkTranslator {
    mappings: Arc<Mappings>,
    registry: Arc<dyn RuntimeIdRegistry>,
    dimension: Dimension,
    block_kind: GridKind,
    biome_kind: GridKind,
    air: u32,
    water: u32,
    default_biome: u32,
}

impl ChunkTranslator {
    /// Fails with a mapping gap when the registry cannot resolve air or water.
    pub fn new(
        mappings: Arc<Mappings>,
        registry: Arc<dyn RuntimeIdRegistry>,
        dimension: Dimension,
    ) -> Result<Self, ConvertError> {
        let air_state = BlockState::new("minecraft:air");
        let water_state =
            BlockState::new("minecraft:water").with("liquid_depth", PropertyValue::Int(0));
        let resolve = |state: &BlockState| {
            registry
                .runtime_id(state)
                .ok_or_else(|| ConvertError::MappingGap(format!("no runtime id for {state}")))
        };
        let air = resolve(&air_state)?;
        let water = resolve(&water_state)?;
        let default_biome = mappings
            .biomes
            .translate_to_destination(FALLBACK_BIOME)
            .unwrap_or(0);

        Ok(Self {
            block_kind: GridKind::blocks(mappings.blocks.id_bits()),
            biome_kind: GridKind::biomes(mappings.biomes.id_bits()),
            mappings,
            registry,
            dimension,
            air,
            water,
            default_biome,
        })
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Runtime id of air, never written explicitly.
    pub fn air(&self) -> u32 {
        self.air
    }

    /// Translate one chunk and save it. Malformed section data skips the
    /// chunk; mapping gaps and sink failures are errors.
    pub fn translate_chunk(
        &self,
        chunk: &SourceChunk,
        sink: &dyn ChunkSink,
    ) -> Result<ChunkOutcome, ConvertError> {
        if !is_fully_generated(&chunk.status) {
            trace!(
                "Skipping chunk {},{} with status {:?}",
                chunk.x_pos,
                chunk.z_pos,
                chunk.status
            );
            return Ok(ChunkOutcome::Skipped(SkipReason::NotFullyGenerated(
                chunk.status.clone(),
            )));
        }

        let (column, stats) = match self.build_column(chunk) {
            Ok(built) => built,
            Err(Failure::Fatal(err)) => return Err(err),
            Err(Failure::Malformed(err)) => {
                warn!(
                    "Skipping malformed chunk {},{}: {err}",
                    chunk.x_pos, chunk.z_pos
                );
                return Ok(ChunkOutcome::Skipped(SkipReason::Malformed(err)));
            }
        };

        sink.save_chunk(ChunkPos::new(chunk.x_pos, chunk.z_pos), &column, self.dimension)?;
        Ok(ChunkOutcome::Translated(stats))
    }

    fn build_column(&self, chunk: &SourceChunk) -> Result<(ChunkColumn, ChunkStats), Failure> {
        let mut column = ChunkColumn::new(
            chunk.x_pos,
            chunk.z_pos,
            self.dimension,
            self.air,
            self.default_biome,
        );
        let mut stats = ChunkStats::default();

        for section in &chunk.sections {
            if !self.dimension.contains_section(section.y) {
                trace!("Section {} outside {:?}", section.y, self.dimension);
                continue;
            }
            let Some(block_states) = &section.block_states else {
                trace!("Section {} has no block states", section.y);
                continue;
            };
            self.translate_blocks(section, block_states, &mut column, &mut stats)?;
            if let Some(biomes) = &section.biomes {
                self.translate_biomes(section, biomes, &mut column)?;
            }
            stats.sections += 1;
        }
        Ok((column, stats))
    }

    fn translate_blocks(
        &self,
        section: &Section,
        block_states: &BlockStates,
        column: &mut ChunkColumn,
        stats: &mut ChunkStats,
    ) -> Result<(), Failure> {
        let ids = block_states
            .palette
            .iter()
            .map(|entry| self.mappings.blocks.source_state_to_id(&entry.to_block_state()))
            .collect::<Result<Vec<_>, _>>()?;
        let grid = CompactStateGrid::from_palette(
            self.block_kind,
            ids,
            block_states.data.as_deref().map(to_words),
        )?;

        let base_y = section.y * 16;
        let mut resolved: HashMap<u32, Resolved> = HashMap::new();
        for index in 0..self.block_kind.cells() {
            let id = grid.get_index(index)?;
            let block = match resolved.get(&id) {
                Some(block) => *block,
                None => {
                    let block = self.resolve_block(id)?;
                    resolved.insert(id, block);
                    block
                }
            };
            if block.runtime_id == self.air {
                continue;
            }

            let pos = self.block_kind.pos(index);
            let y = base_y + pos.y as i32;
            column.set_block(pos.x, y, pos.z, BLOCK_LAYER, block.runtime_id);
            stats.blocks += 1;
            if block.waterlogged {
                column.set_block(pos.x, y, pos.z, LIQUID_LAYER, self.water);
                stats.waterlogged += 1;
            }
        }
        Ok(())
    }

    fn resolve_block(&self, id: u32) -> Result<Resolved, ConvertError> {
        let source = self.mappings.blocks.id_to_source_state(id)?;
        let translation = self
            .mappings
            .blocks
            .translate_to_destination(source)
            .ok_or_else(|| ConvertError::MappingGap(format!("no Bedrock state for {source}")))?;
        let runtime_id = self.registry.runtime_id(&translation.state).ok_or_else(|| {
            ConvertError::MappingGap(format!("no runtime id for {}", translation.state))
        })?;
        Ok(Resolved {
            runtime_id,
            waterlogged: translation.waterlogged,
        })
    }

    /// Each of the 64 samples covers a 4×4×4 block cube. Sample `i` sits at
    /// `x = i & 3`, `z = (i >> 2) & 3`, `y = (i >> 4) & 3`.
    fn translate_biomes(
        &self,
        section: &Section,
        biomes: &Biomes,
        column: &mut ChunkColumn,
    ) -> Result<(), Failure> {
        let ids = biomes
            .palette
            .iter()
            .map(|name| self.mappings.biomes.source_biome_to_id(name))
            .collect::<Result<Vec<_>, _>>()?;
        let grid = CompactStateGrid::from_palette(
            self.biome_kind,
            ids,
            biomes.data.as_deref().map(to_words),
        )?;

        for i in 0..self.biome_kind.cells() {
            let id = grid.get_index(i)?;
            let biome = self.mappings.biomes.translate_id(id).ok_or_else(|| {
                let name = self.mappings.biomes.id_to_source_biome(id).unwrap_or("?");
                ConvertError::MappingGap(format!("no Bedrock biome for {name}"))
            })?;

            let base_x = (i & 3) as u8 * BIOME_SCALE;
            let base_y = ((i >> 4) & 3) as i32 * BIOME_SCALE as i32;
            let base_z = ((i >> 2) & 3) as u8 * BIOME_SCALE;
            for dy in 0..BIOME_SCALE as i32 {
                let y = section.y * 16 + base_y + dy;
                for dz in 0..BIOME_SCALE {
                    for dx in 0..BIOME_SCALE {
                        column.set_biome(base_x + dx, y, base_z + dz, biome);
                    }
                }
            }
        }
        Ok(())
    }
}

fn is_fully_generated(status: &str) -> bool {
    status.strip_prefix("minecraft:").unwrap_or(status) == "full"
}

/// Java stores packed longs signed.
fn to_words(data: &[i64]) -> Vec<u64> {
    data.iter().map(|&word| word as u64).collect()
}
