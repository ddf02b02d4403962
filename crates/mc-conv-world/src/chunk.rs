//! Destination (Bedrock) chunk columns.

use serde::Deserialize;

/// Blocks in one 16×16×16 sub-chunk.
pub const SUB_CHUNK_VOLUME: usize = 4096;

/// Layer holding the primary block.
pub const BLOCK_LAYER: usize = 0;
/// Layer holding the liquid of waterlogged blocks.
pub const LIQUID_LAYER: usize = 1;

/// Bedrock dimension with its vertical range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    #[default]
    Overworld,
    Nether,
    End,
}

impl Dimension {
    /// LevelDB key dimension id.
    pub fn id(self) -> i32 {
        match self {
            Dimension::Overworld => 0,
            Dimension::Nether => 1,
            Dimension::End => 2,
        }
    }

    pub fn min_y(self) -> i32 {
        match self {
            Dimension::Overworld => -64,
            Dimension::Nether | Dimension::End => 0,
        }
    }

    pub fn max_y(self) -> i32 {
        match self {
            Dimension::Overworld => 319,
            Dimension::Nether => 127,
            Dimension::End => 255,
        }
    }

    pub fn sub_chunk_count(self) -> usize {
        ((self.max_y() - self.min_y() + 1) / 16) as usize
    }

    /// Whether a 16-block section starting at `section_y * 16` lies inside the range.
    /// Indices whose block range does not fit in an `i32` are never contained.
    pub fn contains_section(self, section_y: i32) -> bool {
        match section_y.checked_mul(16) {
            Some(base) => base >= self.min_y() && base + 15 <= self.max_y(),
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

/// 4096 palette indices in XZY order `(x*16 + z)*16 + y` plus the palette of
/// `u32` values they refer to (block runtime ids or biome ids).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PalettedStorage {
    pub indices: Box<[u16; SUB_CHUNK_VOLUME]>,
    pub palette: Vec<u32>,
}

impl PalettedStorage {
    /// Storage filled entirely with a single value.
    pub fn new_single(value: u32) -> Self {
        Self {
            indices: Box::new([0; SUB_CHUNK_VOLUME]),
            palette: vec![value],
        }
    }

    /// `x`, `y`, `z` must each be in `[0, 15]`.
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: u32) {
        debug_assert!(x < 16 && y < 16 && z < 16);
        let palette_index = match self.palette.iter().position(|&v| v == value) {
            Some(idx) => idx,
            None => {
                self.palette.push(value);
                self.palette.len() - 1
            }
        };
        self.indices[(x * 16 + z) * 16 + y] = palette_index as u16;
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> u32 {
        let palette_index = self.indices[(x * 16 + z) * 16 + y] as usize;
        self.palette[palette_index]
    }

    /// Number of cells whose value differs from `value`.
    pub fn count_other_than(&self, value: u32) -> usize {
        self.indices
            .iter()
            .filter(|&&i| self.palette[i as usize] != value)
            .count()
    }
}

/// A 16×16×16 slab: block layers and per-block biomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubChunk {
    /// Layer 0 always exists; layer 1 is created on the first liquid write.
    pub layers: Vec<PalettedStorage>,
    pub biomes: PalettedStorage,
}

impl SubChunk {
    pub fn new(air: u32, biome: u32) -> Self {
        Self {
            layers: vec![PalettedStorage::new_single(air)],
            biomes: PalettedStorage::new_single(biome),
        }
    }
}

/// A full chunk column of a dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkColumn {
    pub x: i32,
    pub z: i32,
    pub dimension: Dimension,
    air: u32,
    pub sub_chunks: Vec<SubChunk>,
}

impl ChunkColumn {
    /// An air-filled column with a uniform biome.
    pub fn new(x: i32, z: i32, dimension: Dimension, air: u32, biome: u32) -> Self {
        Self {
            x,
            z,
            dimension,
            air,
            sub_chunks: (0..dimension.sub_chunk_count())
                .map(|_| SubChunk::new(air, biome))
                .collect(),
        }
    }

    pub fn air(&self) -> u32 {
        self.air
    }

    /// Sub-chunk y index as stored in keys: sub-chunk 0 of the Overworld is -4.
    pub fn y_index(&self, sub_chunk: usize) -> i8 {
        (sub_chunk as i32 + self.dimension.min_y() / 16) as i8
    }

    /// Sub-chunk slot and local y for an absolute y, `None` when out of range.
    fn locate(&self, y: i32) -> Option<(usize, usize)> {
        if y < self.dimension.min_y() || y > self.dimension.max_y() {
            return None;
        }
        let rel = (y - self.dimension.min_y()) as usize;
        Some((rel / 16, rel % 16))
    }

    /// Write a runtime id at chunk-local `x`/`z` and absolute `y`. Writes outside
    /// the dimension's height are ignored.
    pub fn set_block(&mut self, x: u8, y: i32, z: u8, layer: usize, runtime_id: u32) {
        let Some((slot, ly)) = self.locate(y) else {
            return;
        };
        let air = self.air;
        let sub = &mut self.sub_chunks[slot];
        while sub.layers.len() <= layer {
            sub.layers.push(PalettedStorage::new_single(air));
        }
        sub.layers[layer].set(x as usize & 15, ly, z as usize & 15, runtime_id);
    }

    pub fn block(&self, x: u8, y: i32, z: u8, layer: usize) -> u32 {
        self.locate(y)
            .and_then(|(slot, ly)| {
                self.sub_chunks[slot]
                    .layers
                    .get(layer)
                    .map(|l| l.get(x as usize & 15, ly, z as usize & 15))
            })
            .unwrap_or(self.air)
    }

    pub fn set_biome(&mut self, x: u8, y: i32, z: u8, biome: u32) {
        if let Some((slot, ly)) = self.locate(y) {
            self.sub_chunks[slot]
                .biomes
                .set(x as usize & 15, ly, z as usize & 15, biome);
        }
    }

    pub fn biome(&self, x: u8, y: i32, z: u8) -> Option<u32> {
        let (slot, ly) = self.locate(y)?;
        Some(
            self.sub_chunks[slot]
                .biomes
                .get(x as usize & 15, ly, z as usize & 15),
        )
    }
}
