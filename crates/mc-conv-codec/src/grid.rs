//! A palette and a packed array over a cubic cell grid.

use crate::error::CodecError;
use crate::packed::{PackedArray, MAX_BITS};
use crate::palette::Palette;

/// Shape and width policy of a grid: block sections and biome samples differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridKind {
    /// Cells along each axis.
    pub side: usize,
    /// Narrowest width a list palette is grown to.
    pub min_bits: u8,
    /// Widest width still using a local palette.
    pub max_bits: u8,
    /// Width of the global (identity) palette.
    pub global_bits: u8,
}

impl GridKind {
    /// 16×16×16 block section.
    pub const fn blocks(global_bits: u8) -> Self {
        Self {
            side: 16,
            min_bits: 4,
            max_bits: 8,
            global_bits,
        }
    }

    /// 4×4×4 biome samples, each covering 4×4×4 blocks.
    pub const fn biomes(global_bits: u8) -> Self {
        Self {
            side: 4,
            min_bits: 1,
            max_bits: 3,
            global_bits,
        }
    }

    pub const fn cells(&self) -> usize {
        self.side * self.side * self.side
    }

    /// Clamp a requested width: at least `min_bits` while it fits a local
    /// palette, otherwise the global width.
    pub fn sanitize_bits(&self, bits: u8) -> u8 {
        if bits <= self.max_bits {
            bits.max(self.min_bits)
        } else {
            self.global_bits
        }
    }

    /// Fresh, empty palette for a width requested during growth.
    fn palette_for(&self, requested: u8) -> (u8, Palette) {
        let bits = self.sanitize_bits(requested);
        if requested > self.max_bits {
            (bits, Palette::Global)
        } else if bits <= self.min_bits {
            (bits, Palette::list(bits))
        } else {
            (bits, Palette::map(bits))
        }
    }

    pub fn index(&self, pos: GridPos) -> usize {
        let side = self.side;
        debug_assert!(
            (pos.x as usize) < side && (pos.y as usize) < side && (pos.z as usize) < side
        );
        (pos.y as usize * side + pos.z as usize) * side + pos.x as usize
    }

    pub fn pos(&self, index: usize) -> GridPos {
        let side = self.side;
        GridPos {
            x: (index % side) as u8,
            z: ((index / side) % side) as u8,
            y: (index / (side * side)) as u8,
        }
    }
}

/// Cell coordinate local to a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPos {
    pub x: u8,
    pub y: u8,
    pub z: u8,
}

impl GridPos {
    pub const fn new(x: u8, y: u8, z: u8) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone)]
pub struct CompactStateGrid {
    kind: GridKind,
    palette: Palette,
    storage: PackedArray,
}

impl CompactStateGrid {
    /// A grid where every cell holds `state`.
    pub fn new(kind: GridKind, state: u32) -> Self {
        Self {
            kind,
            palette: Palette::Singleton(state),
            storage: PackedArray::new(0, kind.cells()),
        }
    }

    /// Rebuild a grid from a stored section: palette entries (as global state
    /// ids, in file order) and the packed palette indices.
    ///
    /// Absent `data` means every cell holds `states[0]`. The storage width is
    /// taken from the word count, so both minimal-width encodings and ones
    /// padded up to `min_bits` are accepted.
    pub fn from_palette(
        kind: GridKind,
        states: Vec<u32>,
        data: Option<Vec<u64>>,
    ) -> Result<Self, CodecError> {
        let cells = kind.cells();
        match states.len() {
            0 => return Err(CodecError::EmptyPalette),
            1 => return Ok(Self::new(kind, states[0])),
            _ => {}
        }

        let index_bits = bit_length(states.len() as u32 - 1);
        let storage = match data.filter(|words| !words.is_empty()) {
            None => PackedArray::new(index_bits, cells),
            Some(words) => {
                let bits = (index_bits..=MAX_BITS)
                    .find(|&bits| PackedArray::required_words(bits, cells) == words.len())
                    .ok_or(CodecError::NoMatchingWidth {
                        got: words.len(),
                        palette_len: states.len(),
                    })?;
                PackedArray::from_words(bits, cells, words)?
            }
        };

        for cell in 0..cells {
            let index = storage.get(cell)?;
            if index as usize >= states.len() {
                return Err(CodecError::PaletteIndex {
                    cell,
                    index,
                    palette_len: states.len(),
                });
            }
        }

        let bits = storage.bits();
        if bits <= kind.max_bits {
            let hashed = bits > kind.min_bits;
            return Ok(Self {
                kind,
                palette: Palette::with_states(bits, states, hashed),
                storage,
            });
        }

        // Too wide for a local palette: store global ids directly.
        let mut global = PackedArray::new(kind.global_bits, cells);
        for cell in 0..cells {
            let index = storage.get(cell)?;
            global.set(cell, states[index as usize])?;
        }
        Ok(Self {
            kind,
            palette: Palette::Global,
            storage: global,
        })
    }

    pub fn kind(&self) -> GridKind {
        self.kind
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Current width of the backing array.
    pub fn bits(&self) -> u8 {
        self.storage.bits()
    }

    pub fn get(&self, pos: GridPos) -> Result<u32, CodecError> {
        self.get_index(self.kind.index(pos))
    }

    pub fn get_index(&self, index: usize) -> Result<u32, CodecError> {
        let id = self.storage.get(index)?;
        Ok(self.palette.id_to_state(id))
    }

    /// Store `state` at `pos`, growing the palette if needed. Returns the
    /// state previously held by the cell.
    pub fn set(&mut self, pos: GridPos, state: u32) -> Result<u32, CodecError> {
        self.set_index(self.kind.index(pos), state)
    }

    pub fn set_index(&mut self, index: usize, state: u32) -> Result<u32, CodecError> {
        let previous = self.get_index(index)?;
        let id = match self.palette.state_to_id(state) {
            Some(id) => id,
            None => {
                self.resize()?;
                self.palette
                    .state_to_id(state)
                    .ok_or(CodecError::PaletteOverflow {
                        bits: self.storage.bits(),
                    })?
            }
        };
        self.storage.set(index, id)?;
        Ok(previous)
    }

    /// Move to the next wider palette and re-encode every cell through it.
    fn resize(&mut self) -> Result<(), CodecError> {
        let requested = if self.palette.is_singleton() {
            1
        } else {
            self.storage.bits() + 1
        };
        let (bits, mut palette) = self.kind.palette_for(requested);
        let mut storage = PackedArray::new(bits, self.kind.cells());

        for cell in 0..self.kind.cells() {
            let state = self.palette.id_to_state(self.storage.get(cell)?);
            let id = palette
                .state_to_id(state)
                .ok_or(CodecError::PaletteOverflow { bits })?;
            storage.set(cell, id)?;
        }

        self.palette = palette;
        self.storage = storage;
        Ok(())
    }
}

/// Bits needed to represent `value`.
fn bit_length(value: u32) -> u8 {
    (u32::BITS - value.leading_zeros()) as u8
}
