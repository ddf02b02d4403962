//! Paletted block and biome storage as used by Java chunk sections.
//!
//! - [`PackedArray`]: fixed-capacity array of small integers packed into `u64` words.
//! - [`Palette`]: local id <-> state mapping (singleton, list, map or global).
//! - [`CompactStateGrid`]: a palette over a packed array covering a 3D cell grid.

pub mod error;
pub mod grid;
pub mod packed;
pub mod palette;

pub use error::CodecError;
pub use grid::{CompactStateGrid, GridKind, GridPos};
pub use packed::PackedArray;
pub use palette::Palette;
