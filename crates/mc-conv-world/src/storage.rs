//! LevelDB chunk sink using the Bedrock key layout.
//!
//! Sub-chunks are stored with runtime-id palettes (FNV-1a hashes, header bit 0
//! set) rather than NBT compound palettes.
//!
//! `rusty_leveldb::DB` is not `Send`, so the database lives on a dedicated
//! writer thread. Callers serialize chunks on their own thread and hand the
//! finished key/value records over a channel; each chunk is one write batch.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::thread::JoinHandle;

use bytes::{BufMut, BytesMut};
use rusty_leveldb::{WriteBatch, DB};
use tracing::{debug, warn};

use crate::chunk::{
    ChunkColumn, ChunkPos, Dimension, PalettedStorage, SubChunk, BLOCK_LAYER, SUB_CHUNK_VOLUME,
};
use crate::level_dat::LevelDat;
use crate::sink::{ChunkSink, SinkError, WorldSettings};

// ─── LevelDB key tags ───────────────────────────────────────────────────────

const TAG_DATA_3D: u8 = 0x2B;
const TAG_CHUNK_VERSION: u8 = 0x2C;
const TAG_SUB_CHUNK_PREFIX: u8 = 0x2F;
const TAG_FINALIZED_STATE: u8 = 0x36;

/// Current chunk format version.
const CHUNK_VERSION: u8 = 40;
/// Sub-chunk format carrying an explicit y index.
const SUB_CHUNK_VERSION: u8 = 9;
/// Finalized state "done".
const FINALIZED_DONE: i32 = 2;

// ─── Key builders ───────────────────────────────────────────────────────────

/// Build a dimension-aware LevelDB key.
///
/// Overworld (dim=0): `[X:i32_le][Z:i32_le][tag]`
/// Nether (dim=1): `[X:i32_le][Z:i32_le][01 00 00 00][tag]`
/// End (dim=2): `[X:i32_le][Z:i32_le][02 00 00 00][tag]`
fn chunk_key_dim(cx: i32, cz: i32, dim: i32, tag: u8) -> Vec<u8> {
    let cap = if dim == 0 { 9 } else { 13 };
    let mut key = Vec::with_capacity(cap);
    key.extend_from_slice(&cx.to_le_bytes());
    key.extend_from_slice(&cz.to_le_bytes());
    if dim != 0 {
        key.extend_from_slice(&dim.to_le_bytes());
    }
    key.push(tag);
    key
}

/// Build a dimension-aware sub-chunk LevelDB key.
fn sub_chunk_key_dim(cx: i32, cz: i32, dim: i32, y_index: i8) -> Vec<u8> {
    let mut key = chunk_key_dim(cx, cz, dim, TAG_SUB_CHUNK_PREFIX);
    key.push(y_index as u8);
    key
}

// ─── Disk serialization ─────────────────────────────────────────────────────

/// Determine minimum bits-per-block for a given palette size.
/// Valid values: 0, 1, 2, 3, 4, 5, 6, 8, 16.
fn bits_per_block_for_palette(palette_size: usize) -> u8 {
    match palette_size {
        0..=1 => 0,
        2 => 1,
        3..=4 => 2,
        5..=8 => 3,
        9..=16 => 4,
        17..=32 => 5,
        33..=64 => 6,
        65..=256 => 8,
        _ => 16,
    }
}

/// Write one paletted storage:
/// `[header][packed u32_le words...][palette_size:i32_le][palette:u32_le[]]`.
/// Header is `bpb << 1 | 1`; a single-value storage has `bpb = 0` and no words.
fn serialize_storage(buf: &mut BytesMut, storage: &PalettedStorage) {
    let palette_size = storage.palette.len();
    let bpb = bits_per_block_for_palette(palette_size);
    buf.put_u8((bpb << 1) | 1);

    if bpb > 0 {
        // Pack indices into u32 words (LSB-first)
        let per_word = 32 / bpb as usize;
        let word_count = SUB_CHUNK_VOLUME.div_ceil(per_word);
        for word_idx in 0..word_count {
            let mut word: u32 = 0;
            for slot in 0..per_word {
                let idx = word_idx * per_word + slot;
                if idx < SUB_CHUNK_VOLUME {
                    word |= (storage.indices[idx] as u32) << (bpb as u32 * slot as u32);
                }
            }
            buf.put_u32_le(word);
        }
    }

    buf.put_i32_le(palette_size as i32);
    for &value in &storage.palette {
        buf.put_u32_le(value);
    }
}

/// `[version=9][num_layers][y_index][layer...]`
fn serialize_sub_chunk_disk(sub: &SubChunk, y_index: i8) -> Vec<u8> {
    let mut buf = BytesMut::new();
    buf.put_u8(SUB_CHUNK_VERSION);
    buf.put_u8(sub.layers.len() as u8);
    buf.put_u8(y_index as u8);
    for layer in &sub.layers {
        serialize_storage(&mut buf, layer);
    }
    buf.to_vec()
}

/// Highest non-air layer-0 Y per XZ column, indexed `x*16 + z`. Empty columns
/// report the dimension's minimum Y.
fn compute_heightmap(column: &ChunkColumn) -> [i16; 256] {
    let dim = column.dimension;
    let mut heightmap = [dim.min_y() as i16; 256];
    for x in 0..16u8 {
        for z in 0..16u8 {
            if let Some(y) = (dim.min_y()..=dim.max_y())
                .rev()
                .find(|&y| column.block(x, y, z, BLOCK_LAYER) != column.air())
            {
                heightmap[x as usize * 16 + z as usize] = y as i16;
            }
        }
    }
    heightmap
}

/// Data3D: heightmap (i16_le[256]) followed by one biome storage per sub-chunk.
fn serialize_data_3d(column: &ChunkColumn) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(512 + column.sub_chunks.len() * 16);
    for h in compute_heightmap(column) {
        buf.put_i16_le(h);
    }
    for sub in &column.sub_chunks {
        serialize_storage(&mut buf, &sub.biomes);
    }
    buf.to_vec()
}

fn is_empty_sub_chunk(sub: &SubChunk, air: u32) -> bool {
    sub.layers.iter().all(|l| l.count_other_than(air) == 0)
}

/// Every key/value record of one chunk.
fn chunk_records(pos: ChunkPos, column: &ChunkColumn, dim: Dimension) -> Vec<(Vec<u8>, Vec<u8>)> {
    let d = dim.id();
    let mut records = vec![
        (
            chunk_key_dim(pos.x, pos.z, d, TAG_CHUNK_VERSION),
            vec![CHUNK_VERSION],
        ),
        (
            chunk_key_dim(pos.x, pos.z, d, TAG_DATA_3D),
            serialize_data_3d(column),
        ),
    ];

    for (i, sub) in column.sub_chunks.iter().enumerate() {
        if is_empty_sub_chunk(sub, column.air()) {
            continue;
        }
        let y_index = column.y_index(i);
        records.push((
            sub_chunk_key_dim(pos.x, pos.z, d, y_index),
            serialize_sub_chunk_disk(sub, y_index),
        ));
    }

    records.push((
        chunk_key_dim(pos.x, pos.z, d, TAG_FINALIZED_STATE),
        FINALIZED_DONE.to_le_bytes().to_vec(),
    ));
    records
}

// ─── Writer thread ──────────────────────────────────────────────────────────

enum Command {
    Write {
        records: Vec<(Vec<u8>, Vec<u8>)>,
        reply: SyncSender<Result<(), SinkError>>,
    },
    Get {
        key: Vec<u8>,
        reply: SyncSender<Option<Vec<u8>>>,
    },
    Flush {
        reply: SyncSender<Result<(), SinkError>>,
    },
}

fn run_writer(mut db: DB, commands: Receiver<Command>) {
    for command in commands {
        match command {
            Command::Write { records, reply } => {
                let mut batch = WriteBatch::default();
                for (key, value) in &records {
                    batch.put(key, value);
                }
                let result = db
                    .write(batch, false)
                    .map_err(|e| SinkError::Db(format!("write batch: {e}")));
                let _ = reply.send(result);
            }
            Command::Get { key, reply } => {
                let _ = reply.send(db.get(&key));
            }
            Command::Flush { reply } => {
                let _ = reply.send(db.flush().map_err(|e| SinkError::Db(format!("flush: {e}"))));
            }
        }
    }
    if let Err(e) = db.flush() {
        warn!("Final LevelDB flush failed: {e}");
    }
}

// ─── LevelDB sink ──────────────────────────────────────────────────────────

/// Writes a Bedrock world directory: `db/` plus `level.dat` and `levelname.txt`.
pub struct LevelDbSink {
    dir: PathBuf,
    commands: Option<Sender<Command>>,
    worker: Option<JoinHandle<()>>,
}

impl LevelDbSink {
    /// Open or create the world at `dir`.
    pub fn open(dir: &Path) -> Result<Self, SinkError> {
        std::fs::create_dir_all(dir)?;
        let db_path = dir.join("db");

        let (commands, rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let worker = std::thread::Builder::new()
            .name("leveldb-writer".into())
            .spawn(move || {
                let opts = rusty_leveldb::Options {
                    create_if_missing: true,
                    ..rusty_leveldb::Options::default()
                };
                match DB::open(&db_path, opts) {
                    Ok(db) => {
                        let _ = ready_tx.send(Ok(()));
                        run_writer(db, rx);
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(SinkError::Db(format!("open: {e}"))));
                    }
                }
            })?;

        ready_rx.recv().map_err(|_| SinkError::Closed)??;
        debug!("Opened LevelDB at {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            commands: Some(commands),
            worker: Some(worker),
        })
    }

    fn send(&self, command: Command) -> Result<(), SinkError> {
        self.commands
            .as_ref()
            .ok_or(SinkError::Closed)?
            .send(command)
            .map_err(|_| SinkError::Closed)
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<(), SinkError> {
        let (reply, rx) = mpsc::sync_channel(1);
        self.send(Command::Flush { reply })?;
        rx.recv().map_err(|_| SinkError::Closed)?
    }

    /// Raw read, mostly for inspection.
    pub fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, SinkError> {
        let (reply, rx) = mpsc::sync_channel(1);
        self.send(Command::Get {
            key: key.to_vec(),
            reply,
        })?;
        rx.recv().map_err(|_| SinkError::Closed)
    }
}

impl ChunkSink for LevelDbSink {
    fn save_chunk(
        &self,
        pos: ChunkPos,
        chunk: &ChunkColumn,
        dimension: Dimension,
    ) -> Result<(), SinkError> {
        let records = chunk_records(pos, chunk, dimension);
        let (reply, rx) = mpsc::sync_channel(1);
        self.send(Command::Write { records, reply })?;
        rx.recv().map_err(|_| SinkError::Closed)?
    }

    fn save_settings(&self, settings: &WorldSettings) -> Result<(), SinkError> {
        LevelDat::from_settings(settings).save(&self.dir.join("level.dat"))?;
        std::fs::write(self.dir.join("levelname.txt"), &settings.name)?;
        Ok(())
    }
}

impl Drop for LevelDbSink {
    fn drop(&mut self) {
        // Closing the channel ends the writer loop, which flushes on exit.
        self.commands.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("LevelDB writer thread panicked");
            }
        }
    }
}
