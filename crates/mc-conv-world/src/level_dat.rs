//! Bedrock `level.dat`: an 8-byte header (storage version, payload length, both
//! i32_le) followed by a little-endian NBT compound.
//!
//! Only a flat compound of string, int and long tags is ever written, so the
//! few tag encoders needed live here instead of behind a general NBT writer.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{BufMut, BytesMut};

use crate::sink::WorldSettings;

const STORAGE_VERSION: i32 = 10;

const TAG_END: u8 = 0x00;
const TAG_INT: u8 = 0x03;
const TAG_LONG: u8 = 0x04;
const TAG_STRING: u8 = 0x08;
const TAG_COMPOUND: u8 = 0x0A;

/// World metadata stored in level.dat.
#[derive(Debug, Clone)]
pub struct LevelDat {
    pub level_name: String,
    pub spawn_x: i32,
    pub spawn_y: i32,
    pub spawn_z: i32,
    pub time: i64,
    pub last_played: i64,
    pub storage_version: i32,
}

impl LevelDat {
    pub fn from_settings(settings: &WorldSettings) -> Self {
        Self {
            level_name: settings.name.clone(),
            spawn_x: settings.spawn.0,
            spawn_y: settings.spawn.1,
            spawn_z: settings.spawn.2,
            time: settings.time,
            last_played: unix_timestamp(),
            storage_version: STORAGE_VERSION,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut nbt = BytesMut::new();
        nbt.put_u8(TAG_COMPOUND);
        put_name(&mut nbt, "");

        put_string(&mut nbt, "LevelName", &self.level_name);
        put_int(&mut nbt, "SpawnX", self.spawn_x);
        put_int(&mut nbt, "SpawnY", self.spawn_y);
        put_int(&mut nbt, "SpawnZ", self.spawn_z);
        put_long(&mut nbt, "Time", self.time);
        put_long(&mut nbt, "LastPlayed", self.last_played);
        put_int(&mut nbt, "StorageVersion", self.storage_version);
        nbt.put_u8(TAG_END);

        let mut file_buf = Vec::with_capacity(8 + nbt.len());
        file_buf.put_i32_le(self.storage_version);
        file_buf.put_i32_le(nbt.len() as i32);
        file_buf.extend_from_slice(&nbt);
        file_buf
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_bytes())
    }
}

fn put_name(buf: &mut BytesMut, name: &str) {
    buf.put_u16_le(name.len() as u16);
    buf.put_slice(name.as_bytes());
}

fn put_string(buf: &mut BytesMut, name: &str, value: &str) {
    buf.put_u8(TAG_STRING);
    put_name(buf, name);
    put_name(buf, value);
}

fn put_int(buf: &mut BytesMut, name: &str, value: i32) {
    buf.put_u8(TAG_INT);
    put_name(buf, name);
    buf.put_i32_le(value);
}

fn put_long(buf: &mut BytesMut, name: &str, value: i64) {
    buf.put_u8(TAG_LONG);
    put_name(buf, name);
    buf.put_i64_le(value);
}

fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
