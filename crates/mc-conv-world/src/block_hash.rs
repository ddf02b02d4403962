//! Block runtime ids as FNV-1a 32-bit hashes of network-serialized block state NBT.
//!
//! With `block_network_ids_are_hashes` Bedrock derives runtime ids from
//! `{name, states, version}` encoded as network NBT, so any state can be
//! resolved without a registry dump.

use bytes::{BufMut, BytesMut};
use mc_conv_states::{BlockState, PropertyValue};

/// FNV-1a 32-bit offset basis.
const FNV1_32_INIT: u32 = 0x811c_9dc5;
/// FNV-1a 32-bit prime.
const FNV1_32_PRIME: u32 = 0x0100_0193;

/// Block state version for 1.21.50 protocol.
pub const BLOCK_STATE_VERSION: i32 = 18_100_737;

const TAG_END: u8 = 0x00;
const TAG_BYTE: u8 = 0x01;
const TAG_INT: u8 = 0x03;
const TAG_STRING: u8 = 0x08;
const TAG_COMPOUND: u8 = 0x0A;

/// Resolves destination block states to runtime ids.
pub trait RuntimeIdRegistry: Send + Sync {
    /// `None` when the registry does not know the state.
    fn runtime_id(&self, state: &BlockState) -> Option<u32>;
}

/// Registry resolving every state to its hashed runtime id.
#[derive(Debug, Clone, Copy)]
pub struct HashedRegistry {
    version: i32,
}

impl HashedRegistry {
    pub fn new(version: i32) -> Self {
        Self { version }
    }
}

impl Default for HashedRegistry {
    fn default() -> Self {
        Self::new(BLOCK_STATE_VERSION)
    }
}

impl RuntimeIdRegistry for HashedRegistry {
    fn runtime_id(&self, state: &BlockState) -> Option<u32> {
        if state.name.is_empty() {
            return None;
        }
        Some(hash_block_state(state, self.version))
    }
}

/// Compute FNV-1a 32-bit hash of a byte slice.
pub fn fnv1a_32(data: &[u8]) -> u32 {
    let mut hash = FNV1_32_INIT;
    for &byte in data {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(FNV1_32_PRIME);
    }
    hash
}

/// Runtime id of a block state.
pub fn hash_block_state(state: &BlockState, version: i32) -> u32 {
    fnv1a_32(&serialize_block_state_nbt(state, version))
}

/// Serialize a block state to network NBT bytes with deterministic key order.
///
/// Key order matches BDS: "name", "states", "version"; states are sorted by key.
fn serialize_block_state_nbt(state: &BlockState, version: i32) -> Vec<u8> {
    let mut buf = BytesMut::new();

    // Root TAG_Compound with empty name
    buf.put_u8(TAG_COMPOUND);
    write_nbt_varuint_string(&mut buf, "");

    buf.put_u8(TAG_STRING);
    write_nbt_varuint_string(&mut buf, "name");
    write_nbt_varuint_string(&mut buf, &state.name);

    buf.put_u8(TAG_COMPOUND);
    write_nbt_varuint_string(&mut buf, "states");
    for (key, value) in &state.properties {
        match value {
            PropertyValue::Bool(b) => {
                buf.put_u8(TAG_BYTE);
                write_nbt_varuint_string(&mut buf, key);
                buf.put_u8(u8::from(*b));
            }
            PropertyValue::Int(i) => {
                buf.put_u8(TAG_INT);
                write_nbt_varuint_string(&mut buf, key);
                write_zigzag_varint(&mut buf, *i);
            }
            PropertyValue::Text(s) => {
                buf.put_u8(TAG_STRING);
                write_nbt_varuint_string(&mut buf, key);
                write_nbt_varuint_string(&mut buf, s);
            }
        }
    }
    buf.put_u8(TAG_END);

    // network NBT uses ZigZag VarInt for ints
    buf.put_u8(TAG_INT);
    write_nbt_varuint_string(&mut buf, "version");
    write_zigzag_varint(&mut buf, version);

    buf.put_u8(TAG_END);

    buf.to_vec()
}

/// Write a network NBT string: VarUInt32(length) + UTF-8 bytes.
fn write_nbt_varuint_string(buf: &mut BytesMut, s: &str) {
    write_varuint32(buf, s.len() as u32);
    buf.put_slice(s.as_bytes());
}

/// Write unsigned VarInt (LEB128).
fn write_varuint32(buf: &mut BytesMut, mut value: u32) {
    loop {
        if value & !0x7F == 0 {
            buf.put_u8(value as u8);
            return;
        }
        buf.put_u8((value & 0x7F | 0x80) as u8);
        value >>= 7;
    }
}

/// Write signed VarInt (ZigZag + LEB128).
fn write_zigzag_varint(buf: &mut BytesMut, value: i32) {
    let encoded = ((value << 1) ^ (value >> 31)) as u32;
    write_varuint32(buf, encoded);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn air() -> BlockState {
        BlockState::new("minecraft:air")
    }

    #[test]
    fn fnv1a_known_vectors() {
        assert_eq!(fnv1a_32(b""), 0x811c_9dc5);
        assert_eq!(fnv1a_32(b"a"), 0xe40c_292c);
        assert_eq!(fnv1a_32(b"foobar"), 0xbf9c_f968);
    }

    #[test]
    fn plain_state_layout() {
        let nbt = serialize_block_state_nbt(&air(), BLOCK_STATE_VERSION);
        assert_eq!(nbt[0], TAG_COMPOUND);
        // root name is empty
        assert_eq!(nbt[1], 0);
        assert_eq!(nbt[2], TAG_STRING);
        assert_eq!(&nbt[3..8], &[4, b'n', b'a', b'm', b'e']);
        assert!(String::from_utf8_lossy(&nbt).contains("minecraft:air"));
        assert_eq!(*nbt.last().unwrap(), TAG_END);
    }

    #[test]
    fn property_encoding() {
        let state = BlockState::new("minecraft:water").with("liquid_depth", PropertyValue::Int(-1));
        let nbt = serialize_block_state_nbt(&state, BLOCK_STATE_VERSION);
        let needle = [&[TAG_INT, 12][..], b"liquid_depth", &[1]].concat();
        assert!(nbt.windows(needle.len()).any(|w| w == needle.as_slice()));
    }

    #[test]
    fn hash_is_order_independent_and_distinct() {
        let a = BlockState::new("minecraft:log")
            .with("pillar_axis", PropertyValue::Text("y".into()))
            .with("stripped_bit", PropertyValue::Bool(false));
        let b = BlockState::new("minecraft:log")
            .with("stripped_bit", PropertyValue::Bool(false))
            .with("pillar_axis", PropertyValue::Text("y".into()));
        let c = BlockState::new("minecraft:log")
            .with("pillar_axis", PropertyValue::Text("x".into()))
            .with("stripped_bit", PropertyValue::Bool(false));
        let registry = HashedRegistry::default();
        assert_eq!(registry.runtime_id(&a), registry.runtime_id(&b));
        assert_ne!(registry.runtime_id(&a), registry.runtime_id(&c));
        assert_ne!(registry.runtime_id(&a), registry.runtime_id(&air()));
    }

    #[test]
    fn version_changes_hash() {
        assert_ne!(
            hash_block_state(&air(), BLOCK_STATE_VERSION),
            hash_block_state(&air(), BLOCK_STATE_VERSION + 1)
        );
    }

    #[test]
    fn unnamed_state_is_unresolvable() {
        assert_eq!(HashedRegistry::default().runtime_id(&BlockState::default()), None);
    }
}
