//! Block states and their canonical lookup key.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::error::StateError;

/// A block state property value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyValue {
    Bool(bool),
    Int(i32),
    Text(String),
}

impl PropertyValue {
    /// Convert an untyped JSON value. Integral floats (`3.0`) become `Int`;
    /// anything that is not a bool, an `i32`-ranged integer or a string is rejected.
    pub fn from_json(key: &str, value: &Value) -> Result<Self, StateError> {
        let invalid = |found| StateError::InvalidPropertyType {
            key: key.to_string(),
            found,
        };
        match value {
            Value::Bool(b) => Ok(PropertyValue::Bool(*b)),
            Value::String(s) => Ok(PropertyValue::Text(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return i32::try_from(i)
                        .map(PropertyValue::Int)
                        .map_err(|_| invalid("out-of-range integer"));
                }
                match n.as_f64() {
                    Some(f)
                        if f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 =>
                    {
                        Ok(PropertyValue::Int(f as i32))
                    }
                    _ => Err(invalid("non-integral number")),
                }
            }
            Value::Null => Err(invalid("null")),
            Value::Array(_) => Err(invalid("array")),
            Value::Object(_) => Err(invalid("object")),
        }
    }

    fn tag(&self) -> u8 {
        match self {
            PropertyValue::Bool(_) => 1,
            PropertyValue::Int(_) => 3,
            PropertyValue::Text(_) => 8,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(v) => write!(f, "{v}"),
            PropertyValue::Int(v) => write!(f, "{v}"),
            PropertyValue::Text(v) => f.write_str(v),
        }
    }
}

/// A named block state. Properties are kept sorted, so equality and the
/// lookup key do not depend on insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BlockState {
    pub name: String,
    pub properties: BTreeMap<String, PropertyValue>,
}

/// Canonical byte key of a [`BlockState`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey(Vec<u8>);

impl StateKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl BlockState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Parse the compact Java form `minecraft:oak_log[axis=y]`. All property
    /// values are kept as text, as Java stores them.
    pub fn parse_compact(text: &str) -> Result<Self, StateError> {
        let malformed = || StateError::MalformedKey(text.to_string());
        let (name, props) = match text.split_once('[') {
            Some((name, rest)) => (name, Some(rest.strip_suffix(']').ok_or_else(malformed)?)),
            None => (text, None),
        };
        if name.is_empty() {
            return Err(malformed());
        }

        let mut state = BlockState::new(name);
        for entry in props.into_iter().flat_map(|p| p.split(',')) {
            if entry.is_empty() {
                continue;
            }
            let (key, value) = entry.split_once('=').ok_or_else(malformed)?;
            if key.is_empty() || value.contains('=') {
                return Err(malformed());
            }
            state
                .properties
                .insert(key.to_string(), PropertyValue::Text(value.to_string()));
        }
        Ok(state)
    }

    /// Derive the lookup key: name, then each property in key order as
    /// `key, type tag, value`. Bools are one byte, ints four little-endian
    /// bytes, strings raw bytes. Every variable-length part is length-prefixed.
    pub fn key(&self) -> StateKey {
        let mut buf = Vec::with_capacity(self.name.len() + 16 * self.properties.len() + 4);
        put_str(&mut buf, &self.name);
        for (key, value) in &self.properties {
            put_str(&mut buf, key);
            buf.push(value.tag());
            match value {
                PropertyValue::Bool(b) => buf.push(u8::from(*b)),
                PropertyValue::Int(i) => buf.extend_from_slice(&i.to_le_bytes()),
                PropertyValue::Text(s) => put_str(&mut buf, s),
            }
        }
        StateKey(buf)
    }
}

fn put_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.properties.is_empty() {
            return Ok(());
        }
        f.write_str("[")?;
        for (i, (key, value)) in self.properties.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}={value}")?;
        }
        f.write_str("]")
    }
}
