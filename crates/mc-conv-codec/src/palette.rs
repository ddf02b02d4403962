//! Local id <-> state palettes.
//!
//! States are dense global ids (`u32`). A palette hands out small local ids so
//! the backing [`PackedArray`](crate::PackedArray) can stay narrow.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Palette {
    /// Exactly one state, id 0. Backed by a zero-width array.
    Singleton(u32),
    /// Ordered distinct states with linear lookup, up to `2^bits` entries.
    List { bits: u8, states: Vec<u32> },
    /// Same contract as `List`, indexed by a hash map for wider palettes.
    Map {
        bits: u8,
        states: Vec<u32>,
        ids: HashMap<u32, u32>,
    },
    /// Identity mapping: local id equals the global state id.
    Global,
}

impl Palette {
    pub fn list(bits: u8) -> Self {
        Palette::List {
            bits,
            states: Vec::new(),
        }
    }

    pub fn map(bits: u8) -> Self {
        Palette::Map {
            bits,
            states: Vec::new(),
            ids: HashMap::new(),
        }
    }

    /// Build a list or map palette pre-filled with `states` in order, so that
    /// local id `i` maps to `states[i]`.
    ///
    /// Duplicate entries keep their position; lookups resolve to the first one.
    pub fn with_states(bits: u8, states: Vec<u32>, hashed: bool) -> Self {
        if hashed {
            let mut ids = HashMap::with_capacity(states.len());
            for (i, &state) in states.iter().enumerate() {
                ids.entry(state).or_insert(i as u32);
            }
            Palette::Map { bits, states, ids }
        } else {
            Palette::List { bits, states }
        }
    }

    /// Look up (or assign) the local id of `state`.
    ///
    /// Returns `None` when the state is absent and cannot be added: a full
    /// list/map, or a singleton holding another state. The caller resizes.
    pub fn state_to_id(&mut self, state: u32) -> Option<u32> {
        match self {
            Palette::Singleton(s) => (*s == state).then_some(0),
            Palette::List { bits, states } => {
                if let Some(i) = states.iter().position(|&s| s == state) {
                    return Some(i as u32);
                }
                if states.len() < capacity(*bits) {
                    states.push(state);
                    Some(states.len() as u32 - 1)
                } else {
                    None
                }
            }
            Palette::Map { bits, states, ids } => {
                if let Some(&id) = ids.get(&state) {
                    return Some(id);
                }
                if states.len() < capacity(*bits) {
                    let id = states.len() as u32;
                    states.push(state);
                    ids.insert(state, id);
                    Some(id)
                } else {
                    None
                }
            }
            Palette::Global => Some(state),
        }
    }

    /// State stored under local `id`. Only ids handed out by this palette are valid.
    pub fn id_to_state(&self, id: u32) -> u32 {
        match self {
            Palette::Singleton(s) => *s,
            Palette::List { states, .. } | Palette::Map { states, .. } => states[id as usize],
            Palette::Global => id,
        }
    }

    /// Number of locally stored states. `Global` reports 0.
    pub fn len(&self) -> usize {
        match self {
            Palette::Singleton(_) => 1,
            Palette::List { states, .. } | Palette::Map { states, .. } => states.len(),
            Palette::Global => 0,
        }
    }

    /// Whether a list or map palette holds no states yet. `Global` covers the
    /// whole state space and is never empty.
    pub fn is_empty(&self) -> bool {
        !matches!(self, Palette::Global) && self.len() == 0
    }

    /// Width of local ids for list/map palettes, 0 for a singleton.
    /// `Global` has no intrinsic width; the owning grid decides.
    pub fn bits(&self) -> Option<u8> {
        match self {
            Palette::Singleton(_) => Some(0),
            Palette::List { bits, .. } | Palette::Map { bits, .. } => Some(*bits),
            Palette::Global => None,
        }
    }

    pub fn is_singleton(&self) -> bool {
        matches!(self, Palette::Singleton(_))
    }
}

fn capacity(bits: u8) -> usize {
    1usize << bits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singleton_hits_and_misses() {
        let mut p = Palette::Singleton(7);
        assert_eq!(p.state_to_id(7), Some(0));
        assert_eq!(p.state_to_id(8), None);
        assert_eq!(p.id_to_state(0), 7);
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn emptiness() {
        assert!(Palette::list(1).is_empty());
        assert!(Palette::map(5).is_empty());
        assert!(!Palette::Singleton(0).is_empty());
        assert!(!Palette::Global.is_empty());
        assert_eq!(Palette::Global.len(), 0);
    }

    #[test]
    fn list_fills_to_capacity() {
        let mut p = Palette::list(2);
        for (i, state) in [10, 20, 30, 40].into_iter().enumerate() {
            assert_eq!(p.state_to_id(state), Some(i as u32));
        }
        // existing states still resolve once full
        assert_eq!(p.state_to_id(30), Some(2));
        assert_eq!(p.state_to_id(50), None);
        assert_eq!(p.len(), 4);
        assert_eq!(p.id_to_state(3), 40);
    }

    #[test]
    fn map_matches_list_semantics() {
        let mut list = Palette::list(3);
        let mut map = Palette::map(3);
        for state in [5, 9, 5, 100, 3, 9, 42, 8, 1, 77, 200] {
            assert_eq!(list.state_to_id(state), map.state_to_id(state), "state {state}");
        }
        assert_eq!(map.len(), 8);
        assert_eq!(map.state_to_id(12345), None);
    }

    #[test]
    fn global_is_identity() {
        let mut p = Palette::Global;
        assert_eq!(p.state_to_id(12_000), Some(12_000));
        assert_eq!(p.id_to_state(12_000), 12_000);
        assert_eq!(p.bits(), None);
    }

    #[test]
    fn with_states_keeps_order() {
        let mut p = Palette::with_states(4, vec![3, 1, 2], true);
        assert_eq!(p.id_to_state(0), 3);
        assert_eq!(p.state_to_id(2), Some(2));
        assert_eq!(p.state_to_id(9), Some(3));
    }
}
