use std::{
    collections::{HashMap, HashSet},
    hash::Hash,
};

#[derive(Debug, Clone)]
enum Slot<V> {
    Present(V),
    /// Masks an entry of a lower layer
    Removed,
}

/// One layer of a copy-on-write table
///
/// A layer only ever holds its own writes - lower layers are read through
/// with [read_through] and never modified.
#[derive(Debug, Clone)]
pub(crate) struct Layer<K, V> {
    slots: HashMap<K, Slot<V>>,
}
impl<K, V> Default for Layer<K, V> {
    fn default() -> Self {
        Layer {
            slots: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq + Copy, V> Layer<K, V> {
    pub(crate) fn insert(&mut self, key: K, value: V) {
        self.slots.insert(key, Slot::Present(value));
    }

    /// Hides `key` in this layer and every layer below it
    pub(crate) fn remove(&mut self, key: K) {
        self.slots.insert(key, Slot::Removed);
    }

    /// Mutable access to a value written in this layer
    pub(crate) fn local_mut(&mut self, key: &K) -> Option<&mut V> {
        match self.slots.get_mut(key) {
            Some(Slot::Present(value)) => Some(value),
            _ => None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

/// Looks `key` up through `layers`, topmost first
///
/// The first layer holding the key decides: its value, or nothing for a tombstone.
pub(crate) fn read_through<'a, K, V>(
    key: &K,
    layers: impl IntoIterator<Item = &'a Layer<K, V>>,
) -> Option<&'a V>
where
    K: Hash + Eq + 'a,
    V: 'a,
{
    for layer in layers {
        match layer.slots.get(key) {
            Some(Slot::Present(value)) => return Some(value),
            Some(Slot::Removed) => return None,
            None => {}
        }
    }
    None
}

/// Every key visible through `layers`, topmost first
pub(crate) fn visible_keys<'a, K, V>(layers: impl IntoIterator<Item = &'a Layer<K, V>>) -> Vec<K>
where
    K: Hash + Eq + Copy + 'a,
    V: 'a,
{
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for layer in layers {
        for (key, slot) in &layer.slots {
            if seen.insert(*key) && matches!(slot, Slot::Present(_)) {
                keys.push(*key);
            }
        }
    }
    keys
}
