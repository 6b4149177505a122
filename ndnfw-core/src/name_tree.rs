//! Name-keyed index shared by the FIB and the PIT.
//!
//! Entries are stored by exact name. Prefix queries look the map up once per
//! prefix length of the queried name, borrowing the name's component slice,
//! so a lookup costs `len + 1` hash lookups and no allocation.

use ndnfw_common::{Name, NameComponent};
use std::collections::HashMap;

/// A map from names to values with longest-prefix-match lookups.
#[derive(Debug, Clone)]
pub struct NameIndex<T> {
    entries: HashMap<Name, T>,
}

impl<T> NameIndex<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Inserts `value` under `name`, returning the value it replaced.
    pub fn insert(&mut self, name: Name, value: T) -> Option<T> {
        self.entries.insert(name, value)
    }

    pub fn get(&self, name: &[NameComponent]) -> Option<&T> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &[NameComponent]) -> Option<&mut T> {
        self.entries.get_mut(name)
    }

    pub fn remove(&mut self, name: &[NameComponent]) -> Option<T> {
        self.entries.remove(name)
    }

    /// Returns the entry registered under the longest prefix of `name`,
    /// trying the full name first and the empty name last.
    pub fn longest_prefix_match(&self, name: &Name) -> Option<(&Name, &T)> {
        let components = name.components();
        (0..=components.len())
            .rev()
            .find_map(|len| self.entries.get_key_value(&components[..len]))
    }

    /// Returns every entry whose name is a prefix of `name` (including
    /// `name` itself), shortest first.
    pub fn prefix_matches<'a>(&'a self, name: &'a Name) -> impl Iterator<Item = (&'a Name, &'a T)> + 'a {
        let components = name.components();
        (0..=components.len()).filter_map(move |len| self.entries.get_key_value(&components[..len]))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &T)> {
        self.entries.iter()
    }

    /// Keeps only the entries for which `f` returns true.
    pub fn retain(&mut self, mut f: impl FnMut(&Name, &mut T) -> bool) {
        self.entries.retain(|name, value| f(name, value));
    }
}

impl<T> Default for NameIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}
