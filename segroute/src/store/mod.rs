// SegRoute: Synthesizing ECMP and Label-Push Groups for Segment Routing
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # Next Objective Store
//!
//! The store remembers which group (next objective) was created for which key. It is the single
//! source of truth for the question *"does a group already exist for this key?"*. There are three
//! independent maps, one for each kind of key (see [`keys`]):
//!
//! - [`NeighborSetKey`]: device and neighbor set, mapping to a hashed group,
//! - [`SubnetKey`]: device and subnet prefix, mapping to a broadcast group,
//! - [`PortKey`]: device, port and treatment, mapping to a simple group.
//!
//! Each map is a [`ConsistentMap`], which is usually replicated among all controller instances
//! with eventual consistency. Writes are visible locally immediately, but may reach other
//! instances later. [`InMemoryMap`] is a local, non-replicated implementation.

pub mod keys;
mod next_objective_store;

pub use keys::{NeighborSetKey, PortKey, SubnetKey};
pub use next_objective_store::NextObjectiveStore;

use dashmap::DashMap;
use std::fmt;
use std::hash::Hash;

/// Eventually consistent key-value map. Implementations must guarantee read-your-writes for the
/// local instance.
pub trait ConsistentMap<K, V>: Send + Sync {
    /// Get the value stored for the key
    fn get(&self, key: &K) -> Option<V>;

    /// Store the value for the key, returning the previous value.
    fn put(&self, key: K, value: V) -> Option<V>;

    /// Remove the key, returning the previous value.
    fn remove(&self, key: &K) -> Option<V>;

    /// Returns true if a value is stored for the key
    fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Returns true if any key maps to the value
    fn contains_value(&self, value: &V) -> bool;

    /// Snapshot of all entries
    fn entries(&self) -> Vec<(K, V)>;
}

/// Local implementation of a [`ConsistentMap`], backed by a concurrent hash map.
pub struct InMemoryMap<K, V>
where
    K: Eq + Hash,
{
    map: DashMap<K, V>,
}

impl<K: Eq + Hash, V> Default for InMemoryMap<K, V> {
    fn default() -> Self {
        Self { map: DashMap::new() }
    }
}

impl<K: Eq + Hash, V> InMemoryMap<K, V> {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if the map has no entries
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<K: Eq + Hash + fmt::Debug, V: fmt::Debug> fmt::Debug for InMemoryMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut m = f.debug_map();
        for e in self.map.iter() {
            m.entry(e.key(), e.value());
        }
        m.finish()
    }
}

impl<K, V> ConsistentMap<K, V> for InMemoryMap<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: PartialEq + Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        self.map.get(key).map(|v| v.value().clone())
    }

    fn put(&self, key: K, value: V) -> Option<V> {
        self.map.insert(key, value)
    }

    fn remove(&self, key: &K) -> Option<V> {
        self.map.remove(key).map(|(_, v)| v)
    }

    fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    fn contains_value(&self, value: &V) -> bool {
        self.map.iter().any(|e| e.value() == value)
    }

    fn entries(&self) -> Vec<(K, V)> {
        self.map.iter().map(|e| (e.key().clone(), e.value().clone())).collect()
    }
}
