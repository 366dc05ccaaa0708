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

use super::keys::{NeighborSetKey, PortKey, SubnetKey};
use super::{ConsistentMap, InMemoryMap};
use crate::neighbor_set::NeighborSet;
use crate::treatment::Treatment;
use crate::types::{DeviceId, NextId, PortNumber, Prefix};
use log::*;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// The three next objective maps. Cloning the store is cheap, and all clones share the same
/// underlying maps.
#[derive(Clone)]
pub struct NextObjectiveStore {
    neighbor_sets: Arc<dyn ConsistentMap<NeighborSetKey, NextId>>,
    subnets: Arc<dyn ConsistentMap<SubnetKey, NextId>>,
    ports: Arc<dyn ConsistentMap<PortKey, NextId>>,
}

impl fmt::Debug for NextObjectiveStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NextObjectiveStore")
            .field("neighbor_sets", &self.neighbor_sets.entries().len())
            .field("subnets", &self.subnets.entries().len())
            .field("ports", &self.ports.entries().len())
            .finish()
    }
}

impl Default for NextObjectiveStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl NextObjectiveStore {
    /// Create a store from three (possibly replicated) maps.
    pub fn new(
        neighbor_sets: Arc<dyn ConsistentMap<NeighborSetKey, NextId>>,
        subnets: Arc<dyn ConsistentMap<SubnetKey, NextId>>,
        ports: Arc<dyn ConsistentMap<PortKey, NextId>>,
    ) -> Self {
        Self { neighbor_sets, subnets, ports }
    }

    /// Create a store which is only kept locally.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryMap::new()),
            Arc::new(InMemoryMap::new()),
            Arc::new(InMemoryMap::new()),
        )
    }

    // ---------------------------------------------------------------------------------------------
    // Neighbor sets
    // ---------------------------------------------------------------------------------------------

    /// Get the hashed group for the neighbor set on the device
    pub fn neighbor_set_next_id(&self, device: DeviceId, ns: &NeighborSet) -> Option<NextId> {
        self.neighbor_sets.get(&NeighborSetKey::new(device, ns.clone()))
    }

    /// Store the hashed group for the neighbor set on the device. Returns the previous value.
    pub fn put_neighbor_set(
        &self,
        device: DeviceId,
        ns: NeighborSet,
        id: NextId,
    ) -> Option<NextId> {
        self.neighbor_sets.put(NeighborSetKey::new(device, ns), id)
    }

    /// Remove the entry for the neighbor set on the device
    pub fn remove_neighbor_set(&self, device: DeviceId, ns: &NeighborSet) -> Option<NextId> {
        self.neighbor_sets.remove(&NeighborSetKey::new(device, ns.clone()))
    }

    /// All neighbor sets with a hashed group on the device, sorted by neighbor set.
    pub fn neighbor_sets_of(&self, device: DeviceId) -> Vec<(NeighborSet, NextId)> {
        let mut entries: Vec<(NeighborSet, NextId)> = self
            .neighbor_sets
            .entries()
            .into_iter()
            .filter(|(k, _)| k.device == device)
            .map(|(k, v)| (k.neighbor_set, v))
            .collect();
        entries.sort();
        entries
    }

    // ---------------------------------------------------------------------------------------------
    // Subnets
    // ---------------------------------------------------------------------------------------------

    /// Get the broadcast group for the subnet on the device
    pub fn subnet_next_id(&self, device: DeviceId, prefix: Prefix) -> Option<NextId> {
        self.subnets.get(&SubnetKey::new(device, prefix))
    }

    /// Returns true if there is a broadcast group for the subnet on the device
    pub fn contains_subnet(&self, device: DeviceId, prefix: Prefix) -> bool {
        self.subnets.contains_key(&SubnetKey::new(device, prefix))
    }

    /// Store the broadcast group for the subnet on the device
    pub fn put_subnet(&self, device: DeviceId, prefix: Prefix, id: NextId) -> Option<NextId> {
        self.subnets.put(SubnetKey::new(device, prefix), id)
    }

    /// Remove the entry for the subnet on the device
    pub fn remove_subnet(&self, device: DeviceId, prefix: Prefix) -> Option<NextId> {
        self.subnets.remove(&SubnetKey::new(device, prefix))
    }

    /// All subnets with a broadcast group on the device
    pub fn subnets_of(&self, device: DeviceId) -> Vec<(Prefix, NextId)> {
        let mut entries: Vec<(Prefix, NextId)> = self
            .subnets
            .entries()
            .into_iter()
            .filter(|(k, _)| k.device == device)
            .map(|(k, v)| (k.prefix, v))
            .collect();
        entries.sort_by_key(|(_, id)| *id);
        entries
    }

    // ---------------------------------------------------------------------------------------------
    // Ports
    // ---------------------------------------------------------------------------------------------

    /// Get the simple group for the port and treatment on the device
    pub fn port_next_id(
        &self,
        device: DeviceId,
        port: PortNumber,
        treatment: &Treatment,
    ) -> Option<NextId> {
        self.ports.get(&PortKey::new(device, port, treatment.clone()))
    }

    /// Store the simple group for the port and treatment on the device
    pub fn put_port(
        &self,
        device: DeviceId,
        port: PortNumber,
        treatment: Treatment,
        id: NextId,
    ) -> Option<NextId> {
        self.ports.put(PortKey::new(device, port, treatment), id)
    }

    /// Remove the entry for the port and treatment on the device
    pub fn remove_port(
        &self,
        device: DeviceId,
        port: PortNumber,
        treatment: &Treatment,
    ) -> Option<NextId> {
        self.ports.remove(&PortKey::new(device, port, treatment.clone()))
    }

    /// All simple groups on the device
    pub fn ports_of(&self, device: DeviceId) -> Vec<(PortNumber, Treatment, NextId)> {
        let mut entries: Vec<(PortNumber, Treatment, NextId)> = self
            .ports
            .entries()
            .into_iter()
            .filter(|(k, _)| k.device == device)
            .map(|(k, v)| (k.port, k.treatment, v))
            .collect();
        entries.sort();
        entries
    }

    // ---------------------------------------------------------------------------------------------
    // Across all maps
    // ---------------------------------------------------------------------------------------------

    /// Returns true if any of the three maps contains the group id
    pub fn contains_next_id(&self, id: NextId) -> bool {
        self.neighbor_sets.contains_value(&id)
            || self.subnets.contains_value(&id)
            || self.ports.contains_value(&id)
    }

    /// All group ids stored for the device, in any of the three maps.
    pub fn next_ids_of(&self, device: DeviceId) -> BTreeSet<NextId> {
        self.neighbor_sets_of(device)
            .into_iter()
            .map(|(_, id)| id)
            .chain(self.subnets_of(device).into_iter().map(|(_, id)| id))
            .chain(self.ports_of(device).into_iter().map(|(_, _, id)| id))
            .collect()
    }

    /// Remove every entry of the device whose value is `id`, in all three maps. Returns the number
    /// of removed entries.
    pub fn purge_next_id(&self, device: DeviceId, id: NextId) -> usize {
        let mut removed = 0;
        for (key, value) in self.neighbor_sets.entries() {
            if key.device == device && value == id && self.neighbor_sets.remove(&key).is_some() {
                trace!("purged {} -> {}", key, id);
                removed += 1;
            }
        }
        for (key, value) in self.subnets.entries() {
            if key.device == device && value == id && self.subnets.remove(&key).is_some() {
                trace!("purged {} -> {}", key, id);
                removed += 1;
            }
        }
        for (key, value) in self.ports.entries() {
            if key.device == device && value == id && self.ports.remove(&key).is_some() {
                trace!("purged {} -> {}", key, id);
                removed += 1;
            }
        }
        removed
    }
}
