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

//! # Device-local adjacency
//!
//! Two concurrent maps of a single device: neighbor device to the set of local ports leading to
//! it, and local port to the neighbor behind it. The maps are local to the controller instance
//! and are never replicated.
//!
//! All updates of a neighbor's port set happen while holding the entry of that neighbor in the
//! `neighbor_ports` map, such that concurrent updates on different ports of the same neighbor
//! never lose an add or a remove.

use crate::types::{DeviceId, PortNumber};
use dashmap::DashMap;
use std::collections::BTreeSet;

/// Outcome of recording a port towards a neighbor
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum AdjacencyChange {
    /// The neighbor had no known port before
    NewNeighbor,
    /// The neighbor was known, but the port is new
    NewPort,
    /// The port was already known to lead to the neighbor
    Unchanged,
}

/// Adjacency tables of a device.
#[derive(Debug, Default)]
pub struct Adjacency {
    neighbor_ports: DashMap<DeviceId, BTreeSet<PortNumber>>,
    port_neighbor: DashMap<PortNumber, DeviceId>,
}

impl Adjacency {
    /// Create empty adjacency tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `port` leads to `neighbor`. If the port was previously connected to a different
    /// neighbor, it is removed from the port set of that neighbor.
    pub fn add_neighbor_at_port(&self, neighbor: DeviceId, port: PortNumber) -> AdjacencyChange {
        if let Some(old) = self.port_neighbor.insert(port, neighbor) {
            if old != neighbor {
                self.remove_port_of(old, port);
            }
        }
        let mut ports = self.neighbor_ports.entry(neighbor).or_default();
        if ports.is_empty() {
            ports.insert(port);
            AdjacencyChange::NewNeighbor
        } else if ports.insert(port) {
            AdjacencyChange::NewPort
        } else {
            AdjacencyChange::Unchanged
        }
    }

    /// Forget the port. Returns the neighbor that was connected to it, if any.
    pub fn remove_port(&self, port: PortNumber) -> Option<DeviceId> {
        let (_, neighbor) = self.port_neighbor.remove(&port)?;
        self.remove_port_of(neighbor, port);
        Some(neighbor)
    }

    /// Forget the neighbor and all its ports. Returns the ports that were connected to it.
    pub fn remove_neighbor(&self, neighbor: DeviceId) -> BTreeSet<PortNumber> {
        let ports = self.neighbor_ports.remove(&neighbor).map(|(_, p)| p).unwrap_or_default();
        for port in ports.iter() {
            self.port_neighbor.remove_if(port, |_, n| *n == neighbor);
        }
        ports
    }

    /// Ports leading to the neighbor. The set is empty if the neighbor is unknown.
    pub fn ports_to(&self, neighbor: DeviceId) -> BTreeSet<PortNumber> {
        self.neighbor_ports.get(&neighbor).map(|p| p.clone()).unwrap_or_default()
    }

    /// Neighbor connected to the port
    pub fn neighbor_at(&self, port: PortNumber) -> Option<DeviceId> {
        self.port_neighbor.get(&port).map(|n| *n)
    }

    /// All neighbors with at least one known port
    pub fn neighbors(&self) -> BTreeSet<DeviceId> {
        self.neighbor_ports.iter().filter(|e| !e.value().is_empty()).map(|e| *e.key()).collect()
    }

    /// Returns true if the neighbor has at least one known port
    pub fn is_neighbor(&self, neighbor: DeviceId) -> bool {
        self.neighbor_ports.get(&neighbor).map(|p| !p.is_empty()).unwrap_or(false)
    }

    fn remove_port_of(&self, neighbor: DeviceId, port: PortNumber) {
        if let Some(mut ports) = self.neighbor_ports.get_mut(&neighbor) {
            ports.remove(&port);
        }
        self.neighbor_ports.remove_if(&neighbor, |_, ports| ports.is_empty());
    }
}
