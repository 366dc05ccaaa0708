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

//! # Neighbor Set
//!
//! A neighbor set is the key of a hashed (ECMP) group: a set of directly connected neighbor
//! devices, together with an optional edge label which is pushed on traffic forwarded through any
//! of the neighbors. The neighbors are kept in a `BTreeSet`, which makes equality and hashing
//! independent of the insertion order.

use crate::types::{DeviceId, SegmentId};
use std::collections::BTreeSet;
use std::fmt;
use std::iter::FromIterator;

/// Set of neighbor devices plus an optional edge label. The neighbor set is immutable after
/// construction.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone)]
pub struct NeighborSet {
    neighbors: BTreeSet<DeviceId>,
    edge_label: Option<SegmentId>,
}

impl NeighborSet {
    /// Create a new neighbor set.
    pub fn new<I>(neighbors: I, edge_label: Option<SegmentId>) -> Self
    where
        I: IntoIterator<Item = DeviceId>,
    {
        Self { neighbors: neighbors.into_iter().collect(), edge_label }
    }

    /// Create a new neighbor set without an edge label.
    pub fn unlabeled<I: IntoIterator<Item = DeviceId>>(neighbors: I) -> Self {
        Self::new(neighbors, None)
    }

    /// Returns the neighbors
    pub fn neighbors(&self) -> &BTreeSet<DeviceId> {
        &self.neighbors
    }

    /// Returns the edge label, or `None` if no label is pushed
    pub fn edge_label(&self) -> Option<SegmentId> {
        self.edge_label
    }

    /// Returns true if the neighbor is part of the set
    pub fn contains(&self, neighbor: DeviceId) -> bool {
        self.neighbors.contains(&neighbor)
    }

    /// Number of neighbors in the set
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    /// Returns true if the set contains no neighbors
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}

impl FromIterator<DeviceId> for NeighborSet {
    fn from_iter<T: IntoIterator<Item = DeviceId>>(iter: T) -> Self {
        Self::unlabeled(iter)
    }
}

impl fmt::Display for NeighborSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NS{{[{}], label: {}}}",
            self.neighbors.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", "),
            match self.edge_label {
                Some(l) => l.to_string(),
                None => "none".to_string(),
            }
        )
    }
}
