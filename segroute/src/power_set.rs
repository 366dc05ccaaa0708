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

//! Power set enumeration of neighbor devices.

use crate::types::DeviceId;
use itertools::Itertools;
use std::collections::BTreeSet;

/// Returns all non-empty subsets of `neighbors`. For `n` neighbors, this returns `2^n - 1`
/// subsets. The result is deterministic: subsets are ordered by size, and within the same size
/// lexicographically by device id.
///
/// ```
/// use segroute::power_set::power_set;
/// use segroute::DeviceId;
/// use std::collections::BTreeSet;
///
/// let neighbors: BTreeSet<DeviceId> = (1..=3).map(DeviceId).collect();
/// assert_eq!(power_set(&neighbors).len(), 7);
/// ```
pub fn power_set(neighbors: &BTreeSet<DeviceId>) -> Vec<BTreeSet<DeviceId>> {
    neighbors
        .iter()
        .copied()
        .powerset()
        .filter(|subset| !subset.is_empty())
        .map(|subset| subset.into_iter().collect())
        .collect()
}

/// Returns every subset of `existing ∪ {new}` which contains `new`. This is the delta of the
/// power set when `new` is added to `existing`, and contains `2^|existing|` subsets. If `new` is
/// already part of `existing`, it is ignored there.
pub fn power_set_with(existing: &BTreeSet<DeviceId>, new: DeviceId) -> Vec<BTreeSet<DeviceId>> {
    let others: BTreeSet<DeviceId> = existing.iter().copied().filter(|d| *d != new).collect();
    others
        .iter()
        .copied()
        .powerset()
        .map(|subset| {
            let mut subset: BTreeSet<DeviceId> = subset.into_iter().collect();
            subset.insert(new);
            subset
        })
        .collect()
}
