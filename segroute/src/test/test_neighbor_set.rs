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

use crate::neighbor_set::NeighborSet;
use crate::DeviceId;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

fn hash_of(ns: &NeighborSet) -> u64 {
    let mut hasher = DefaultHasher::new();
    ns.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn test_order_independent() {
    let a = DeviceId(1);
    let b = DeviceId(2);
    let ab = NeighborSet::new(vec![a, b], Some(5));
    let ba = NeighborSet::new(vec![b, a], Some(5));
    assert_eq!(ab, ba);
    assert_eq!(hash_of(&ab), hash_of(&ba));

    let mut set = HashSet::new();
    set.insert(ab);
    assert!(set.contains(&ba));
}

#[test]
fn test_label_distinguishes() {
    let ns5 = NeighborSet::new(vec![DeviceId(1), DeviceId(2)], Some(5));
    let ns6 = NeighborSet::new(vec![DeviceId(1), DeviceId(2)], Some(6));
    let none = NeighborSet::unlabeled(vec![DeviceId(1), DeviceId(2)]);
    assert_ne!(ns5, ns6);
    assert_ne!(ns5, none);
}

#[test]
fn test_duplicates_and_accessors() {
    let ns: NeighborSet = vec![DeviceId(3), DeviceId(1), DeviceId(3)].into_iter().collect();
    assert_eq!(ns.len(), 2);
    assert!(ns.contains(DeviceId(1)));
    assert!(!ns.contains(DeviceId(2)));
    assert_eq!(ns.edge_label(), None);
    assert_eq!(ns.neighbors().iter().copied().collect::<Vec<_>>(), vec![DeviceId(1), DeviceId(3)]);
    assert!(NeighborSet::unlabeled(vec![]).is_empty());
}

#[test]
fn test_display() {
    let ns = NeighborSet::new(vec![DeviceId(2), DeviceId(1)], Some(101));
    assert_eq!(ns.to_string(), "NS{[of:0000000000000001, of:0000000000000002], label: 101}");
    let ns = NeighborSet::unlabeled(vec![DeviceId(1)]);
    assert_eq!(ns.to_string(), "NS{[of:0000000000000001], label: none}");
}
