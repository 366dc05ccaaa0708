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

use crate::power_set::{power_set, power_set_with};
use crate::DeviceId;
use maplit::btreeset;
use std::collections::{BTreeSet, HashSet};

#[test]
fn test_power_set_complete() {
    let (a, b, c) = (DeviceId(1), DeviceId(2), DeviceId(3));
    let subsets = power_set(&btreeset! {a, b, c});
    assert_eq!(subsets.len(), 7);
    assert!(subsets.iter().all(|s| !s.is_empty()));
    let unique: HashSet<Vec<DeviceId>> =
        subsets.iter().map(|s| s.iter().copied().collect()).collect();
    assert_eq!(unique.len(), 7);
    assert!(subsets.contains(&btreeset! {a, c}));
    assert!(subsets.contains(&btreeset! {a, b, c}));
}

#[test]
fn test_power_set_empty() {
    assert!(power_set(&BTreeSet::new()).is_empty());
}

#[test]
fn test_power_set_deterministic() {
    let neighbors: BTreeSet<DeviceId> = (1..=4).map(DeviceId).collect();
    assert_eq!(power_set(&neighbors), power_set(&neighbors));
    assert_eq!(power_set(&neighbors).len(), 15);
    // ordered by size
    let sizes: Vec<usize> = power_set(&neighbors).iter().map(|s| s.len()).collect();
    let mut sorted = sizes.clone();
    sorted.sort();
    assert_eq!(sizes, sorted);
}

#[test]
fn test_power_set_with() {
    let (a, b, c) = (DeviceId(1), DeviceId(2), DeviceId(3));
    let delta = power_set_with(&btreeset! {a, b}, c);
    assert_eq!(delta.len(), 4);
    assert!(delta.iter().all(|s| s.contains(&c)));
    assert!(delta.contains(&btreeset! {c}));
    assert!(delta.contains(&btreeset! {a, c}));
    assert!(delta.contains(&btreeset! {b, c}));
    assert!(delta.contains(&btreeset! {a, b, c}));

    // the new neighbor is ignored in the existing set
    assert_eq!(power_set_with(&btreeset! {a, c}, c), vec![btreeset! {c}, btreeset! {a, c}]);
    assert_eq!(power_set_with(&BTreeSet::new(), c), vec![btreeset! {c}]);
}
