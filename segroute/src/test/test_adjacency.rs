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

use crate::adjacency::{Adjacency, AdjacencyChange};
use crate::{DeviceId, PortNumber};
use maplit::btreeset;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

const A: DeviceId = DeviceId(1);
const B: DeviceId = DeviceId(2);

#[test]
fn test_add_and_remove() {
    let adj = Adjacency::new();
    assert_eq!(adj.add_neighbor_at_port(A, PortNumber(1)), AdjacencyChange::NewNeighbor);
    assert_eq!(adj.add_neighbor_at_port(A, PortNumber(2)), AdjacencyChange::NewPort);
    assert_eq!(adj.add_neighbor_at_port(A, PortNumber(2)), AdjacencyChange::Unchanged);
    assert_eq!(adj.add_neighbor_at_port(B, PortNumber(3)), AdjacencyChange::NewNeighbor);

    assert_eq!(adj.ports_to(A), btreeset! {PortNumber(1), PortNumber(2)});
    assert_eq!(adj.neighbor_at(PortNumber(3)), Some(B));
    assert_eq!(adj.neighbors(), btreeset! {A, B});

    assert_eq!(adj.remove_port(PortNumber(1)), Some(A));
    assert_eq!(adj.remove_port(PortNumber(1)), None);
    assert_eq!(adj.ports_to(A), btreeset! {PortNumber(2)});
    assert_eq!(adj.remove_port(PortNumber(2)), Some(A));
    assert!(!adj.is_neighbor(A));
    assert_eq!(adj.neighbors(), btreeset! {B});
    // the neighbor is new again
    assert_eq!(adj.add_neighbor_at_port(A, PortNumber(2)), AdjacencyChange::NewNeighbor);
}

#[test]
fn test_port_moves_to_other_neighbor() {
    let adj = Adjacency::new();
    adj.add_neighbor_at_port(A, PortNumber(1));
    adj.add_neighbor_at_port(A, PortNumber(2));
    adj.add_neighbor_at_port(B, PortNumber(1));
    assert_eq!(adj.neighbor_at(PortNumber(1)), Some(B));
    assert_eq!(adj.ports_to(A), btreeset! {PortNumber(2)});
    assert_eq!(adj.ports_to(B), btreeset! {PortNumber(1)});
}

#[test]
fn test_remove_neighbor() {
    let adj = Adjacency::new();
    adj.add_neighbor_at_port(A, PortNumber(1));
    adj.add_neighbor_at_port(A, PortNumber(2));
    adj.add_neighbor_at_port(B, PortNumber(3));
    assert_eq!(adj.remove_neighbor(A), btreeset! {PortNumber(1), PortNumber(2)});
    assert_eq!(adj.neighbor_at(PortNumber(1)), None);
    assert_eq!(adj.neighbor_at(PortNumber(3)), Some(B));
    assert!(adj.remove_neighbor(A).is_empty());
}

#[test]
fn test_concurrent_updates_of_one_neighbor() {
    let adj = Arc::new(Adjacency::new());
    // ports 0..100 exist initially, the even ones go down while 100..200 come up
    for p in 0..100 {
        adj.add_neighbor_at_port(A, PortNumber(p));
    }
    let workers: Vec<_> = (0..4)
        .map(|w| {
            let adj = adj.clone();
            thread::spawn(move || {
                for p in (w..100).step_by(4) {
                    if p % 2 == 0 {
                        adj.remove_port(PortNumber(p));
                    }
                    adj.add_neighbor_at_port(A, PortNumber(100 + p));
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }
    let expected: BTreeSet<PortNumber> =
        (0..100).filter(|p| p % 2 == 1).chain(100..200).map(PortNumber).collect();
    assert_eq!(adj.ports_to(A), expected);
    for p in 100..200 {
        assert_eq!(adj.neighbor_at(PortNumber(p)), Some(A));
    }
}
