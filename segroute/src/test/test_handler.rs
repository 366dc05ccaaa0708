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

use super::helpers::RecordingSink;
use crate::device_config::{DeviceConfig, DeviceConfigError, DeviceInfo, DeviceProperties};
use crate::example_networks::{router_mac, ExampleFabric, LeafSpine, TwoNeighbors};
use crate::handler::GroupHandler;
use crate::neighbor_set::NeighborSet;
use crate::objective::{NextKind, NextOperation::*};
use crate::store::NextObjectiveStore;
use crate::topology::{StaticLinkSource, TopologyEvent};
use crate::treatment::{Instruction, Selector, Treatment};
use crate::{ConnectPoint, DeviceId, Error, Link, LinkType, NextId, PortNumber, Prefix};
use crate::{MacAddress, SegmentId, INTERNAL_VLAN};
use maplit::{btreeset, hashset};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const D: DeviceId = TwoNeighbors::D;
const A: DeviceId = TwoNeighbors::A;
const B: DeviceId = TwoNeighbors::B;

struct Setup {
    config: Arc<DeviceConfig>,
    links: StaticLinkSource,
    sink: Arc<RecordingSink>,
    store: NextObjectiveStore,
}

impl Setup {
    fn new(config: DeviceConfig, links: StaticLinkSource) -> Self {
        Self {
            config: Arc::new(config),
            links,
            sink: Arc::new(RecordingSink::new()),
            store: NextObjectiveStore::in_memory(),
        }
    }

    fn two_neighbors() -> Self {
        Self::new(TwoNeighbors::config(), TwoNeighbors::links())
    }

    fn leaf_spine() -> Self {
        Self::new(LeafSpine::config(), LeafSpine::links())
    }

    fn handler(&self, device: DeviceId) -> GroupHandler {
        GroupHandler::new(
            device,
            self.config.clone(),
            &self.links,
            self.sink.clone(),
            self.store.clone(),
        )
        .unwrap()
    }

    fn next_id(&self, device: DeviceId, ns: &NeighborSet) -> NextId {
        self.store.neighbor_set_next_id(device, ns).unwrap()
    }
}

fn ns(neighbors: Vec<DeviceId>, label: Option<u32>) -> NeighborSet {
    NeighborSet::new(neighbors, label)
}

fn prefix(s: &str) -> Prefix {
    s.parse().unwrap()
}

fn link(src: DeviceId, src_port: u32, dst: DeviceId, dst_port: u32) -> Link {
    Link::direct(
        ConnectPoint::new(src, PortNumber(src_port)),
        ConnectPoint::new(dst, PortNumber(dst_port)),
    )
}

#[test]
fn test_create_groups_two_neighbors() {
    let s = Setup::two_neighbors();
    let handler = s.handler(D);
    assert_eq!(handler.create_groups(), 5);

    let keys: HashSet<NeighborSet> =
        s.store.neighbor_sets_of(D).into_iter().map(|(ns, _)| ns).collect();
    assert_eq!(
        keys,
        hashset! {
            ns(vec![A], None),
            ns(vec![A], Some(102)),
            ns(vec![B], None),
            ns(vec![B], Some(101)),
            ns(vec![A, B], None),
        }
    );
    assert_eq!(s.sink.count(Add), 5);
    assert!(s.sink.records().iter().all(|r| r.kind == NextKind::Hashed && r.device == D));

    // label push towards A
    let id = s.next_id(D, &ns(vec![A], Some(102)));
    assert_eq!(
        s.sink.buckets(id),
        vec![Treatment::builder()
            .set_eth_dst(router_mac(A))
            .set_eth_src(router_mac(D))
            .push_mpls()
            .copy_ttl_out()
            .set_mpls(102)
            .set_output(PortNumber(1))
            .build()]
    );
    // one bucket per neighbor without a label
    let id = s.next_id(D, &ns(vec![A, B], None));
    let ports: HashSet<PortNumber> =
        s.sink.buckets(id).iter().filter_map(|t| t.output_port()).collect();
    assert_eq!(ports, hashset! {PortNumber(1), PortNumber(2)});
    assert!(s.sink.buckets(id).iter().all(|t| t.mpls_label().is_none()));

    // running it again does not create anything
    assert_eq!(handler.create_groups(), 0);
    assert_eq!(s.sink.count(Add), 5);
}

#[test]
fn test_next_objective_id_idempotent() {
    let s = Setup::two_neighbors();
    let handler = s.handler(D);
    let id1 = handler.next_objective_id(&ns(vec![A, B], Some(7)), None).unwrap();
    let id2 = handler.next_objective_id(&ns(vec![B, A], Some(7)), None).unwrap();
    assert_eq!(id1, id2);
    assert_eq!(s.sink.count(Add), 1);
    assert!(handler.has_next_objective_id(&ns(vec![A, B], Some(7))));
    assert!(!handler.has_next_objective_id(&ns(vec![A, B], Some(8))));
}

#[test]
fn test_next_objective_id_passes_meta() {
    let s = Setup::two_neighbors();
    let handler = s.handler(D);
    let meta = Selector::vlan(INTERNAL_VLAN);
    handler.next_objective_id(&ns(vec![A], None), Some(meta)).unwrap();
    assert_eq!(s.sink.with_op(Add)[0].meta, Some(meta));
}

#[test]
fn test_next_objective_id_unknown_adjacency() {
    let s = Setup::two_neighbors();
    let c = DeviceId(4);
    s.config.insert(c, DeviceInfo::transit(103, router_mac(c)));
    let handler = s.handler(D);

    // no port to c is known
    assert_eq!(handler.next_objective_id(&ns(vec![c], None), None), None);
    // unconfigured neighbor
    assert_eq!(handler.next_objective_id(&ns(vec![DeviceId(99)], None), None), None);
    assert_eq!(s.sink.count(Add), 0);
    assert!(!handler.has_next_objective_id(&ns(vec![c], None)));

    // the bucket of c is skipped
    let id = handler.next_objective_id(&ns(vec![A, c], None), None).unwrap();
    assert_eq!(s.sink.buckets(id).len(), 1);
}

#[test]
fn test_transit_drops_edge_pairs() {
    let s = Setup::leaf_spine();
    let spine = s.handler(LeafSpine::SPINE1);
    // three leaves, each paired with no label and the sids of the other spine and other leaves
    assert_eq!(spine.create_groups(), 12);
    let groups = s.store.neighbor_sets_of(LeafSpine::SPINE1);
    assert_eq!(groups.len(), 12);
    assert!(groups.iter().all(|(ns, _)| ns.len() == 1));
    assert!(!spine.has_next_objective_id(&ns(vec![LeafSpine::LEAF1, LeafSpine::LEAF2], None)));
}

#[test]
fn test_edge_keeps_all_subsets() {
    let s = Setup::leaf_spine();
    let leaf = s.handler(LeafSpine::LEAF1);
    assert_eq!(leaf.create_groups(), 11);
    let both = ns(vec![LeafSpine::SPINE1, LeafSpine::SPINE2], None);
    // two links to spine1 and one link to spine2
    assert_eq!(s.sink.buckets(s.next_id(LeafSpine::LEAF1, &both)).len(), 3);
    assert!(!leaf.has_next_objective_id(&ns(vec![LeafSpine::SPINE1], Some(101))));
    assert!(!leaf.has_next_objective_id(&ns(vec![LeafSpine::SPINE1], Some(201))));
    assert!(leaf.has_next_objective_id(&ns(vec![LeafSpine::SPINE1], Some(102))));
}

#[test]
fn test_link_up_patches_existing_groups() {
    let s = Setup::two_neighbors();
    let handler = s.handler(D);
    handler.create_groups();
    let ab = ns(vec![A, B], None);
    let id = s.next_id(D, &ab);
    assert_eq!(s.sink.buckets(id).len(), 2);
    let adds = s.sink.count(Add);

    handler.link_up(&link(D, 3, A, 2), true);

    assert_eq!(s.next_id(D, &ab), id);
    assert_eq!(s.sink.buckets(id).len(), 3);
    assert_eq!(s.sink.count(Add), adds);
    // every group containing A is patched
    assert_eq!(s.sink.count(AddToExisting), 3);
    assert!(s.sink.with_op(AddToExisting).iter().all(|r| r.treatments.len() == 1
        && r.treatments[0].output_port() == Some(PortNumber(3))));
    assert_eq!(handler.adjacency().ports_to(A).len(), 2);

    // the same link again changes nothing
    handler.link_up(&link(D, 3, A, 2), true);
    assert_eq!(s.sink.count(AddToExisting), 3);
}

#[test]
fn test_link_up_not_master() {
    let s = Setup::two_neighbors();
    let handler = s.handler(D);
    handler.create_groups();
    s.sink.clear_records();
    handler.link_up(&link(D, 3, A, 2), false);
    assert!(s.sink.records().is_empty());
    assert_eq!(handler.adjacency().neighbor_at(PortNumber(3)), Some(A));
}

#[test]
fn test_link_up_new_neighbor() {
    let s = Setup::two_neighbors();
    let c = DeviceId(4);
    s.config.insert(c, DeviceInfo::transit(103, router_mac(c)));
    let handler = s.handler(D);
    handler.create_groups();
    s.sink.clear_records();

    handler.link_up(&link(D, 3, c, 1), true);

    // {C}: 3 labels, {A,C}: 2, {B,C}: 2, {A,B,C}: 1
    assert_eq!(s.sink.count(Add), 8);
    assert_eq!(s.sink.count(AddToExisting), 0);
    assert!(handler.has_next_objective_id(&ns(vec![c], Some(101))));
    assert!(handler.has_next_objective_id(&ns(vec![A, B, c], None)));
    assert!(s.store.neighbor_sets_of(D).iter().all(|(ns, _)| ns.len() < 3 || ns.contains(c)));
}

#[test]
fn test_link_up_ignored() {
    let s = Setup::two_neighbors();
    let handler = s.handler(D);
    let mut indirect = link(D, 5, A, 5);
    indirect.link_type = LinkType::Indirect;
    handler.link_up(&indirect, true);
    handler.link_up(&link(A, 5, B, 5), true);
    assert_eq!(handler.adjacency().neighbor_at(PortNumber(5)), None);
    assert!(s.sink.records().is_empty());
}

#[test]
fn test_port_down() {
    let s = Setup::two_neighbors();
    let handler = s.handler(D);
    handler.create_groups();
    let ab = s.next_id(D, &ns(vec![A, B], None));

    handler.port_down(PortNumber(1), true);

    assert_eq!(s.sink.count(RemoveFromExisting), 3);
    assert_eq!(s.sink.buckets(ab), s.sink.buckets(s.next_id(D, &ns(vec![B], None))));
    assert!(s.sink.buckets(s.next_id(D, &ns(vec![A], None))).is_empty());
    assert_eq!(handler.adjacency().neighbor_at(PortNumber(1)), None);
    assert!(!handler.adjacency().is_neighbor(A));
    // groups stay in the store
    assert!(handler.has_next_objective_id(&ns(vec![A], None)));

    // unknown port
    s.sink.clear_records();
    handler.port_down(PortNumber(1), true);
    assert!(s.sink.records().is_empty());
}

#[test]
fn test_port_down_unconfigured_neighbor() {
    let s = Setup::two_neighbors();
    let handler = s.handler(D);
    handler.create_groups();
    let x = DeviceId(0x99);
    handler.link_up(&link(D, 5, x, 1), true);
    assert_eq!(handler.adjacency().neighbor_at(PortNumber(5)), Some(x));
    s.sink.clear_records();

    // no group can be patched, but the port is forgotten
    handler.port_down(PortNumber(5), true);
    assert!(s.sink.records().is_empty());
    assert_eq!(handler.adjacency().neighbor_at(PortNumber(5)), None);
}

#[test]
fn test_port_down_not_master() {
    let s = Setup::two_neighbors();
    let handler = s.handler(D);
    handler.create_groups();
    s.sink.clear_records();
    handler.port_down(PortNumber(2), false);
    assert!(s.sink.records().is_empty());
    assert_eq!(handler.adjacency().neighbors(), btreeset! {A});
}

#[test]
fn test_subnet_groups() {
    let s = Setup::leaf_spine();
    let leaf = s.handler(LeafSpine::LEAF1);
    let subnet = prefix("10.0.1.0/24");

    // lookups never create
    assert_eq!(leaf.subnet_next_objective_id(subnet), None);
    assert!(s.sink.records().is_empty());

    assert_eq!(leaf.create_groups_from_subnet_config(), 1);
    assert_eq!(leaf.create_groups_from_subnet_config(), 0);
    let id = leaf.subnet_next_objective_id(subnet).unwrap();
    let record = &s.sink.with_op(Add)[0];
    assert_eq!(record.kind, NextKind::Broadcast);
    assert_eq!(record.meta, Some(Selector::vlan(INTERNAL_VLAN)));
    assert_eq!(
        s.sink.buckets(id),
        vec![
            Treatment::builder().pop_vlan().set_output(PortNumber(10)).build(),
            Treatment::builder().pop_vlan().set_output(PortNumber(11)).build(),
        ]
    );

    let leaf3 = s.handler(LeafSpine::LEAF3);
    assert_eq!(leaf3.create_groups_from_subnet_config(), 2);
}

#[test]
fn test_process_edge_port() {
    let s = Setup::leaf_spine();
    let leaf = s.handler(LeafSpine::LEAF1);
    let subnet = prefix("10.0.1.0/24");
    leaf.create_groups_from_subnet_config();
    let id = leaf.subnet_next_objective_id(subnet).unwrap();

    leaf.process_edge_port(PortNumber(12), subnet, true, true);
    assert_eq!(s.sink.buckets(id).len(), 3);
    leaf.process_edge_port(PortNumber(10), subnet, false, true);
    assert_eq!(
        s.sink.buckets(id).iter().filter_map(|t| t.output_port()).collect::<Vec<_>>(),
        vec![PortNumber(11), PortNumber(12)]
    );

    // not master
    leaf.process_edge_port(PortNumber(13), subnet, true, false);
    assert_eq!(s.sink.buckets(id).len(), 2);

    // first port of a new subnet
    let other = prefix("10.9.0.0/16");
    leaf.process_edge_port(PortNumber(20), other, false, true);
    assert_eq!(leaf.subnet_next_objective_id(other), None);
    leaf.process_edge_port(PortNumber(20), other, true, true);
    let other_id = leaf.subnet_next_objective_id(other).unwrap();
    assert_ne!(other_id, id);
    assert_eq!(s.sink.buckets(other_id).len(), 1);

    assert!(leaf.remove_bcast_group_from_subnet(other));
    assert!(!leaf.remove_bcast_group_from_subnet(other));
    assert!(!s.sink.group_exists(other_id));
}

#[test]
fn test_transit_ignores_edge_ports() {
    let s = Setup::leaf_spine();
    let spine = s.handler(LeafSpine::SPINE1);
    assert_eq!(spine.create_groups_from_subnet_config(), 0);
    spine.process_edge_port(PortNumber(10), prefix("10.0.1.0/24"), true, true);
    assert!(s.sink.records().is_empty());
}

#[test]
fn test_port_groups() {
    let s = Setup::leaf_spine();
    let leaf = s.handler(LeafSpine::LEAF1);
    let rewrite = Treatment::builder().set_eth_dst(router_mac(DeviceId(0x99))).build();
    let pop = Treatment::builder().pop_vlan().build();

    let id = leaf.port_next_objective_id(PortNumber(10), &rewrite, None).unwrap();
    assert_eq!(leaf.port_next_objective_id(PortNumber(10), &rewrite, None), Some(id));
    let other = leaf.port_next_objective_id(PortNumber(10), &pop, None).unwrap();
    assert_ne!(id, other);
    assert_eq!(s.sink.count(Add), 2);

    let record = &s.sink.with_op(Add)[0];
    assert_eq!(record.kind, NextKind::Simple);
    assert_eq!(
        record.treatments,
        vec![rewrite.to_builder().set_output(PortNumber(10)).build()]
    );

    assert!(leaf.remove_group_from_port(PortNumber(10), &rewrite));
    assert!(!leaf.remove_group_from_port(PortNumber(10), &rewrite));
    assert_eq!(s.sink.with_op(Remove)[0].id, id);
    let recreated = leaf.port_next_objective_id(PortNumber(10), &rewrite, None).unwrap();
    assert_ne!(recreated, id);
}

#[test]
fn test_failed_create_is_recreated() {
    let s = Setup::two_neighbors();
    let handler = s.handler(D);
    let key = ns(vec![A], None);

    s.sink.set_fail_adds(true);
    let failed = handler.next_objective_id(&key, None).unwrap();
    // the entry is only purged by the next operation
    assert!(handler.has_next_objective_id(&key));

    s.sink.set_fail_adds(false);
    let id = handler.next_objective_id(&key, None).unwrap();
    assert_ne!(id, failed);
    assert_eq!(s.store.neighbor_set_next_id(D, &key), Some(id));
    assert_eq!(s.sink.count(Add), 2);
    assert!(s.sink.group_exists(id));
}

#[test]
fn test_failed_create_groups_reconciled() {
    let s = Setup::two_neighbors();
    let handler = s.handler(D);
    s.sink.set_fail_adds(true);
    assert_eq!(handler.create_groups(), 5);
    s.sink.set_fail_adds(false);
    assert_eq!(handler.create_groups(), 5);
    assert_eq!(handler.create_groups(), 0);
    assert_eq!(s.sink.num_groups(), 5);
    assert_eq!(handler.purge_failed(), 0);
}

#[test]
fn test_remove_groups() {
    let s = Setup::two_neighbors();
    let handler = s.handler(D);
    handler.create_groups();
    let id = s.next_id(D, &ns(vec![A], None));

    assert!(handler.remove_group(id));
    assert!(!handler.remove_group(id));
    assert!(!handler.has_next_objective_id(&ns(vec![A], None)));
    let removed = s.sink.with_op(Remove);
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].kind, NextKind::Hashed);
    assert_eq!(removed[0].id, id);

    handler.create_groups_from_subnet_config();
    handler.port_next_objective_id(PortNumber(1), &Treatment::default(), None);
    assert_eq!(handler.remove_all_groups(), 5);
    assert!(s.store.next_ids_of(D).is_empty());
    assert_eq!(s.sink.num_groups(), 0);
}

#[test]
fn test_verify_groups() {
    let s = Setup::two_neighbors();
    let handler = s.handler(D);
    handler.create_groups();
    assert_eq!(handler.verify_groups(false), 0);
    assert_eq!(handler.verify_groups(true), 5);
    let verified = s.sink.with_op(Verify);
    assert_eq!(verified.len(), 5);
    assert!(verified.iter().all(|r| r.meta == Some(Selector::vlan(INTERNAL_VLAN))));
    let ab = s.next_id(D, &ns(vec![A, B], None));
    let record = verified.iter().find(|r| r.id == ab).unwrap();
    assert_eq!(record.treatments.len(), 2);
    assert!(record.treatments[0].instructions().contains(&Instruction::SetEthSrc(router_mac(D))));
}

#[test]
fn test_handle_event() {
    let s = Setup::two_neighbors();
    let handler = s.handler(D);
    handler.create_groups();

    handler.handle_event(TopologyEvent::LinkUp(link(D, 3, B, 2)), true);
    assert_eq!(handler.adjacency().ports_to(B).len(), 2);
    handler.handle_event(TopologyEvent::PortDown(PortNumber(3)), true);
    assert_eq!(handler.adjacency().ports_to(B).len(), 1);
    assert_eq!(s.sink.count(AddToExisting), s.sink.count(RemoveFromExisting));

    handler.handle_event(TopologyEvent::NeighborDown(A), true);
    assert!(!handler.adjacency().is_neighbor(A));
    assert_eq!(handler.adjacency().neighbor_at(PortNumber(1)), None);
}

#[test]
fn test_shared_store() {
    let s = Setup::two_neighbors();
    let d = s.handler(D);
    let a = s.handler(A);
    assert_eq!(d.create_groups(), 5);
    // A only sees D, and is an edge device
    assert_eq!(a.create_groups(), 2);
    assert_eq!(a.remove_all_groups(), 2);
    assert_eq!(s.store.neighbor_sets_of(D).len(), 5);
    assert!(s.sink.records().iter().filter(|r| r.op == Remove).all(|r| r.device == A));
}

#[test]
fn test_unknown_device() {
    let s = Setup::two_neighbors();
    let result = GroupHandler::new(
        DeviceId(99),
        s.config.clone(),
        &s.links,
        s.sink.clone(),
        s.store.clone(),
    );
    assert!(matches!(
        result,
        Err(Error::DeviceConfigError(DeviceConfigError::NotFound(DeviceId(99))))
    ));
}

/// Configuration running a hook the first time the MAC address of `trigger` is looked up.
struct HookedConfig {
    inner: DeviceConfig,
    trigger: DeviceId,
    hook: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl DeviceProperties for HookedConfig {
    fn segment_id(&self, device: DeviceId) -> Result<SegmentId, DeviceConfigError> {
        self.inner.segment_id(device)
    }

    fn device_mac(&self, device: DeviceId) -> Result<MacAddress, DeviceConfigError> {
        if device == self.trigger {
            let hook = self.hook.lock().take();
            if let Some(hook) = hook {
                hook();
            }
        }
        self.inner.device_mac(device)
    }

    fn is_edge_device(&self, device: DeviceId) -> Result<bool, DeviceConfigError> {
        self.inner.is_edge_device(device)
    }

    fn all_segment_ids(&self) -> Vec<SegmentId> {
        self.inner.all_segment_ids()
    }

    fn subnet_ports(
        &self,
        device: DeviceId,
    ) -> Result<HashMap<Prefix, Vec<PortNumber>>, DeviceConfigError> {
        self.inner.subnet_ports(device)
    }
}

/// Output ports of all buckets of the group, sorted
fn bucket_ports(sink: &RecordingSink, id: NextId) -> Vec<PortNumber> {
    let mut ports: Vec<PortNumber> =
        sink.buckets(id).iter().filter_map(|t| t.output_port()).collect();
    ports.sort();
    ports
}

#[test]
fn test_lookup_during_link_up() {
    let config = Arc::new(HookedConfig {
        inner: TwoNeighbors::config(),
        trigger: A,
        hook: Mutex::new(None),
    });
    let sink = Arc::new(RecordingSink::new());
    let store = NextObjectiveStore::in_memory();
    let handler = Arc::new(
        GroupHandler::new(D, config.clone(), &TwoNeighbors::links(), sink.clone(), store.clone())
            .unwrap(),
    );

    // while the link is processed, another thread asks for the group of A
    let worker: Arc<Mutex<Option<JoinHandle<()>>>> = Arc::new(Mutex::new(None));
    let (h, w) = (handler.clone(), worker.clone());
    *config.hook.lock() = Some(Box::new(move || {
        let (tx, rx) = mpsc::channel();
        let t = thread::spawn(move || {
            h.next_objective_id(&ns(vec![A], None), None);
            tx.send(()).ok();
        });
        // give the lookup a chance to finish inside the event
        rx.recv_timeout(Duration::from_millis(200)).ok();
        *w.lock() = Some(t);
    }));

    handler.link_up(&link(D, 3, A, 2), true);
    let t = worker.lock().take();
    t.unwrap().join().unwrap();

    let id = store.neighbor_set_next_id(D, &ns(vec![A], None)).unwrap();
    assert_eq!(bucket_ports(&sink, id), vec![PortNumber(1), PortNumber(3)]);
    assert_eq!(sink.count(Add), 1);
}

#[test]
fn test_concurrent_events_and_lookups() {
    let s = Setup::two_neighbors();
    let handler = Arc::new(s.handler(D));
    handler.create_groups();

    let events = {
        let h = handler.clone();
        thread::spawn(move || {
            for p in 3..40 {
                h.link_up(&link(D, p, A, p), true);
                if p % 3 == 0 {
                    h.port_down(PortNumber(p), true);
                }
            }
        })
    };
    let lookups = {
        let h = handler.clone();
        thread::spawn(move || {
            for l in 0..40 {
                h.next_objective_id(&ns(vec![A, B], Some(1000 + l)), None);
                h.next_objective_id(&ns(vec![A], Some(2000 + l)), None);
            }
        })
    };
    events.join().unwrap();
    lookups.join().unwrap();

    // every group holds exactly one bucket per current port to its neighbors
    let groups = s.store.neighbor_sets_of(D);
    assert_eq!(groups.len(), 85);
    for (ns, id) in groups {
        let mut expected: Vec<PortNumber> =
            ns.neighbors().iter().flat_map(|n| handler.adjacency().ports_to(*n)).collect();
        expected.sort();
        assert_eq!(bucket_ports(&s.sink, id), expected, "{}", ns);
    }
}
