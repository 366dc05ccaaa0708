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

//! # Group Handler
//!
//! The [`GroupHandler`] owns the forwarding groups of a single device. It builds the hashed groups
//! for every combination of neighbors at startup, the broadcast groups for every configured subnet,
//! and simple groups for single ports on demand. Afterwards, it keeps all of them consistent with
//! the topology by reacting to [`TopologyEvent`]s.
//!
//! There is a single handler implementation for both edge and transit devices. The differences
//! between the two roles are captured by the [`LabelPairingPolicy`] chosen when the handler is
//! constructed (see [`crate::label_pairing`]).
//!
//! ## Ownership of the state
//!
//! The handler does not keep any state about existing groups besides the [`NextObjectiveStore`].
//! Whatever the store contains is the state of the device. The only local state are the adjacency
//! tables ([`Adjacency`]), which are populated from the [`LinkSource`] at construction and updated
//! on every link or port event.
//!
//! ## Mastership
//!
//! Every operation that submits a next objective to the sink in response to a topology event takes
//! an `is_master` flag. If the flag is not set, the operation only updates the local adjacency.
//!
//! ## Failed objectives
//!
//! Group creation writes the store before the sink reports the outcome. If the sink later reports
//! a failure, the group id is remembered, and the store entries pointing to it are purged at the
//! beginning of the next operation on this handler. The next lookup then creates the group again.

mod broadcast;
mod hashed;
mod simple;

use crate::adjacency::Adjacency;
use crate::device_config::DeviceProperties;
use crate::label_pairing::{policy_for_role, LabelPairingPolicy};
use crate::objective::{
    log_context, NextKind, NextObjective, NextOperation, ObjectiveError, ObjectiveSink,
};
use crate::store::NextObjectiveStore;
use crate::topology::{LinkSource, TopologyEvent};
use crate::types::{DeviceId, LinkType, MacAddress, NextId, SegmentId};
use crate::Error;

use dashmap::DashSet;
use log::*;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Group handler of a single device.
pub struct GroupHandler {
    device_id: DeviceId,
    node_mac: MacAddress,
    node_sid: SegmentId,
    config: Arc<dyn DeviceProperties>,
    sink: Arc<dyn ObjectiveSink>,
    store: NextObjectiveStore,
    policy: Box<dyn LabelPairingPolicy>,
    adjacency: Adjacency,
    /// Serializes check-then-create and in-place bucket updates of this instance.
    group_lock: Mutex<()>,
    failed: Arc<DashSet<NextId>>,
}

impl fmt::Debug for GroupHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupHandler")
            .field("device_id", &self.device_id)
            .field("node_mac", &self.node_mac)
            .field("node_sid", &self.node_sid)
            .field("policy", &self.policy)
            .field("adjacency", &self.adjacency)
            .finish()
    }
}

impl GroupHandler {
    /// Create the group handler for the device. The label pairing policy is chosen from the role of
    /// the device: [`EdgePairing`](crate::label_pairing::EdgePairing) for edge devices, and
    /// [`TransitPairing`](crate::label_pairing::TransitPairing) otherwise. Fails if the device has
    /// no configuration.
    pub fn new(
        device_id: DeviceId,
        config: Arc<dyn DeviceProperties>,
        links: &dyn LinkSource,
        sink: Arc<dyn ObjectiveSink>,
        store: NextObjectiveStore,
    ) -> Result<Self, Error> {
        let policy = policy_for_role(config.is_edge_device(device_id)?);
        Self::with_policy(device_id, config, links, sink, store, policy)
    }

    /// Create the group handler for the device, using the given label pairing policy.
    pub fn with_policy(
        device_id: DeviceId,
        config: Arc<dyn DeviceProperties>,
        links: &dyn LinkSource,
        sink: Arc<dyn ObjectiveSink>,
        store: NextObjectiveStore,
        policy: Box<dyn LabelPairingPolicy>,
    ) -> Result<Self, Error> {
        let node_mac = config.device_mac(device_id)?;
        let node_sid = config.segment_id(device_id)?;
        let handler = Self {
            device_id,
            node_mac,
            node_sid,
            config,
            sink,
            store,
            policy,
            adjacency: Adjacency::new(),
            group_lock: Mutex::new(()),
            failed: Arc::new(DashSet::new()),
        };
        handler.populate_neighbor_maps(links);
        info!(
            "Created group handler for {} (sid {}, {:?})",
            handler.device_id, handler.node_sid, handler.policy
        );
        Ok(handler)
    }

    fn populate_neighbor_maps(&self, links: &dyn LinkSource) {
        for link in links.egress_links(self.device_id) {
            if link.link_type != LinkType::Direct {
                continue;
            }
            debug!("{}: neighbor {} at port {}", self.device_id, link.dst.device, link.src.port);
            self.adjacency.add_neighbor_at_port(link.dst.device, link.src.port);
        }
    }

    /// Device of this handler
    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    /// Router MAC address of the device
    pub fn node_mac(&self) -> MacAddress {
        self.node_mac
    }

    /// Segment id of the device
    pub fn node_sid(&self) -> SegmentId {
        self.node_sid
    }

    /// Label pairing policy of the handler
    pub fn policy(&self) -> &dyn LabelPairingPolicy {
        self.policy.as_ref()
    }

    /// Adjacency tables of the device
    pub fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    /// Next objective store used by the handler
    pub fn store(&self) -> &NextObjectiveStore {
        &self.store
    }

    /// Device properties used by the handler
    pub fn config(&self) -> &dyn DeviceProperties {
        self.config.as_ref()
    }

    /// Objective sink used by the handler
    pub fn sink(&self) -> &Arc<dyn ObjectiveSink> {
        &self.sink
    }

    /// Dispatch a topology event to the matching operation.
    pub fn handle_event(&self, event: TopologyEvent, is_master: bool) {
        match event {
            TopologyEvent::LinkUp(link) => self.link_up(&link, is_master),
            TopologyEvent::PortDown(port) => self.port_down(port, is_master),
            TopologyEvent::EdgePort { port, subnet, port_up } => {
                self.process_edge_port(port, subnet, port_up, is_master)
            }
            TopologyEvent::NeighborDown(neighbor) => self.cleanup_for_neighbor_down(neighbor),
        }
    }

    /// Remove the adjacency of a neighbor device that has disappeared. No group is changed.
    pub fn cleanup_for_neighbor_down(&self, neighbor: DeviceId) {
        let _guard = self.group_lock.lock();
        let ports = self.adjacency.remove_neighbor(neighbor);
        info!("{}: neighbor {} down, forgetting ports {:?}", self.device_id, neighbor, ports);
    }

    /// Remove the group from the device, and purge every store entry pointing to it. Returns
    /// `false` if no group with this id is known for the device.
    pub fn remove_group(&self, id: NextId) -> bool {
        self.purge_failed();
        let _guard = self.group_lock.lock();
        self.remove_group_locked(id)
    }

    /// Remove every group of the device. Returns the number of removed groups.
    pub fn remove_all_groups(&self) -> usize {
        self.purge_failed();
        let _guard = self.group_lock.lock();
        let ids = self.store.next_ids_of(self.device_id);
        ids.into_iter().filter(|id| self.remove_group_locked(*id)).count()
    }

    fn remove_group_locked(&self, id: NextId) -> bool {
        let kind = if self.store.neighbor_sets_of(self.device_id).iter().any(|(_, x)| *x == id) {
            NextKind::Hashed
        } else if self.store.subnets_of(self.device_id).iter().any(|(_, x)| *x == id) {
            NextKind::Broadcast
        } else if self.store.ports_of(self.device_id).iter().any(|(_, _, x)| *x == id) {
            NextKind::Simple
        } else {
            debug!("{}: cannot remove unknown NextObj {}", self.device_id, id);
            return false;
        };
        let objective = NextObjective::new(id, kind, NextOperation::Remove)
            .with_context(log_context(self.device_id, "removeGroup"));
        info!("{}: removing {:?} NextObj {}", self.device_id, kind, id);
        self.sink.next(self.device_id, objective);
        self.store.purge_next_id(self.device_id, id);
        true
    }

    /// Purge the store entries of all groups for which the sink reported a failed creation.
    /// Returns the number of purged groups.
    pub fn purge_failed(&self) -> usize {
        let failed: Vec<NextId> = self.failed.iter().map(|id| *id).collect();
        for id in failed.iter() {
            self.failed.remove(id);
            let n = self.store.purge_next_id(self.device_id, *id);
            if n > 0 {
                info!("{}: purged {} store entries of failed NextObj {}", self.device_id, n, id);
            }
        }
        failed.len()
    }

    /// Context for objectives creating a new group. On failure, the group is marked for purging.
    fn create_context(
        &self,
        what: &'static str,
    ) -> impl FnOnce(NextId, Result<(), ObjectiveError>) + Send + 'static {
        let device = self.device_id;
        let failed = self.failed.clone();
        move |id, result| match result {
            Ok(()) => debug!("{} installed NextObj {} on {}", what, id, device),
            Err(e) => {
                warn!("{} failed to install NextObj {} on {}: {}", what, id, device, e);
                failed.insert(id);
            }
        }
    }
}
