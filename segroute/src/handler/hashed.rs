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

//! Hashed (ECMP) groups, keyed by neighbor set.

use super::GroupHandler;
use crate::adjacency::AdjacencyChange;
use crate::neighbor_set::NeighborSet;
use crate::objective::{log_context, NextKind, NextObjective, NextOperation};
use crate::power_set::{power_set, power_set_with};
use crate::treatment::{Selector, Treatment};
use crate::types::{
    DeviceId, Link, LinkType, MacAddress, NextId, PortNumber, SegmentId, INTERNAL_VLAN,
};

use log::*;
use std::collections::BTreeSet;

impl GroupHandler {
    /// Create the hashed groups for every non-empty subset of the current neighbors, paired with
    /// every label allowed by the label pairing policy. Groups that already exist in the store are
    /// left untouched. Returns the number of newly created groups.
    pub fn create_groups(&self) -> usize {
        self.purge_failed();
        let _guard = self.group_lock.lock();
        let neighbors = self.adjacency.neighbors();
        info!("{}: creating groups for neighbors {:?}", self.device_id, neighbors);
        self.create_groups_locked(power_set(&neighbors))
    }

    fn create_groups_locked(&self, subsets: Vec<BTreeSet<DeviceId>>) -> usize {
        let mut created = 0;
        for subset in subsets {
            for label in self.policy.pair_labels(self.device_id, &subset, self.config.as_ref()) {
                let ns = NeighborSet::new(subset.iter().copied(), label);
                if let Some((_, true)) = self.create_hashed_group_locked(&ns, None) {
                    created += 1;
                }
            }
        }
        created
    }

    /// Get the hashed group of the neighbor set, creating it first if it does not exist yet.
    /// Returns `None` if the group cannot be created, either because the configuration of a
    /// neighbor is missing, or because no port to any of the neighbors is known.
    pub fn next_objective_id(&self, ns: &NeighborSet, meta: Option<Selector>) -> Option<NextId> {
        self.purge_failed();
        if let Some(id) = self.store.neighbor_set_next_id(self.device_id, ns) {
            trace!("{}: NextObj {} found for {}", self.device_id, id, ns);
            return Some(id);
        }
        debug!("{}: NextObj not found for {}, creating", self.device_id, ns);
        let _guard = self.group_lock.lock();
        match self.create_hashed_group_locked(ns, meta) {
            Some((id, _)) => Some(id),
            None => {
                warn!("{}: unable to create NextObj for {}", self.device_id, ns);
                None
            }
        }
    }

    /// Returns `true` if a hashed group exists for the neighbor set.
    pub fn has_next_objective_id(&self, ns: &NeighborSet) -> bool {
        self.store.neighbor_set_next_id(self.device_id, ns).is_some()
    }

    /// Check-then-create. Must be called with the group lock held. The returned flag is `true` if
    /// the group was created by this call.
    fn create_hashed_group_locked(
        &self,
        ns: &NeighborSet,
        meta: Option<Selector>,
    ) -> Option<(NextId, bool)> {
        if let Some(id) = self.store.neighbor_set_next_id(self.device_id, ns) {
            return Some((id, false));
        }
        let buckets = self.hashed_buckets(ns)?;
        if buckets.is_empty() {
            warn!("{}: no known port to any neighbor of {}", self.device_id, ns);
            return None;
        }
        let id = self.sink.allocate_next_id();
        let objective = NextObjective::new(id, NextKind::Hashed, NextOperation::Add)
            .with_treatments(buckets)
            .with_meta(meta)
            .with_context(self.create_context("createGroupFromNeighborSet"));
        self.store.put_neighbor_set(self.device_id, ns.clone(), id);
        debug!("{}: submitting hashed NextObj {} for {}", self.device_id, id, ns);
        self.sink.next(self.device_id, objective);
        Some((id, true))
    }

    /// Buckets of the neighbor set from the current adjacency: one bucket per port to every
    /// neighbor. Neighbors without any known port are skipped. Returns `None` if the MAC address
    /// of any neighbor is not configured.
    fn hashed_buckets(&self, ns: &NeighborSet) -> Option<Vec<Treatment>> {
        let mut buckets = Vec::new();
        for neighbor in ns.neighbors() {
            let mac = match self.config.device_mac(*neighbor) {
                Ok(mac) => mac,
                Err(e) => {
                    warn!("{} Aborting group creation for {} on {}", e, ns, self.device_id);
                    return None;
                }
            };
            let ports = self.adjacency.ports_to(*neighbor);
            if ports.is_empty() {
                warn!("{}: neighbor {} is not in the port map yet", self.device_id, neighbor);
                continue;
            }
            for port in ports {
                trace!("{}: bucket port/label {}/{:?}", self.device_id, port, ns.edge_label());
                buckets.push(self.neighbor_bucket(mac, port, ns.edge_label()));
            }
        }
        Some(buckets)
    }

    /// Bucket towards a neighbor: rewrite the MAC addresses, optionally push a label, and output
    /// on the port.
    pub(crate) fn neighbor_bucket(
        &self,
        neighbor_mac: MacAddress,
        port: PortNumber,
        label: Option<SegmentId>,
    ) -> Treatment {
        let mut builder = Treatment::builder().set_eth_dst(neighbor_mac).set_eth_src(self.node_mac);
        if let Some(label) = label {
            builder = builder.push_label(label);
        }
        builder.set_output(port).build()
    }

    /// A direct link from this device to a neighbor came up. The adjacency is always recorded. If
    /// the instance is master, every existing hashed group containing the neighbor gets a new
    /// bucket for the port, and if the neighbor was not known before, the groups of all neighbor
    /// subsets containing it are created. The adjacency update, the patch and the creation happen
    /// under the group lock, so no group is built from a half-applied event.
    pub fn link_up(&self, link: &Link, is_master: bool) {
        self.purge_failed();
        if link.link_type != LinkType::Direct {
            debug!("{}: ignoring {:?} link {:?}", self.device_id, link.link_type, link);
            return;
        }
        if link.src.device != self.device_id {
            warn!(
                "linkUp: device {} does not match with link source {}",
                self.device_id, link.src.device
            );
            return;
        }
        let neighbor = link.dst.device;
        let port = link.src.port;
        let _guard = self.group_lock.lock();
        let known = self.adjacency.neighbors();
        info!("{}: link up at local port {} to neighbor {}", self.device_id, port, neighbor);
        let change = self.adjacency.add_neighbor_at_port(neighbor, port);

        if !is_master || change == AdjacencyChange::Unchanged {
            return;
        }

        let mac = match self.config.device_mac(neighbor) {
            Ok(mac) => mac,
            Err(e) => {
                warn!("{} Aborting linkUp on {}", e, self.device_id);
                return;
            }
        };
        self.update_hashed_groups_locked(neighbor, mac, port, NextOperation::AddToExisting);

        if change == AdjacencyChange::NewNeighbor {
            let created = self.create_groups_locked(power_set_with(&known, neighbor));
            info!("{}: created {} groups for new neighbor {}", self.device_id, created, neighbor);
        }
    }

    /// A port of this device went down. If the instance is master, the bucket of the port is
    /// removed from every hashed group containing the neighbor behind it. The adjacency of the
    /// port is always removed.
    ///
    /// If the MAC address of the neighbor is not configured, the groups cannot be patched and keep
    /// the bucket of the dead port. [`GroupHandler::verify_groups`] corrects them later.
    pub fn port_down(&self, port: PortNumber, is_master: bool) {
        self.purge_failed();
        let _guard = self.group_lock.lock();
        let neighbor = match self.adjacency.neighbor_at(port) {
            Some(n) => n,
            None => {
                debug!("{}: port {} down, but it leads to no known neighbor", self.device_id, port);
                return;
            }
        };
        info!("{}: port {} down to neighbor {}", self.device_id, port, neighbor);
        if is_master {
            match self.config.device_mac(neighbor) {
                Ok(mac) => self.update_hashed_groups_locked(
                    neighbor,
                    mac,
                    port,
                    NextOperation::RemoveFromExisting,
                ),
                Err(e) => warn!(
                    "{} Aborting portDown on {}: groups keep the bucket of port {} until verified",
                    e, self.device_id, port
                ),
            }
        }
        self.adjacency.remove_port(port);
    }

    /// Add or remove the bucket of the port in every stored group containing the neighbor. The
    /// group id is preserved. Must be called with the group lock held.
    fn update_hashed_groups_locked(
        &self,
        neighbor: DeviceId,
        mac: MacAddress,
        port: PortNumber,
        op: NextOperation,
    ) {
        let groups: Vec<(NeighborSet, NextId)> = self
            .store
            .neighbor_sets_of(self.device_id)
            .into_iter()
            .filter(|(ns, _)| ns.contains(neighbor))
            .collect();
        for (ns, id) in groups {
            let bucket = self.neighbor_bucket(mac, port, ns.edge_label());
            info!(
                "{}: {:?} bucket with port {} (label {:?}) in NextObj {}",
                self.device_id, op, port, ns.edge_label(), id
            );
            let objective = NextObjective::new(id, NextKind::Hashed, op)
                .with_treatment(bucket)
                .with_context(log_context(self.device_id, "updateHashedGroup"));
            self.sink.next(self.device_id, objective);
        }
    }

    /// Verify every hashed group of the device: submit the full list of buckets expected from the
    /// current adjacency, such that the device can correct missing or stale buckets. Returns the
    /// number of submitted objectives. Does nothing if the instance is not master.
    pub fn verify_groups(&self, is_master: bool) -> usize {
        if !is_master {
            return 0;
        }
        self.purge_failed();
        let _guard = self.group_lock.lock();
        let mut verified = 0;
        for (ns, id) in self.store.neighbor_sets_of(self.device_id) {
            let buckets = match self.hashed_buckets(&ns) {
                Some(b) => b,
                None => continue,
            };
            trace!("{}: verify NextObj {} with {} buckets", self.device_id, id, buckets.len());
            let objective = NextObjective::new(id, NextKind::Hashed, NextOperation::Verify)
                .with_treatments(buckets)
                .with_meta(Some(Selector::vlan(INTERNAL_VLAN)))
                .with_context(log_context(self.device_id, "verifyGroup"));
            self.sink.next(self.device_id, objective);
            verified += 1;
        }
        verified
    }
}
