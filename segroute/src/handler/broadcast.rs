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

//! Broadcast groups, keyed by subnet.

use super::GroupHandler;
use crate::objective::{log_context, NextKind, NextObjective, NextOperation};
use crate::treatment::{Selector, Treatment};
use crate::types::{NextId, PortNumber, Prefix, INTERNAL_VLAN};

use log::*;

impl GroupHandler {
    /// An access port in a subnet went up or down. If the subnet has a broadcast group, the bucket
    /// of the port is added or removed. If there is none and the port comes up, a new broadcast
    /// group containing only this port is created. Does nothing if the device does not handle
    /// edge ports, or if the instance is not master.
    pub fn process_edge_port(
        &self,
        port: PortNumber,
        subnet: Prefix,
        port_up: bool,
        is_master: bool,
    ) {
        if !self.policy.handles_edge_ports() {
            debug!("{}: ignoring edge port {} on a transit device", self.device_id, port);
            return;
        }
        if !is_master {
            return;
        }
        self.purge_failed();
        let _guard = self.group_lock.lock();
        let id = match self.store.subnet_next_id(self.device_id, subnet) {
            Some(id) => id,
            None if port_up => {
                debug!(
                    "{}: creating flooding group for the first port {} in {}",
                    self.device_id, port, subnet
                );
                self.create_bcast_group_locked(subnet, &[port]);
                return;
            }
            None => {
                warn!(
                    "{}: no flooding group for subnet {} when removing port {}",
                    self.device_id, subnet, port
                );
                return;
            }
        };
        let op = if port_up {
            NextOperation::AddToExisting
        } else {
            NextOperation::RemoveFromExisting
        };
        info!(
            "{}: port {} {}, {:?} bucket in NextObj {}",
            self.device_id,
            port,
            if port_up { "up" } else { "down" },
            op,
            id
        );
        let objective = NextObjective::new(id, NextKind::Broadcast, op)
            .with_treatment(flood_bucket(port))
            .with_meta(Some(Selector::vlan(INTERNAL_VLAN)))
            .with_context(log_context(self.device_id, "processEdgePort"));
        self.sink.next(self.device_id, objective);
    }

    /// Get the broadcast group of the subnet. This never creates a group. Broadcast groups are
    /// created by [`GroupHandler::create_groups_from_subnet_config`], which must be called again
    /// whenever the subnet configuration changes.
    pub fn subnet_next_objective_id(&self, prefix: Prefix) -> Option<NextId> {
        self.purge_failed();
        self.store.subnet_next_id(self.device_id, prefix)
    }

    /// Create a broadcast group for every subnet configured on the device. Existing groups are
    /// left untouched. Returns the number of newly created groups.
    pub fn create_groups_from_subnet_config(&self) -> usize {
        if !self.policy.handles_edge_ports() {
            return 0;
        }
        self.purge_failed();
        let subnets = match self.config.subnet_ports(self.device_id) {
            Ok(s) => s,
            Err(e) => {
                warn!("{} Aborting subnet group creation on {}", e, self.device_id);
                return 0;
            }
        };
        let mut subnets: Vec<(Prefix, Vec<PortNumber>)> = subnets.into_iter().collect();
        subnets.sort_by_key(|(prefix, _)| (prefix.ip(), prefix.prefix()));
        let _guard = self.group_lock.lock();
        let mut created = 0;
        for (prefix, ports) in subnets {
            if self.store.contains_subnet(self.device_id, prefix) {
                continue;
            }
            if self.create_bcast_group_locked(prefix, &ports).is_some() {
                created += 1;
            }
        }
        created
    }

    /// Create the broadcast group of the subnet on the given ports, if it does not exist yet.
    /// Returns the group id, or `None` if `ports` is empty.
    pub fn create_bcast_group_from_subnet(
        &self,
        prefix: Prefix,
        ports: &[PortNumber],
    ) -> Option<NextId> {
        self.purge_failed();
        let _guard = self.group_lock.lock();
        self.create_bcast_group_locked(prefix, ports)
    }

    fn create_bcast_group_locked(&self, prefix: Prefix, ports: &[PortNumber]) -> Option<NextId> {
        if let Some(id) = self.store.subnet_next_id(self.device_id, prefix) {
            debug!("{}: flooding group {} for {} already exists", self.device_id, id, prefix);
            return Some(id);
        }
        if ports.is_empty() {
            warn!("{}: cannot create flooding group for {} without ports", self.device_id, prefix);
            return None;
        }
        let id = self.sink.allocate_next_id();
        let objective = NextObjective::new(id, NextKind::Broadcast, NextOperation::Add)
            .with_treatments(ports.iter().map(|p| flood_bucket(*p)))
            .with_meta(Some(Selector::vlan(INTERNAL_VLAN)))
            .with_context(self.create_context("createBcastGroupFromSubnet"));
        self.store.put_subnet(self.device_id, prefix, id);
        info!("{}: submitting flooding NextObj {} for {}", self.device_id, id, prefix);
        self.sink.next(self.device_id, objective);
        Some(id)
    }

    /// Remove the broadcast group of the subnet. Returns `false` if there is none.
    pub fn remove_bcast_group_from_subnet(&self, prefix: Prefix) -> bool {
        self.purge_failed();
        let _guard = self.group_lock.lock();
        let id = match self.store.remove_subnet(self.device_id, prefix) {
            Some(id) => id,
            None => return false,
        };
        let objective = NextObjective::new(id, NextKind::Broadcast, NextOperation::Remove)
            .with_meta(Some(Selector::vlan(INTERNAL_VLAN)))
            .with_context(log_context(self.device_id, "removeBcastGroupFromSubnet"));
        info!("{}: removing flooding NextObj {} for {}", self.device_id, id, prefix);
        self.sink.next(self.device_id, objective);
        true
    }
}

/// Flooding bucket: remove the internal tag and output on the access port.
fn flood_bucket(port: PortNumber) -> Treatment {
    Treatment::builder().pop_vlan().set_output(port).build()
}
