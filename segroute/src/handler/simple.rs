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

//! Simple groups, keyed by port and treatment.

use super::GroupHandler;
use crate::objective::{log_context, NextKind, NextObjective, NextOperation};
use crate::treatment::{Selector, Treatment};
use crate::types::{NextId, PortNumber};

use log::*;

impl GroupHandler {
    /// Get the simple group sending packets out of `port` after applying `treatment`, creating it
    /// first if it does not exist. The output action is appended to `treatment` by the handler.
    /// Different treatments to the same port are different groups.
    pub fn port_next_objective_id(
        &self,
        port: PortNumber,
        treatment: &Treatment,
        meta: Option<Selector>,
    ) -> Option<NextId> {
        self.purge_failed();
        if let Some(id) = self.store.port_next_id(self.device_id, port, treatment) {
            return Some(id);
        }
        debug!("{}: NextObj not found for port {} {}, creating", self.device_id, port, treatment);
        let _guard = self.group_lock.lock();
        if let Some(id) = self.store.port_next_id(self.device_id, port, treatment) {
            return Some(id);
        }
        let id = self.sink.allocate_next_id();
        let objective = NextObjective::new(id, NextKind::Simple, NextOperation::Add)
            .with_treatment(treatment.to_builder().set_output(port).build())
            .with_meta(meta)
            .with_context(self.create_context("createGroupFromPort"));
        self.store.put_port(self.device_id, port, treatment.clone(), id);
        debug!("{}: submitting simple NextObj {} for port {}", self.device_id, id, port);
        self.sink.next(self.device_id, objective);
        Some(id)
    }

    /// Remove the simple group of the port and treatment. Returns `false` if there is none.
    pub fn remove_group_from_port(&self, port: PortNumber, treatment: &Treatment) -> bool {
        self.purge_failed();
        let _guard = self.group_lock.lock();
        let id = match self.store.remove_port(self.device_id, port, treatment) {
            Some(id) => id,
            None => return false,
        };
        let objective = NextObjective::new(id, NextKind::Simple, NextOperation::Remove)
            .with_treatment(treatment.to_builder().set_output(port).build())
            .with_context(log_context(self.device_id, "removeGroupFromPort"));
        info!("{}: removing simple NextObj {} for port {}", self.device_id, id, port);
        self.sink.next(self.device_id, objective);
        true
    }
}
