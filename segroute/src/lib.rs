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

#![deny(missing_docs)]

//! # SegRoute: ECMP and Label-Push Groups for Segment Routing
//! This is a library for synthesizing and maintaining the forwarding groups of the switches in a
//! segment routing fabric. For every device, it computes the next-hop groups needed to reach every
//! combination of directly connected neighbors, to flood on the ports of configured subnets, and to
//! forward on single ports, and keeps them consistent while links and ports go up and down.
//!
//! ## Structure
//!
//! This library is structured in the following way:
//!
//! - **[`NeighborSet`](neighbor_set::NeighborSet)**: Key of a hashed (ECMP) group: a set of
//!   neighbors and an optional edge label.
//!
//! - **[`PowerSet`](power_set)**: Enumeration of all non-empty subsets of the neighbors of a
//!   device, or of the subsets containing a newly discovered neighbor.
//!
//! - **[`LabelPairing`](label_pairing)**: Policies deciding which labels are paired with which
//!   subset of neighbors. Edge and transit devices use different policies.
//!
//! - **[`Store`](store)**: The [`NextObjectiveStore`](store::NextObjectiveStore), remembering
//!   which group was created for which key. It is backed by three eventually consistent maps.
//!
//! - **[`GroupHandler`](handler::GroupHandler)**: Builds the groups of a device and reacts to
//!   [topology events](topology::TopologyEvent), creating new groups or patching existing ones.
//!   All requests are submitted as [`NextObjectives`](objective::NextObjective) to an
//!   [`ObjectiveSink`](objective::ObjectiveSink).
//!
//! - **[`PolicyGroupHandler`](policy::PolicyGroupHandler)**: Builds chains of groups for pushing
//!   multiple labels, and tears them down in dependency order.
//!
//! - **[`ExampleFabrics`](example_networks)**: Collection of prepared fabrics.
//!
//! ## Usage
//!
//! ```
//! use segroute::example_networks::*;
//! use segroute::handler::GroupHandler;
//! use segroute::neighbor_set::NeighborSet;
//! use segroute::objective::{NextObjective, ObjectiveSink};
//! use segroute::store::NextObjectiveStore;
//! use segroute::{DeviceId, Error, NextId};
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//!
//! /// Sink accepting every objective
//! #[derive(Default)]
//! struct AcceptAll(AtomicU32);
//!
//! impl ObjectiveSink for AcceptAll {
//!     fn allocate_next_id(&self) -> NextId {
//!         NextId(self.0.fetch_add(1, Ordering::SeqCst))
//!     }
//!     fn next(&self, _device: DeviceId, mut objective: NextObjective) {
//!         objective.complete(Ok(()))
//!     }
//! }
//!
//! fn main() -> Result<(), Error> {
//!     let config = Arc::new(TwoNeighbors::config());
//!     let links = TwoNeighbors::links();
//!     let sink = Arc::new(AcceptAll::default());
//!     let store = NextObjectiveStore::in_memory();
//!
//!     let handler = GroupHandler::new(TwoNeighbors::D, config, &links, sink, store)?;
//!     handler.create_groups();
//!
//!     let ns = NeighborSet::new(vec![TwoNeighbors::A, TwoNeighbors::B], None);
//!     assert!(handler.next_objective_id(&ns, None).is_some());
//!     Ok(())
//! }
//! ```

pub mod adjacency;
pub mod device_config;
mod error;
pub mod example_networks;
pub mod handler;
pub mod label_pairing;
pub mod neighbor_set;
pub mod objective;
pub mod policy;
pub mod power_set;
pub mod store;
pub mod topology;
pub mod treatment;
mod types;

pub use error::Error;
pub use types::*;

mod test;
