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

//! Module for the link source and the topology events handled by the group handlers.

use crate::types::{ConnectPoint, DeviceId, Link, PortNumber, Prefix};
use parking_lot::RwLock;
use std::collections::HashSet;

/// Source of infrastructure links. It is used to get the initial snapshot of egress links when a
/// group handler is created.
pub trait LinkSource: Send + Sync {
    /// All links with source on the given device.
    fn egress_links(&self, device: DeviceId) -> Vec<Link>;
}

/// Link source backed by a static set of links. Links can be added and removed at runtime.
#[derive(Debug, Default)]
pub struct StaticLinkSource {
    links: RwLock<HashSet<Link>>,
}

impl StaticLinkSource {
    /// Create an empty link source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single unidirectional link
    pub fn add_link(&self, link: Link) {
        self.links.write().insert(link);
    }

    /// Add a direct link in both directions
    pub fn add_bidirectional(&self, a: ConnectPoint, b: ConnectPoint) {
        let link = Link::direct(a, b);
        let mut links = self.links.write();
        links.insert(link);
        links.insert(link.reversed());
    }

    /// All links in the source
    pub fn links(&self) -> Vec<Link> {
        self.links.read().iter().copied().collect()
    }
}

impl LinkSource for StaticLinkSource {
    fn egress_links(&self, device: DeviceId) -> Vec<Link> {
        let mut links: Vec<Link> =
            self.links.read().iter().filter(|l| l.src.device == device).copied().collect();
        links.sort_by_key(|l| (l.src, l.dst));
        links
    }
}

/// Event to handle by the group handler of a device.
#[derive(Debug, Clone, PartialEq)]
pub enum TopologyEvent {
    /// A link from the device to a neighbor came up.
    LinkUp(Link),
    /// A port of the device went down.
    PortDown(PortNumber),
    /// An access port in a subnet went up (`port_up = true`) or down.
    EdgePort {
        /// Port on the device
        port: PortNumber,
        /// Subnet configured on the port
        subnet: Prefix,
        /// New state of the port
        port_up: bool,
    },
    /// A neighbor device disappeared.
    NeighborDown(DeviceId),
}
