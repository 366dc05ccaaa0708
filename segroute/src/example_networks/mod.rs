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

//! Fabrics for testing

use crate::device_config::DeviceConfig;
use crate::topology::StaticLinkSource;
use crate::types::{ConnectPoint, DeviceId, MacAddress, PortNumber};

mod leaf_spine;
pub use leaf_spine::LeafSpine;

mod two_neighbors;
pub use two_neighbors::TwoNeighbors;

/// Trait for easier access to example fabrics.
pub trait ExampleFabric {
    /// Get the configuration of all devices in the fabric
    fn config() -> DeviceConfig;
    /// Get the direct links of the fabric, in both directions
    fn links() -> StaticLinkSource;
}

/// Names of all example fabrics, as accepted by [`by_name`].
pub const NAMES: [&str; 2] = ["leaf-spine", "two-neighbors"];

/// Get the configuration and the links of an example fabric by its name.
pub fn by_name(name: &str) -> Option<(DeviceConfig, StaticLinkSource)> {
    match name {
        "leaf-spine" => Some((LeafSpine::config(), LeafSpine::links())),
        "two-neighbors" => Some((TwoNeighbors::config(), TwoNeighbors::links())),
        _ => None,
    }
}

/// Locally administered router MAC address derived from the device id.
pub fn router_mac(device: DeviceId) -> MacAddress {
    let b = device.0.to_be_bytes();
    MacAddress([0x02, b[3], b[4], b[5], b[6], b[7]])
}

/// Connect `a:pa` with `b:pb` in both directions.
fn connect(links: &StaticLinkSource, a: DeviceId, pa: u32, b: DeviceId, pb: u32) {
    links.add_bidirectional(
        ConnectPoint::new(a, PortNumber(pa)),
        ConnectPoint::new(b, PortNumber(pb)),
    );
}
