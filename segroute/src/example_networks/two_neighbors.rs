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

//! # Two Neighbors

use super::{connect, router_mac, ExampleFabric};
use crate::device_config::{DeviceConfig, DeviceInfo};
use crate::topology::StaticLinkSource;
use crate::types::DeviceId;

/// # Two Neighbors
///
/// Transit device `D` (segment id 100) with two neighbors: the edge device `A` (101) and the
/// transit device `B` (102).
///
/// ```text
///   A ---(1)--- D ---(2)--- B
/// ```
///
/// Port `i` of `D` leads to its `i`-th neighbor, and both neighbors reach `D` on their port 1.
pub struct TwoNeighbors {}

impl TwoNeighbors {
    /// The device in the middle
    pub const D: DeviceId = DeviceId(1);
    /// Edge neighbor
    pub const A: DeviceId = DeviceId(2);
    /// Transit neighbor
    pub const B: DeviceId = DeviceId(3);
}

impl ExampleFabric for TwoNeighbors {
    fn config() -> DeviceConfig {
        DeviceConfig::new()
            .with_device(Self::D, DeviceInfo::transit(100, router_mac(Self::D)))
            .with_device(Self::A, DeviceInfo::edge(101, router_mac(Self::A)))
            .with_device(Self::B, DeviceInfo::transit(102, router_mac(Self::B)))
    }

    fn links() -> StaticLinkSource {
        let links = StaticLinkSource::new();
        connect(&links, Self::D, 1, Self::A, 1);
        connect(&links, Self::D, 2, Self::B, 1);
        links
    }
}
