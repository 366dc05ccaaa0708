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

//! # Leaf-Spine Fabric

use super::{connect, router_mac, ExampleFabric};
use crate::device_config::{DeviceConfig, DeviceInfo};
use crate::topology::StaticLinkSource;
use crate::types::{DeviceId, PortNumber, Prefix};

/// # Leaf-Spine
///
/// Two spines and three leaves. Every leaf is connected to every spine. `leaf1` has a second link
/// to `spine1`.
///
/// ```text
///      spine1 (101)   spine2 (102)
///          |    \  /    |
///          |     \/     |      (full mesh)
///          |     /\     |
///   leaf1 (201)  leaf2 (202)  leaf3 (203)
/// ```
///
/// Ports:
/// - On a leaf, port `i` leads to spine `i`. `leaf1` uses port 3 for its second link to `spine1`.
/// - On a spine, port `i` leads to leaf `i`. `spine1` uses port 4 for the second link of `leaf1`.
/// - Access ports start at 10. The subnets are:
///   - `leaf1`: `10.0.1.0/24` on ports 10 and 11
///   - `leaf2`: `10.0.2.0/24` on port 10
///   - `leaf3`: `10.0.3.0/24` on ports 10, 11 and 12, and `10.0.4.0/24` on port 13
pub struct LeafSpine {}

impl LeafSpine {
    /// First spine
    pub const SPINE1: DeviceId = DeviceId(0x101);
    /// Second spine
    pub const SPINE2: DeviceId = DeviceId(0x102);
    /// First leaf
    pub const LEAF1: DeviceId = DeviceId(0x201);
    /// Second leaf
    pub const LEAF2: DeviceId = DeviceId(0x202);
    /// Third leaf
    pub const LEAF3: DeviceId = DeviceId(0x203);

    /// All spines
    pub fn spines() -> Vec<DeviceId> {
        vec![Self::SPINE1, Self::SPINE2]
    }

    /// All leaves
    pub fn leaves() -> Vec<DeviceId> {
        vec![Self::LEAF1, Self::LEAF2, Self::LEAF3]
    }
}

fn ports(ports: &[u32]) -> Vec<PortNumber> {
    ports.iter().copied().map(PortNumber).collect()
}

impl ExampleFabric for LeafSpine {
    fn config() -> DeviceConfig {
        let config = DeviceConfig::new()
            .with_device(Self::SPINE1, DeviceInfo::transit(101, router_mac(Self::SPINE1)))
            .with_device(Self::SPINE2, DeviceInfo::transit(102, router_mac(Self::SPINE2)));
        let net = |s: &str| -> Prefix { s.parse().unwrap() };
        config
            .with_device(
                Self::LEAF1,
                DeviceInfo::edge(201, router_mac(Self::LEAF1))
                    .with_subnet(net("10.0.1.0/24"), ports(&[10, 11])),
            )
            .with_device(
                Self::LEAF2,
                DeviceInfo::edge(202, router_mac(Self::LEAF2))
                    .with_subnet(net("10.0.2.0/24"), ports(&[10])),
            )
            .with_device(
                Self::LEAF3,
                DeviceInfo::edge(203, router_mac(Self::LEAF3))
                    .with_subnet(net("10.0.3.0/24"), ports(&[10, 11, 12]))
                    .with_subnet(net("10.0.4.0/24"), ports(&[13])),
            )
    }

    fn links() -> StaticLinkSource {
        let links = StaticLinkSource::new();
        for (i, leaf) in Self::leaves().into_iter().enumerate() {
            let leaf_port = i as u32 + 1;
            connect(&links, leaf, 1, Self::SPINE1, leaf_port);
            connect(&links, leaf, 2, Self::SPINE2, leaf_port);
        }
        connect(&links, Self::LEAF1, 3, Self::SPINE1, 4);
        links
    }
}
