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

//! Keys of the next objective store. All keys contain the device on which the group is created,
//! such that the same store can be shared by the group handlers of all devices.

use crate::neighbor_set::NeighborSet;
use crate::treatment::Treatment;
use crate::types::{DeviceId, PortNumber, Prefix};
use std::fmt;

/// Key of a hashed group: device and neighbor set
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub struct NeighborSetKey {
    /// Device on which the group exists
    pub device: DeviceId,
    /// Neighbor set (including the edge label)
    pub neighbor_set: NeighborSet,
}

impl NeighborSetKey {
    /// Create a new key
    pub fn new(device: DeviceId, neighbor_set: NeighborSet) -> Self {
        Self { device, neighbor_set }
    }
}

impl fmt::Display for NeighborSetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.device, self.neighbor_set)
    }
}

/// Key of a broadcast group: device and subnet
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub struct SubnetKey {
    /// Device on which the group exists
    pub device: DeviceId,
    /// Subnet prefix
    pub prefix: Prefix,
}

impl SubnetKey {
    /// Create a new key
    pub fn new(device: DeviceId, prefix: Prefix) -> Self {
        Self { device, prefix }
    }
}

impl fmt::Display for SubnetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.device, self.prefix)
    }
}

/// Key of a simple group: device, port and treatment. Different treatments to the same port are
/// different groups.
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub struct PortKey {
    /// Device on which the group exists
    pub device: DeviceId,
    /// Output port
    pub port: PortNumber,
    /// Treatment of the single bucket
    pub treatment: Treatment,
}

impl PortKey {
    /// Create a new key
    pub fn new(device: DeviceId, port: PortNumber, treatment: Treatment) -> Self {
        Self { device, port, treatment }
    }
}

impl fmt::Display for PortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} {}", self.device, self.port, self.treatment)
    }
}
