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

//! # Device Configuration
//!
//! The group handlers need a few attributes of every device in the fabric: its segment id, its
//! router MAC address, whether it is an edge (leaf) or transit (spine) device, and the subnets
//! configured on its access ports. These are provided through the [`DeviceProperties`] trait.
//! [`DeviceConfig`] is an in-memory implementation of it.

use crate::types::{DeviceId, MacAddress, PortNumber, Prefix, SegmentId};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// Error raised when a device has no (or incomplete) configuration.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum DeviceConfigError {
    /// The device is not configured at all
    #[error("Device configuration not found for {0}")]
    NotFound(DeviceId),
}

/// Provider of device attributes
pub trait DeviceProperties: Send + Sync {
    /// Segment id of the device
    fn segment_id(&self, device: DeviceId) -> Result<SegmentId, DeviceConfigError>;

    /// Router MAC address of the device
    fn device_mac(&self, device: DeviceId) -> Result<MacAddress, DeviceConfigError>;

    /// Returns `true` if the device is an edge device (with subnets and hosts attached)
    fn is_edge_device(&self, device: DeviceId) -> Result<bool, DeviceConfigError>;

    /// Segment ids of all configured devices, sorted.
    fn all_segment_ids(&self) -> Vec<SegmentId>;

    /// Subnets configured on the device, together with the ports on which they are configured.
    fn subnet_ports(
        &self,
        device: DeviceId,
    ) -> Result<HashMap<Prefix, Vec<PortNumber>>, DeviceConfigError>;
}

/// Configuration of a single device
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    /// Segment id
    pub segment_id: SegmentId,
    /// Router MAC address
    pub mac: MacAddress,
    /// Edge or transit role
    pub is_edge: bool,
    /// Subnets configured on access ports
    pub subnets: HashMap<Prefix, Vec<PortNumber>>,
}

impl DeviceInfo {
    /// Create the configuration of a transit device
    pub fn transit(segment_id: SegmentId, mac: MacAddress) -> Self {
        Self { segment_id, mac, is_edge: false, subnets: HashMap::new() }
    }

    /// Create the configuration of an edge device without any subnets
    pub fn edge(segment_id: SegmentId, mac: MacAddress) -> Self {
        Self { segment_id, mac, is_edge: true, subnets: HashMap::new() }
    }

    /// Add a subnet on the given access ports
    pub fn with_subnet(mut self, prefix: Prefix, ports: Vec<PortNumber>) -> Self {
        self.subnets.insert(prefix, ports);
        self
    }
}

/// In-memory device configuration. The configuration may be updated while handlers are running.
#[derive(Debug, Default)]
pub struct DeviceConfig {
    devices: RwLock<HashMap<DeviceId, DeviceInfo>>,
}

impl DeviceConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the configuration of a device. Returns the previous configuration.
    pub fn insert(&self, device: DeviceId, info: DeviceInfo) -> Option<DeviceInfo> {
        self.devices.write().insert(device, info)
    }

    /// Builder-style variant of [`DeviceConfig::insert`]
    pub fn with_device(self, device: DeviceId, info: DeviceInfo) -> Self {
        self.insert(device, info);
        self
    }

    /// All configured devices, sorted.
    pub fn devices(&self) -> Vec<DeviceId> {
        let mut devices: Vec<DeviceId> = self.devices.read().keys().copied().collect();
        devices.sort();
        devices
    }

    fn lookup<T, F: FnOnce(&DeviceInfo) -> T>(
        &self,
        device: DeviceId,
        f: F,
    ) -> Result<T, DeviceConfigError> {
        self.devices.read().get(&device).map(f).ok_or(DeviceConfigError::NotFound(device))
    }
}

impl DeviceProperties for DeviceConfig {
    fn segment_id(&self, device: DeviceId) -> Result<SegmentId, DeviceConfigError> {
        self.lookup(device, |d| d.segment_id)
    }

    fn device_mac(&self, device: DeviceId) -> Result<MacAddress, DeviceConfigError> {
        self.lookup(device, |d| d.mac)
    }

    fn is_edge_device(&self, device: DeviceId) -> Result<bool, DeviceConfigError> {
        self.lookup(device, |d| d.is_edge)
    }

    fn all_segment_ids(&self) -> Vec<SegmentId> {
        self.devices
            .read()
            .values()
            .map(|d| d.segment_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn subnet_ports(
        &self,
        device: DeviceId,
    ) -> Result<HashMap<Prefix, Vec<PortNumber>>, DeviceConfigError> {
        self.lookup(device, |d| d.subnets.clone())
    }
}
