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

//! Module containing all basic type definitions

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Device Identification. Devices are referred to by their datapath id, and printed in the
/// `of:0000000000000001` notation.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct DeviceId(pub u64);

impl From<u64> for DeviceId {
    fn from(x: u64) -> Self {
        Self(x)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "of:{:016x}", self.0)
    }
}

impl FromStr for DeviceId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix("of:").unwrap_or(s);
        u64::from_str_radix(hex, 16)
            .map(Self)
            .map_err(|_| ParseError::InvalidDeviceId(s.to_string()))
    }
}

/// Port number on a device
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct PortNumber(pub u32);

impl From<u32> for PortNumber {
    fn from(x: u32) -> Self {
        Self(x)
    }
}

impl fmt::Display for PortNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ethernet MAC address
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct MacAddress(pub [u8; 6]);

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", b[0], b[1], b[2], b[3], b[4], b[5])
    }
}

impl FromStr for MacAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 6];
        let mut parts = s.split(':');
        for byte in bytes.iter_mut() {
            *byte = parts
                .next()
                .and_then(|p| u8::from_str_radix(p, 16).ok())
                .ok_or_else(|| ParseError::InvalidMacAddress(s.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(ParseError::InvalidMacAddress(s.to_string()));
        }
        Ok(Self(bytes))
    }
}

/// IP Prefix of a subnet configured on the access ports of an edge device.
pub type Prefix = ipnetwork::IpNetwork;

/// Segment ID (node SID) of a device. Segment ids are pushed as MPLS labels.
pub type SegmentId = u32;

/// VLAN Identifier
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct VlanId(pub u16);

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vlan{}", self.0)
    }
}

/// Internal VLAN, used as metadata for hashed groups towards other routers. There is no subnet
/// assigned on those ports.
pub const INTERNAL_VLAN: VlanId = VlanId(4094);

/// Identifier of a next objective (a forwarding group). It is allocated by the objective sink.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct NextId(pub u32);

impl fmt::Display for NextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A port on a specific device.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct ConnectPoint {
    /// Device
    pub device: DeviceId,
    /// Port on the device
    pub port: PortNumber,
}

impl ConnectPoint {
    /// Create a new connect point
    pub fn new(device: DeviceId, port: PortNumber) -> Self {
        Self { device, port }
    }
}

impl fmt::Display for ConnectPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.device, self.port)
    }
}

/// Type of an infrastructure link. Only `Direct` links are used to build groups.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum LinkType {
    /// Physical adjacency between two devices
    Direct,
    /// Link traversing a non-controlled network segment
    Indirect,
    /// Link to an end-station
    Edge,
    /// Virtual link (tunnel)
    Tunnel,
    /// Optical link
    Optical,
}

/// Unidirectional infrastructure link
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub struct Link {
    /// Source of the link (port on the local device)
    pub src: ConnectPoint,
    /// Destination of the link (port on the neighbor device)
    pub dst: ConnectPoint,
    /// Link type
    pub link_type: LinkType,
}

impl Link {
    /// Create a new `Direct` link
    pub fn direct(src: ConnectPoint, dst: ConnectPoint) -> Self {
        Self { src, dst, link_type: LinkType::Direct }
    }

    /// Return the same link in the opposite direction
    pub fn reversed(&self) -> Self {
        Self { src: self.dst, dst: self.src, link_type: self.link_type }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src, self.dst)
    }
}

/// Errors while parsing identifiers from strings
#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    /// The device id is not a (possibly `of:` prefixed) hex number
    #[error("Invalid device id: {0}")]
    InvalidDeviceId(String),
    /// The mac address is not in the `aa:bb:cc:dd:ee:ff` format
    #[error("Invalid mac address: {0}")]
    InvalidMacAddress(String),
}
