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

//! JSON description of a fabric: device configuration, links, and events to replay.

use segroute::device_config::{DeviceConfig, DeviceInfo};
use segroute::topology::{StaticLinkSource, TopologyEvent};
use segroute::{ConnectPoint, DeviceId, Link, MacAddress, PortNumber, Prefix};

use serde::Deserialize;
use std::error::Error;
use std::fs::File;
use std::io::BufReader;

/// Fabric file
#[derive(Deserialize, Debug)]
pub struct FabricFile {
    pub devices: Vec<DeviceEntry>,
    /// Bidirectional links, as pairs of connect points (`of:0000000000000001/1`).
    #[serde(default)]
    pub links: Vec<(String, String)>,
    #[serde(default)]
    pub events: Vec<EventEntry>,
}

#[derive(Deserialize, Debug)]
pub struct DeviceEntry {
    pub id: String,
    pub mac: String,
    pub sid: u32,
    #[serde(default)]
    pub edge: bool,
    #[serde(default)]
    pub subnets: Vec<SubnetEntry>,
}

#[derive(Deserialize, Debug)]
pub struct SubnetEntry {
    pub prefix: String,
    pub ports: Vec<u32>,
}

/// Event to replay on the device it names, after all groups are created.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEntry {
    LinkUp { src: String, dst: String },
    PortDown { device: String, port: u32 },
    EdgePort { device: String, port: u32, subnet: String, up: bool },
    NeighborDown { device: String, neighbor: String },
}

/// Parsed fabric, ready to build the group handlers
pub struct Fabric {
    pub config: DeviceConfig,
    pub links: StaticLinkSource,
    pub events: Vec<(DeviceId, TopologyEvent)>,
}

impl Fabric {
    /// Read and parse the fabric file
    pub fn load(filename: &str) -> Result<Self, Box<dyn Error>> {
        let reader = BufReader::new(File::open(filename)?);
        let file: FabricFile = serde_json::from_reader(reader)?;
        Self::from_file(file)
    }

    /// Fabric without any events
    pub fn new(config: DeviceConfig, links: StaticLinkSource) -> Self {
        Self { config, links, events: Vec::new() }
    }

    fn from_file(file: FabricFile) -> Result<Self, Box<dyn Error>> {
        let config = DeviceConfig::new();
        for d in file.devices {
            let mac: MacAddress = d.mac.parse()?;
            let mut info = if d.edge {
                DeviceInfo::edge(d.sid, mac)
            } else {
                DeviceInfo::transit(d.sid, mac)
            };
            for s in d.subnets {
                let prefix: Prefix = s.prefix.parse()?;
                info = info.with_subnet(prefix, s.ports.into_iter().map(PortNumber).collect());
            }
            config.insert(d.id.parse()?, info);
        }

        let links = StaticLinkSource::new();
        for (a, b) in file.links {
            links.add_bidirectional(connect_point(&a)?, connect_point(&b)?);
        }

        let mut events = Vec::with_capacity(file.events.len());
        for e in file.events {
            events.push(match e {
                EventEntry::LinkUp { src, dst } => {
                    let link = Link::direct(connect_point(&src)?, connect_point(&dst)?);
                    (link.src.device, TopologyEvent::LinkUp(link))
                }
                EventEntry::PortDown { device, port } => {
                    (device.parse()?, TopologyEvent::PortDown(PortNumber(port)))
                }
                EventEntry::EdgePort { device, port, subnet, up } => (
                    device.parse()?,
                    TopologyEvent::EdgePort {
                        port: PortNumber(port),
                        subnet: subnet.parse()?,
                        port_up: up,
                    },
                ),
                EventEntry::NeighborDown { device, neighbor } => {
                    (device.parse()?, TopologyEvent::NeighborDown(neighbor.parse()?))
                }
            });
        }

        Ok(Self { config, links, events })
    }
}

/// Parse a connect point written as `device/port`
fn connect_point(s: &str) -> Result<ConnectPoint, Box<dyn Error>> {
    let mut parts = s.rsplitn(2, '/');
    let port = parts.next().ok_or_else(|| format!("invalid connect point: {}", s))?;
    let device = parts.next().ok_or_else(|| format!("invalid connect point: {}", s))?;
    Ok(ConnectPoint::new(device.parse()?, PortNumber(port.parse()?)))
}
