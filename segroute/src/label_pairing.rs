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

//! # Label Pairing
//!
//! Every subset of neighbors can be used to reach different destinations. For destinations which
//! are not directly connected, the device pushes the segment id of the destination as edge label.
//! A [`LabelPairingPolicy`] decides which labels are paired with a given subset of neighbors, and
//! thus, which hashed groups are generated.
//!
//! - [`EdgePairing`]: Policy of edge devices. Every subset is paired with every label, except with
//!   the labels owned by the neighbors in the subset itself.
//! - [`TransitPairing`]: Policy of transit devices. Same as `EdgePairing`, but subsets of two or
//!   more neighbors which are all edge devices are not paired at all, since traffic between two
//!   edge devices never needs to be hashed over both of them at a transit device.

use crate::device_config::{DeviceConfigError, DeviceProperties};
use crate::types::{DeviceId, SegmentId};
use log::*;
use std::collections::BTreeSet;
use std::fmt;

/// Strategy deciding which labels are paired with a subset of neighbors. The first element of
/// the returned vector is always `None` (no label), unless the subset is dropped entirely, in which
/// case the returned vector is empty. A subset is also dropped if the configuration of the device
/// or of any neighbor in the subset is missing.
pub trait LabelPairingPolicy: Send + Sync + fmt::Debug {
    /// Compute the labels to pair with `neighbors`, for the device `device`.
    fn pair_labels(
        &self,
        device: DeviceId,
        neighbors: &BTreeSet<DeviceId>,
        config: &dyn DeviceProperties,
    ) -> Vec<Option<SegmentId>>;

    /// Whether the device reacts on access ports (subnet ports)
    fn handles_edge_ports(&self) -> bool;
}

/// Pairs `None` and all segment ids other than the one of `device` and the ones owned by any
/// neighbor in the set. If the segment id of a neighbor cannot be found, the error is returned.
fn pair_without_self(
    device: DeviceId,
    neighbors: &BTreeSet<DeviceId>,
    config: &dyn DeviceProperties,
) -> Result<Vec<Option<SegmentId>>, DeviceConfigError> {
    let own = config.segment_id(device)?;
    let neighbor_sids = neighbors
        .iter()
        .map(|n| config.segment_id(*n))
        .collect::<Result<BTreeSet<SegmentId>, _>>()?;
    let mut labels = vec![None];
    labels.extend(
        config
            .all_segment_ids()
            .into_iter()
            .filter(|sid| *sid != own && !neighbor_sids.contains(sid))
            .map(Some),
    );
    Ok(labels)
}

/// Label pairing of edge devices
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgePairing;

impl LabelPairingPolicy for EdgePairing {
    fn pair_labels(
        &self,
        device: DeviceId,
        neighbors: &BTreeSet<DeviceId>,
        config: &dyn DeviceProperties,
    ) -> Vec<Option<SegmentId>> {
        match pair_without_self(device, neighbors, config) {
            Ok(labels) => labels,
            Err(e) => {
                warn!("{} Skipping neighbor subset {:?} on {}", e, neighbors, device);
                Vec::new()
            }
        }
    }

    fn handles_edge_ports(&self) -> bool {
        true
    }
}

/// Label pairing of transit devices
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitPairing;

impl LabelPairingPolicy for TransitPairing {
    fn pair_labels(
        &self,
        device: DeviceId,
        neighbors: &BTreeSet<DeviceId>,
        config: &dyn DeviceProperties,
    ) -> Vec<Option<SegmentId>> {
        if neighbors.len() >= 2 {
            let all_edge = neighbors.iter().all(|n| match config.is_edge_device(*n) {
                Ok(is_edge) => is_edge,
                Err(e) => {
                    warn!("{} Treating {} as transit device", e, n);
                    false
                }
            });
            if all_edge {
                trace!("{}: dropping neighbor subset {:?} of only edge devices", device, neighbors);
                return Vec::new();
            }
        }
        match pair_without_self(device, neighbors, config) {
            Ok(labels) => labels,
            Err(e) => {
                warn!("{} Skipping neighbor subset {:?} on {}", e, neighbors, device);
                Vec::new()
            }
        }
    }

    fn handles_edge_ports(&self) -> bool {
        false
    }
}

/// Select the pairing policy matching the role of the device.
pub fn policy_for_role(is_edge: bool) -> Box<dyn LabelPairingPolicy> {
    if is_edge {
        Box::new(EdgePairing)
    } else {
        Box::new(TransitPairing)
    }
}
