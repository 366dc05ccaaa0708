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

//! Module containing all error types

use crate::device_config::DeviceConfigError;
use crate::types::{DeviceId, ParseError, PortNumber};
use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    /// Error propagated from the device configuration
    #[error("Device Configuration Error: {0}")]
    DeviceConfigError(#[from] DeviceConfigError),
    /// An identifier could not be parsed
    #[error("Parse Error: {0}")]
    ParseError(#[from] ParseError),
    /// The device has no group handler
    #[error("No group handler for device {0}")]
    NoHandler(DeviceId),
    /// A policy group chain contains a port that does not lead to any known neighbor
    #[error("Port {1} on {0} does not lead to any known neighbor")]
    UnknownAdjacency(DeviceId, PortNumber),
    /// A policy group chain was requested without any input
    #[error("Policy group chain {0} has no inputs")]
    EmptyPolicyChain(String),
}
