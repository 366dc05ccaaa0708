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

//! # Next Objectives
//!
//! A [`NextObjective`] is a request to install, patch, verify or remove a forwarding group on a
//! device. Objectives are submitted to an [`ObjectiveSink`], which programs the device
//! asynchronously, and reports the outcome by calling the [`ObjectiveContext`] attached to the
//! objective. The engine never waits for this to happen.

use crate::treatment::{Selector, Treatment};
use crate::types::{DeviceId, NextId};
use std::fmt;
use thiserror::Error;

/// Kind of forwarding group
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum NextKind {
    /// ECMP group. One bucket is chosen for every flow by hashing.
    Hashed,
    /// Flooding group. Packets are replicated to every bucket.
    Broadcast,
    /// Group with a single bucket.
    Simple,
}

/// Operation requested on the group
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum NextOperation {
    /// Create a new group with the given buckets
    Add,
    /// Add the buckets to an existing group
    AddToExisting,
    /// Remove the buckets from an existing group
    RemoveFromExisting,
    /// Remove the group entirely
    Remove,
    /// Make the group on the device contain exactly the given buckets
    Verify,
}

/// Error codes reported by the objective sink
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum ObjectiveErrorCode {
    /// The group could not be installed
    GroupInstallationFailed,
    /// The group could not be removed
    GroupRemovalFailed,
    /// The group to modify does not exist on the device
    GroupMissing,
    /// The device is not known to the sink
    DeviceMissing,
    /// The objective is malformed
    BadParams,
    /// The operation is not supported by the device pipeline
    Unsupported,
}

/// Failure of an objective, reported asynchronously.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{code:?}: {message}")]
pub struct ObjectiveError {
    /// Error code
    pub code: ObjectiveErrorCode,
    /// Human readable message
    pub message: String,
}

impl ObjectiveError {
    /// Create a new objective error
    pub fn new<S: Into<String>>(code: ObjectiveErrorCode, message: S) -> Self {
        Self { code, message: message.into() }
    }
}

/// Completion callback of an objective. It is called exactly once, possibly from a different
/// thread and after [`ObjectiveSink::next`] has returned.
pub type ObjectiveContext = Box<dyn FnOnce(NextId, Result<(), ObjectiveError>) + Send + 'static>;

/// Request to install, patch, verify or remove a group.
pub struct NextObjective {
    /// Identifier of the group
    pub id: NextId,
    /// Kind of group
    pub kind: NextKind,
    /// Requested operation
    pub op: NextOperation,
    /// Buckets (for `Remove`, this may be empty)
    pub treatments: Vec<Treatment>,
    /// Optional metadata for the driver
    pub meta: Option<Selector>,
    /// Completion callback
    pub context: Option<ObjectiveContext>,
}

impl fmt::Debug for NextObjective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NextObjective")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("op", &self.op)
            .field("treatments", &self.treatments)
            .field("meta", &self.meta)
            .field("context", &self.context.is_some())
            .finish()
    }
}

impl NextObjective {
    /// Create a new objective without buckets and without context
    pub fn new(id: NextId, kind: NextKind, op: NextOperation) -> Self {
        Self { id, kind, op, treatments: Vec::new(), meta: None, context: None }
    }

    /// Add a bucket
    pub fn with_treatment(mut self, treatment: Treatment) -> Self {
        self.treatments.push(treatment);
        self
    }

    /// Add multiple buckets
    pub fn with_treatments<I: IntoIterator<Item = Treatment>>(mut self, treatments: I) -> Self {
        self.treatments.extend(treatments);
        self
    }

    /// Set the metadata
    pub fn with_meta(mut self, meta: Option<Selector>) -> Self {
        self.meta = meta;
        self
    }

    /// Set the completion context
    pub fn with_context<F>(mut self, context: F) -> Self
    where
        F: FnOnce(NextId, Result<(), ObjectiveError>) + Send + 'static,
    {
        self.context = Some(Box::new(context));
        self
    }

    /// Consume the context and call it with the result. Does nothing if the context was already
    /// taken.
    pub fn complete(&mut self, result: Result<(), ObjectiveError>) {
        if let Some(context) = self.context.take() {
            context(self.id, result)
        }
    }
}

/// Sink programming the forwarding state on the devices.
pub trait ObjectiveSink: Send + Sync {
    /// Allocate a fresh, unused group identifier.
    fn allocate_next_id(&self) -> NextId;

    /// Submit the objective for the device. This function must not block on the device. The
    /// outcome is reported through the context of the objective.
    fn next(&self, device: DeviceId, objective: NextObjective);
}

/// Build the standard logging context for an objective, used by all group handlers.
pub(crate) fn log_context(
    device: DeviceId,
    what: &'static str,
) -> impl FnOnce(NextId, Result<(), ObjectiveError>) + Send + 'static {
    move |id, result| match result {
        Ok(()) => log::debug!("{} succeeded for NextObj {} on {}", what, id, device),
        Err(e) => log::warn!("{} failed for NextObj {} on {}: {}", what, id, device, e),
    }
}
