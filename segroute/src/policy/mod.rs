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

//! # Policy Group Chains
//!
//! When a flow requires pushing more than one label, a single group cannot do it. Instead, a chain
//! of groups is built, where every group pushes one label and forwards to the next group in the
//! chain. The last group of the chain outputs the packet on a physical port.
//!
//! For each input port with the label stack `[l0, l1, ..., ln]`, the chain looks like this:
//!
//! ```text
//! top-level group  --push ln-->  group(l(n-1))  --> ... -->  group(l0)  --push l0-->  port
//! ```
//!
//! The group pushing `l0` is the innermost group. It targets the port directly and is installed
//! first. Every other group targets the group built in the previous step, and depends on it: it
//! is only installed once the inner group is installed on the device. The top-level group is a
//! hashed group containing one bucket per input port.
//!
//! Groups are identified by a [`PolicyGroupIdentifier`], whose equality is structural: two
//! identifiers with the same inputs and buckets denote the same group, even when they were
//! generated for different chains.

mod handler;

pub use handler::PolicyGroupHandler;

use crate::types::{PortNumber, SegmentId};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Input of a policy group chain: a set of ports, and the label stack to push on packets sent out
/// of any of them. The first label of the stack is pushed last.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone)]
pub struct PolicyGroupParams {
    ports: Vec<PortNumber>,
    label_stack: Vec<SegmentId>,
}

impl PolicyGroupParams {
    /// Create new parameters. The order of the ports does not matter.
    pub fn new<I: IntoIterator<Item = PortNumber>>(ports: I, label_stack: Vec<SegmentId>) -> Self {
        let mut ports: Vec<PortNumber> = ports.into_iter().collect();
        ports.sort();
        ports.dedup();
        Self { ports, label_stack }
    }

    /// Output ports, sorted.
    pub fn ports(&self) -> &[PortNumber] {
        &self.ports
    }

    /// Label stack
    pub fn label_stack(&self) -> &[SegmentId] {
        &self.label_stack
    }
}

/// Target of a bucket in a policy group
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone)]
pub enum BucketTarget {
    /// Output on the port
    Port(PortNumber),
    /// Continue in the (inner) group
    Group(Arc<PolicyGroupIdentifier>),
}

/// A single bucket of a policy group: optionally push a label, then forward to the target.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone)]
pub struct GroupBucketIdentifier {
    /// Label to push, if any
    pub label: Option<SegmentId>,
    /// Where to forward the packet
    pub target: BucketTarget,
}

impl GroupBucketIdentifier {
    /// Bucket sending the packet out of a port
    pub fn port(label: Option<SegmentId>, port: PortNumber) -> Self {
        Self { label, target: BucketTarget::Port(port) }
    }

    /// Bucket chaining to an inner group
    pub fn group(label: Option<SegmentId>, group: Arc<PolicyGroupIdentifier>) -> Self {
        Self { label, target: BucketTarget::Group(group) }
    }

    /// Inner group targeted by the bucket, if any
    pub fn inner(&self) -> Option<&Arc<PolicyGroupIdentifier>> {
        match &self.target {
            BucketTarget::Group(g) => Some(g),
            BucketTarget::Port(_) => None,
        }
    }
}

/// Identifier of a single group in a policy group chain. Equality, ordering and hashing only
/// consider the inputs and buckets, not the id, and are independent of their order.
#[derive(Debug, Clone)]
pub struct PolicyGroupIdentifier {
    id: String,
    inputs: Vec<PolicyGroupParams>,
    buckets: Vec<GroupBucketIdentifier>,
}

impl PolicyGroupIdentifier {
    /// Create a new identifier.
    pub fn new(
        id: impl Into<String>,
        mut inputs: Vec<PolicyGroupParams>,
        mut buckets: Vec<GroupBucketIdentifier>,
    ) -> Self {
        inputs.sort();
        buckets.sort();
        Self { id: id.into(), inputs, buckets }
    }

    /// Human readable id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Inputs of the group, sorted
    pub fn inputs(&self) -> &[PolicyGroupParams] {
        &self.inputs
    }

    /// Buckets of the group, sorted
    pub fn buckets(&self) -> &[GroupBucketIdentifier] {
        &self.buckets
    }

    /// Inner groups this group directly depends on
    pub fn inner_groups(&self) -> impl Iterator<Item = &Arc<PolicyGroupIdentifier>> {
        self.buckets.iter().filter_map(|b| b.inner())
    }
}

impl PartialEq for PolicyGroupIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.inputs == other.inputs && self.buckets == other.buckets
    }
}

impl Eq for PolicyGroupIdentifier {}

impl Hash for PolicyGroupIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inputs.hash(state);
        self.buckets.hash(state);
    }
}

impl PartialOrd for PolicyGroupIdentifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PolicyGroupIdentifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inputs.cmp(&other.inputs).then_with(|| self.buckets.cmp(&other.buckets))
    }
}

impl fmt::Display for PolicyGroupIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} buckets)", self.id, self.buckets.len())
    }
}

/// Build the identifier of a chain, without installing anything. Returns `None` if `params` is
/// empty.
pub(crate) fn build_chain(
    id: &str,
    params: &[PolicyGroupParams],
) -> Option<PolicyGroupIdentifier> {
    if params.is_empty() {
        return None;
    }
    let mut buckets = Vec::new();
    for input in params {
        let stack = input.label_stack();
        if stack.len() <= 1 {
            let label = stack.first().copied();
            buckets.extend(input.ports().iter().map(|p| GroupBucketIdentifier::port(label, *p)));
            continue;
        }
        for port in input.ports() {
            let mut inner = Arc::new(PolicyGroupIdentifier::new(
                format!("{}-{}-0", id, port),
                vec![PolicyGroupParams::new(vec![*port], stack[..1].to_vec())],
                vec![GroupBucketIdentifier::port(Some(stack[0]), *port)],
            ));
            let last = stack.len() - 1;
            for (idx, label) in stack.iter().enumerate().take(last).skip(1) {
                inner = Arc::new(PolicyGroupIdentifier::new(
                    format!("{}-{}-{}", id, port, idx),
                    vec![PolicyGroupParams::new(vec![*port], stack[..=idx].to_vec())],
                    vec![GroupBucketIdentifier::group(Some(*label), inner)],
                ));
            }
            buckets.push(GroupBucketIdentifier::group(Some(stack[last]), inner));
        }
    }
    Some(PolicyGroupIdentifier::new(id, params.to_vec(), buckets))
}
