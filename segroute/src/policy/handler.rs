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

use super::{
    build_chain, BucketTarget, GroupBucketIdentifier, PolicyGroupIdentifier, PolicyGroupParams,
};
use crate::handler::GroupHandler;
use crate::objective::{log_context, NextKind, NextObjective, NextOperation};
use crate::treatment::Treatment;
use crate::types::NextId;
use crate::Error;

use log::*;
use parking_lot::Mutex;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

type Key = Arc<PolicyGroupIdentifier>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupState {
    /// Waiting for inner groups to be installed
    Pending,
    /// Submitted to the sink, outcome not yet known
    Submitted(NextId),
    /// Installed on the device
    Installed(NextId),
}

impl GroupState {
    fn next_id(&self) -> Option<NextId> {
        match self {
            GroupState::Pending => None,
            GroupState::Submitted(id) | GroupState::Installed(id) => Some(*id),
        }
    }
}

#[derive(Debug)]
struct GroupEntry {
    kind: NextKind,
    state: GroupState,
}

#[derive(Debug, Default)]
struct ChainState {
    groups: HashMap<Key, GroupEntry>,
    /// inner group -> outer groups depending on it
    dependencies: HashMap<Key, BTreeSet<Key>>,
}

/// Group ready to be submitted to the sink
struct Submission {
    key: Key,
    id: NextId,
    kind: NextKind,
    treatments: Vec<Treatment>,
}

struct PolicyInner {
    handler: Arc<GroupHandler>,
    state: Mutex<ChainState>,
}

/// Builds and tears down policy group chains on the device of a [`GroupHandler`].
///
/// The handler can be cloned cheaply, and all clones share the same chain state. Objectives are
/// never submitted while the chain state is locked, so the sink may report their outcome
/// synchronously.
#[derive(Clone)]
pub struct PolicyGroupHandler {
    inner: Arc<PolicyInner>,
}

impl std::fmt::Debug for PolicyGroupHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("PolicyGroupHandler")
            .field("device", &self.inner.handler.device_id())
            .field("groups", &state.groups.len())
            .finish()
    }
}

impl PolicyGroupHandler {
    /// Create a policy group handler on top of the group handler of a device.
    pub fn new(handler: Arc<GroupHandler>) -> Self {
        Self { inner: Arc::new(PolicyInner { handler, state: Mutex::new(ChainState::default()) }) }
    }

    /// Compute the identifier of the chain without installing anything.
    pub fn generate_policy_group_key(
        &self,
        id: &str,
        params: &[PolicyGroupParams],
    ) -> Result<Key, Error> {
        build_chain(id, params).map(Arc::new).ok_or_else(|| Error::EmptyPolicyChain(id.to_string()))
    }

    /// Build the chain for the given inputs. Every group of the chain that does not exist yet is
    /// installed as soon as all groups it depends on are installed. Returns the identifier of the
    /// top-level group.
    ///
    /// Fails if `params` is empty, or if any port does not lead to a configured neighbor.
    pub fn create_policy_group_chain(
        &self,
        id: &str,
        params: &[PolicyGroupParams],
    ) -> Result<Key, Error> {
        let key = self.generate_policy_group_key(id, params)?;
        self.inner.check_ports(&key)?;
        let submissions = {
            let mut state = self.inner.state.lock();
            let mut submissions = Vec::new();
            self.inner.register(&mut state, &key, NextKind::Hashed, &mut submissions);
            submissions
        };
        info!(
            "{}: created policy chain {}, submitting {} groups",
            self.inner.handler.device_id(),
            key,
            submissions.len()
        );
        PolicyInner::submit(&self.inner, submissions);
        Ok(key)
    }

    /// Notify the handler that the group was installed on the device. All outer groups whose
    /// dependencies are now fully installed are submitted.
    pub fn group_added(&self, key: &Key) {
        PolicyInner::group_added(&self.inner, key)
    }

    /// Group id of the group, if it was submitted already.
    pub fn next_id(&self, key: &Key) -> Option<NextId> {
        self.inner.state.lock().groups.get(key).and_then(|e| e.state.next_id())
    }

    /// Returns `true` if the group is installed on the device.
    pub fn is_installed(&self, key: &Key) -> bool {
        matches!(
            self.inner.state.lock().groups.get(key).map(|e| e.state),
            Some(GroupState::Installed(_))
        )
    }

    /// Remove the chain starting at its top-level identifier. Groups are removed from the outside
    /// in, such that no group is removed while a remaining group still points to it. Inner groups
    /// shared with other chains are kept. Returns the ids of all removed groups in the order in
    /// which they were removed.
    pub fn remove_group_chain(&self, key: &Key) -> Vec<NextId> {
        let device = self.inner.handler.device_id();
        let order = teardown_order(key);
        let mut removals = Vec::new();
        {
            let mut state = self.inner.state.lock();
            for group in order {
                if state.dependencies.get(&group).map(|d| !d.is_empty()).unwrap_or(false) {
                    debug!("{}: policy group {} is still referenced", device, group);
                    continue;
                }
                state.dependencies.remove(&group);
                for inner in group.inner_groups() {
                    if let Some(outers) = state.dependencies.get_mut(inner) {
                        outers.remove(&group);
                    }
                }
                if let Some(entry) = state.groups.remove(&group) {
                    if let Some(id) = entry.state.next_id() {
                        removals.push((id, entry.kind));
                    }
                }
            }
        }
        for (id, kind) in removals.iter() {
            info!("{}: removing policy group {}", device, id);
            let objective = NextObjective::new(*id, *kind, NextOperation::Remove)
                .with_context(log_context(device, "removeGroupChain"));
            self.inner.handler.sink().next(device, objective);
        }
        removals.into_iter().map(|(id, _)| id).collect()
    }
}

impl PolicyInner {
    /// Make sure that every port of the chain leads to a configured neighbor.
    fn check_ports(&self, key: &Key) -> Result<(), Error> {
        let device = self.handler.device_id();
        for bucket in key.buckets() {
            match &bucket.target {
                BucketTarget::Port(port) => {
                    let neighbor = self
                        .handler
                        .adjacency()
                        .neighbor_at(*port)
                        .ok_or(Error::UnknownAdjacency(device, *port))?;
                    self.handler.config().device_mac(neighbor)?;
                }
                BucketTarget::Group(inner) => self.check_ports(inner)?,
            }
        }
        Ok(())
    }

    /// Register the group and all its inner groups (inner first), recording the dependencies.
    /// Groups whose inner groups are all installed are pushed to `submissions`.
    fn register(
        &self,
        state: &mut ChainState,
        key: &Key,
        kind: NextKind,
        submissions: &mut Vec<Submission>,
    ) {
        for inner in key.inner_groups() {
            self.register(state, inner, NextKind::Simple, submissions);
            state.dependencies.entry(inner.clone()).or_default().insert(key.clone());
        }
        if !state.groups.contains_key(key) {
            state.groups.insert(key.clone(), GroupEntry { kind, state: GroupState::Pending });
        }
        self.try_resolve(state, key, submissions);
    }

    /// Submit the group if it is pending and all its inner groups are installed.
    fn try_resolve(&self, state: &mut ChainState, key: &Key, submissions: &mut Vec<Submission>) {
        let kind = match state.groups.get(key) {
            Some(GroupEntry { kind, state: GroupState::Pending }) => *kind,
            _ => return,
        };
        let view: &ChainState = state;
        let treatments = match key
            .buckets()
            .iter()
            .map(|b| self.bucket_treatment(view, b))
            .collect::<Option<Vec<Treatment>>>()
        {
            Some(t) => t,
            None => {
                trace!("{}: policy group {} not resolved yet", self.handler.device_id(), key);
                return;
            }
        };
        let id = self.handler.sink().allocate_next_id();
        if let Some(entry) = state.groups.get_mut(key) {
            entry.state = GroupState::Submitted(id);
        }
        submissions.push(Submission { key: key.clone(), id, kind, treatments });
    }

    /// Treatment of the bucket, or `None` if the target is not resolved.
    fn bucket_treatment(
        &self,
        state: &ChainState,
        bucket: &GroupBucketIdentifier,
    ) -> Option<Treatment> {
        match &bucket.target {
            BucketTarget::Port(port) => {
                let neighbor = self.handler.adjacency().neighbor_at(*port)?;
                let mac = match self.handler.config().device_mac(neighbor) {
                    Ok(mac) => mac,
                    Err(e) => {
                        warn!("{} Cannot build policy bucket on port {}", e, port);
                        return None;
                    }
                };
                Some(self.handler.neighbor_bucket(mac, *port, bucket.label))
            }
            BucketTarget::Group(inner) => match state.groups.get(inner).map(|e| e.state) {
                Some(GroupState::Installed(id)) => {
                    let mut builder = Treatment::builder();
                    if let Some(label) = bucket.label {
                        builder = builder.push_label(label);
                    }
                    Some(builder.group(id).build())
                }
                _ => None,
            },
        }
    }

    fn submit(this: &Arc<Self>, submissions: Vec<Submission>) {
        let device = this.handler.device_id();
        for Submission { key, id, kind, treatments } in submissions {
            let inner = this.clone();
            debug!("{}: submitting policy group {} as NextObj {}", device, key, id);
            let objective = NextObjective::new(id, kind, NextOperation::Add)
                .with_treatments(treatments)
                .with_context(move |id, result| match result {
                    Ok(()) => {
                        debug!("policy group {} installed as NextObj {} on {}", key, id, device);
                        PolicyInner::group_added(&inner, &key);
                    }
                    Err(e) => {
                        warn!(
                            "policy group {} failed as NextObj {} on {}: {}",
                            key, id, device, e
                        );
                        PolicyInner::group_failed(&inner, &key, id);
                    }
                });
            this.handler.sink().next(device, objective);
        }
    }

    fn group_added(this: &Arc<Self>, key: &Key) {
        let submissions = {
            let mut state = this.state.lock();
            match state.groups.get_mut(key) {
                Some(entry) => match entry.state {
                    GroupState::Submitted(id) | GroupState::Installed(id) => {
                        entry.state = GroupState::Installed(id)
                    }
                    GroupState::Pending => {
                        warn!("policy group {} reported installed before submission", key);
                        return;
                    }
                },
                None => {
                    debug!("policy group {} is not part of any chain", key);
                    return;
                }
            }
            let outers: Vec<Key> = state
                .dependencies
                .get(key)
                .map(|o| o.iter().cloned().collect())
                .unwrap_or_default();
            let mut submissions = Vec::new();
            for outer in outers {
                this.try_resolve(&mut state, &outer, &mut submissions);
            }
            submissions
        };
        Self::submit(this, submissions);
    }

    /// The group could not be installed. It goes back to pending, and is submitted again when the
    /// chain is created again, or when one of its inner groups is reported installed.
    fn group_failed(this: &Arc<Self>, key: &Key, id: NextId) {
        let mut state = this.state.lock();
        if let Some(entry) = state.groups.get_mut(key) {
            if entry.state == GroupState::Submitted(id) {
                entry.state = GroupState::Pending;
            }
        }
    }
}

/// Groups of the chain, ordered such that every group comes before all groups it points to.
fn teardown_order(key: &Key) -> Vec<Key> {
    let mut graph: DiGraph<Key, ()> = DiGraph::new();
    let mut nodes: HashMap<Key, NodeIndex> = HashMap::new();
    let mut stack = vec![key.clone()];
    nodes.insert(key.clone(), graph.add_node(key.clone()));
    while let Some(outer) = stack.pop() {
        let outer_idx = nodes[&outer];
        for inner in outer.inner_groups() {
            let inner_idx = match nodes.get(inner) {
                Some(idx) => *idx,
                None => {
                    let idx = graph.add_node(inner.clone());
                    nodes.insert(inner.clone(), idx);
                    stack.push(inner.clone());
                    idx
                }
            };
            graph.update_edge(outer_idx, inner_idx, ());
        }
    }
    // identifiers are immutable trees of `Arc`s, so the graph cannot have cycles.
    toposort(&graph, None)
        .map(|order| order.into_iter().map(|idx| graph[idx].clone()).collect())
        .unwrap_or_default()
}
