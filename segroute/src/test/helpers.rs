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

//! Objective sinks used by the tests.

use crate::objective::{
    NextKind, NextObjective, NextOperation, ObjectiveError, ObjectiveErrorCode, ObjectiveSink,
};
use crate::treatment::{Selector, Treatment};
use crate::types::{DeviceId, NextId};

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Copy of a submitted objective, without its context
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub device: DeviceId,
    pub id: NextId,
    pub kind: NextKind,
    pub op: NextOperation,
    pub treatments: Vec<Treatment>,
    pub meta: Option<Selector>,
}

/// Sink recording every objective, and tracking the buckets of every group as a device would.
///
/// By default, every objective is completed successfully before `next` returns. With
/// `fail_adds`, objectives creating a group are rejected instead. With `hold`, contexts are kept
/// until `complete_pending` is called.
#[derive(Default)]
pub struct RecordingSink {
    next_id: AtomicU32,
    fail_adds: AtomicBool,
    hold: AtomicBool,
    records: Mutex<Vec<Record>>,
    groups: Mutex<HashMap<NextId, Vec<Treatment>>>,
    pending: Mutex<Vec<NextObjective>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        let sink = Self::default();
        sink.next_id.store(1, Ordering::SeqCst);
        sink
    }

    pub fn holding() -> Self {
        let sink = Self::new();
        sink.hold.store(true, Ordering::SeqCst);
        sink
    }

    pub fn set_fail_adds(&self, fail: bool) {
        self.fail_adds.store(fail, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    pub fn count(&self, op: NextOperation) -> usize {
        self.records.lock().iter().filter(|r| r.op == op).count()
    }

    pub fn with_op(&self, op: NextOperation) -> Vec<Record> {
        self.records.lock().iter().filter(|r| r.op == op).cloned().collect()
    }

    /// Buckets of the group, as they would be on the device
    pub fn buckets(&self, id: NextId) -> Vec<Treatment> {
        self.groups.lock().get(&id).cloned().unwrap_or_default()
    }

    pub fn group_exists(&self, id: NextId) -> bool {
        self.groups.lock().contains_key(&id)
    }

    pub fn num_groups(&self) -> usize {
        self.groups.lock().len()
    }

    pub fn clear_records(&self) {
        self.records.lock().clear();
    }

    pub fn num_pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Complete all held objectives (including the ones submitted while completing).
    pub fn complete_pending(&self, result: Result<(), ObjectiveError>) {
        loop {
            let pending: Vec<NextObjective> = self.pending.lock().drain(..).collect();
            if pending.is_empty() {
                return;
            }
            for mut objective in pending {
                objective.complete(result.clone());
            }
        }
    }

    fn apply(&self, objective: &NextObjective) {
        let mut groups = self.groups.lock();
        match objective.op {
            NextOperation::Add | NextOperation::Verify => {
                groups.insert(objective.id, objective.treatments.clone());
            }
            NextOperation::AddToExisting => {
                groups.entry(objective.id).or_default().extend(objective.treatments.iter().cloned())
            }
            NextOperation::RemoveFromExisting => {
                if let Some(buckets) = groups.get_mut(&objective.id) {
                    buckets.retain(|b| !objective.treatments.contains(b));
                }
            }
            NextOperation::Remove => {
                groups.remove(&objective.id);
            }
        }
    }
}

impl ObjectiveSink for RecordingSink {
    fn allocate_next_id(&self) -> NextId {
        NextId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn next(&self, device: DeviceId, mut objective: NextObjective) {
        self.records.lock().push(Record {
            device,
            id: objective.id,
            kind: objective.kind,
            op: objective.op,
            treatments: objective.treatments.clone(),
            meta: objective.meta,
        });
        let result = if objective.op == NextOperation::Add && self.fail_adds.load(Ordering::SeqCst)
        {
            Err(ObjectiveError::new(ObjectiveErrorCode::GroupInstallationFailed, "rejected"))
        } else {
            self.apply(&objective);
            Ok(())
        };
        if self.hold.load(Ordering::SeqCst) {
            self.pending.lock().push(objective);
        } else {
            objective.complete(result);
        }
    }
}
