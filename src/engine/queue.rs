// src/engine/queue.rs

use std::collections::{BTreeSet, VecDeque};

use tracing::{debug, warn};

use crate::engine::TaskName;
use crate::types::TriggerWhileRunningBehaviour;

/// Triggers that arrive while a run is already executing.
///
/// Each entry is a batch of task names for one future run. `max_runs`
/// bounds how many batches are remembered; with the default of 1 at most
/// one follow-up run is pending, however many files change meanwhile.
#[derive(Debug)]
pub struct TriggerQueue {
    behaviour: TriggerWhileRunningBehaviour,
    max_runs: usize,
    runs: VecDeque<BTreeSet<TaskName>>,
}

impl TriggerQueue {
    /// `max_runs` is clamped to at least 1.
    pub fn new(behaviour: TriggerWhileRunningBehaviour, max_runs: usize) -> Self {
        Self {
            behaviour,
            max_runs: max_runs.max(1),
            runs: VecDeque::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn behaviour(&self) -> TriggerWhileRunningBehaviour {
        self.behaviour
    }

    /// Remember a trigger for the next run.
    ///
    /// - `Queue`: coalesce into the most recent batch.
    /// - `Cancel`: forget earlier batches and keep only this task.
    pub fn record_trigger(&mut self, task: &str) {
        match self.behaviour {
            TriggerWhileRunningBehaviour::Queue => {
                match self.runs.back_mut() {
                    Some(batch) => {
                        let inserted = batch.insert(task.to_string());
                        debug!(task = %task, inserted, "coalesced trigger into queued run");
                    }
                    None => {
                        self.runs.push_back(BTreeSet::from([task.to_string()]));
                        debug!(task = %task, "queued follow-up run");
                    }
                }

                if self.runs.len() > self.max_runs {
                    warn!(
                        batches = self.runs.len(),
                        max_runs = self.max_runs,
                        "dropping oldest queued runs"
                    );
                    while self.runs.len() > self.max_runs {
                        self.runs.pop_front();
                    }
                }
            }
            TriggerWhileRunningBehaviour::Cancel => {
                debug!(task = %task, "replacing queued runs with latest trigger");
                self.runs.clear();
                self.runs.push_back(BTreeSet::from([task.to_string()]));
            }
        }
    }

    /// Merge and remove every queued batch. Names come back sorted.
    pub fn drain_pending(&mut self) -> Vec<TaskName> {
        let mut merged: BTreeSet<TaskName> = BTreeSet::new();
        while let Some(batch) = self.runs.pop_front() {
            merged.extend(batch);
        }
        debug!(drained = merged.len(), "drained queued triggers");
        merged.into_iter().collect()
    }
}
