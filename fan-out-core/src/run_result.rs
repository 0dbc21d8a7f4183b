use std::fmt;

use tokio::time::Duration;

use crate::{collector::CollectorState, task::TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Completed,
    NotObserved,
}

/// What the collector saw before it stopped waiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub(crate) completed: Vec<bool>,
    pub(crate) arrivals: Vec<TaskId>,
    pub(crate) state: CollectorState,
    pub(crate) elapsed: Duration,
}

impl RunResult {
    pub fn expected(&self) -> usize {
        self.completed.len()
    }

    // `None` for ids that were never dispatched in this run.
    pub fn status(&self, id: TaskId) -> Option<TaskStatus> {
        self.completed.get(id.0).map(|&completed| {
            if completed {
                TaskStatus::Completed
            } else {
                TaskStatus::NotObserved
            }
        })
    }

    pub fn completed(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.completed
            .iter()
            .enumerate()
            .filter(|(_, &completed)| completed)
            .map(|(id, _)| TaskId(id))
    }

    pub fn not_observed(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.completed
            .iter()
            .enumerate()
            .filter(|(_, &completed)| !completed)
            .map(|(id, _)| TaskId(id))
    }

    /// Observed ids in the order the collector received them.
    pub fn arrival_order(&self) -> &[TaskId] {
        &self.arrivals
    }

    pub fn observed(&self) -> usize {
        self.arrivals.len()
    }

    pub fn is_complete(&self) -> bool {
        self.arrivals.len() == self.completed.len()
    }

    pub fn state(&self) -> CollectorState {
        self.state
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tasks={} observed={} outcome={}",
            self.expected(),
            self.observed(),
            self.state
        )
    }
}
