use std::fmt;

use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, info};

use crate::completion_channel::CompletionSender;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TaskId(pub usize);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Simulated work: `increments` consecutive sleeps of `step` each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Workload {
    pub step: Duration,
    pub increments: u32,
}

impl Workload {
    pub fn new(step: Duration, increments: u32) -> Self {
        Self { step, increments }
    }

    /// A workload that finishes after exactly `duration`.
    pub fn fixed(duration: Duration) -> Self {
        Self {
            step: duration,
            increments: 1,
        }
    }

    pub fn total(&self) -> Duration {
        self.step.checked_mul(self.increments).unwrap_or(Duration::MAX)
    }
}

/// Sent by a task unit once its work is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionSignal {
    pub task: TaskId,
}

#[derive(Debug)]
pub struct TaskUnit {
    pub id: TaskId,
    pub workload: Workload,
}

impl TaskUnit {
    pub fn new(id: TaskId, workload: Workload) -> Self {
        Self { id, workload }
    }

    /// Runs the workload, then reports completion exactly once.
    ///
    /// Consumes the unit, so a second report is impossible. When the collector
    /// is already gone the signal is dropped and the task simply ends.
    pub async fn run(self, sender: CompletionSender) {
        let start = Instant::now();

        for _ in 0..self.workload.increments {
            sleep(self.workload.step).await;
        }

        info!("Task {} completed in {:?}", self.id, start.elapsed());

        if let Err(error) = sender.send(CompletionSignal { task: self.id }).await {
            debug!("Discarding completion of task {}: {}", self.id, error);
        }
    }
}
