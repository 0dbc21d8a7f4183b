use std::fmt;

use tokio::time::{interval_at, sleep, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{
    completion_channel::{CompletionReceiver, TryRecv},
    config::{RunConfig, WaitPolicy},
    deadline::{instant_after, DeadlineTimer, ExpiryReason, FAR_FUTURE},
    run_result::RunResult,
    task::{CompletionSignal, TaskId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    // Still expecting completions and the deadline has not fired.
    Waiting,
    // Every dispatched task reported in.
    DoneAllReceived,
    // The deadline fired first. Whatever arrived before it is kept.
    DoneTimedOut(ExpiryReason),
    // Every sender is gone but some tasks never reported, e.g. a task unit panicked.
    DoneDisconnected,
}

impl CollectorState {
    pub fn is_waiting(&self) -> bool {
        matches!(self, CollectorState::Waiting)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_waiting()
    }
}

impl fmt::Display for CollectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CollectorState::Waiting => "waiting",
            CollectorState::DoneAllReceived => "all_received",
            CollectorState::DoneTimedOut(ExpiryReason::Elapsed) => "timed_out",
            CollectorState::DoneTimedOut(ExpiryReason::Interrupted) => "interrupted",
            CollectorState::DoneDisconnected => "disconnected",
        };
        f.write_str(label)
    }
}

/// Drains completion signals until every task reported or the deadline fired.
///
/// The transitions (`on_signal`, `on_deadline`, `on_disconnect`) are plain
/// methods so the state machine can be driven without a runtime; `collect`
/// wires them to a channel and a timer.
#[derive(Debug)]
pub struct Collector {
    state: CollectorState,
    completed: Vec<bool>,
    arrivals: Vec<TaskId>,
    wait_policy: WaitPolicy,
    progress_interval: Duration,
}

impl Collector {
    pub fn new(expected: usize) -> Self {
        let state = if expected == 0 {
            CollectorState::DoneAllReceived
        } else {
            CollectorState::Waiting
        };

        Self {
            state,
            completed: vec![false; expected],
            arrivals: Vec::with_capacity(expected),
            wait_policy: WaitPolicy::default(),
            progress_interval: RunConfig::DEFAULT_IDLE,
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.tasks)
            .with_wait_policy(config.wait_policy)
            .with_progress_interval(config.progress_interval)
    }

    pub fn with_wait_policy(mut self, wait_policy: WaitPolicy) -> Self {
        self.wait_policy = wait_policy;
        self
    }

    pub fn with_progress_interval(mut self, progress_interval: Duration) -> Self {
        self.progress_interval = progress_interval;
        self
    }

    pub fn state(&self) -> CollectorState {
        self.state
    }

    pub fn expected(&self) -> usize {
        self.completed.len()
    }

    pub fn received(&self) -> usize {
        self.arrivals.len()
    }

    pub fn on_signal(&mut self, signal: CompletionSignal) -> CollectorState {
        if self.state.is_terminal() {
            debug!("Ignoring completion of task {} after {}", signal.task, self.state);
            return self.state;
        }

        let expected = self.expected();
        match self.completed.get_mut(signal.task.0) {
            None => warn!("Ignoring completion of unknown task {}", signal.task),
            Some(seen) if *seen => warn!("Ignoring duplicate completion of task {}", signal.task),
            Some(seen) => {
                *seen = true;
                self.arrivals.push(signal.task);
                info!("Received completion signal for task {}", signal.task);

                if self.arrivals.len() == expected {
                    info!("All {} tasks completed", expected);
                    self.state = CollectorState::DoneAllReceived;
                }
            }
        }
        self.state
    }

    pub fn on_deadline(&mut self, reason: ExpiryReason) -> CollectorState {
        if self.state.is_waiting() {
            info!(
                "Timeout reached ({}), {} of {} tasks observed",
                reason,
                self.received(),
                self.expected()
            );
            self.state = CollectorState::DoneTimedOut(reason);
        }
        self.state
    }

    pub fn on_disconnect(&mut self) -> CollectorState {
        if self.state.is_waiting() {
            warn!(
                "Completion channel closed with {} of {} tasks observed",
                self.received(),
                self.expected()
            );
            self.state = CollectorState::DoneDisconnected;
        }
        self.state
    }

    /// Runs the collector to a terminal state.
    ///
    /// Consumes the receiving end and the timer. Both are dropped on return:
    /// late task units then fail their send and discard the signal, and the
    /// timer fiber is aborted if it has not fired yet.
    pub async fn collect(
        mut self,
        mut receiver: CompletionReceiver,
        mut timer: DeadlineTimer,
    ) -> RunResult {
        let started = Instant::now();

        match self.wait_policy {
            WaitPolicy::Multiplexed => self.wait_multiplexed(&mut receiver, &mut timer).await,
            WaitPolicy::Polling { idle } => {
                self.wait_polling(&mut receiver, &mut timer, idle).await
            }
        }

        RunResult {
            completed: self.completed,
            arrivals: self.arrivals,
            state: self.state,
            elapsed: started.elapsed(),
        }
    }

    async fn wait_multiplexed(
        &mut self,
        receiver: &mut CompletionReceiver,
        timer: &mut DeadlineTimer,
    ) {
        let mut progress = interval_at(
            instant_after(self.progress_interval),
            self.progress_interval.min(FAR_FUTURE),
        );
        progress.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.state.is_waiting() {
            tokio::select! {
                // Buffered signals win ties against the deadline.
                biased;

                signal = receiver.recv() => match signal {
                    Some(signal) => {
                        self.on_signal(signal);
                    }
                    None => {
                        self.on_disconnect();
                    }
                },
                reason = timer.expired() => {
                    self.on_deadline(reason);
                }
                _ = progress.tick() => {
                    info!(
                        "Waiting on {} of {} tasks",
                        self.expected() - self.received(),
                        self.expected()
                    );
                }
            }
        }
    }

    async fn wait_polling(
        &mut self,
        receiver: &mut CompletionReceiver,
        timer: &mut DeadlineTimer,
        idle: Duration,
    ) {
        while self.state.is_waiting() {
            match receiver.try_recv() {
                TryRecv::Signal(signal) => {
                    self.on_signal(signal);
                    continue;
                }
                TryRecv::Closed => {
                    self.on_disconnect();
                    continue;
                }
                TryRecv::Empty => {}
            }

            if let Some(reason) = timer.try_expired() {
                self.on_deadline(reason);
                continue;
            }

            debug!("No tasks completed yet, waiting...");
            sleep(idle.min(timer.remaining())).await;
        }
    }
}
