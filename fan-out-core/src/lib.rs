//! Bounded fan-out with deadline-bounded completion collection.
//!
//! N task units are spawned at once, each reporting a single completion over a
//! bounded channel. A collector drains the channel until every unit reported or
//! a one-shot deadline fires, whichever comes first. Units still running at the
//! deadline are not cancelled; their late completions are discarded.

use std::future::Future;

use tokio::time::Duration;
use tracing::info;

mod collector;
mod completion_channel;
mod config;
mod deadline;
mod dispatcher;
mod duration_source;
mod error;
mod run_result;
mod task;

pub use collector::{Collector, CollectorState};
pub use completion_channel::{completion_channel, CompletionReceiver, CompletionSender, TryRecv};
pub use config::{RunConfig, WaitPolicy};
pub use deadline::{Deadline, DeadlineTimer, ExpiryReason};
pub use dispatcher::Dispatcher;
pub use duration_source::{DurationSource, FixedDurations, RandomDurations};
pub use error::{ConfigError, SendError, TrySendError};
pub use run_result::{RunResult, TaskStatus};
pub use task::{CompletionSignal, TaskId, TaskUnit, Workload};

/// A configured run: how many tasks, how long to wait, and how long each task works.
#[derive(Debug)]
pub struct FanOut<D> {
    config: RunConfig,
    dispatcher: Dispatcher<D>,
}

impl<D: DurationSource> FanOut<D> {
    pub fn new(config: RunConfig, durations: D) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            dispatcher: Dispatcher::new(durations),
        })
    }

    pub async fn run(&self) -> RunResult {
        self.run_until(std::future::pending()).await
    }

    /// Like [`FanOut::run`], but `interrupt` resolving expires the deadline early
    /// with [`ExpiryReason::Interrupted`].
    pub async fn run_until<F>(&self, interrupt: F) -> RunResult
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (sender, receiver) = completion_channel(self.config.capacity);
        self.dispatcher.dispatch(self.config.tasks, &sender);
        drop(sender);

        let timer = DeadlineTimer::start(self.config.timeout);
        let deadline = timer.deadline();
        let interrupt_watcher = tokio::spawn(async move {
            interrupt.await;
            deadline.trigger(ExpiryReason::Interrupted).await;
        });

        let result = Collector::from_config(&self.config)
            .collect(receiver, timer)
            .await;
        interrupt_watcher.abort();

        info!("Run finished: {} in {:?}", result, result.elapsed());
        result
    }
}

/// Runs `n` randomly sized task units against `timeout` with default settings.
///
/// Must be awaited inside a tokio runtime.
pub async fn run_bounded_fan_out(n: usize, timeout: Duration) -> RunResult {
    let config = RunConfig::new(n, timeout);
    let fan_out = FanOut {
        config,
        dispatcher: Dispatcher::new(RandomDurations::default()),
    };
    fan_out.run().await
}
