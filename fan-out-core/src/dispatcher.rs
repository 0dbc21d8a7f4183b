use tracing::{debug, info};

use crate::{
    completion_channel::CompletionSender,
    duration_source::DurationSource,
    task::{TaskId, TaskUnit},
};

/// Fans task units out onto the runtime, one spawned task each.
#[derive(Debug, Clone)]
pub struct Dispatcher<D> {
    durations: D,
}

impl<D: DurationSource> Dispatcher<D> {
    pub fn new(durations: D) -> Self {
        Self { durations }
    }

    /// Spawns task units `0..count` and returns right away.
    ///
    /// Completions are not tracked here; each unit gets its own clone of
    /// `sender` and reports through it. The caller's `sender` can be dropped
    /// afterwards, which lets the channel close once the last unit is done.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime. Bounding `count` is the
    /// caller's job; running out of memory while spawning is not recovered.
    pub fn dispatch(&self, count: usize, sender: &CompletionSender) {
        info!("Dispatching {} tasks", count);

        for id in 0..count {
            let id = TaskId(id);
            let workload = self.durations.workload(id);
            debug!("Task {} will work for {:?}", id, workload.total());

            let unit = TaskUnit::new(id, workload);
            tokio::spawn(unit.run(sender.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{completion_channel::completion_channel, duration_source::FixedDurations};
    use std::collections::BTreeSet;
    use tokio::time::{sleep, Duration, Instant};

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_is_fire_and_forget() {
        let dispatcher = Dispatcher::new(FixedDurations::uniform(Duration::from_secs(5)));
        let (sender, mut receiver) = completion_channel(4);

        let start = Instant::now();
        dispatcher.dispatch(4, &sender);
        assert_eq!(start.elapsed(), Duration::ZERO);
        drop(sender);

        let mut seen = BTreeSet::new();
        while let Some(signal) = receiver.recv().await {
            assert!(seen.insert(signal.task), "task {} reported twice", signal.task);
        }
        assert_eq!(seen, (0..4).map(TaskId).collect());
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_nothing() {
        let dispatcher = Dispatcher::new(FixedDurations::default());
        let (sender, mut receiver) = completion_channel(1);
        dispatcher.dispatch(0, &sender);
        drop(sender);
        assert_eq!(receiver.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shorter_workloads_report_first() {
        let durations = FixedDurations::new(vec![
            Duration::from_secs(3),
            Duration::from_secs(1),
            Duration::from_secs(2),
        ]);
        let dispatcher = Dispatcher::new(durations);
        let (sender, mut receiver) = completion_channel(3);
        dispatcher.dispatch(3, &sender);

        sleep(Duration::from_millis(1500)).await;
        assert_eq!(receiver.len(), 1);

        let order: Vec<_> = [
            receiver.recv().await,
            receiver.recv().await,
            receiver.recv().await,
        ]
        .into_iter()
        .map(|signal| signal.map(|signal| signal.task))
        .collect();
        assert_eq!(order, vec![Some(TaskId(1)), Some(TaskId(2)), Some(TaskId(0))]);
    }
}
