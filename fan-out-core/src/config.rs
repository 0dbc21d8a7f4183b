use tokio::time::Duration;

use crate::error::ConfigError;

/// How the collector waits when nothing is ready yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitPolicy {
    // Block on whichever of channel or deadline becomes ready first.
    #[default]
    Multiplexed,
    // Check both without blocking, then sleep for at most `idle` before checking again.
    Polling { idle: Duration },
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    // Number of task units to dispatch.
    pub tasks: usize,
    // How long the collector waits for completions before giving up.
    pub timeout: Duration,
    // Undelivered completions the channel can hold before producers have to wait.
    pub capacity: usize,
    pub wait_policy: WaitPolicy,
    // Interval at which a multiplexed wait logs how many tasks are still outstanding.
    pub progress_interval: Duration,
}

impl RunConfig {
    pub const DEFAULT_IDLE: Duration = Duration::from_millis(500);

    /// Defaults: one channel slot per task, multiplexed wait, progress every 500ms.
    pub fn new(tasks: usize, timeout: Duration) -> Self {
        Self {
            tasks,
            timeout,
            capacity: tasks.max(1),
            wait_policy: WaitPolicy::default(),
            progress_interval: Self::DEFAULT_IDLE,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_wait_policy(mut self, wait_policy: WaitPolicy) -> Self {
        self.wait_policy = wait_policy;
        self
    }

    pub fn with_progress_interval(mut self, progress_interval: Duration) -> Self {
        self.progress_interval = progress_interval;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.progress_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "progress_interval",
                value: format!("{:?}", self.progress_interval),
                reason: "must be greater than zero".to_string(),
            });
        }
        if let WaitPolicy::Polling { idle } = self.wait_policy {
            if idle.is_zero() {
                return Err(ConfigError::InvalidValue {
                    name: "idle",
                    value: format!("{:?}", idle),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Default for RunConfig {
    /// Ten tasks racing a twenty second deadline.
    fn default() -> Self {
        Self::new(10, Duration::from_secs(20))
    }
}
