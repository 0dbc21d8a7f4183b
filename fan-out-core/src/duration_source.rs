use tokio::time::Duration;

use crate::{
    error::ConfigError,
    task::{TaskId, Workload},
};

/// Decides how long each dispatched task unit works.
pub trait DurationSource {
    fn workload(&self, id: TaskId) -> Workload;
}

/// Production source: every task draws its own step from `[min_step, max_step]`
/// and repeats it `id + 1` times, so higher ids finish later on average.
#[derive(Debug, Clone)]
pub struct RandomDurations {
    min_step: Duration,
    max_step: Duration,
}

impl RandomDurations {
    pub fn new(min_step: Duration, max_step: Duration) -> Result<Self, ConfigError> {
        if min_step > max_step {
            return Err(ConfigError::InvertedStepRange { min_step, max_step });
        }
        Ok(Self { min_step, max_step })
    }

    /// Steps of `min_units..=max_units` multiples of `time_unit`.
    pub fn from_units(
        time_unit: Duration,
        min_units: u32,
        max_units: u32,
    ) -> Result<Self, ConfigError> {
        if time_unit.is_zero() {
            return Err(ConfigError::ZeroTimeUnit);
        }
        let scale = |units: u32| {
            time_unit
                .checked_mul(units)
                .ok_or_else(|| ConfigError::InvalidValue {
                    name: "step_units",
                    value: units.to_string(),
                    reason: format!("{:?} times {} overflows", time_unit, units),
                })
        };
        Self::new(scale(min_units)?, scale(max_units)?)
    }

    pub fn min_step(&self) -> Duration {
        self.min_step
    }

    pub fn max_step(&self) -> Duration {
        self.max_step
    }
}

impl Default for RandomDurations {
    fn default() -> Self {
        Self {
            min_step: Duration::from_secs(1),
            max_step: Duration::from_secs(2),
        }
    }
}

impl DurationSource for RandomDurations {
    fn workload(&self, id: TaskId) -> Workload {
        let spread = self.max_step - self.min_step;
        let step = self.min_step + spread.mul_f64(rand::random::<f64>());
        let increments = u32::try_from(id.0 + 1).unwrap_or(u32::MAX);
        Workload::new(step, increments)
    }
}

/// Deterministic source: task `i` works for exactly `durations[i]`.
// Ids past the end reuse the last entry; an empty list means no work at all.
#[derive(Debug, Clone, Default)]
pub struct FixedDurations {
    durations: Vec<Duration>,
}

impl FixedDurations {
    pub fn new(durations: Vec<Duration>) -> Self {
        Self { durations }
    }

    pub fn uniform(duration: Duration) -> Self {
        Self {
            durations: vec![duration],
        }
    }
}

impl DurationSource for FixedDurations {
    fn workload(&self, id: TaskId) -> Workload {
        let duration = self
            .durations
            .get(id.0)
            .or_else(|| self.durations.last())
            .copied()
            .unwrap_or(Duration::ZERO);
        Workload::fixed(duration)
    }
}
