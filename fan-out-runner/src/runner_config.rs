use std::{fmt::Display, str::FromStr, time::Duration};

use fan_out_core::{ConfigError, RandomDurations, RunConfig, WaitPolicy};

#[derive(Debug)]
pub struct RunnerConfig {
  pub run: RunConfig,
  // Base unit every other duration is expressed in.
  pub time_unit: Duration,
  // Each task draws its per-increment step from [min_units, max_units] time units.
  pub min_units: u32,
  pub max_units: u32,
}

impl RunnerConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|name| std::env::var(name).ok())
  }

  /// Builds the config from any key/value source; unset keys fall back to defaults.
  pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
  where
    L: Fn(&str) -> Option<String>,
  {
    let tasks: usize = parse(&lookup, "FANOUT_TASKS", 10)?;
    let time_unit = Duration::from_millis(parse(&lookup, "FANOUT_TIME_UNIT_MS", 1000)?);
    let timeout_units: f64 = parse(&lookup, "FANOUT_TIMEOUT_UNITS", 20.0)?;
    let capacity: usize = parse(&lookup, "FANOUT_CAPACITY", tasks.max(1))?;
    let min_units: u32 = parse(&lookup, "FANOUT_MIN_UNITS", 1)?;
    let max_units: u32 = parse(&lookup, "FANOUT_MAX_UNITS", 2)?;
    let idle = Duration::from_millis(parse(&lookup, "FANOUT_IDLE_MS", 500)?);

    if !timeout_units.is_finite() || timeout_units < 0.0 {
      return Err(ConfigError::InvalidValue {
        name: "FANOUT_TIMEOUT_UNITS",
        value: timeout_units.to_string(),
        reason: "must be a non-negative number".to_string(),
      });
    }

    let wait_policy = match lookup("FANOUT_WAIT").as_deref() {
      None | Some("multiplexed") => WaitPolicy::Multiplexed,
      Some("polling") => WaitPolicy::Polling { idle },
      Some(other) => {
        return Err(ConfigError::InvalidValue {
          name: "FANOUT_WAIT",
          value: other.to_string(),
          reason: "expected `multiplexed` or `polling`".to_string(),
        })
      }
    };

    let timeout = Duration::from_nanos((time_unit.as_nanos() as f64 * timeout_units).round() as u64);
    let run = RunConfig::new(tasks, timeout)
      .with_capacity(capacity)
      .with_wait_policy(wait_policy)
      .with_progress_interval(idle);
    run.validate()?;

    Ok(Self {
      run,
      time_unit,
      min_units,
      max_units,
    })
  }

  pub fn durations(&self) -> Result<RandomDurations, ConfigError> {
    RandomDurations::from_units(self.time_unit, self.min_units, self.max_units)
  }
}

fn parse<L, T>(lookup: &L, name: &'static str, default: T) -> Result<T, ConfigError>
where
  L: Fn(&str) -> Option<String>,
  T: FromStr,
  T::Err: Display,
{
  match lookup(name) {
    None => Ok(default),
    Some(value) => value
      .trim()
      .parse()
      .map_err(|error: T::Err| ConfigError::InvalidValue {
        name,
        value,
        reason: error.to_string(),
      }),
  }
}
