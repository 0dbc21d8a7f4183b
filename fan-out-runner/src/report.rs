use fan_out_core::{RunResult, TaskId};

fn list(ids: impl Iterator<Item = TaskId>) -> String {
  let ids: Vec<String> = ids.map(|id| id.to_string()).collect();
  format!("[{}]", ids.join(","))
}

/// Summary printed once the run is over.
pub fn render(result: &RunResult) -> String {
  format!(
    "{}\narrival_order={}\nnot_observed={}",
    result,
    list(result.arrival_order().iter().copied()),
    list(result.not_observed())
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use fan_out_core::{CollectorState, FanOut, FixedDurations, RunConfig};
  use std::time::Duration;

  #[tokio::test(start_paused = true)]
  async fn test_render_partial_run() {
    let durations = FixedDurations::new(vec![
      Duration::from_secs(2),
      Duration::from_secs(1),
      Duration::from_secs(9),
    ]);
    let fan_out = FanOut::new(RunConfig::new(3, Duration::from_secs(5)), durations).unwrap();
    let result = fan_out.run().await;
    assert!(matches!(result.state(), CollectorState::DoneTimedOut(_)));

    assert_eq!(
      render(&result),
      "tasks=3 observed=2 outcome=timed_out\narrival_order=[1,0]\nnot_observed=[2]"
    );
  }
}
