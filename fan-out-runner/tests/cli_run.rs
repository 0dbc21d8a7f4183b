//! Runs the built binary end to end with a shortened time unit.

use std::process::Command;

fn run_with(envs: &[(&str, &str)]) -> (bool, String) {
  let bin = env!("CARGO_BIN_EXE_fan-out-runner");
  let output = Command::new(bin)
    .env_remove("RUST_LOG")
    .envs(envs.iter().copied())
    .output()
    .expect("failed to run fan-out-runner");
  (
    output.status.success(),
    String::from_utf8_lossy(&output.stdout).into_owned(),
  )
}

#[test]
fn cli_reports_every_task_with_generous_timeout() {
  let (success, stdout) = run_with(&[
    ("FANOUT_TASKS", "4"),
    ("FANOUT_TIME_UNIT_MS", "10"),
    ("FANOUT_TIMEOUT_UNITS", "500"),
  ]);

  assert!(success, "runner exited with failure");
  let summary = stdout
    .lines()
    .find(|line| line.starts_with("tasks="))
    .expect("summary line missing");
  assert_eq!(summary.trim(), "tasks=4 observed=4 outcome=all_received");

  let not_observed = stdout
    .lines()
    .find(|line| line.starts_with("not_observed="))
    .expect("not_observed line missing");
  assert_eq!(not_observed.trim(), "not_observed=[]");
}

#[test]
fn cli_timeout_is_not_an_error() {
  // Task 0 alone needs at least one unit, so nothing can make it in time.
  let (success, stdout) = run_with(&[
    ("FANOUT_TASKS", "3"),
    ("FANOUT_TIME_UNIT_MS", "200"),
    ("FANOUT_TIMEOUT_UNITS", "0.1"),
    ("FANOUT_WAIT", "polling"),
    ("FANOUT_IDLE_MS", "5"),
  ]);

  assert!(success, "timeout should still exit cleanly");
  assert!(
    stdout.contains("tasks=3 observed=0 outcome=timed_out"),
    "unexpected output: {}",
    stdout
  );
}

#[test]
fn cli_rejects_invalid_configuration() {
  let (success, _) = run_with(&[("FANOUT_CAPACITY", "0")]);
  assert!(!success, "zero capacity should be rejected");
}
