use std::{fmt, sync::Arc};

use tokio::{
  sync::{oneshot, Mutex},
  task::JoinHandle,
  time::{sleep_until, Duration, Instant},
};
use tracing::{debug, info};

// Roughly 30 years; stands in for "never" when an offset does not fit in an Instant.
pub(crate) const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// `now + offset`, saturating at a far-future instant instead of overflowing.
pub(crate) fn instant_after(offset: Duration) -> Instant {
  let now = Instant::now();
  now.checked_add(offset).unwrap_or_else(|| now + FAR_FUTURE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryReason {
  // The configured timeout ran out.
  Elapsed,
  // Someone outside the run asked it to stop early.
  Interrupted,
}

impl fmt::Display for ExpiryReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ExpiryReason::Elapsed => write!(f, "elapsed"),
      ExpiryReason::Interrupted => write!(f, "interrupted"),
    }
  }
}

/// One-shot timer raced against the completions.
///
/// Owns the receiving end and the fiber that fires it. Dropping the timer
/// aborts the fiber, so a run that finishes early leaves nothing behind.
pub struct DeadlineTimer {
  deadline: Arc<Deadline>,
  receiver: oneshot::Receiver<ExpiryReason>,
  fiber: JoinHandle<()>,
  fires_at: Instant,
  fired: Option<ExpiryReason>,
}

impl DeadlineTimer {
  /// Starts counting down now. Must be called from within a tokio runtime.
  pub fn start(timeout: Duration) -> Self {
    let (sender, receiver) = oneshot::channel();
    let deadline = Arc::new(Deadline {
      sender: Mutex::new(Some(sender)),
    });
    let fires_at = instant_after(timeout);

    let moved_deadline = deadline.clone();
    let fiber = tokio::spawn(async move {
      sleep_until(fires_at).await;
      moved_deadline.trigger(ExpiryReason::Elapsed).await;
    });

    Self {
      deadline,
      receiver,
      fiber,
      fires_at,
      fired: None,
    }
  }

  /// Shareable trigger for expiring the run early.
  pub fn deadline(&self) -> Arc<Deadline> {
    self.deadline.clone()
  }

  pub fn fires_at(&self) -> Instant {
    self.fires_at
  }

  pub fn remaining(&self) -> Duration {
    self.fires_at.saturating_duration_since(Instant::now())
  }

  /// Resolves once the deadline fires. Cancel safe; returns immediately on
  /// every call after the first expiry.
  pub async fn expired(&mut self) -> ExpiryReason {
    if let Some(reason) = self.fired {
      return reason;
    }
    match (&mut self.receiver).await {
      Ok(reason) => {
        self.fired = Some(reason);
        reason
      }
      // The sender lives in `self.deadline`, so it cannot be dropped unfired.
      Err(_) => std::future::pending().await,
    }
  }

  /// Non-blocking check, for callers that poll.
  pub fn try_expired(&mut self) -> Option<ExpiryReason> {
    if self.fired.is_none() {
      if let Ok(reason) = self.receiver.try_recv() {
        self.fired = Some(reason);
      }
    }
    self.fired
  }
}

impl fmt::Debug for DeadlineTimer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DeadlineTimer")
      .field("fires_at", &self.fires_at)
      .field("fired", &self.fired)
      .finish()
  }
}

impl Drop for DeadlineTimer {
  fn drop(&mut self) {
    self.fiber.abort();
  }
}

/// The fire-once half of a [`DeadlineTimer`].
pub struct Deadline {
  sender: Mutex<Option<oneshot::Sender<ExpiryReason>>>,
}

impl Deadline {
  /// Fires the deadline. Only the first call has any effect.
  pub async fn trigger(&self, reason: ExpiryReason) {
    let mut sender_guard = self.sender.lock().await;
    if let Some(sender) = sender_guard.take() {
      if sender.send(reason).is_ok() {
        info!("Deadline fired: {}", reason);
      } else {
        debug!("Deadline fired ({}) after the collector stopped waiting", reason);
      }
    }
  }

  pub async fn is_fired(&self) -> bool {
    self.sender.lock().await.is_none()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::time::sleep;

  #[tokio::test(start_paused = true)]
  async fn test_fires_once_after_timeout() {
    let start = Instant::now();
    let mut timer = DeadlineTimer::start(Duration::from_secs(20));
    assert_eq!(timer.try_expired(), None);
    assert_eq!(timer.fires_at(), start + Duration::from_secs(20));

    assert_eq!(timer.expired().await, ExpiryReason::Elapsed);
    assert!(start.elapsed() >= Duration::from_secs(20));
    assert!(timer.deadline().is_fired().await);
    assert_eq!(timer.remaining(), Duration::ZERO);

    // One-shot: later checks report the same expiry without waiting again.
    assert_eq!(timer.expired().await, ExpiryReason::Elapsed);
    assert_eq!(timer.try_expired(), Some(ExpiryReason::Elapsed));
  }

  #[tokio::test(start_paused = true)]
  async fn test_unbounded_timeout_never_fires() {
    let start = Instant::now();
    let mut timer = DeadlineTimer::start(Duration::MAX);
    assert!(timer.fires_at() > start + Duration::from_secs(86400 * 365));

    sleep(Duration::from_secs(86400)).await;
    assert_eq!(timer.try_expired(), None);
    assert!(timer.remaining() > Duration::from_secs(86400 * 365));
  }

  #[tokio::test(start_paused = true)]
  async fn test_manual_trigger_wins_and_is_idempotent() {
    let mut timer = DeadlineTimer::start(Duration::from_secs(20));
    let deadline = timer.deadline();

    sleep(Duration::from_secs(1)).await;
    deadline.trigger(ExpiryReason::Interrupted).await;
    deadline.trigger(ExpiryReason::Elapsed).await;

    assert_eq!(timer.try_expired(), Some(ExpiryReason::Interrupted));

    // The timer fiber firing later must not change anything.
    sleep(Duration::from_secs(30)).await;
    assert_eq!(timer.expired().await, ExpiryReason::Interrupted);
  }

  #[tokio::test(start_paused = true)]
  async fn test_dropping_timer_releases_fiber() {
    let timer = DeadlineTimer::start(Duration::from_secs(5));
    let deadline = timer.deadline();
    drop(timer);

    sleep(Duration::from_secs(10)).await;
    // The fiber was aborted, so the sender was never used.
    assert!(!deadline.is_fired().await);
    assert_eq!(Arc::strong_count(&deadline), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_fire_into_void_is_harmless() {
    let timer = DeadlineTimer::start(Duration::from_secs(5));
    let deadline = timer.deadline();
    drop(timer);

    deadline.trigger(ExpiryReason::Interrupted).await;
    assert!(deadline.is_fired().await);
  }
}
