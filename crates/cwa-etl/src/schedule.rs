//! In-process scheduling for `cwa-etl run --every`.
//!
//! Runs execute one at a time on a single task, so two runs never overlap.
//! A shutdown request is honoured between runs, never in the middle of one.

use std::{future::Future, time::Duration};

use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::RunOutcome;

/// Invoke `job` immediately and then every `interval` until `shutdown`
/// resolves. Ticks missed while a run was in progress are skipped rather
/// than bunched up. Returns the number of runs performed.
pub async fn run_every<J, Fut>(
  interval: Duration,
  shutdown: impl Future<Output = ()>,
  mut job:  J,
) -> usize
where
  J: FnMut() -> Fut,
  Fut: Future<Output = RunOutcome>,
{
  let mut ticker = tokio::time::interval(interval);
  ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
  tokio::pin!(shutdown);

  let mut runs = 0;
  loop {
    tokio::select! {
      _ = &mut shutdown => {
        info!(runs, "shutdown requested; stopping scheduler");
        break;
      }
      _ = ticker.tick() => {
        let outcome = job().await;
        runs += 1;
        debug!(?outcome, runs, next_in = ?interval, "scheduled run finished");
      }
    }
  }
  runs
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  };

  use super::*;

  #[tokio::test]
  async fn runs_until_shutdown() {
    let counter = Arc::new(AtomicUsize::new(0));
    let seen = counter.clone();

    let runs = run_every(
      Duration::from_millis(20),
      tokio::time::sleep(Duration::from_millis(110)),
      move || {
        let seen = seen.clone();
        async move {
          seen.fetch_add(1, Ordering::SeqCst);
          RunOutcome::NoUsableData
        }
      },
    )
    .await;

    assert!(runs >= 2, "expected repeated runs, got {runs}");
    assert_eq!(runs, counter.load(Ordering::SeqCst));
  }

  #[tokio::test]
  async fn slow_runs_do_not_overlap() {
    let active = Arc::new(AtomicUsize::new(0));
    let max_active = Arc::new(AtomicUsize::new(0));
    let (a, m) = (active.clone(), max_active.clone());

    run_every(
      Duration::from_millis(5),
      tokio::time::sleep(Duration::from_millis(80)),
      move || {
        let (a, m) = (a.clone(), m.clone());
        async move {
          let now = a.fetch_add(1, Ordering::SeqCst) + 1;
          m.fetch_max(now, Ordering::SeqCst);
          tokio::time::sleep(Duration::from_millis(20)).await;
          a.fetch_sub(1, Ordering::SeqCst);
          RunOutcome::NoUsableData
        }
      },
    )
    .await;

    assert_eq!(max_active.load(Ordering::SeqCst), 1);
  }
}
