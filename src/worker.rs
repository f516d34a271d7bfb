//! Background poll loop driving sweeps over the schedule collection.
//!
//! One tokio task wakes every poll interval, snapshots the clock once,
//! and evaluates every schedule in stored order. A positive decision
//! hands the alert to the notifier and, only after the acknowledgment
//! completes, marks the schedule fired for today. A failure for one
//! schedule never stops the sweep or the loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::clock::Clock;
use crate::config::clamp_interval;
use crate::engine::{self, Decision, SkipReason};
use crate::error::DaybellError;
use crate::notify::Notifier;
use crate::store::ScheduleStore;

/// Result of evaluating one schedule during a sweep.
#[derive(Debug)]
pub enum SweepOutcome {
    /// Alert shown, acknowledged, and marked fired for today.
    Fired { title: String },
    /// Not due; carries the engine's reason.
    Skipped(SkipReason),
    /// Evaluating or firing this schedule failed; the sweep moved on.
    Failed(DaybellError),
}

/// The background poll driver. `spawn` moves it onto a tokio task;
/// the returned [`WorkerHandle`] is the only way to stop it.
pub struct PollWorker {
    store: Arc<Mutex<ScheduleStore>>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    /// Shared cadence in seconds; writes are picked up before the next
    /// sleep, never mid-sleep.
    interval_secs: Arc<AtomicU64>,
    lead: Duration,
}

impl PollWorker {
    pub fn new(
        store: Arc<Mutex<ScheduleStore>>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        interval_secs: Arc<AtomicU64>,
        lead_secs: u64,
    ) -> Self {
        Self {
            store,
            clock,
            notifier,
            interval_secs,
            lead: Duration::seconds(lead_secs as i64),
        }
    }

    /// Start ticking (Stopped → Running).
    pub fn spawn(self) -> WorkerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            tracing::info!(
                "⏰ reminder worker started (check every {}s)",
                clamp_interval(self.interval_secs.load(Ordering::Relaxed))
            );
            loop {
                if *shutdown_rx.borrow() {
                    break;
                }
                let secs = clamp_interval(self.interval_secs.load(Ordering::Relaxed));
                let outcomes = run_sweep(
                    &self.store,
                    self.clock.as_ref(),
                    self.notifier.as_ref(),
                    self.lead,
                    Duration::seconds(secs as i64),
                )
                .await;
                for outcome in &outcomes {
                    if let SweepOutcome::Failed(e) = outcome {
                        tracing::warn!("⚠️ {e}");
                    }
                }
                tokio::select! {
                    _ = tokio::time::sleep(StdDuration::from_secs(secs)) => {}
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() {
                            // Handle dropped without stop(); nothing can
                            // reach us anymore.
                            break;
                        }
                    }
                }
            }
            tracing::info!("⏰ reminder worker stopped");
        });
        WorkerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Running-worker handle (Running → Stopped).
pub struct WorkerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Signal the loop to stop and wait, bounded by `timeout`, for the
    /// in-flight sweep to finish. Cooperative: an alert currently on
    /// screen is not interrupted. Returns whether the worker exited in
    /// time.
    pub async fn stop(self, timeout: StdDuration) -> bool {
        let _ = self.shutdown.send(true);
        match tokio::time::timeout(timeout, self.task).await {
            Ok(_) => true,
            Err(_) => {
                tracing::warn!("⚠️ worker did not stop within {timeout:?}; detaching");
                false
            }
        }
    }
}

/// One full pass over the collection. Public so tests (and diagnostics)
/// can drive single sweeps deterministically.
pub async fn run_sweep(
    store: &Mutex<ScheduleStore>,
    clock: &dyn Clock,
    notifier: &dyn Notifier,
    lead_base: Duration,
    poll_interval: Duration,
) -> Vec<SweepOutcome> {
    let now = clock.now();
    let today = now.date_naive();
    // Snapshot under the lock, evaluate outside it: the foreground also
    // takes this lock (add/remove/toggle) and, for the channel notifier,
    // produces the very acknowledgment a fire waits on.
    let snapshot = { store.lock().await.schedules().to_vec() };

    let mut outcomes = Vec::with_capacity(snapshot.len());
    for (index, schedule) in snapshot.iter().enumerate() {
        match engine::evaluate(now, schedule, lead_base, poll_interval) {
            Decision::Fire { target } => {
                tracing::info!("🔔 reminder due: '{}' (target {})", schedule.title, target);
                match notifier.present(&schedule.title, target).await {
                    Ok(()) => {
                        let mut guard = store.lock().await;
                        let unchanged = guard
                            .get(index)
                            .is_some_and(|s| s.title == schedule.title);
                        if unchanged {
                            match guard.mark_fired(index, today) {
                                Ok(()) => outcomes.push(SweepOutcome::Fired {
                                    title: schedule.title.clone(),
                                }),
                                Err(e) => outcomes.push(SweepOutcome::Failed(e)),
                            }
                        } else {
                            // User edited the list while the alert was up.
                            // Not marking is the safe direction: a still-
                            // eligible schedule simply fires again.
                            outcomes.push(SweepOutcome::Failed(DaybellError::Evaluation {
                                title: schedule.title.clone(),
                                reason: "schedule list changed during presentation; not marking"
                                    .into(),
                            }));
                        }
                    }
                    Err(e) => outcomes.push(SweepOutcome::Failed(e)),
                }
            }
            Decision::Skip(reason) => outcomes.push(SweepOutcome::Skipped(reason)),
        }
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::error::Result;
    use crate::schedule::Schedule;
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, TimeZone};
    use chrono_tz::Asia::Seoul;
    use chrono_tz::Tz;
    use std::path::PathBuf;
    use std::sync::Mutex as StdMutex;

    struct TestClock(StdMutex<DateTime<Tz>>);

    impl TestClock {
        fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Self {
            Self(StdMutex::new(
                Seoul.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap(),
            ))
        }

        fn set(&self, y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) {
            *self.0.lock().unwrap() = Seoul.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap();
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> DateTime<Tz> {
            *self.0.lock().unwrap()
        }
    }

    /// Acknowledges immediately and records what it presented.
    #[derive(Default)]
    struct AutoAck {
        fired: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for AutoAck {
        async fn present(&self, title: &str, _target: DateTime<Tz>) -> Result<()> {
            self.fired.lock().unwrap().push(title.to_string());
            Ok(())
        }
    }

    /// Fails for one title, acknowledges the rest.
    struct FailFor {
        bad_title: &'static str,
    }

    #[async_trait]
    impl Notifier for FailFor {
        async fn present(&self, title: &str, _target: DateTime<Tz>) -> Result<()> {
            if title == self.bad_title {
                Err(DaybellError::Evaluation {
                    title: title.to_string(),
                    reason: "popup machinery broke".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn temp_store(tag: &str) -> (PathBuf, Arc<Mutex<ScheduleStore>>) {
        let dir = std::env::temp_dir().join(format!("daybell-test-worker-{tag}"));
        std::fs::remove_dir_all(&dir).ok();
        let store = ScheduleStore::open(&dir);
        (dir, Arc::new(Mutex::new(store)))
    }

    fn lead() -> Duration {
        Duration::minutes(5)
    }

    fn tick() -> Duration {
        Duration::seconds(30)
    }

    #[tokio::test]
    async fn test_standup_scenario_fires_dedups_refires() {
        let (dir, store) = temp_store("standup");
        store
            .lock()
            .await
            .add(Schedule::new("standup", "09:00", &[0, 1, 2, 3, 4]).unwrap())
            .unwrap();
        let clock = TestClock::at(2024, 6, 3, 8, 54, 31); // Monday, inside window
        let notifier = AutoAck::default();

        let outcomes = run_sweep(&store, &clock, &notifier, lead(), tick()).await;
        assert!(matches!(outcomes[0], SweepOutcome::Fired { .. }));
        assert_eq!(
            store.lock().await.get(0).unwrap().last_fired_date,
            NaiveDate::from_ymd_opt(2024, 6, 3)
        );

        // Next sweep, same day: dedup gate holds.
        clock.set(2024, 6, 3, 8, 55, 1);
        let outcomes = run_sweep(&store, &clock, &notifier, lead(), tick()).await;
        assert!(matches!(
            outcomes[0],
            SweepOutcome::Skipped(SkipReason::AlreadyFiredToday)
        ));

        // Next day, same window: fires again.
        clock.set(2024, 6, 4, 8, 54, 31);
        let outcomes = run_sweep(&store, &clock, &notifier, lead(), tick()).await;
        assert!(matches!(outcomes[0], SweepOutcome::Fired { .. }));
        assert_eq!(notifier.fired.lock().unwrap().len(), 2);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_one_bad_schedule_does_not_stop_the_sweep() {
        let (dir, store) = temp_store("resilience");
        {
            let mut guard = store.lock().await;
            guard
                .add(Schedule::new("bad", "09:00", &[0]).unwrap())
                .unwrap();
            guard
                .add(Schedule::new("good", "09:00", &[0]).unwrap())
                .unwrap();
        }
        let clock = TestClock::at(2024, 6, 3, 8, 55, 0);
        let notifier = FailFor { bad_title: "bad" };

        let outcomes = run_sweep(&store, &clock, &notifier, lead(), tick()).await;
        assert!(matches!(outcomes[0], SweepOutcome::Failed(_)));
        assert!(matches!(outcomes[1], SweepOutcome::Fired { .. }));

        let guard = store.lock().await;
        // Unacknowledged alert leaves the dedup state untouched.
        assert_eq!(guard.get(0).unwrap().last_fired_date, None);
        assert!(guard.get(1).unwrap().last_fired_date.is_some());
        drop(guard);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_unacknowledged_alert_refires_next_sweep() {
        let (dir, store) = temp_store("refire");
        store
            .lock()
            .await
            .add(Schedule::new("standup", "09:00", &[0]).unwrap())
            .unwrap();
        let clock = TestClock::at(2024, 6, 3, 8, 55, 0);

        let outcomes = run_sweep(&store, &clock, &FailFor { bad_title: "standup" }, lead(), tick()).await;
        assert!(matches!(outcomes[0], SweepOutcome::Failed(_)));

        // The next sweep still sees it as due.
        let notifier = AutoAck::default();
        let outcomes = run_sweep(&store, &clock, &notifier, lead(), tick()).await;
        assert!(matches!(outcomes[0], SweepOutcome::Fired { .. }));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_edit_during_presentation_skips_the_mark() {
        struct RemoveWhileUp {
            store: Arc<Mutex<ScheduleStore>>,
        }

        #[async_trait]
        impl Notifier for RemoveWhileUp {
            async fn present(&self, _title: &str, _target: DateTime<Tz>) -> Result<()> {
                self.store.lock().await.remove(0).unwrap();
                Ok(())
            }
        }

        let (dir, store) = temp_store("edit-race");
        store
            .lock()
            .await
            .add(Schedule::new("standup", "09:00", &[0]).unwrap())
            .unwrap();
        let clock = TestClock::at(2024, 6, 3, 8, 55, 0);
        let notifier = RemoveWhileUp {
            store: store.clone(),
        };

        let outcomes = run_sweep(&store, &clock, &notifier, lead(), tick()).await;
        assert!(matches!(outcomes[0], SweepOutcome::Failed(_)));
        assert!(store.lock().await.is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_stop_is_bounded() {
        let (dir, store) = temp_store("stop");
        let worker = PollWorker::new(
            store,
            Arc::new(SystemClock::new(chrono_tz::Asia::Seoul)),
            Arc::new(AutoAck::default()),
            Arc::new(AtomicU64::new(600)),
            300,
        );
        let handle = worker.spawn();
        // Give the first sweep a chance to run, then stop mid-sleep.
        tokio::time::sleep(StdDuration::from_millis(50)).await;
        assert!(handle.stop(StdDuration::from_secs(2)).await);
        std::fs::remove_dir_all(&dir).ok();
    }
}
