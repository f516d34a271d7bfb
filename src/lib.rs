//! # daybell
//!
//! Local recurring reminder scheduler. Users define named events with a
//! target time-of-day and a set of active weekdays; daybell surfaces
//! exactly one acknowledgment-gated alert per event per calendar day,
//! fired inside a lead window ahead of the target time.
//!
//! ## Architecture
//! ```text
//! PollWorker (tokio task, sleeps poll_interval between sweeps)
//!   └── sweep: snapshot now, then for each schedule in stored order
//!         engine::evaluate(now, schedule, lead_base + poll_interval)
//!           ├── Skip(reason)     → next schedule
//!           └── Fire { target }  → Notifier::present
//!                                   (FireEvent → foreground context,
//!                                    blocks until acknowledged)
//!                                 → ScheduleStore::mark_fired(today)
//!                                 → persist schedules.json
//! ```
//!
//! The alert window is half-open: a schedule becomes eligible at
//! `target - (lead + poll_interval)` and stops being eligible at
//! `target`. The `+ poll_interval` term guarantees that ticks spaced
//! exactly by the interval cannot step over the window; a check landing
//! at the target itself has already missed its day and waits for the
//! next eligible one.
//!
//! All times live in one fixed target timezone (`Asia/Seoul` by
//! default). State is a single human-readable JSON file under
//! `~/.daybell`, rewritten in full on every mutation.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod notify;
pub mod schedule;
pub mod store;
pub mod worker;

pub use clock::{Clock, SystemClock};
pub use config::DaybellConfig;
pub use engine::{evaluate, should_fire, Decision, SkipReason};
pub use error::{DaybellError, Result};
pub use notify::{ChannelNotifier, FireEvent, Notifier};
pub use schedule::Schedule;
pub use store::ScheduleStore;
pub use worker::{run_sweep, PollWorker, SweepOutcome, WorkerHandle};
