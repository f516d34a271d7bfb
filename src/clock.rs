//! Wall-clock access pinned to the fixed target timezone.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Source of the current wall-clock time.
///
/// The whole scheduler reasons in one fixed target zone; everything
/// downstream of `now()` is zone-aware. Tests substitute a fixed clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Tz>;
}

/// System clock converted into the target timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }
}
