//! File-backed schedule store — owns the collection and its persistence.
//!
//! Every mutation persists the full collection immediately; the set is
//! small and human-entered, so there is no batching and no journal. A
//! missing or unreadable file loads as an empty collection so that a
//! corrupt store can never prevent startup.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DaybellError, Result};
use crate::schedule::Schedule;

/// File name of the schedule store, both in the config directory and in
/// the legacy working-directory location.
pub const STORE_FILE: &str = "schedules.json";

#[derive(Debug, Default, Deserialize)]
struct StoreFile {
    #[serde(default)]
    schedules: Vec<Schedule>,
}

#[derive(Serialize)]
struct StoreFileRef<'a> {
    schedules: &'a [Schedule],
}

/// Owns the in-memory schedule collection and the backing JSON file.
pub struct ScheduleStore {
    path: PathBuf,
    schedules: Vec<Schedule>,
}

impl ScheduleStore {
    /// Open (or create) the store under the given directory, migrating a
    /// legacy working-directory file if the new location is still empty.
    pub fn open(dir: &Path) -> Self {
        std::fs::create_dir_all(dir).ok();
        let path = dir.join(STORE_FILE);
        migrate_legacy(&path, Path::new(STORE_FILE));
        let schedules = load_file(&path);
        Self { path, schedules }
    }

    pub fn schedules(&self) -> &[Schedule] {
        &self.schedules
    }

    pub fn get(&self, index: usize) -> Option<&Schedule> {
        self.schedules.get(index)
    }

    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }

    /// Validate and append a schedule. Nothing is appended on failure.
    pub fn add(&mut self, schedule: Schedule) -> Result<()> {
        schedule.validate()?;
        tracing::info!("📅 schedule added: '{}' at {}", schedule.title, schedule.time_str);
        self.schedules.push(schedule);
        self.persist();
        Ok(())
    }

    /// Remove the schedule at `index`, returning it.
    pub fn remove(&mut self, index: usize) -> Result<Schedule> {
        self.check_bounds(index)?;
        let removed = self.schedules.remove(index);
        tracing::info!("🗑️ schedule removed: '{}'", removed.title);
        self.persist();
        Ok(removed)
    }

    /// Flip the enabled flag at `index`; returns the new state.
    pub fn toggle(&mut self, index: usize) -> Result<bool> {
        self.check_bounds(index)?;
        let schedule = &mut self.schedules[index];
        schedule.active = !schedule.active;
        let state = schedule.active;
        tracing::info!(
            "schedule '{}' {}",
            schedule.title,
            if state { "enabled" } else { "disabled" }
        );
        self.persist();
        Ok(state)
    }

    /// Record that the schedule at `index` fired on `date`.
    ///
    /// Call only after the alert was acknowledged; marking earlier could
    /// persist a "fired" day whose alert the user never saw.
    pub fn mark_fired(&mut self, index: usize, date: NaiveDate) -> Result<()> {
        self.check_bounds(index)?;
        self.schedules[index].last_fired_date = Some(date);
        self.persist();
        Ok(())
    }

    /// Write the full collection to disk.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&StoreFileRef {
            schedules: &self.schedules,
        })
        .map_err(|e| DaybellError::Persistence(format!("serialize: {e}")))?;
        std::fs::write(&self.path, json)
            .map_err(|e| DaybellError::Persistence(format!("write {}: {e}", self.path.display())))?;
        tracing::debug!("💾 saved {} schedules to {}", self.schedules.len(), self.path.display());
        Ok(())
    }

    // A failed persist is a warning, not a rollback: the in-memory
    // collection stays authoritative for the session.
    fn persist(&self) {
        if let Err(e) = self.save() {
            tracing::warn!("⚠️ {e}");
        }
    }

    fn check_bounds(&self, index: usize) -> Result<()> {
        if index < self.schedules.len() {
            Ok(())
        } else {
            Err(DaybellError::IndexOutOfBounds {
                index,
                len: self.schedules.len(),
            })
        }
    }
}

/// Load the collection, treating a missing, unreadable or malformed file
/// as empty.
fn load_file(path: &Path) -> Vec<Schedule> {
    if !path.exists() {
        return Vec::new();
    }
    match std::fs::read_to_string(path) {
        Ok(json) => match serde_json::from_str::<StoreFile>(&json) {
            Ok(file) => {
                // Hand-edited files can carry records that creation
                // validation would have rejected (day 9, empty day set).
                // Keep the rest of the collection usable.
                let mut schedules = file.schedules;
                schedules.retain(|s| match s.validate() {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!("⚠️ dropping stored schedule '{}': {e}", s.title);
                        false
                    }
                });
                schedules
            }
            Err(e) => {
                tracing::warn!("⚠️ failed to parse {}: {e}; starting empty", path.display());
                Vec::new()
            }
        },
        Err(e) => {
            tracing::warn!("⚠️ failed to read {}: {e}; starting empty", path.display());
            Vec::new()
        }
    }
}

/// One-time migration: copy a legacy same-directory schedules file into
/// the config location, but only when the new location has no file yet.
fn migrate_legacy(target: &Path, legacy: &Path) {
    if target.exists() || !legacy.exists() {
        return;
    }
    match std::fs::copy(legacy, target) {
        Ok(_) => tracing::info!(
            "migrated legacy schedule file {} → {}",
            legacy.display(),
            target.display()
        ),
        Err(e) => tracing::warn!("⚠️ legacy migration failed: {e}"),
    }
}
