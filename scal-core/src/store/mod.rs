//! Local state on disk.
//!
//! Two JSON files live in the data directory: `user_data.json` (marks,
//! custom events, settings) and `schoology_cache.json` (catalog and
//! submission checks). Both are kept in memory and rewritten whole on every
//! change via a temp file and rename.

mod cache;
mod user_data;

pub use cache::{CACHE_FILE, SubmissionRecord, UpstreamCache};
pub use user_data::{EffectiveSettings, Settings, USER_DATA_FILE, UserData};

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{info, warn};

use crate::custom::{CustomEvent, CustomEventDraft};
use crate::error::{ScalError, ScalResult};
use crate::occurrence::{mark_key, normalize_token};
use crate::schedule::parse_hhmm;

/// Counts shown on the dashboard, from cached checks and marks only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub total: usize,
    pub submitted: usize,
    pub unsubmitted: usize,
    /// Needs due dates, which the cache doesn't keep.
    pub overdue: usize,
}

pub struct Store {
    dir: PathBuf,
    user: Mutex<UserData>,
    cache: Mutex<UpstreamCache>,
}

impl Store {
    pub fn open(dir: impl Into<PathBuf>) -> ScalResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let user_path = dir.join(USER_DATA_FILE);
        let user: UserData = read_json_or_default(&user_path);
        if stored_custom_event_count(&user_path) > user.custom_events.len() {
            keep_copy(&user_path);
        }
        let cache = read_json_or_default(&dir.join(CACHE_FILE));

        Ok(Store {
            dir,
            user: Mutex::new(user),
            cache: Mutex::new(cache),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn update_user<T>(&self, f: impl FnOnce(&mut UserData) -> ScalResult<T>) -> ScalResult<T> {
        let mut guard = self.user.lock();
        let mut next = guard.clone();
        let out = f(&mut next)?;
        write_json_atomic(&self.dir.join(USER_DATA_FILE), &next)?;
        *guard = next;
        Ok(out)
    }

    /// Edit the cache in place while holding its lock, then persist it.
    pub fn update_cache<T>(&self, f: impl FnOnce(&mut UpstreamCache) -> T) -> ScalResult<T> {
        let mut guard = self.cache.lock();
        let mut next = guard.clone();
        let out = f(&mut next);
        write_json_atomic(&self.dir.join(CACHE_FILE), &next)?;
        *guard = next;
        Ok(out)
    }

    // --- marks ---

    /// Mark an item (or one occurrence of it) done. Returns false if it
    /// already was; marking twice leaves the same state as marking once.
    pub fn mark_done(&self, item_id: &str, occurrence: Option<&str>) -> ScalResult<bool> {
        let token = normalize_token(occurrence);
        let key = mark_key(item_id, token.as_deref());

        let added = self.update_user(|data| Ok(data.manual_done.insert(key.clone())))?;
        if added {
            info!(item_id, occurrence = ?token, "Marked done");
        }
        Ok(added)
    }

    /// Remove a mark. Returns false if there was nothing to remove.
    pub fn unmark_done(&self, item_id: &str, occurrence: Option<&str>) -> ScalResult<bool> {
        let token = normalize_token(occurrence);
        let key = mark_key(item_id, token.as_deref());

        let removed = self.update_user(|data| Ok(data.manual_done.remove(&key)))?;
        if removed {
            info!(item_id, occurrence = ?token, "Unmarked done");
        } else {
            info!(item_id, occurrence = ?token, "Was not marked done");
        }
        Ok(removed)
    }

    /// True if this occurrence, or the item as a whole, is marked.
    pub fn is_marked(&self, item_id: &str, occurrence: Option<&str>) -> bool {
        let data = self.user.lock();
        let occurrence_marked = normalize_token(occurrence)
            .map(|tok| data.manual_done.contains(&mark_key(item_id, Some(&tok))))
            .unwrap_or(false);
        occurrence_marked || data.manual_done.contains(item_id)
    }

    pub fn marks(&self) -> BTreeSet<String> {
        self.user.lock().manual_done.clone()
    }

    // --- custom events ---

    pub fn custom_events(&self) -> Vec<CustomEvent> {
        self.user.lock().custom_events.clone()
    }

    pub fn custom_event(&self, id: &str) -> Option<CustomEvent> {
        self.user
            .lock()
            .custom_events
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }

    pub fn add_custom_event(&self, draft: &CustomEventDraft) -> ScalResult<CustomEvent> {
        let fields = draft.validate()?;

        let event = self.update_user(|data| {
            let mut millis = Utc::now().timestamp_millis();
            while data.custom_events.iter().any(|e| e.id == format!("cst-{millis}")) {
                millis += 1;
            }
            let event = CustomEvent::new(format!("cst-{millis}"), fields);
            data.custom_events.push(event.clone());
            Ok(event)
        })?;

        info!(id = %event.id, name = %event.name, "Added custom event");
        Ok(event)
    }

    pub fn update_custom_event(&self, id: &str, draft: &CustomEventDraft) -> ScalResult<CustomEvent> {
        let fields = draft.validate()?;

        self.update_user(|data| {
            let event = data
                .custom_events
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| ScalError::NotFound(format!("Custom event {id}")))?;
            event.apply(fields);
            Ok(event.clone())
        })
    }

    /// Returns false if no event had that id.
    pub fn remove_custom_event(&self, id: &str) -> ScalResult<bool> {
        let removed = self.update_user(|data| {
            let before = data.custom_events.len();
            data.custom_events.retain(|e| e.id != id);
            Ok(data.custom_events.len() != before)
        })?;
        if removed {
            info!(id, "Removed custom event");
        }
        Ok(removed)
    }

    // --- settings ---

    pub fn settings(&self) -> Settings {
        self.user.lock().settings.clone()
    }

    /// `stack_start_time` must be `HH:MM`; it is stored zero-padded.
    pub fn update_settings(
        &self,
        stack_events: Option<bool>,
        stack_start_time: Option<&str>,
    ) -> ScalResult<Settings> {
        let start = match stack_start_time.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(
                parse_hhmm(raw)
                    .ok_or_else(|| ScalError::InvalidInput(format!("Start time must be HH:MM, got '{raw}'")))?
                    .format("%H:%M")
                    .to_string(),
            ),
            None => None,
        };

        self.update_user(|data| {
            if let Some(stack) = stack_events {
                data.settings.stack_events = Some(stack);
            }
            if let Some(start) = start {
                data.settings.stack_start_time = Some(start);
            }
            Ok(data.settings.clone())
        })
    }

    // --- upstream cache ---

    pub fn cache(&self) -> UpstreamCache {
        self.cache.lock().clone()
    }

    pub fn record_submission(&self, item_id: &str, record: SubmissionRecord) -> ScalResult<()> {
        self.update_cache(|cache| {
            cache
                .assignment_submissions
                .insert(item_id.to_string(), record);
        })
    }

    pub fn cached_submission(&self, item_id: &str) -> Option<SubmissionRecord> {
        self.cache.lock().assignment_submissions.get(item_id).cloned()
    }

    pub fn catalog_generated_at(&self) -> Option<DateTime<Utc>> {
        self.cache.lock().generated_at
    }

    /// Dashboard counts. Disabled items count toward neither side.
    pub fn metrics(&self) -> Metrics {
        let marked_ids: BTreeSet<String> = self
            .marks()
            .into_iter()
            .map(|k| k.split('@').next().unwrap_or_default().to_string())
            .collect();
        let cache = self.cache.lock();

        let mut metrics = Metrics::default();
        for (id, record) in &cache.assignment_submissions {
            if marked_ids.contains(id) || record.has_submission {
                metrics.submitted += 1;
            } else if !record.is_disabled() {
                metrics.unsubmitted += 1;
            }
        }
        metrics.total = metrics.submitted + metrics.unsubmitted;
        metrics
    }
}

/// A missing file is empty state; an unreadable one is logged and treated the same.
fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read state file");
            return T::default();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "State file is corrupt, starting empty");
        keep_copy(path);
        T::default()
    })
}

fn stored_custom_event_count(path: &Path) -> usize {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).ok())
        .and_then(|v| v.get("custom_events").and_then(|e| e.as_array()).map(Vec::len))
        .unwrap_or(0)
}

/// Copy a state file that could not be read in full to `<name>.corrupt`
/// before the next write replaces it. An existing copy is never overwritten.
fn keep_copy(path: &Path) {
    let backup = path.with_extension("json.corrupt");
    if backup.exists() {
        return;
    }
    match std::fs::copy(path, &backup) {
        Ok(_) => warn!(backup = %backup.display(), "Kept a copy of the unreadable state file"),
        Err(e) => warn!(path = %path.display(), error = %e, "Could not copy unreadable state file"),
    }
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> ScalResult<()> {
    let content = serde_json::to_string_pretty(value)?;
    let temp = path.with_extension("json.tmp");

    std::fs::write(&temp, content)?;
    std::fs::rename(&temp, path)?;
    Ok(())
}
