//! Completion status for one item.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::config::ScalConfig;
use crate::item::{Item, ItemKind, Status};
use crate::store::{Store, SubmissionRecord};
use crate::upstream::Upstream;

pub struct StatusResolver<'a> {
    pub config: &'a ScalConfig,
    pub store: &'a Store,
    pub upstream: &'a dyn Upstream,
    pub now: DateTime<Utc>,
}

impl StatusResolver<'_> {
    fn local_now(&self) -> DateTime<Tz> {
        self.now.with_timezone(&self.config.tz())
    }

    fn is_fresh(&self, record: &SubmissionRecord) -> bool {
        record.checked_at.is_some_and(|at| {
            self.now - at <= Duration::seconds(self.config.submission_cache_max_age_secs)
        })
    }

    /// Marks win, then cached answers, then a live submission check. Only
    /// assignments ever reach the API.
    pub async fn resolve_status(&self, item: &Item) -> Status {
        let pending = Status::uncompleted(item.due, self.local_now());

        if self.store.is_marked(&item.id, Some(&item.occurrence())) {
            return Status::Done;
        }

        if item.is_custom() || !item.kind.is_completable() {
            return pending;
        }

        let cached = self.store.cached_submission(&item.id);

        if cached.as_ref().is_some_and(|r| r.has_submission) {
            return Status::Done;
        }

        if item.kind == ItemKind::Discussion {
            return Status::Discussion;
        }

        if self.config.user_id().is_none() {
            return Status::Unknown;
        }

        if let Some(record) = &cached {
            if record.is_disabled() {
                return Status::Disabled;
            }
            if self.is_fresh(record) {
                return pending;
            }
        }

        let Some(section_id) = item.section_id.as_deref() else {
            return pending;
        };

        match self.upstream.submission(section_id, &item.id).await {
            Ok(check) => {
                debug!(item_id = %item.id, ?check, "Checked submission");
                let record = SubmissionRecord {
                    has_submission: check.has_submission,
                    submissions_disabled: check.submissions_disabled,
                    checked_at: Some(self.now),
                    ..Default::default()
                };
                if let Err(e) = self.store.record_submission(&item.id, record) {
                    warn!(item_id = %item.id, error = %e, "Could not cache submission check");
                }

                if check.has_submission {
                    Status::Done
                } else if check.submissions_disabled {
                    Status::Disabled
                } else {
                    pending
                }
            }
            Err(e) => {
                warn!(item_id = %item.id, error = %e, "Submission check failed");
                Status::Unknown
            }
        }
    }
}
