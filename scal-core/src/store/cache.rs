//! `schoology_cache.json`: section names, item ownership and submission checks.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub const CACHE_FILE: &str = "schoology_cache.json";

/// Result of one submission check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    #[serde(default)]
    pub has_submission: bool,

    #[serde(default)]
    pub submissions_disabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_dropbox: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropbox_locked: Option<bool>,

    #[serde(default, deserialize_with = "lenient_datetime")]
    pub checked_at: Option<DateTime<Utc>>,
}

impl SubmissionRecord {
    pub fn is_disabled(&self) -> bool {
        self.submissions_disabled
            || self.allow_dropbox == Some(false)
            || self.dropbox_locked == Some(true)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamCache {
    #[serde(default)]
    pub section_id_to_name: BTreeMap<String, String>,

    #[serde(default)]
    pub item_id_to_section: BTreeMap<String, String>,

    #[serde(default)]
    pub assignment_submissions: BTreeMap<String, SubmissionRecord>,

    #[serde(default, deserialize_with = "lenient_datetime")]
    pub generated_at: Option<DateTime<Utc>>,
}

impl UpstreamCache {
    /// Both maps are populated.
    pub fn has_catalog(&self) -> bool {
        !self.section_id_to_name.is_empty() && !self.item_id_to_section.is_empty()
    }

    pub fn section_of(&self, item_id: &str) -> Option<&str> {
        self.item_id_to_section.get(item_id).map(String::as_str)
    }

    pub fn section_name(&self, section_id: &str) -> Option<&str> {
        self.section_id_to_name.get(section_id).map(String::as_str)
    }
}

/// RFC 3339, or the naive ISO timestamps older files hold (read as UTC).
fn lenient_datetime<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|n| n.and_utc())
            })
    }))
}
