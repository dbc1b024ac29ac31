//! The seam between reshaping and the Schoology API.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer};

use crate::error::ScalResult;

/// Page size for the user events endpoint.
pub const EVENTS_PAGE_SIZE: usize = 500;

/// A course section the user is enrolled in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Section {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub course_title: String,
    #[serde(default)]
    pub section_title: String,
}

impl Section {
    /// `"Course - Section"`, without a dangling separator when one is blank.
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.course_title, self.section_title)
            .trim_matches(|c: char| c == ' ' || c == '-')
            .to_string()
    }
}

/// One entry from the user events endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpstreamEvent {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub assignment_id: Option<String>,

    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub section_id: Option<String>,

    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub realm_id: Option<String>,

    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub start: Option<String>,
}

impl UpstreamEvent {
    pub fn is_assignment(&self) -> bool {
        self.kind
            .as_deref()
            .is_some_and(|k| k.eq_ignore_ascii_case("assignment"))
    }

    /// The id submissions are keyed by: `assignment_id` when present.
    pub fn assignment_key(&self) -> &str {
        self.assignment_id.as_deref().unwrap_or(&self.id)
    }

    /// Parse `start`, which shows up as epoch seconds, RFC 3339 or a few
    /// naive layouts read as local time.
    pub fn start_in(&self, tz: Tz) -> Option<DateTime<Tz>> {
        parse_flexible(self.start.as_deref()?, tz)
    }
}

/// Result of a submission lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionCheck {
    pub has_submission: bool,
    pub submissions_disabled: bool,
}

#[async_trait]
pub trait Upstream: Send + Sync {
    /// GET the ICS export. Fails when the body is empty.
    async fn fetch_calendar(&self, url: &str) -> ScalResult<String>;

    async fn sections(&self) -> ScalResult<Vec<Section>>;

    /// All user events between the two dates, every page.
    async fn events(&self, from: NaiveDate, to: NaiveDate) -> ScalResult<Vec<UpstreamEvent>>;

    async fn submission(&self, section_id: &str, assignment_id: &str) -> ScalResult<SubmissionCheck>;
}

pub fn parse_flexible(raw: &str, tz: Tz) -> Option<DateTime<Tz>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(secs) = raw.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0).map(|dt| dt.with_timezone(&tz));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&tz));
    }

    let naive = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })?;

    tz.from_local_datetime(&naive).earliest()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Str(String),
    Int(i64),
    Float(f64),
}

impl From<StringOrNumber> for String {
    fn from(v: StringOrNumber) -> Self {
        match v {
            StringOrNumber::Str(s) => s,
            StringOrNumber::Int(i) => i.to_string(),
            StringOrNumber::Float(f) => f.to_string(),
        }
    }
}

/// Ids come back as numbers from some endpoints and strings from others.
fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(d).map(String::from)
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<StringOrNumber>::deserialize(d)?
        .map(String::from)
        .filter(|s| !s.is_empty()))
}
