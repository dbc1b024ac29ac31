//! Items: the assignments and events a feed is made of.

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::ics::CalendarEvent;
use crate::occurrence::occurrence_token;

/// What kind of thing an item is, taken from its Schoology link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Assignment,
    Discussion,
    Assessment,
    Event,
    /// Any other Schoology path word (`page`, `album`, ...).
    Other(String),
}

impl ItemKind {
    pub fn from_link_type(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "assignment" => ItemKind::Assignment,
            "discussion" => ItemKind::Discussion,
            "assessment" => ItemKind::Assessment,
            "event" => ItemKind::Event,
            other => ItemKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ItemKind::Assignment => "assignment",
            ItemKind::Discussion => "discussion",
            ItemKind::Assessment => "assessment",
            ItemKind::Event => "event",
            ItemKind::Other(s) => s,
        }
    }

    /// Kinds that carry a "Mark as Done" link.
    pub fn is_completable(&self) -> bool {
        matches!(self, ItemKind::Assignment | ItemKind::Discussion)
    }
}

/// Where an item came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// From the upstream feed. `uid` is the feed's UID for the component.
    Upstream { uid: String },
    /// Created locally on the custom events page.
    Custom,
}

/// Completion state, rendered as a symbol in front of the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Done,
    Pending,
    Overdue,
    Discussion,
    Disabled,
    Unknown,
}

impl Status {
    pub fn symbol(&self) -> &'static str {
        match self {
            Status::Done => "✅",
            Status::Pending => "⚠️",
            Status::Overdue => "‼️",
            Status::Discussion => "💬",
            Status::Disabled => "-",
            Status::Unknown => "?",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Status::Done)
    }

    /// The not-yet-done status for something due at `due`.
    pub fn uncompleted(due: DateTime<Tz>, now: DateTime<Tz>) -> Self {
        if due < now {
            Status::Overdue
        } else {
            Status::Pending
        }
    }
}

/// One assignment or event, reshaped for the output feed.
#[derive(Debug, Clone)]
pub struct Item {
    /// Schoology item id, or `cst-<millis>` for custom events.
    pub id: String,
    pub kind: ItemKind,
    pub source: Source,
    pub title: String,
    pub description: String,
    pub course: Option<String>,
    pub section_id: Option<String>,
    /// Original due time in local time. Never moved by retiming.
    pub due: DateTime<Tz>,
    /// Where the item sits on the calendar. Starts out equal to `due`.
    pub start: DateTime<Tz>,
    /// False for date-only entries, whose `due` is local midnight.
    pub timed: bool,
    /// Whether `start` was moved away from the upstream time.
    pub retimed: bool,
    pub status: Status,
    /// The upstream component, kept so unknown properties survive.
    pub raw: Option<CalendarEvent>,
}

impl Item {
    pub fn due_date(&self) -> NaiveDate {
        self.due.date_naive()
    }

    pub fn occurrence(&self) -> String {
        occurrence_token(self.due)
    }

    pub fn is_custom(&self) -> bool {
        matches!(self.source, Source::Custom)
    }

    /// Course name without the section suffix (`"Biology - P3"` -> `"Biology"`).
    pub fn course_short_name(&self) -> Option<&str> {
        self.course
            .as_deref()
            .map(|c| c.split(" - ").next().unwrap_or(c))
    }

    /// Symbol shown in front of the summary.
    pub fn summary_prefix(&self) -> &'static str {
        match &self.kind {
            ItemKind::Assignment => self.status.symbol(),
            ItemKind::Discussion if self.status.is_done() => Status::Done.symbol(),
            ItemKind::Discussion => Status::Discussion.symbol(),
            ItemKind::Assessment => "🧪",
            ItemKind::Event => "🗓",
            ItemKind::Other(_) => "🤷",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::Los_Angeles;

    fn item(kind: ItemKind, status: Status) -> Item {
        let due = Los_Angeles.with_ymd_and_hms(2025, 3, 4, 23, 59, 0).unwrap();
        Item {
            id: "7001".into(),
            kind,
            source: Source::Upstream { uid: "u-1".into() },
            title: "Lab report".into(),
            description: String::new(),
            course: Some("Chemistry - P2".into()),
            section_id: Some("55".into()),
            due,
            start: due,
            timed: true,
            retimed: false,
            status,
            raw: None,
        }
    }

    #[test]
    fn test_summary_prefix_per_kind() {
        assert_eq!(item(ItemKind::Assignment, Status::Overdue).summary_prefix(), "‼️");
        assert_eq!(item(ItemKind::Discussion, Status::Pending).summary_prefix(), "💬");
        assert_eq!(item(ItemKind::Discussion, Status::Done).summary_prefix(), "✅");
        assert_eq!(item(ItemKind::Assessment, Status::Unknown).summary_prefix(), "🧪");
        assert_eq!(item(ItemKind::Event, Status::Unknown).summary_prefix(), "🗓");
        assert_eq!(
            item(ItemKind::Other("page".into()), Status::Unknown).summary_prefix(),
            "🤷"
        );
    }

    #[test]
    fn test_course_short_name_drops_section() {
        let it = item(ItemKind::Assignment, Status::Pending);
        assert_eq!(it.course_short_name(), Some("Chemistry"));
    }

    #[test]
    fn test_kind_from_link_type_is_case_insensitive() {
        assert_eq!(ItemKind::from_link_type("Assignment"), ItemKind::Assignment);
        assert_eq!(ItemKind::from_link_type("page"), ItemKind::Other("page".into()));
    }

    #[test]
    fn test_uncompleted_depends_on_now() {
        let due = Los_Angeles.with_ymd_and_hms(2025, 3, 4, 12, 0, 0).unwrap();
        let before = Los_Angeles.with_ymd_and_hms(2025, 3, 4, 11, 0, 0).unwrap();
        let after = Los_Angeles.with_ymd_and_hms(2025, 3, 4, 13, 0, 0).unwrap();

        assert_eq!(Status::uncompleted(due, before), Status::Pending);
        assert_eq!(Status::uncompleted(due, after), Status::Overdue);
    }
}
