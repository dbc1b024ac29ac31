//! Custom events: items created locally and merged into the feed.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ScalError, ScalResult};
use crate::item::{Item, ItemKind, Source, Status};
use crate::recurrence::Repeat;
use crate::schedule::{at_local, parse_hhmm};

/// Custom items are either something to hand in or something to attend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomKind {
    Assignment,
    #[default]
    #[serde(other)]
    Event,
}

impl CustomKind {
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("assignment") {
            CustomKind::Assignment
        } else {
            CustomKind::Event
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CustomKind::Assignment => "assignment",
            CustomKind::Event => "event",
        }
    }
}

/// A stored custom event, as kept in `user_data.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEvent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub course_name: String,
    #[serde(rename = "type", default)]
    pub kind: CustomKind,
    #[serde(with = "stored_date")]
    pub date: NaiveDate,
    /// Stored as `"HH:MM"`, or `""` for a date-only event.
    #[serde(default, with = "optional_hhmm")]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub repeat: Repeat,
    /// Keys written by older versions (e.g. `url`), kept on rewrite.
    #[serde(flatten)]
    pub legacy: serde_json::Map<String, serde_json::Value>,
}

/// Form input for creating or editing a custom event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomEventDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub course_name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub repeat: String,
}

/// Validated draft fields.
#[derive(Debug, Clone)]
pub struct CustomFields {
    pub name: String,
    pub description: String,
    pub course_name: String,
    pub kind: CustomKind,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub repeat: Repeat,
}

impl CustomEventDraft {
    /// Name and date are required; everything else has a default.
    pub fn validate(&self) -> ScalResult<CustomFields> {
        let name = self.name.trim();
        let date = self.date.trim();

        if name.is_empty() || date.is_empty() {
            return Err(ScalError::InvalidInput("Name and date are required.".into()));
        }

        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| ScalError::InvalidInput(format!("Date must be YYYY-MM-DD, got '{date}'")))?;

        let time = match self.time.trim() {
            "" => None,
            raw => Some(
                parse_hhmm(raw)
                    .ok_or_else(|| ScalError::InvalidInput(format!("Time must be HH:MM, got '{raw}'")))?,
            ),
        };

        Ok(CustomFields {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            course_name: self.course_name.trim().to_string(),
            kind: CustomKind::parse(&self.kind),
            date,
            time,
            repeat: Repeat::parse(&self.repeat),
        })
    }
}

impl CustomEvent {
    pub fn new(id: String, fields: CustomFields) -> Self {
        let mut event = CustomEvent {
            id,
            name: String::new(),
            description: String::new(),
            course_name: String::new(),
            kind: CustomKind::Event,
            date: fields.date,
            time: None,
            repeat: Repeat::None,
            legacy: serde_json::Map::new(),
        };
        event.apply(fields);
        event
    }

    /// Overwrite the editable fields, keeping id and legacy keys.
    pub fn apply(&mut self, fields: CustomFields) {
        self.name = fields.name;
        self.description = fields.description;
        self.course_name = fields.course_name;
        self.kind = fields.kind;
        self.date = fields.date;
        self.time = fields.time;
        self.repeat = fields.repeat;
    }

    /// Next date to show: repeating events roll forward to today or later.
    pub fn display_date(&self, today: NaiveDate) -> NaiveDate {
        self.repeat.roll_forward(self.date, today)
    }

    fn sort_key(&self, tz: Tz, today: NaiveDate) -> DateTime<Tz> {
        let time = self
            .time
            .or_else(|| NaiveTime::from_hms_opt(23, 59, 0))
            .unwrap_or(NaiveTime::MIN);
        at_local(tz, self.display_date(today), time)
    }

    /// One item per occurrence between today and `today + horizon_days`.
    pub fn to_items(&self, tz: Tz, today: NaiveDate, horizon_days: i64) -> Vec<Item> {
        let until = today + Duration::days(horizon_days);
        let kind = match self.kind {
            CustomKind::Assignment => ItemKind::Assignment,
            CustomKind::Event => ItemKind::Event,
        };
        let title = if self.name.trim().is_empty() {
            "Custom Item".to_string()
        } else {
            self.name.clone()
        };
        let course = Some(self.course_name.clone()).filter(|c| !c.is_empty());

        self.repeat
            .occurrences(self.date, today, until)
            .into_iter()
            .map(|date| {
                let due = at_local(tz, date, self.time.unwrap_or(NaiveTime::MIN));
                Item {
                    id: self.id.clone(),
                    kind: kind.clone(),
                    source: Source::Custom,
                    title: title.clone(),
                    description: self.description.clone(),
                    course: course.clone(),
                    section_id: None,
                    due,
                    start: due,
                    timed: self.time.is_some(),
                    retimed: false,
                    status: Status::Unknown,
                    raw: None,
                }
            })
            .collect()
    }
}

/// Upcoming events soonest first, then past ones most recent first.
pub fn display_order(mut events: Vec<CustomEvent>, now: DateTime<Tz>) -> Vec<CustomEvent> {
    let tz = now.timezone();
    let today = now.date_naive();

    events.sort_by_key(|e| e.sort_key(tz, today));
    let split = events.partition_point(|e| e.sort_key(tz, today) < now);
    let mut ordered = events.split_off(split);
    events.reverse();
    ordered.extend(events);
    ordered
}

/// Written as `YYYY-MM-DD`. Older files may hold `MM/DD/YYYY`,
/// `YYYY/MM/DD` or a full timestamp.
mod stored_date {
    use super::*;

    const FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        FORMATS
            .iter()
            .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
            .or_else(|| {
                raw.get(..10)
                    .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
            })
    }

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("unreadable date '{raw}'")))
    }
}

mod optional_hhmm {
    use super::*;

    pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => s.serialize_str(&t.format("%H:%M").to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        Ok(raw.as_deref().and_then(parse_hhmm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use chrono_tz::America::Los_Angeles;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn event(id: &str, date: NaiveDate, time: Option<&str>, repeat: Repeat) -> CustomEvent {
        CustomEvent {
            id: id.into(),
            name: format!("Event {id}"),
            description: String::new(),
            course_name: String::new(),
            kind: CustomKind::Event,
            date,
            time: time.and_then(parse_hhmm),
            repeat,
            legacy: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_draft_requires_name_and_date() {
        let draft = CustomEventDraft {
            name: "  ".into(),
            date: "2025-03-04".into(),
            ..Default::default()
        };
        let err = draft.validate().unwrap_err();
        assert!(matches!(err, ScalError::InvalidInput(_)));

        let draft = CustomEventDraft {
            name: "Study".into(),
            date: "".into(),
            ..Default::default()
        };
        assert!(draft.validate().is_err());
    }

    #[test]
    fn test_draft_defaults() {
        let draft = CustomEventDraft {
            name: " Study ".into(),
            date: "2025-03-04".into(),
            kind: "ASSIGNMENT".into(),
            repeat: "sometimes".into(),
            ..Default::default()
        };
        let fields = draft.validate().unwrap();

        assert_eq!(fields.name, "Study");
        assert_eq!(fields.kind, CustomKind::Assignment);
        assert_eq!(fields.repeat, Repeat::None);
        assert_eq!(fields.time, None);
    }

    #[test]
    fn test_json_shape_matches_stored_format() {
        let raw = r#"{
            "id": "cst-1700000000000",
            "name": "Quiz prep",
            "description": "",
            "course_name": "Chem",
            "type": "assignment",
            "date": "2025-03-04",
            "time": "",
            "repeat": "weekly",
            "url": "https://legacy.example"
        }"#;

        let ev: CustomEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(ev.kind, CustomKind::Assignment);
        assert_eq!(ev.time, None, "Empty time means date-only");
        assert_eq!(ev.repeat, Repeat::Weekly);
        assert!(ev.legacy.contains_key("url"), "Unknown keys are kept");

        let back = serde_json::to_value(&ev).unwrap();
        assert_eq!(back["time"], "");
        assert_eq!(back["type"], "assignment");
        assert_eq!(back["url"], "https://legacy.example");
    }

    #[test]
    fn test_to_items_expands_repeats() {
        let ev = event("cst-1", d(2025, 3, 3), Some("15:30"), Repeat::Weekly);
        let items = ev.to_items(Los_Angeles, d(2025, 3, 12), 21);

        let dates: Vec<_> = items.iter().map(|i| i.due_date()).collect();
        assert_eq!(dates, vec![d(2025, 3, 17), d(2025, 3, 24), d(2025, 3, 31)]);
        assert!(items.iter().all(|i| i.is_custom() && i.timed));
        assert_eq!(items[0].due.hour(), 15);
    }

    #[test]
    fn test_display_order_upcoming_then_past() {
        let now = Los_Angeles.with_ymd_and_hms(2025, 3, 12, 10, 0, 0).unwrap();
        let events = vec![
            event("past-old", d(2025, 1, 2), None, Repeat::None),
            event("soon", d(2025, 3, 13), None, Repeat::None),
            event("past-recent", d(2025, 3, 10), None, Repeat::None),
            event("later", d(2025, 4, 1), None, Repeat::None),
            event("weekly", d(2025, 1, 6), Some("09:00"), Repeat::Weekly),
        ];

        let ordered: Vec<_> = display_order(events, now).into_iter().map(|e| e.id).collect();

        assert_eq!(
            ordered,
            vec!["soon", "weekly", "later", "past-recent", "past-old"],
            "Weekly event from Jan rolls forward to Mar 17"
        );
    }

    #[test]
    fn test_stored_dates_in_older_layouts() {
        let json = r#"{"id": "cst-2", "name": "Old", "date": "03/04/2025"}"#;
        let event: CustomEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.date, d(2025, 3, 4));

        assert_eq!(stored_date::parse("2025/03/04"), Some(d(2025, 3, 4)));
        assert_eq!(stored_date::parse("2025-03-04T15:30:00"), Some(d(2025, 3, 4)));
        assert_eq!(stored_date::parse("next tuesday"), None);

        let written = serde_json::to_value(&event).unwrap();
        assert_eq!(written["date"], "2025-03-04");
    }
}
