//! iCalendar reading and writing.

mod generate;
mod parse;

pub use generate::generate_calendar;
pub use parse::{ParsedCalendar, parse_calendar};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// A DTSTART/DTEND value, keeping the form the feed used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTime {
    Date(NaiveDate),
    DateTimeUtc(DateTime<Utc>),
    DateTimeFloating(NaiveDateTime),
    DateTimeZoned { datetime: NaiveDateTime, tzid: String },
}

impl EventTime {
    /// Resolve to an instant in `tz`. Floating times and all-day dates are
    /// read as local wall time; unknown TZIDs fall back to `tz`.
    pub fn to_local(&self, tz: Tz) -> Option<DateTime<Tz>> {
        match self {
            EventTime::Date(d) => tz.from_local_datetime(&d.and_time(NaiveTime::MIN)).earliest(),
            EventTime::DateTimeUtc(dt) => Some(dt.with_timezone(&tz)),
            EventTime::DateTimeFloating(naive) => tz.from_local_datetime(naive).earliest(),
            EventTime::DateTimeZoned { datetime, tzid } => {
                let zone = tzid.parse::<Tz>().unwrap_or(tz);
                zone.from_local_datetime(datetime)
                    .earliest()
                    .map(|dt| dt.with_timezone(&tz))
            }
        }
    }
}

/// A property the reshaper doesn't touch, carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraProperty {
    pub name: String,
    pub value: String,
    pub params: Vec<(String, String)>,
}

/// One VEVENT.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CalendarEvent {
    pub uid: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub extra: Vec<ExtraProperty>,
}

impl CalendarEvent {
    pub fn start_local(&self, tz: Tz) -> Option<DateTime<Tz>> {
        self.start.as_ref().and_then(|t| t.to_local(tz))
    }

    /// Drop every extra property called `name`.
    pub fn remove_extra(&mut self, name: &str) {
        self.extra.retain(|p| !p.name.eq_ignore_ascii_case(name));
    }
}
