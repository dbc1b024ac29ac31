//! Feed parsing using the icalendar crate's parser.

use icalendar::{
    DatePerhapsTime,
    parser::{Property, read_calendar, unfold},
};

use super::{CalendarEvent, EventTime, ExtraProperty};
use crate::error::{ScalError, ScalResult};

/// Properties mapped onto `CalendarEvent` fields; everything else is extra.
const KNOWN: [&str; 7] = [
    "UID",
    "SUMMARY",
    "DESCRIPTION",
    "LOCATION",
    "URL",
    "DTSTART",
    "DTEND",
];

#[derive(Debug, Clone, Default)]
pub struct ParsedCalendar {
    /// X-WR-CALNAME, if the feed sets one.
    pub name: Option<String>,
    pub events: Vec<CalendarEvent>,
}

/// Parse a whole feed. Every VEVENT becomes one `CalendarEvent`, including
/// ones without a UID or start.
pub fn parse_calendar(content: &str) -> ScalResult<ParsedCalendar> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| ScalError::IcsParse(e.to_string()))?;

    let name = calendar
        .properties
        .iter()
        .find(|p| p.name == "X-WR-CALNAME")
        .map(|p| unescape_text(p.val.as_ref()));

    let events = calendar
        .components
        .iter()
        .filter(|c| c.name == "VEVENT")
        .map(|vevent| {
            let text = |name: &str| vevent.find_prop(name).map(|p| unescape_text(p.val.as_ref()));

            let extra = vevent
                .properties
                .iter()
                .filter(|p| !KNOWN.iter().any(|k| p.name == *k))
                .map(to_extra)
                .collect();

            CalendarEvent {
                uid: vevent
                    .find_prop("UID")
                    .map(|p| p.val.to_string())
                    .unwrap_or_default(),
                summary: text("SUMMARY"),
                description: text("DESCRIPTION"),
                location: text("LOCATION"),
                url: vevent.find_prop("URL").map(|p| p.val.to_string()),
                start: vevent.find_prop("DTSTART").and_then(parse_time),
                end: vevent.find_prop("DTEND").and_then(parse_time),
                extra,
            }
        })
        .collect();

    Ok(ParsedCalendar { name, events })
}

fn parse_time(prop: &Property) -> Option<EventTime> {
    DatePerhapsTime::try_from(prop).ok().map(to_event_time)
}

/// Convert icalendar's DatePerhapsTime to our EventTime, preserving timezone info
fn to_event_time(dpt: DatePerhapsTime) -> EventTime {
    match dpt {
        DatePerhapsTime::Date(d) => EventTime::Date(d),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            icalendar::CalendarDateTime::Utc(dt) => EventTime::DateTimeUtc(dt),
            icalendar::CalendarDateTime::Floating(naive) => EventTime::DateTimeFloating(naive),
            icalendar::CalendarDateTime::WithTimezone { date_time, tzid } => {
                EventTime::DateTimeZoned {
                    datetime: date_time,
                    tzid,
                }
            }
        },
    }
}

fn to_extra(prop: &Property) -> ExtraProperty {
    ExtraProperty {
        name: prop.name.to_string(),
        value: prop.val.to_string(),
        params: prop
            .params
            .iter()
            .filter_map(|p| p.val.as_ref().map(|v| (p.key.to_string(), v.to_string())))
            .collect(),
    }
}

/// Undo RFC 5545 TEXT escaping.
fn unescape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    const FEED: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Schoology//EN\r\n\
X-WR-CALNAME:Jamie's Schoology\r\n\
BEGIN:VEVENT\r\n\
UID:sgy-1@schoology.com\r\n\
SUMMARY:Lab report\\, part 2\r\n\
DTSTART:20250304T235900Z\r\n\
DTEND:20250304T235900Z\r\n\
DESCRIPTION:Write it up\\nCite sources - Link: https://app.schoology.com/a\r\n ssignment/7001\r\n\
X-SGY-KIND;X-P=1:assignment\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:sgy-2@schoology.com\r\n\
SUMMARY:No start here\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:sgy-3@schoology.com\r\n\
SUMMARY:All day\r\n\
DTSTART;VALUE=DATE:20250310\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    #[test]
    fn test_parse_reads_every_vevent() {
        let parsed = parse_calendar(FEED).expect("Should parse");

        assert_eq!(parsed.events.len(), 3, "Events without DTSTART are still returned");
        assert_eq!(parsed.name.as_deref(), Some("Jamie's Schoology"));
        assert!(parsed.events[1].start.is_none());
    }

    #[test]
    fn test_parse_unescapes_text_and_unfolds() {
        let parsed = parse_calendar(FEED).unwrap();
        let ev = &parsed.events[0];

        assert_eq!(ev.summary.as_deref(), Some("Lab report, part 2"));
        let desc = ev.description.as_deref().unwrap();
        assert!(desc.starts_with("Write it up\nCite sources"), "Got: {:?}", desc);
        assert!(
            desc.ends_with("https://app.schoology.com/assignment/7001"),
            "Folded line should be joined. Got: {:?}",
            desc
        );
        assert_eq!(
            ev.start,
            Some(EventTime::DateTimeUtc(
                Utc.with_ymd_and_hms(2025, 3, 4, 23, 59, 0).unwrap()
            ))
        );
    }

    #[test]
    fn test_parse_keeps_unknown_properties_with_params() {
        let parsed = parse_calendar(FEED).unwrap();
        let extra = &parsed.events[0].extra;

        let kind = extra
            .iter()
            .find(|p| p.name == "X-SGY-KIND")
            .expect("X- property should be kept");
        assert_eq!(kind.value, "assignment");
        assert_eq!(kind.params, vec![("X-P".to_string(), "1".to_string())]);
        assert!(
            !extra.iter().any(|p| p.name == "SUMMARY"),
            "Mapped properties must not be duplicated into extra"
        );
    }

    #[test]
    fn test_parse_all_day_date() {
        let parsed = parse_calendar(FEED).unwrap();
        assert_eq!(
            parsed.events[2].start,
            Some(EventTime::Date(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()))
        );
    }

    #[test]
    fn test_unescape_text() {
        assert_eq!(unescape_text(r"a\,b\;c\\d\ne"), "a,b;c\\d\ne");
    }
}
