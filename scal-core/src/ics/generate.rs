//! Feed generation.

use std::collections::HashMap;

use icalendar::{Calendar, Component, EventLike, Property, ValueType};

use super::{CalendarEvent, EventTime};
use crate::error::ScalResult;

/// Serialize a calendar with one VEVENT per entry, in order.
pub fn generate_calendar(name: Option<&str>, events: &[CalendarEvent]) -> ScalResult<String> {
    let mut cal = Calendar::new();
    if let Some(name) = name {
        cal.name(name);
    }

    for event in events {
        cal.push(to_ics_event(event));
    }

    let cal = cal.done();

    Ok(strip_ics_bloat(&cal.to_string()))
}

fn to_ics_event(event: &CalendarEvent) -> icalendar::Event {
    let mut ics_event = icalendar::Event::new();

    if !event.uid.is_empty() {
        ics_event.uid(&event.uid);
    }
    if let Some(ref summary) = event.summary {
        ics_event.summary(summary);
    }
    if let Some(ref start) = event.start {
        add_datetime_property(&mut ics_event, "DTSTART", start);
    }
    if let Some(ref end) = event.end {
        add_datetime_property(&mut ics_event, "DTEND", end);
    }
    if let Some(ref desc) = event.description {
        ics_event.description(desc);
    }
    if let Some(ref loc) = event.location {
        ics_event.location(loc);
    }
    if let Some(ref url) = event.url {
        ics_event.add_property("URL", url);
    }

    // Names seen more than once (EXDATE, ATTENDEE, ...) need the multi-property list,
    // everything else replaces what icalendar pre-fills (DTSTAMP).
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for prop in &event.extra {
        *counts.entry(prop.name.as_str()).or_default() += 1;
    }

    for extra in &event.extra {
        let mut prop = Property::new(&extra.name, &extra.value);
        for (key, value) in &extra.params {
            prop.add_parameter(key, value);
        }
        if counts.get(extra.name.as_str()).copied().unwrap_or(0) > 1 {
            ics_event.append_multi_property(prop);
        } else {
            ics_event.append_property(prop);
        }
    }

    ics_event.done()
}

/// Clean up ICS output from the icalendar crate
/// - Replace PRODID with our own
/// - Remove CALSCALE:GREGORIAN (it's the default)
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:-//scal//EN\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

/// Add a datetime property with proper formatting based on EventTime variant
fn add_datetime_property(ics_event: &mut icalendar::Event, name: &str, time: &EventTime) {
    match time {
        EventTime::Date(d) => {
            let mut prop = Property::new(name, d.format("%Y%m%d").to_string());
            prop.append_parameter(ValueType::Date);
            ics_event.append_property(prop);
        }
        EventTime::DateTimeUtc(dt) => {
            ics_event.add_property(name, dt.format("%Y%m%dT%H%M%SZ").to_string());
        }
        EventTime::DateTimeFloating(dt) => {
            ics_event.add_property(name, dt.format("%Y%m%dT%H%M%S").to_string());
        }
        EventTime::DateTimeZoned { datetime, tzid } => {
            let mut prop = Property::new(name, datetime.format("%Y%m%dT%H%M%S").to_string());
            prop.add_parameter("TZID", tzid);
            ics_event.append_property(prop);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ics::{ExtraProperty, parse_calendar};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn make_event(uid: &str) -> CalendarEvent {
        CalendarEvent {
            uid: uid.to_string(),
            summary: Some("⚠️ Lab report".to_string()),
            description: Some("📅 Tue, Mar 4 at 11:59 PM\n\nWrite it up".to_string()),
            location: Some("Chemistry".to_string()),
            url: None,
            start: Some(EventTime::DateTimeUtc(
                Utc.with_ymd_and_hms(2025, 3, 5, 7, 59, 0).unwrap(),
            )),
            end: Some(EventTime::DateTimeUtc(
                Utc.with_ymd_and_hms(2025, 3, 5, 8, 49, 0).unwrap(),
            )),
            extra: vec![],
        }
    }

    #[test]
    fn test_generate_rewrites_prodid() {
        let ics = generate_calendar(Some("School"), &[make_event("a")]).unwrap();

        assert!(ics.contains("PRODID:-//scal//EN"), "ICS:\n{}", ics);
        assert!(!ics.contains("CALSCALE"), "CALSCALE should be stripped. ICS:\n{}", ics);
        assert!(ics.contains("X-WR-CALNAME:School"), "ICS:\n{}", ics);
    }

    #[test]
    fn test_generate_round_trips_fields() {
        let events = vec![make_event("a"), make_event("b")];
        let ics = generate_calendar(None, &events).unwrap();
        let parsed = parse_calendar(&ics).expect("Generated ICS should parse");

        assert_eq!(parsed.events.len(), 2);
        let first = &parsed.events[0];
        assert_eq!(first.uid, "a");
        assert_eq!(first.summary.as_deref(), Some("⚠️ Lab report"));
        assert_eq!(
            first.description.as_deref(),
            Some("📅 Tue, Mar 4 at 11:59 PM\n\nWrite it up"),
            "Newlines should survive escaping"
        );
        assert_eq!(first.start, events[0].start);
        assert_eq!(first.end, events[0].end);
    }

    #[test]
    fn test_generate_all_day_has_value_date() {
        let mut event = make_event("a");
        event.start = Some(EventTime::Date(NaiveDate::from_ymd_opt(2025, 3, 20).unwrap()));
        event.end = None;

        let ics = generate_calendar(None, &[event]).unwrap();
        assert!(
            ics.contains("DTSTART;VALUE=DATE:20250320"),
            "DTSTART should have VALUE=DATE parameter. ICS:\n{}",
            ics
        );
    }

    #[test]
    fn test_generate_keeps_repeated_extra_properties() {
        let mut event = make_event("a");
        event.extra = vec![
            ExtraProperty {
                name: "CATEGORIES".into(),
                value: "school".into(),
                params: vec![],
            },
            ExtraProperty {
                name: "CATEGORIES".into(),
                value: "chem".into(),
                params: vec![],
            },
            ExtraProperty {
                name: "X-SGY-KIND".into(),
                value: "assignment".into(),
                params: vec![("X-P".into(), "1".into())],
            },
        ];

        let ics = generate_calendar(None, &[event]).unwrap();
        let categories = ics.lines().filter(|l| l.starts_with("CATEGORIES")).count();

        assert_eq!(categories, 2, "Both CATEGORIES lines should be kept. ICS:\n{}", ics);
        assert!(ics.contains("X-SGY-KIND;X-P=1:assignment"), "ICS:\n{}", ics);
    }
}
