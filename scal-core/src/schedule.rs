//! Where items land on the calendar.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;

use crate::days::DayBucket;
use crate::item::Item;

/// Parse `HH:MM` (also accepts `H:MM`).
pub fn parse_hhmm(raw: &str) -> Option<NaiveTime> {
    let (h, m) = raw.trim().split_once(':')?;
    NaiveTime::from_hms_opt(h.trim().parse().ok()?, m.trim().parse().ok()?, 0)
}

/// First configured due time whose key appears in the course title.
pub fn course_due_time(
    due_times: &BTreeMap<String, String>,
    course_title: &str,
) -> Option<NaiveTime> {
    let title = course_title.to_lowercase();
    due_times
        .iter()
        .find(|(key, _)| title.contains(&key.to_lowercase()))
        .and_then(|(_, time)| parse_hhmm(time))
}

/// Wall-clock time on a local date. DST gaps resolve to the later side.
pub fn at_local(tz: Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Tz> {
    let naive = date.and_time(time);
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

/// Retiming rules for one feed build.
#[derive(Debug, Clone)]
pub struct Schedule<'a> {
    pub tz: Tz,
    pub stack: bool,
    pub stack_start: NaiveTime,
    pub event_length: Duration,
    pub course_due_times: &'a BTreeMap<String, String>,
}

/// Time date-only custom events fall back to when no course time matches.
fn custom_fallback() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)
}

impl Schedule<'_> {
    /// Lay out one day. With stacking on, the i-th item starts at
    /// `stack_start + i * event_length`; otherwise course due times and the
    /// custom-event defaults apply.
    pub fn apply(&self, bucket: &mut DayBucket) {
        let mut slot = at_local(self.tz, bucket.date, self.stack_start);

        for item in bucket.items.iter_mut() {
            if self.stack {
                self.place(item, slot);
                slot += self.event_length;
                continue;
            }

            let course_time = item
                .course
                .as_deref()
                .and_then(|c| course_due_time(self.course_due_times, c));

            if item.is_custom() {
                let time = if item.timed {
                    item.due.time()
                } else {
                    course_time.unwrap_or_else(custom_fallback)
                };
                self.place(item, at_local(self.tz, bucket.date, time));
            } else if let Some(time) = course_time {
                self.place(item, at_local(self.tz, bucket.date, time));
            }
        }
    }

    fn place(&self, item: &mut Item, start: DateTime<Tz>) {
        item.start = start;
        item.retimed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::days::group_by_day;
    use crate::item::{ItemKind, Source, Status};
    use chrono::Timelike;
    use chrono_tz::America::Los_Angeles;

    fn upstream(id: &str, course: &str, y: i32, mo: u32, d: u32, h: u32, mi: u32) -> Item {
        let due = Los_Angeles.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap();
        Item {
            id: id.into(),
            kind: ItemKind::Assignment,
            source: Source::Upstream { uid: format!("u-{id}") },
            title: format!("Item {id}"),
            description: String::new(),
            course: Some(course.into()),
            section_id: Some("1".into()),
            due,
            start: due,
            timed: true,
            retimed: false,
            status: Status::Pending,
            raw: None,
        }
    }

    fn schedule(stack: bool, due_times: &BTreeMap<String, String>) -> Schedule<'_> {
        Schedule {
            tz: Los_Angeles,
            stack,
            stack_start: NaiveTime::from_hms_opt(8, 25, 0).unwrap(),
            event_length: Duration::minutes(50),
            course_due_times: due_times,
        }
    }

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(parse_hhmm("08:25"), NaiveTime::from_hms_opt(8, 25, 0));
        assert_eq!(parse_hhmm("8:05"), NaiveTime::from_hms_opt(8, 5, 0));
        assert_eq!(parse_hhmm("25:00"), None);
        assert_eq!(parse_hhmm("noon"), None);
    }

    #[test]
    fn test_course_due_time_substring_match() {
        let mut times = BTreeMap::new();
        times.insert("chem".to_string(), "08:00".to_string());

        assert_eq!(
            course_due_time(&times, "AP Chemistry - P2"),
            NaiveTime::from_hms_opt(8, 0, 0)
        );
        assert_eq!(course_due_time(&times, "History"), None);
    }

    #[test]
    fn test_stacking_lays_items_back_to_back() {
        let times = BTreeMap::new();
        let items = vec![
            upstream("1", "Chem", 2025, 3, 4, 23, 59),
            upstream("2", "Bio", 2025, 3, 4, 9, 0),
            upstream("3", "Art", 2025, 3, 5, 23, 59),
        ];
        let mut days = group_by_day(items);

        for day in days.iter_mut() {
            schedule(true, &times).apply(day);
        }

        let first_day: Vec<_> = days[0]
            .items
            .iter()
            .map(|i| (i.start.hour(), i.start.minute()))
            .collect();
        assert_eq!(first_day, vec![(8, 25), (9, 15)], "Slots follow bucket order");
        assert_eq!(
            (days[1].items[0].start.hour(), days[1].items[0].start.minute()),
            (8, 25),
            "Each day starts its own stack"
        );
        assert!(days.iter().flat_map(|d| &d.items).all(|i| i.retimed));
    }

    #[test]
    fn test_course_time_without_stacking() {
        let mut times = BTreeMap::new();
        times.insert("Chem".to_string(), "07:45".to_string());
        let mut days = group_by_day(vec![
            upstream("1", "AP Chem", 2025, 3, 4, 23, 59),
            upstream("2", "History", 2025, 3, 4, 15, 0),
        ]);

        schedule(false, &times).apply(&mut days[0]);

        let chem = days[0].items.iter().find(|i| i.id == "1").unwrap();
        let hist = days[0].items.iter().find(|i| i.id == "2").unwrap();
        assert_eq!((chem.start.hour(), chem.start.minute()), (7, 45));
        assert!(chem.retimed);
        assert_eq!(hist.start, hist.due, "Unmatched course keeps its time");
        assert!(!hist.retimed);
    }

    #[test]
    fn test_at_local_skips_dst_gap() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let t = at_local(Los_Angeles, date, NaiveTime::from_hms_opt(2, 30, 0).unwrap());
        assert_eq!(t.hour(), 3, "2:30 doesn't exist on spring-forward day");
    }
}
