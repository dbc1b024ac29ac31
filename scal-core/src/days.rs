//! Grouping items into day buckets.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::item::Item;

/// All items whose local due date is `date`.
#[derive(Debug, Clone)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub items: Vec<Item>,
}

/// Upstream entries first, then custom ones, then by due time and title.
fn bucket_order(a: &Item, b: &Item) -> Ordering {
    a.is_custom()
        .cmp(&b.is_custom())
        .then(a.due.cmp(&b.due))
        .then_with(|| a.title.cmp(&b.title))
}

/// Bucket items by local due date. Buckets come out in date order and every
/// item lands in exactly one of them.
pub fn group_by_day(items: Vec<Item>) -> Vec<DayBucket> {
    let mut by_date: BTreeMap<NaiveDate, Vec<Item>> = BTreeMap::new();

    for item in items {
        by_date.entry(item.due_date()).or_default().push(item);
    }

    by_date
        .into_iter()
        .map(|(date, mut items)| {
            items.sort_by(bucket_order);
            DayBucket { date, items }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemKind, Source, Status};
    use chrono::{DateTime, TimeZone};
    use chrono_tz::America::Los_Angeles;
    use chrono_tz::Tz;

    fn at(d: u32, h: u32, mi: u32) -> DateTime<Tz> {
        Los_Angeles.with_ymd_and_hms(2025, 3, d, h, mi, 0).unwrap()
    }

    fn item(id: &str, due: DateTime<Tz>, source: Source) -> Item {
        Item {
            id: id.into(),
            kind: ItemKind::Assignment,
            source,
            title: format!("Item {id}"),
            description: String::new(),
            course: None,
            section_id: None,
            due,
            start: due,
            timed: true,
            retimed: false,
            status: Status::Pending,
            raw: None,
        }
    }

    fn upstream(id: &str, due: DateTime<Tz>) -> Item {
        item(id, due, Source::Upstream { uid: id.into() })
    }

    #[test]
    fn test_every_item_lands_in_its_local_date_bucket() {
        let items = vec![
            upstream("a", at(4, 23, 59)),
            upstream("b", at(5, 0, 0)),
            upstream("c", at(4, 0, 0)),
            upstream("d", at(7, 12, 0)),
            upstream("e", at(5, 8, 0)),
        ];
        let total = items.len();

        let days = group_by_day(items);

        let placed: usize = days.iter().map(|d| d.items.len()).sum();
        assert_eq!(placed, total, "No item should be dropped or duplicated");
        for day in &days {
            for it in &day.items {
                assert_eq!(
                    it.due.date_naive(),
                    day.date,
                    "Item {} is in the wrong bucket",
                    it.id
                );
            }
        }
        let dates: Vec<_> = days.iter().map(|d| d.date.format("%d").to_string()).collect();
        assert_eq!(dates, vec!["04", "05", "07"], "Buckets are date ordered");
    }

    #[test]
    fn test_bucket_uses_local_date_not_utc() {
        // 23:59 Pacific is the next day in UTC.
        let late = at(4, 23, 59);
        let days = group_by_day(vec![upstream("a", late)]);

        assert_eq!(days.len(), 1);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2025, 3, 4).unwrap());
    }

    #[test]
    fn test_custom_items_follow_upstream_within_a_day() {
        let days = group_by_day(vec![
            item("cst-1", at(4, 7, 0), Source::Custom),
            upstream("b", at(4, 22, 0)),
            upstream("a", at(4, 9, 0)),
        ]);

        let ids: Vec<_> = days[0].items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "cst-1"]);
    }

    #[test]
    fn test_empty_input_gives_no_buckets() {
        assert!(group_by_day(Vec::new()).is_empty());
    }
}
