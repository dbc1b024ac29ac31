//! Terminal rendering for scal types.

use chrono::NaiveDate;
use owo_colors::OwoColorize;
use scal_core::{DayBucket, Item, Status};

pub trait Render {
    fn render(&self) -> String;
}

impl Render for Item {
    fn render(&self) -> String {
        let time = if self.timed {
            format!("{:>8}", self.start.format("%-I:%M %p").to_string())
        } else {
            format!("{:>8}", "all-day")
        };

        let title = match self.status {
            Status::Done => self.title.dimmed().strikethrough().to_string(),
            Status::Overdue => self.title.red().to_string(),
            _ => self.title.clone(),
        };

        let mut line = format!("{} {} {}", time.dimmed(), self.summary_prefix(), title);
        if let Some(course) = self.course_short_name() {
            line.push_str(&format!(" {}", format!("[{course}]").dimmed()));
        }
        if self.kind.is_completable() {
            line.push_str(&format!(" {}", format!("{}@{}", self.id, self.occurrence()).dimmed()));
        }
        line
    }
}

/// "Today", "Tomorrow", or e.g. "Wed Mar 5"
pub fn date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

pub fn render_day(day: &DayBucket, today: NaiveDate) -> String {
    let mut lines = vec![date_label(day.date, today).bold().to_string()];
    lines.extend(day.items.iter().map(|item| format!("  {}", item.render())));
    lines.join("\n")
}

pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_label() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        assert_eq!(date_label(today, today), "Today");
        assert_eq!(date_label(today.succ_opt().unwrap(), today), "Tomorrow");
        assert_eq!(
            date_label(NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(), today),
            "Fri Mar 7"
        );
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("item", 1), "item");
        assert_eq!(pluralize("item", 0), "items");
    }
}
