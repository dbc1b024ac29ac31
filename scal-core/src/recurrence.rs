//! Repeat rules for custom events.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Repeat {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    #[default]
    #[serde(other)]
    None,
}

impl Repeat {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "daily" => Repeat::Daily,
            "weekly" => Repeat::Weekly,
            "monthly" => Repeat::Monthly,
            "yearly" => Repeat::Yearly,
            _ => Repeat::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Repeat::None => "none",
            Repeat::Daily => "daily",
            Repeat::Weekly => "weekly",
            Repeat::Monthly => "monthly",
            Repeat::Yearly => "yearly",
        }
    }

    /// The n-th occurrence counting from `anchor` (n = 0 is `anchor`).
    ///
    /// Month and year steps are taken from the anchor, so a Jan 31 monthly
    /// event lands on Feb 28 and then back on Mar 31, and a Feb 29 yearly
    /// event lands on Feb 28 in common years.
    pub fn nth(&self, anchor: NaiveDate, n: u32) -> Option<NaiveDate> {
        match self {
            Repeat::None => (n == 0).then_some(anchor),
            Repeat::Daily => anchor.checked_add_days(Days::new(u64::from(n))),
            Repeat::Weekly => anchor.checked_add_days(Days::new(7 * u64::from(n))),
            Repeat::Monthly => anchor.checked_add_months(Months::new(n)),
            Repeat::Yearly => anchor.checked_add_months(Months::new(12 * n)),
        }
    }

    /// First occurrence on or after `today`. Non-repeating dates stay put.
    pub fn roll_forward(&self, anchor: NaiveDate, today: NaiveDate) -> NaiveDate {
        (0..)
            .map_while(|n| self.nth(anchor, n))
            .find(|date| *date >= today)
            .unwrap_or(anchor)
    }

    /// Occurrences from the next one on or after `today` through `until`.
    /// A non-repeating event yields just its own date, past or not.
    pub fn occurrences(&self, anchor: NaiveDate, today: NaiveDate, until: NaiveDate) -> Vec<NaiveDate> {
        if *self == Repeat::None {
            return vec![anchor];
        }

        (0..)
            .map_while(|n| self.nth(anchor, n))
            .skip_while(|date| *date < today)
            .take_while(|date| *date <= until)
            .collect()
    }
}
