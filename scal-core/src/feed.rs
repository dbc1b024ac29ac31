//! Reshaping an upstream ICS export into the served feed.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use crate::catalog;
use crate::config::ScalConfig;
use crate::days::{DayBucket, group_by_day};
use crate::error::ScalResult;
use crate::ics::{CalendarEvent, EventTime, generate_calendar, parse_calendar};
use crate::item::{Item, Source, Status};
use crate::links::{ItemRef, clean_description, extract_item_ref};
use crate::schedule::Schedule;
use crate::status::StatusResolver;
use crate::store::{Store, UpstreamCache};
use crate::upstream::Upstream;

/// A reshaped calendar, ready to be written out or shown as an agenda.
#[derive(Debug, Clone)]
pub struct Feed {
    pub name: Option<String>,
    days: Vec<DayBucket>,
    /// Entries served exactly as the upstream sent them.
    pub passthrough: Vec<CalendarEvent>,
    public_url: String,
    event_length: Duration,
}

impl Feed {
    pub fn days(&self) -> &[DayBucket] {
        &self.days
    }

    pub fn item_count(&self) -> usize {
        self.days.iter().map(|d| d.items.len()).sum()
    }

    /// Every reshaped item followed by the passthrough entries.
    pub fn components(&self) -> Vec<CalendarEvent> {
        self.days
            .iter()
            .flat_map(|day| day.items.iter())
            .map(|item| self.render(item))
            .chain(self.passthrough.iter().cloned())
            .collect()
    }

    pub fn to_ics(&self) -> ScalResult<String> {
        generate_calendar(self.name.as_deref(), &self.components())
    }

    fn render(&self, item: &Item) -> CalendarEvent {
        let mut event = item.raw.clone().unwrap_or_default();

        if let Source::Custom = item.source {
            event.uid = format!("{}-{}@scal", item.id, item.occurrence());
        }
        event.summary = Some(format!("{} {}", item.summary_prefix(), item.title));
        event.description = Some(self.describe(item));
        event.location = item.course_short_name().map(str::to_string);

        if item.retimed || item.raw.is_none() {
            let start = item.start.with_timezone(&Utc);
            event.start = Some(EventTime::DateTimeUtc(start));
            event.end = Some(EventTime::DateTimeUtc(start + self.event_length));
            event.remove_extra("DURATION");
        }

        event
    }

    fn describe(&self, item: &Item) -> String {
        let mut text = format!(
            "{}\n\n{}",
            item.due.format("📅 %a, %b %-d at %-I:%M %p"),
            item.description
        );

        if item.kind.is_completable() {
            let occ = item.occurrence();
            if item.status.is_done() {
                text.push_str(&format!(
                    "\n\n↩️ Unmark as Done: {}/api/unmark-done/{}?occ={occ}",
                    self.public_url, item.id
                ));
            } else {
                text.push_str(&format!(
                    "\n\n📝 Mark as Done: {}/api/mark-done/{}?occ={occ}",
                    self.public_url, item.id
                ));
            }
        }

        if item.is_custom() {
            text.push_str(&format!("\n\nEdit: {}/custom/edit/{}", self.public_url, item.id));
        }

        while text.contains("\n\n\n\n") {
            text = text.replace("\n\n\n\n", "\n\n");
        }
        text.trim_end().to_string()
    }
}

/// Why an entry was or wasn't reshaped.
#[derive(Debug, Default)]
struct Tally {
    valid: usize,
    invalid: usize,
    old: usize,
    new: usize,
    missing: usize,
}

/// An entry with a Schoology reference and a usable start.
struct Candidate {
    event: CalendarEvent,
    reference: ItemRef,
    due: DateTime<Tz>,
}

pub struct FeedBuilder<'a> {
    config: &'a ScalConfig,
    store: &'a Store,
    upstream: &'a dyn Upstream,
    now: DateTime<Utc>,
}

impl<'a> FeedBuilder<'a> {
    pub fn new(config: &'a ScalConfig, store: &'a Store, upstream: &'a dyn Upstream) -> Self {
        FeedBuilder {
            config,
            store,
            upstream,
            now: Utc::now(),
        }
    }

    /// Pin "now", for tests and reproducible output.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub async fn fetch_and_build(&self, url: &str) -> ScalResult<Feed> {
        let text = self.upstream.fetch_calendar(url).await?;
        self.build(&text).await
    }

    pub async fn build(&self, ics_text: &str) -> ScalResult<Feed> {
        let parsed = parse_calendar(ics_text)?;
        let tz = self.config.tz();
        let now = self.now.with_timezone(&tz);
        let window_start = now - Duration::days(self.config.window.days_back);
        let window_end = now + Duration::days(self.config.window.days_forward);
        let uses_catalog = self.config.user_id().is_some();

        if uses_catalog {
            self.refresh_catalog(false).await;
        }

        let mut tally = Tally::default();
        let mut passthrough = Vec::new();
        let mut candidates = Vec::new();

        for event in parsed.events {
            let reference = extract_item_ref(&event);
            let due = event.start_local(tz);

            match (reference, due) {
                (Some(reference), Some(due)) if due < window_start => {
                    debug!(id = %reference.id, "Entry is older than the window");
                    tally.old += 1;
                    passthrough.push(event);
                }
                (Some(reference), Some(due)) if due > window_end => {
                    debug!(id = %reference.id, "Entry is past the window");
                    tally.new += 1;
                    passthrough.push(event);
                }
                (Some(reference), Some(due)) => candidates.push(Candidate { event, reference, due }),
                _ => {
                    tally.invalid += 1;
                    passthrough.push(event);
                }
            }
        }

        let mut cache = self.store.cache();

        if uses_catalog {
            let upcoming_missing = candidates
                .iter()
                .any(|c| cache.section_of(&c.reference.id).is_none() && c.due >= now);

            if upcoming_missing {
                info!("Upcoming items have no known section, refreshing catalog");
                self.refresh_catalog(true).await;
                cache = self.store.cache();
            }
        }

        let mut items = Vec::new();
        for candidate in candidates {
            if uses_catalog && cache.section_of(&candidate.reference.id).is_none() {
                tally.missing += 1;
                passthrough.push(candidate.event);
                continue;
            }
            tally.valid += 1;
            items.push(to_item(candidate, &cache));
        }

        let custom: Vec<Item> = self
            .store
            .custom_events()
            .iter()
            .flat_map(|e| e.to_items(tz, now.date_naive(), self.config.window.repeat_days))
            .collect();
        let custom_count = custom.len();
        items.extend(custom);

        let settings = self
            .store
            .settings()
            .resolve(self.config.stack_events, self.config.default_stack_start());
        let schedule = Schedule {
            tz,
            stack: settings.stack_events,
            stack_start: settings.stack_start,
            event_length: self.config.event_length(),
            course_due_times: &self.config.course_due_times,
        };

        let resolver = StatusResolver {
            config: self.config,
            store: self.store,
            upstream: self.upstream,
            now: self.now,
        };

        let mut days = group_by_day(items);
        for day in days.iter_mut() {
            schedule.apply(day);
            for item in day.items.iter_mut() {
                item.status = resolver.resolve_status(item).await;
            }
        }

        info!(
            valid = tally.valid,
            invalid = tally.invalid,
            old = tally.old,
            new = tally.new,
            missing = tally.missing,
            custom = custom_count,
            days = days.len(),
            "Built feed"
        );

        Ok(Feed {
            name: parsed.name,
            days,
            passthrough,
            public_url: self.config.public_url(),
            event_length: self.config.event_length(),
        })
    }

    async fn refresh_catalog(&self, force: bool) {
        if let Err(e) = catalog::refresh(self.upstream, self.store, self.config, self.now, force).await {
            warn!(error = %e, force, "Catalog refresh failed, continuing with cached catalog");
        }
    }
}

fn to_item(candidate: Candidate, cache: &UpstreamCache) -> Item {
    let Candidate {
        event,
        reference,
        due,
    } = candidate;

    let section_id = cache.section_of(&reference.id).map(str::to_string);
    let course = section_id
        .as_deref()
        .and_then(|s| cache.section_name(s))
        .map(str::to_string)
        .or_else(|| event.location.clone().filter(|l| !l.is_empty()));
    let timed = !matches!(event.start, Some(EventTime::Date(_)));

    Item {
        id: reference.id,
        kind: reference.kind,
        source: Source::Upstream {
            uid: event.uid.clone(),
        },
        title: event.summary.clone().unwrap_or_default(),
        description: event
            .description
            .as_deref()
            .map(clean_description)
            .unwrap_or_default()
            .trim()
            .to_string(),
        course,
        section_id,
        due,
        start: due,
        timed,
        retimed: false,
        status: Status::Unknown,
        raw: Some(event),
    }
}
