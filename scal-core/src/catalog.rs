//! Which section every Schoology item belongs to.
//!
//! The ICS export doesn't say which section an entry comes from, but the
//! submission endpoint needs it. The catalog is rebuilt from the sections and
//! user events endpoints and kept in the upstream cache.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ScalConfig;
use crate::error::ScalResult;
use crate::store::{Store, UpstreamCache};
use crate::upstream::{Section, Upstream, UpstreamEvent};

/// Counts after a refresh, shown on the refresh page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    pub sections: usize,
    pub items: usize,
    /// Events fetched this time. Zero when the cached catalog was reused.
    pub events: usize,
    pub refreshed: bool,
}

impl CatalogSummary {
    fn of(cache: &UpstreamCache, events: usize, refreshed: bool) -> Self {
        CatalogSummary {
            sections: cache.section_id_to_name.len(),
            items: cache.item_id_to_section.len(),
            events,
            refreshed,
        }
    }
}

/// Rebuild the catalog unless a usable one is cached and `force` is off.
pub async fn refresh(
    upstream: &dyn Upstream,
    store: &Store,
    config: &ScalConfig,
    now: DateTime<Utc>,
    force: bool,
) -> ScalResult<CatalogSummary> {
    let cache = store.cache();

    if cache.has_catalog() && !force {
        debug!("Reusing cached catalog");
        return Ok(CatalogSummary::of(&cache, 0, false));
    }

    if config.user_id().is_none() {
        warn!("SCHOOLOGY_UID is not set, skipping catalog refresh");
        return Ok(CatalogSummary::of(&cache, 0, false));
    }

    let sections = match upstream.sections().await {
        Ok(sections) => sections,
        Err(e) if e.is_offline() => {
            warn!(error = %e, "Offline while fetching sections");
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    let from = cache
        .generated_at
        .unwrap_or_else(|| now - Duration::days(config.window.days_back))
        .with_timezone(&config.tz())
        .date_naive();
    let to = (now + Duration::days(config.window.days_forward))
        .with_timezone(&config.tz())
        .date_naive();

    let events = upstream.events(from, to).await?;

    // Merge into whatever the cache holds now, not the snapshot taken above.
    let summary = store.update_cache(|cache| {
        merge(cache, &sections, &events);
        cache.generated_at = Some(now);
        CatalogSummary::of(cache, events.len(), true)
    })?;

    info!(
        sections = summary.sections,
        items = summary.items,
        events = summary.events,
        %from,
        %to,
        "Refreshed item catalog"
    );
    Ok(summary)
}

/// Fold fresh sections and events into the cache. Existing entries stay.
/// Items are only mapped to sections the user is enrolled in.
fn merge(cache: &mut UpstreamCache, sections: &[Section], events: &[UpstreamEvent]) {
    for section in sections {
        cache
            .section_id_to_name
            .insert(section.id.clone(), section.display_name());
    }

    for event in events {
        let section = [&event.section_id, &event.realm_id]
            .into_iter()
            .flatten()
            .find(|id| cache.section_id_to_name.contains_key(id.as_str()))
            .cloned();

        let Some(section) = section else {
            continue;
        };

        cache
            .item_id_to_section
            .insert(event.id.clone(), section.clone());

        if event.is_assignment()
            && let Some(assignment_id) = &event.assignment_id
        {
            cache
                .item_id_to_section
                .insert(assignment_id.clone(), section);
        }
    }
}
