use anyhow::Result;
use chrono::Utc;
use owo_colors::OwoColorize;
use scal_core::{ScalConfig, catalog};
use scal_schoology::SchoologyClient;

use super::open_store;
use crate::render::pluralize;
use crate::utils::tui::busy;

pub async fn run(config: &ScalConfig) -> Result<()> {
    if config.user_id().is_none() {
        anyhow::bail!("Set SCHOOLOGY_UID to build the section catalog");
    }

    let store = open_store(config)?;
    let client = SchoologyClient::new(config)?;

    let summary = busy(
        "Refreshing catalog",
        catalog::refresh(&client, &store, config, Utc::now(), true),
    )
    .await?;

    println!(
        "{} {} {}, {} {} mapped from {} {}",
        "✓".green(),
        summary.sections,
        pluralize("section", summary.sections),
        summary.items,
        pluralize("item", summary.items),
        summary.events,
        pluralize("event", summary.events),
    );

    Ok(())
}
