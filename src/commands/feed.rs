use std::path::PathBuf;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use scal_core::{FeedBuilder, ScalConfig};
use scal_schoology::SchoologyClient;

use super::{feed_url, open_store};
use crate::utils::tui::busy;

pub async fn run(config: &ScalConfig, url: Option<String>, output: Option<PathBuf>) -> Result<()> {
    let url = feed_url(config, url)?;
    let store = open_store(config)?;
    let client = SchoologyClient::new(config)?;

    let builder = FeedBuilder::new(config, &store, &client);
    let feed = busy("Fetching feed", builder.fetch_and_build(&url)).await?;
    let ics = feed.to_ics()?;

    match output {
        Some(path) => {
            std::fs::write(&path, &ics)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} {} items, {} passed through -> {}",
                "✓".green(),
                feed.item_count(),
                feed.passthrough.len(),
                path.display()
            );
        }
        None => print!("{ics}"),
    }

    Ok(())
}
