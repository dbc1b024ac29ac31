use anyhow::Result;
use chrono::Utc;
use owo_colors::OwoColorize;
use scal_core::{FeedBuilder, ScalConfig};
use scal_schoology::SchoologyClient;

use super::{feed_url, open_store};
use crate::render::{pluralize, render_day};
use crate::utils::tui::busy;

pub async fn run(config: &ScalConfig, url: Option<String>) -> Result<()> {
    let url = feed_url(config, url)?;
    let store = open_store(config)?;
    let client = SchoologyClient::new(config)?;

    let builder = FeedBuilder::new(config, &store, &client);
    let feed = busy("Fetching feed", builder.fetch_and_build(&url)).await?;

    if let Some(name) = &feed.name {
        println!("📅 {}\n", name.bold());
    }

    if feed.days().is_empty() {
        println!("{}", "Nothing in the window".dimmed());
    }

    let today = Utc::now().with_timezone(&config.tz()).date_naive();
    let days: Vec<String> = feed.days().iter().map(|d| render_day(d, today)).collect();
    println!("{}", days.join("\n\n"));

    let passed = feed.passthrough.len();
    if passed > 0 {
        println!(
            "\n{}",
            format!("{passed} other {} served unchanged", pluralize("entry", passed)).dimmed()
        );
    }

    Ok(())
}
