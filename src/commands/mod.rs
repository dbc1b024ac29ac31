pub mod agenda;
pub mod config;
pub mod custom;
pub mod feed;
pub mod marks;
pub mod refresh;
pub mod serve;
pub mod status;

use anyhow::{Context, Result};
use scal_core::{ScalConfig, Store};

pub fn open_store(config: &ScalConfig) -> Result<Store> {
    let dir = config.data_dir();
    Store::open(&dir).with_context(|| format!("Failed to open data directory {}", dir.display()))
}

/// `--url`, then `SCHOOLOGY_ICS_URL`.
pub fn feed_url(config: &ScalConfig, url: Option<String>) -> Result<String> {
    url.filter(|u| !u.trim().is_empty())
        .or_else(|| config.schoology.ics_url.clone())
        .context("Pass --url or set SCHOOLOGY_ICS_URL")
}
