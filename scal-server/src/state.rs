use std::sync::Arc;

use anyhow::{Context, Result};
use tera::Tera;

use scal_core::{FeedBuilder, ScalConfig, Store, Upstream};
use scal_schoology::SchoologyClient;

use crate::pages;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ScalConfig>,
    pub store: Arc<Store>,
    pub upstream: Arc<dyn Upstream>,
    pub templates: Arc<Tera>,
}

impl AppState {
    /// Open the data directory and talk to the real Schoology API.
    pub fn from_config(config: ScalConfig) -> Result<Self> {
        let dir = config.data_dir();
        let store = Store::open(&dir)
            .with_context(|| format!("Failed to open data directory {}", dir.display()))?;
        let upstream = SchoologyClient::new(&config)?;

        Self::new(config, store, Arc::new(upstream))
    }

    pub fn new(config: ScalConfig, store: Store, upstream: Arc<dyn Upstream>) -> Result<Self> {
        Ok(AppState {
            config: Arc::new(config),
            store: Arc::new(store),
            upstream,
            templates: Arc::new(pages::load()?),
        })
    }

    pub fn feed_builder(&self) -> FeedBuilder<'_> {
        FeedBuilder::new(&self.config, &self.store, self.upstream.as_ref())
    }
}
