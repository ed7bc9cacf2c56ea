// src/lib.rs
// Public library surface for the binary, integration tests and reuse.

pub mod api;
pub mod cache;
pub mod collocation;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod lexicon;
pub mod metrics;
pub mod sentiment;
pub mod stats;

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tracing::{info, warn};

pub use crate::api::{router, AppState};
pub use crate::engine::{ScoreRun, Scorer};
pub use crate::error::SentimentError;

use crate::config::PipelineConfig;
use crate::lexicon::LexiconPair;
use crate::stats::dhlab::{http_client, DhlabClient};

/// Build the full application from the default configuration: load both
/// lexicons (fatal on failure), wire the DH-lab client and mount `/metrics`
/// when a Prometheus recorder can be installed.
pub async fn app() -> anyhow::Result<Router> {
    let cfg = PipelineConfig::load_default()?;
    app_with_config(&cfg).await
}

pub async fn app_with_config(cfg: &PipelineConfig) -> anyhow::Result<Router> {
    let http = http_client(&cfg.service)?;
    let lexicons = LexiconPair::load(&cfg.lexicon, &http)
        .await
        .context("loading sentiment lexicons")?;

    let service = Arc::new(DhlabClient::new(http, &cfg.service));
    let scorer = Scorer::new(service, Arc::new(lexicons));
    let state = AppState::new(scorer, cfg.window, cfg.cache.capacity);

    let mut router = api::router(state);
    match crate::metrics::Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => warn!(error = %e, "prometheus recorder not installed, /metrics disabled"),
    }

    info!(base_url = %cfg.service.base_url, "application ready");
    Ok(router)
}
