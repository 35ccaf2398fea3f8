// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod metrics;
pub mod sources;
pub mod upstream;

use std::sync::Arc;

use axum::Router;

pub use crate::api::{router, AppState};
pub use crate::config::{AppConfig, SeriesCatalog};
pub use crate::upstream::{HttpUpstream, Upstream, UpstreamResponse};

/// Build the production router: env config, series catalogue, reqwest upstream.
pub async fn app() -> anyhow::Result<Router> {
    let (_, router) = app_with_config().await?;
    Ok(router)
}

/// Same as [`app`], also handing back the config so the caller knows where to bind.
pub async fn app_with_config() -> anyhow::Result<(AppConfig, Router)> {
    let config = AppConfig::from_env()?;
    let catalog = SeriesCatalog::load_default()?;
    tracing::info!(
        series = catalog.len(),
        ons = %config.ons_api_base,
        feed = %config.news_feed_url,
        "configuration loaded"
    );
    let upstream: Arc<dyn Upstream> = Arc::new(HttpUpstream::new()?);
    let state = AppState::new(config.clone(), catalog, upstream);
    Ok((config, router(state)))
}
