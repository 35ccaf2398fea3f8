use std::sync::Arc;

use axum::{
    extract::{MatchedPath, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::aggregate;
use crate::config::{AppConfig, SeriesCatalog};
use crate::metrics::Metrics;
use crate::sources::{
    fixed,
    headlines::{self, Headline},
    statistics::{self, SeriesReport},
    FetchError,
};
use crate::upstream::Upstream;

pub const STATUS_MESSAGE: &str = "Middlington API is running.";

/// Everything a handler can see. Read-only; cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub catalog: Arc<SeriesCatalog>,
    pub upstream: Arc<dyn Upstream>,
}

impl AppState {
    pub fn new(config: AppConfig, catalog: SeriesCatalog, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            upstream,
        }
    }
}

/// 500 body: `{"error": ..., "message": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
}

impl ApiError {
    /// `subject` is the phrase after the verb, e.g. "ONS inflation data".
    pub fn from_fetch(subject: &str, e: &FetchError) -> Self {
        let error = match e {
            FetchError::Status(_) => format!("Failed to fetch {subject}"),
            _ => format!("Error fetching {subject}"),
        };
        Self {
            error,
            message: e.message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let series_routes: Vec<String> = state
        .catalog
        .routed()
        .map(|(path, _)| path.to_string())
        .collect();

    let mut r = Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "ok" }))
        .route("/weather", get(weather))
        .route("/tiktok-trends", get(tiktok_trends))
        .route("/news-headlines", get(news_headlines))
        .route("/yougov-polls", get(yougov_polls))
        .route("/full-data", get(full_data));

    for path in &series_routes {
        r = r.route(path, get(series));
    }

    match Metrics::init() {
        Ok(m) => r = r.merge(m.router()),
        Err(e) => tracing::warn!(error = ?e, "metrics recorder unavailable; /metrics disabled"),
    }

    r.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct StatusResp {
    status: &'static str,
}

async fn index() -> Json<StatusResp> {
    Json(StatusResp {
        status: STATUS_MESSAGE,
    })
}

async fn weather() -> Json<fixed::SampleWeather> {
    Json(fixed::sample_weather())
}

async fn tiktok_trends() -> Json<fixed::TikTokTrends> {
    Json(fixed::tiktok_trends())
}

async fn yougov_polls() -> Json<fixed::PollsReport> {
    Json(fixed::polls())
}

#[derive(Serialize)]
struct HeadlinesResp {
    headlines: Vec<Headline>,
}

async fn news_headlines(State(state): State<AppState>) -> Result<Json<HeadlinesResp>, ApiError> {
    headlines::fetch_headlines(state.upstream.as_ref(), &state.config.news_feed_url)
        .await
        .map(|headlines| Json(HeadlinesResp { headlines }))
        .map_err(|e| ApiError::from_fetch("news headlines", &e))
}

/// Shared handler for every catalogue route; the matched path picks the series.
async fn series(
    State(state): State<AppState>,
    path: MatchedPath,
) -> Result<Json<SeriesReport>, ApiError> {
    let Some(spec) = state.catalog.by_route(path.as_str()) else {
        // Unreachable unless the router and catalogue disagree.
        return Err(ApiError {
            error: "Unknown statistics route".to_string(),
            message: path.as_str().to_string(),
        });
    };

    statistics::fetch_series(state.upstream.as_ref(), &state.config.ons_api_base, spec)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_fetch(&spec.subject(), &e))
}

async fn full_data(State(state): State<AppState>) -> Json<Map<String, Value>> {
    Json(aggregate::full_data(&state).await)
}
