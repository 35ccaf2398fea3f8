// src/aggregate.rs
//! `/full-data`: every source in a fixed order, one after another, merged into
//! one object. A failing source turns into `<topic>_error` and never touches
//! its neighbours or the status code.

use metrics::counter;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::api::{ApiError, AppState};
use crate::sources::{fixed, headlines, statistics, trends, weather, FetchError};

/// Output key → catalogue topic.
pub const STATISTICS_TOPICS: [(&str, &str); 3] = [
    ("inflation_rate", "inflation"),
    ("unemployment_rate", "unemployment"),
    ("wage_growth", "wage_growth"),
];

pub async fn full_data(state: &AppState) -> Map<String, Value> {
    counter!("full_data_requests_total").increment(1);
    let up = state.upstream.as_ref();
    let cfg = &state.config;
    let mut out = Map::new();

    for (key, topic) in STATISTICS_TOPICS {
        match state.catalog.get(topic) {
            Some(spec) => {
                let res = statistics::fetch_series(up, &cfg.ons_api_base, spec).await;
                merge(&mut out, key, &spec.subject(), res);
            }
            None => {
                let res: Result<(), _> = Err(FetchError::Other(anyhow::anyhow!(
                    "series '{topic}' is not configured"
                )));
                merge(&mut out, key, &format!("ONS {topic} data"), res);
            }
        }
    }

    merge(
        &mut out,
        "news_headlines",
        "news headlines",
        headlines::fetch_headlines(up, &cfg.news_feed_url).await,
    );
    merge(
        &mut out,
        "google_trends",
        "Google Trends data",
        trends::fetch_interest(up, &cfg.trends).await,
    );
    merge(
        &mut out,
        "current_weather",
        "weather data",
        weather::fetch_current(up, &cfg.weather).await,
    );
    merge(
        &mut out,
        "foodbank_stats",
        "foodbank stats",
        Ok(fixed::foodbank_stats()),
    );

    let failed = out.keys().filter(|k| k.ends_with("_error")).count();
    tracing::info!(topics = out.len(), failed, "full-data assembled");
    out
}

/// `<key>_error` reads like the per-topic 500 body: "<error>: <message>".
fn merge<T: Serialize>(
    out: &mut Map<String, Value>,
    key: &str,
    subject: &str,
    res: Result<T, FetchError>,
) {
    let res = res.and_then(|v| {
        serde_json::to_value(v).map_err(|e| FetchError::Other(anyhow::Error::new(e)))
    });
    match res {
        Ok(v) => {
            out.insert(key.to_string(), v);
        }
        Err(e) => {
            let api = ApiError::from_fetch(subject, &e);
            let message = format!("{}: {}", api.error, api.message);
            tracing::warn!(topic = key, error = %message, "full-data topic degraded");
            out.insert(format!("{key}_error"), Value::String(message));
        }
    }
}
