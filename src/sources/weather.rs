// src/sources/weather.rs
use reqwest::Url;
use serde_json::Value;

use super::{fetch_body, parse_json, record_error, FetchError};
use crate::config::WeatherConfig;
use crate::upstream::Upstream;

const SOURCE: &str = "weather";

pub fn forecast_url(cfg: &WeatherConfig) -> Result<Url, FetchError> {
    let raw = format!("{}/forecast", cfg.api_base);
    Url::parse_with_params(
        &raw,
        &[
            ("latitude", cfg.latitude.to_string()),
            ("longitude", cfg.longitude.to_string()),
            ("current_weather", "true".to_string()),
        ],
    )
    .map_err(|e| FetchError::Other(anyhow::anyhow!("bad weather url {raw}: {e}")))
}

/// Open-Meteo `current_weather` object, passed through untouched.
pub async fn fetch_current(
    upstream: &dyn Upstream,
    cfg: &WeatherConfig,
) -> Result<Value, FetchError> {
    let body = fetch_body(upstream, SOURCE, &forecast_url(cfg)?).await?;
    let out = current_weather(&body);
    if let Err(e) = &out {
        record_error(SOURCE, e);
    }
    out
}

pub fn current_weather(body: &str) -> Result<Value, FetchError> {
    let mut v = parse_json(body, "weather forecast")?;
    match v.get_mut("current_weather").map(Value::take) {
        Some(cw @ Value::Object(_)) => Ok(cw),
        _ => Err(FetchError::shape("forecast has no 'current_weather' object")),
    }
}
