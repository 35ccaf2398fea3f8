// tests/common/mod.rs
//
// Canned upstream for router tests: no sockets, no network.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use reqwest::Url;
use serde_json::Value as Json;
use tower::ServiceExt as _;

use middlington_api::config::{AppConfig, TrendsConfig, WeatherConfig};
use middlington_api::{router, AppState, SeriesCatalog, Upstream, UpstreamResponse};

pub const ONS_OBSERVATIONS: &str = include_str!("../fixtures/ons_observations.json");
pub const NEWS_RSS: &str = include_str!("../fixtures/news_rss.xml");
pub const TRENDS_EXPLORE: &str = include_str!("../fixtures/trends_explore.txt");
pub const TRENDS_MULTILINE: &str = include_str!("../fixtures/trends_multiline.txt");
pub const OPEN_METEO: &str = include_str!("../fixtures/open_meteo.json");

/// Observations in `ons_observations.json`.
pub const ONS_FIXTURE_LEN: usize = 14;

const BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone)]
enum Reply {
    Respond(UpstreamResponse),
    Fail(String),
}

/// First stub whose needle is a substring of the URL wins.
#[derive(Default)]
pub struct StubUpstream {
    stubs: Mutex<Vec<(String, Reply)>>,
    calls: Mutex<Vec<String>>,
}

impl StubUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every source answers with its fixture.
    pub fn healthy() -> Self {
        Self::new()
            .reply("ons.test", 200, ONS_OBSERVATIONS)
            .reply("news.test", 200, NEWS_RSS)
            .reply("/explore", 200, TRENDS_EXPLORE)
            .reply("/widgetdata/multiline", 200, TRENDS_MULTILINE)
            .reply("weather.test", 200, OPEN_METEO)
    }

    /// Put a stub ahead of the existing ones.
    pub fn reply(self, needle: &str, status: u16, body: &str) -> Self {
        self.stubs.lock().unwrap().insert(
            0,
            (
                needle.to_string(),
                Reply::Respond(UpstreamResponse::with_status(status, body)),
            ),
        );
        self
    }

    pub fn fail(self, needle: &str, msg: &str) -> Self {
        self.stubs
            .lock()
            .unwrap()
            .insert(0, (needle.to_string(), Reply::Fail(msg.to_string())));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Upstream for StubUpstream {
    async fn get(&self, url: &Url) -> anyhow::Result<UpstreamResponse> {
        self.calls.lock().unwrap().push(url.to_string());
        let hit = self
            .stubs
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| url.as_str().contains(needle.as_str()))
            .map(|(_, r)| r.clone());
        match hit {
            Some(Reply::Respond(r)) => Ok(r),
            Some(Reply::Fail(msg)) => Err(anyhow::anyhow!(msg)),
            None => Err(anyhow::anyhow!("no stub for {url}")),
        }
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        ons_api_base: "https://ons.test/v1".into(),
        news_feed_url: "https://news.test/rss.xml".into(),
        trends: TrendsConfig {
            api_base: "https://trends.test/trends/api".into(),
            geo: "GB".into(),
            keywords: vec![
                "cost of living".into(),
                "food bank".into(),
                "energy bills".into(),
                "rent prices".into(),
            ],
        },
        weather: WeatherConfig {
            api_base: "https://weather.test/v1".into(),
            latitude: 52.4862,
            longitude: -1.8904,
        },
        ..AppConfig::default()
    }
}

/// Router over `upstream` plus a handle to inspect the calls it received.
pub fn test_router(upstream: StubUpstream) -> (Router, Arc<StubUpstream>) {
    let upstream = Arc::new(upstream);
    let state = AppState::new(
        test_config(),
        SeriesCatalog::default_seed(),
        upstream.clone(),
    );
    (router(state), upstream)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET request");
    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, bytes)
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Json) {
    let (status, bytes) = get(app, uri).await;
    let v: Json = serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("{uri} did not return JSON ({e}): {bytes:?}"));
    (status, v)
}
