// src/config/mod.rs
//! Process configuration read once at startup.
//!
//! Everything here is immutable after `AppConfig::from_env()`; handlers only ever
//! see it behind an `Arc`.

pub mod series;

use anyhow::{Context, Result};
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub use series::{SeriesCatalog, SeriesSpec};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_ONS_API_BASE: &str = "https://api.beta.ons.gov.uk/v1";
pub const DEFAULT_NEWS_FEED_URL: &str = "http://feeds.bbci.co.uk/news/rss.xml";
pub const DEFAULT_TRENDS_API_BASE: &str = "https://trends.google.com/trends/api";
pub const DEFAULT_WEATHER_API_BASE: &str = "https://api.open-meteo.com/v1";

const DEFAULT_TRENDS_KEYWORDS: [&str; 4] =
    ["cost of living", "food bank", "energy bills", "rent prices"];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub ons_api_base: String,
    pub news_feed_url: String,
    pub trends: TrendsConfig,
    pub weather: WeatherConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendsConfig {
    pub api_base: String,
    pub geo: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherConfig {
    pub api_base: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            ons_api_base: DEFAULT_ONS_API_BASE.to_string(),
            news_feed_url: DEFAULT_NEWS_FEED_URL.to_string(),
            trends: TrendsConfig {
                api_base: DEFAULT_TRENDS_API_BASE.to_string(),
                geo: "GB".to_string(),
                keywords: DEFAULT_TRENDS_KEYWORDS
                    .iter()
                    .map(|k| k.to_string())
                    .collect(),
            },
            // Middlington is fictional; these point at the West Midlands.
            weather: WeatherConfig {
                api_base: DEFAULT_WEATHER_API_BASE.to_string(),
                latitude: 52.4862,
                longitude: -1.8904,
            },
        }
    }
}

impl AppConfig {
    /// Build config from env vars layered over `Default`.
    ///
    /// Recognised: `PORT`, `BIND_ADDR`, `ONS_API_BASE`, `NEWS_FEED_URL`,
    /// `TRENDS_API_BASE`, `TRENDS_GEO`, `TRENDS_KEYWORDS` (comma separated),
    /// `WEATHER_API_BASE`, `WEATHER_LATITUDE`, `WEATHER_LONGITUDE`.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();

        if let Some(p) = env_nonempty("PORT") {
            cfg.port = p
                .parse()
                .with_context(|| format!("PORT is not a valid port: {p:?}"))?;
        }
        if let Some(a) = env_nonempty("BIND_ADDR") {
            cfg.bind_addr = a
                .parse()
                .with_context(|| format!("BIND_ADDR is not an IP address: {a:?}"))?;
        }
        if let Some(v) = env_nonempty("ONS_API_BASE") {
            cfg.ons_api_base = trim_base(v);
        }
        if let Some(v) = env_nonempty("NEWS_FEED_URL") {
            cfg.news_feed_url = v;
        }
        if let Some(v) = env_nonempty("TRENDS_API_BASE") {
            cfg.trends.api_base = trim_base(v);
        }
        if let Some(v) = env_nonempty("TRENDS_GEO") {
            cfg.trends.geo = v.to_ascii_uppercase();
        }
        if let Some(v) = env_nonempty("TRENDS_KEYWORDS") {
            let kws = parse_keywords(&v);
            if !kws.is_empty() {
                cfg.trends.keywords = kws;
            }
        }
        if let Some(v) = env_nonempty("WEATHER_API_BASE") {
            cfg.weather.api_base = trim_base(v);
        }
        if let Some(v) = env_nonempty("WEATHER_LATITUDE") {
            cfg.weather.latitude = v
                .parse()
                .with_context(|| format!("WEATHER_LATITUDE is not a number: {v:?}"))?;
        }
        if let Some(v) = env_nonempty("WEATHER_LONGITUDE") {
            cfg.weather.longitude = v
                .parse()
                .with_context(|| format!("WEATHER_LONGITUDE is not a number: {v:?}"))?;
        }

        Ok(cfg)
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn trim_base(v: String) -> String {
    v.trim_end_matches('/').to_string()
}

fn parse_keywords(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}
