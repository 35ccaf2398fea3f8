// src/config/series.rs
//! # Statistics series catalogue
//!
//! Every ONS series the service knows about is described by one `SeriesSpec`:
//! which dataset to query, which dimension filters to send, how to name the
//! value column and how many trailing observations to keep. Routes and the
//! `/full-data` aggregate look series up by topic.
//!
//! Load order:
//! 1) `$SERIES_CONFIG_PATH`
//! 2) `config/series.toml`
//! 3) `config/series.json`
//! 4) built-in `SeriesCatalog::default_seed()`

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_SERIES_CONFIG_PATH: &str = "SERIES_CONFIG_PATH";

/// Routes owned by the router itself; series may not claim them.
const RESERVED_ROUTES: [&str; 8] = [
    "/",
    "/health",
    "/metrics",
    "/weather",
    "/tiktok-trends",
    "/news-headlines",
    "/yougov-polls",
    "/full-data",
];

fn default_edition() -> String {
    "time-series".to_string()
}
fn default_value_key() -> String {
    "value".to_string()
}
fn default_date_key() -> String {
    "date".to_string()
}
fn default_window() -> usize {
    12
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SeriesSpec {
    /// Stable key, e.g. "inflation". Also the metrics label.
    pub topic: String,
    /// Per-topic GET route. `None` means aggregate-only.
    #[serde(default)]
    pub route: Option<String>,
    /// Used in error strings: "Failed to fetch ONS <label> data".
    pub label: String,
    pub data_source: String,
    pub description: String,
    pub dataset: String,
    #[serde(default = "default_edition")]
    pub edition: String,
    pub version: String,
    /// Query filters sent verbatim, e.g. `geography = "K02000001"`, `time = "*"`.
    #[serde(default)]
    pub dimensions: BTreeMap<String, String>,
    #[serde(default = "default_value_key")]
    pub value_key: String,
    #[serde(default = "default_date_key")]
    pub date_key: String,
    #[serde(default = "default_window")]
    pub window: usize,
}

impl SeriesSpec {
    /// Subject phrase for error bodies, e.g. "ONS house price data".
    pub fn subject(&self) -> String {
        format!("ONS {} data", self.label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesCatalog {
    series: Vec<SeriesSpec>,
}

#[derive(Deserialize)]
struct CatalogFile {
    series: Vec<SeriesSpec>,
}

impl SeriesCatalog {
    pub fn new(series: Vec<SeriesSpec>) -> Result<Self> {
        validate(&series)?;
        Ok(Self { series })
    }

    pub fn get(&self, topic: &str) -> Option<&SeriesSpec> {
        self.series.iter().find(|s| s.topic == topic)
    }

    pub fn by_route(&self, route: &str) -> Option<&SeriesSpec> {
        self.series
            .iter()
            .find(|s| s.route.as_deref() == Some(route))
    }

    /// Series that expose their own GET route, in catalogue order.
    pub fn routed(&self) -> impl Iterator<Item = (&str, &SeriesSpec)> {
        self.series
            .iter()
            .filter_map(|s| s.route.as_deref().map(|r| (r, s)))
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Load from an explicit path. TOML or JSON, chosen by extension with a
    /// content sniff as fallback.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading series catalogue from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let series = parse_catalog(&content, &ext)
            .with_context(|| format!("parsing series catalogue {}", path.display()))?;
        Self::new(series)
    }

    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_SERIES_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!("{ENV_SERIES_CONFIG_PATH} points to non-existent path");
            }
            return Self::load_from(&pb);
        }
        for candidate in ["config/series.toml", "config/series.json"] {
            let p = PathBuf::from(candidate);
            if p.exists() {
                return Self::load_from(&p);
            }
        }
        Ok(Self::default_seed())
    }

    /// Built-in catalogue against the versioned ONS datasets API.
    /// Dataset versions move on as ONS publishes; override via config file.
    pub fn default_seed() -> Self {
        let uk = |extra: &[(&str, &str)]| {
            let mut dims = BTreeMap::from([
                ("geography".to_string(), "K02000001".to_string()),
                ("time".to_string(), "*".to_string()),
            ]);
            for (k, v) in extra {
                dims.insert(k.to_string(), v.to_string());
            }
            dims
        };

        let series = vec![
            SeriesSpec {
                topic: "gdp".into(),
                route: Some("/ons-gdp".into()),
                label: "GDP".into(),
                data_source: "ONS UK GDP Quarterly Data".into(),
                description:
                    "Gross Domestic Product: chained volume measures: Seasonally adjusted £m"
                        .into(),
                dataset: "gdp-to-four-decimal-places".into(),
                edition: default_edition(),
                version: "29".into(),
                dimensions: uk(&[("unofficialstandardindustrialclassification", "A--T")]),
                value_key: "value".into(),
                date_key: default_date_key(),
                window: 5,
            },
            SeriesSpec {
                topic: "inflation".into(),
                route: Some("/ons-inflation".into()),
                label: "inflation".into(),
                data_source: "ONS UK Inflation Rate".into(),
                description: "Consumer Prices Index including owner occupiers' housing costs (CPIH) 12-month rate".into(),
                dataset: "cpih01".into(),
                edition: default_edition(),
                version: "6".into(),
                dimensions: uk(&[("aggregate", "cpih1dim1A0")]),
                value_key: "rate_percent".into(),
                date_key: default_date_key(),
                window: 12,
            },
            SeriesSpec {
                topic: "unemployment".into(),
                route: Some("/ons-unemployment".into()),
                label: "unemployment".into(),
                data_source: "ONS UK Unemployment Rate".into(),
                description: "Unemployment rate (aged 16 and over, seasonally adjusted)".into(),
                dataset: "labour-market".into(),
                edition: default_edition(),
                version: "1".into(),
                dimensions: uk(&[
                    ("agegroups", "16+"),
                    ("economicactivity", "unemployed"),
                    ("seasonaladjustment", "seasonal-adjustment"),
                    ("sex", "all-adults"),
                    ("unitofmeasure", "rates"),
                ]),
                value_key: "rate_percent".into(),
                date_key: default_date_key(),
                window: 12,
            },
            SeriesSpec {
                topic: "house_prices".into(),
                route: Some("/ons-house-prices".into()),
                label: "house price".into(),
                data_source: "ONS UK House Prices".into(),
                description: "Average house prices for the United Kingdom (seasonally adjusted)".into(),
                dataset: "house-prices-local-authority".into(),
                edition: default_edition(),
                version: "1".into(),
                dimensions: uk(&[]),
                value_key: "average_price_gbp".into(),
                date_key: default_date_key(),
                window: 12,
            },
            SeriesSpec {
                topic: "population".into(),
                route: Some("/ons-population".into()),
                label: "population".into(),
                data_source: "ONS UK Population".into(),
                description: "UK population estimates (mid-year, thousands)".into(),
                dataset: "mid-year-pop-est".into(),
                edition: default_edition(),
                version: "4".into(),
                dimensions: uk(&[("age", "total"), ("sex", "0")]),
                value_key: "population_thousands".into(),
                date_key: "year".into(),
                window: 5,
            },
            SeriesSpec {
                topic: "retail_sales".into(),
                route: Some("/ons-retail-sales".into()),
                label: "retail sales".into(),
                data_source: "ONS UK Retail Sales".into(),
                description: "Retail sales quantity (seasonally adjusted)".into(),
                dataset: "retail-sales-index".into(),
                edition: default_edition(),
                version: "1".into(),
                dimensions: uk(&[
                    ("prices", "chained-volume-of-retail-sales"),
                    ("seasonaladjustment", "seasonal-adjustment"),
                    (
                        "unofficialstandardindustrialclassification",
                        "all-retailing-including-automotive-fuel",
                    ),
                ]),
                value_key: "index_value".into(),
                date_key: default_date_key(),
                window: 12,
            },
            SeriesSpec {
                topic: "wage_growth".into(),
                route: None,
                label: "wage growth".into(),
                data_source: "ONS UK Average Weekly Earnings".into(),
                description: "Average weekly earnings, total pay, annual growth (three month average)".into(),
                dataset: "average-weekly-earnings".into(),
                edition: default_edition(),
                version: "1".into(),
                dimensions: uk(&[
                    ("aggregate", "total-pay"),
                    ("industry", "whole-economy"),
                    ("type", "seasonally-adjusted-total-pay-three-month-average-growth"),
                ]),
                value_key: "growth_percent".into(),
                date_key: default_date_key(),
                window: 12,
            },
        ];

        Self { series }
    }
}

fn parse_catalog(s: &str, hint_ext: &str) -> Result<Vec<SeriesSpec>> {
    let try_toml = hint_ext == "toml" || s.contains("[[series]]");
    if try_toml {
        if let Ok(f) = toml::from_str::<CatalogFile>(s) {
            return Ok(f.series);
        }
    }
    if let Ok(f) = serde_json::from_str::<CatalogFile>(s) {
        return Ok(f.series);
    }
    if !try_toml {
        if let Ok(f) = toml::from_str::<CatalogFile>(s) {
            return Ok(f.series);
        }
    }
    // Surface the parser error for the format we expected.
    if try_toml {
        toml::from_str::<CatalogFile>(s)
            .map(|f| f.series)
            .context("invalid TOML series catalogue")
    } else {
        Err(anyhow!("unsupported series catalogue format"))
    }
}

fn validate(series: &[SeriesSpec]) -> Result<()> {
    let mut topics = HashSet::new();
    let mut routes = HashSet::new();
    for s in series {
        if s.topic.trim().is_empty() {
            bail!("series with empty topic");
        }
        if !topics.insert(s.topic.as_str()) {
            bail!("duplicate series topic '{}'", s.topic);
        }
        if s.window == 0 {
            bail!("series '{}' has window 0", s.topic);
        }
        if s.dataset.trim().is_empty() || s.version.trim().is_empty() {
            bail!("series '{}' needs dataset and version", s.topic);
        }
        if let Some(r) = &s.route {
            if !r.starts_with('/') {
                bail!("series '{}' route must start with '/': {r}", s.topic);
            }
            if RESERVED_ROUTES.contains(&r.as_str()) {
                bail!("series '{}' route {r} is reserved", s.topic);
            }
            if !routes.insert(r.as_str()) {
                bail!("duplicate series route {r}");
            }
        }
    }
    Ok(())
}
