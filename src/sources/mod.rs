// src/sources/mod.rs
//! Per-source fetchers. Each one turns "no input" into a typed result or a
//! `FetchError`; none of them panic or retry.

pub mod fixed;
pub mod headlines;
pub mod statistics;
pub mod trends;
pub mod weather;

use metrics::{counter, histogram};
use reqwest::Url;

use crate::upstream::{redact, Upstream};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Upstream answered, but not with 200.
    #[error("upstream returned HTTP {0}")]
    Status(u16),
    /// Body parsed but a required field was missing or had the wrong type.
    #[error("unexpected response shape: {0}")]
    Shape(String),
    /// Network, decode, or anything else.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FetchError {
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    /// Metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status(_) => "status",
            Self::Shape(_) => "shape",
            Self::Other(_) => "other",
        }
    }

    /// Full message including the anyhow context chain.
    pub fn message(&self) -> String {
        format!("{self:#}")
    }
}

/// One GET, classified. Returns the body only for HTTP 200.
pub(crate) async fn fetch_body(
    upstream: &dyn Upstream,
    source: &str,
    url: &Url,
) -> Result<String, FetchError> {
    let t0 = std::time::Instant::now();
    counter!("upstream_requests_total", "source" => source.to_string()).increment(1);

    let res = match upstream.get(url).await {
        Ok(r) if r.status == 200 => Ok(r.body),
        Ok(r) => Err(FetchError::Status(r.status)),
        Err(e) => Err(FetchError::Other(e)),
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("upstream_fetch_ms", "source" => source.to_string()).record(ms);

    if let Err(e) = &res {
        record_error(source, e);
        tracing::warn!(source, url = %redact(url), error = %e.message(), "upstream fetch failed");
    } else {
        tracing::debug!(source, url = %redact(url), ms, "upstream fetch ok");
    }
    res
}

/// Count a failure that happened after the body arrived (parse/shape).
pub(crate) fn record_error(source: &str, e: &FetchError) {
    counter!(
        "upstream_errors_total",
        "source" => source.to_string(),
        "kind" => e.kind()
    )
    .increment(1);
}

/// Parse a JSON body, mapping decode failures to `Shape`.
pub(crate) fn parse_json(body: &str, what: &str) -> Result<serde_json::Value, FetchError> {
    serde_json::from_str(body).map_err(|e| FetchError::Shape(format!("{what}: invalid JSON: {e}")))
}
