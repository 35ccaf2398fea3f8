// src/upstream.rs
//! The single seam between handlers and the network.
//!
//! Fetchers never touch `reqwest` directly; they call `Upstream::get`. The binary
//! wires in `HttpUpstream`, tests wire in canned responses.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};

/// Raw upstream reply. Status is kept so callers can classify non-200s
/// without `error_for_status` throwing the body away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait Upstream: Send + Sync {
    async fn get(&self, url: &Url) -> Result<UpstreamResponse>;
}

/// `reqwest`-backed upstream. One pooled client for the whole process; no
/// timeout beyond reqwest's defaults.
#[derive(Clone)]
pub struct HttpUpstream {
    client: Client,
}

impl HttpUpstream {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("middlington-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building reqwest client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn get(&self, url: &Url) -> Result<UpstreamResponse> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {}", redact(url)))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .with_context(|| format!("reading body of {}", redact(url)))?;
        Ok(UpstreamResponse { status, body })
    }
}

/// Host + path only; query strings can be long (trends) and are noise in logs.
pub fn redact(url: &Url) -> String {
    format!("{}{}", url.host_str().unwrap_or_default(), url.path())
}
