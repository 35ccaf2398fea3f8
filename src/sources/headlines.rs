// src/sources/headlines.rs
use once_cell::sync::OnceCell;
use quick_xml::de::from_str;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::{fetch_body, record_error, FetchError};
use crate::upstream::Upstream;

pub const HEADLINE_LIMIT: usize = 5;
const SOURCE: &str = "news";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Headline {
    pub title: String,
    pub link: String,
}

// RSS 2.0
#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
}

// Atom
#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}
#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    link: Vec<AtomLink>,
}
#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}
#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

impl AtomEntry {
    /// `rel="alternate"` or no rel is the article link; anything else is not.
    fn article_link(&self) -> Option<String> {
        self.link
            .iter()
            .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
            .and_then(|l| l.href.clone())
    }
}

pub async fn fetch_headlines(
    upstream: &dyn Upstream,
    feed_url: &str,
) -> Result<Vec<Headline>, FetchError> {
    let url = Url::parse(feed_url)
        .map_err(|e| FetchError::Other(anyhow::anyhow!("bad feed url {feed_url}: {e}")))?;
    let body = fetch_body(upstream, SOURCE, &url).await?;
    let out = parse_feed(&body);
    if let Err(e) = &out {
        record_error(SOURCE, e);
    }
    out
}

/// First `HEADLINE_LIMIT` entries that carry both a title and a link, feed
/// order kept. RSS is tried first, then Atom.
pub fn parse_feed(xml: &str) -> Result<Vec<Headline>, FetchError> {
    let xml_clean = scrub_html_entities_for_xml(xml.trim_start_matches('\u{feff}'));
    if !xml_clean.trim_start().starts_with('<') {
        return Err(FetchError::shape("feed body is not XML"));
    }

    let pairs: Vec<(Option<String>, Option<String>)> = match from_str::<Rss>(&xml_clean) {
        Ok(rss) => rss
            .channel
            .item
            .into_iter()
            .map(|it| (it.title, it.link))
            .collect(),
        Err(rss_err) => match from_str::<AtomFeed>(&xml_clean) {
            Ok(feed) => feed
                .entry
                .into_iter()
                .map(|e| {
                    let link = e.article_link();
                    (e.title.map(|t| t.value), link)
                })
                .collect(),
            Err(atom_err) => {
                return Err(FetchError::shape(format!(
                    "feed is neither RSS ({rss_err}) nor Atom ({atom_err})"
                )))
            }
        },
    };

    Ok(pairs
        .into_iter()
        .filter_map(|(title, link)| {
            let title = normalize_title(title.as_deref().unwrap_or_default());
            let link = link.unwrap_or_default().trim().to_string();
            (!title.is_empty() && !link.is_empty()).then_some(Headline { title, link })
        })
        .take(HEADLINE_LIMIT)
        .collect())
}

/// Decode entities, collapse whitespace.
fn normalize_title(s: &str) -> String {
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let decoded = html_escape::decode_html_entities(s);
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("static regex"));
    re_ws.replace_all(&decoded, " ").trim().to_string()
}

/// XML only knows five named entities; feeds routinely use HTML ones.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&pound;", "£")
}
