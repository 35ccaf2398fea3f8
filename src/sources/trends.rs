// src/sources/trends.rs
//! Google Trends interest-over-time, the way the public web client asks for it:
//!
//! 1. `GET <base>/explore?req=...` returns the widget list; the `TIMESERIES`
//!    widget carries a `token` and a `request` object.
//! 2. `GET <base>/widgetdata/multiline?req=<request>&token=<token>` returns
//!    `default.timelineData`, one row per time bucket with one value per keyword.
//!
//! Both bodies start with the `)]}'` anti-hijacking prefix.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, Utc};
use reqwest::Url;
use serde_json::{json, Value};

use super::{fetch_body, parse_json, record_error, FetchError};
use crate::config::TrendsConfig;
use crate::upstream::Upstream;

const SOURCE: &str = "google_trends";
const WINDOW_DAYS: i64 = 7;

/// Keyword → most recent interest value (0-100). Keywords without data are absent.
pub type TrendsInterest = BTreeMap<String, i64>;

/// `"YYYY-MM-DD YYYY-MM-DD"`, trailing `WINDOW_DAYS` ending `today`.
pub fn timeframe(today: NaiveDate) -> String {
    let start = today - Duration::days(WINDOW_DAYS);
    format!("{} {}", start.format("%Y-%m-%d"), today.format("%Y-%m-%d"))
}

pub fn explore_url(cfg: &TrendsConfig, today: NaiveDate) -> Result<Url, FetchError> {
    let time = timeframe(today);
    let items: Vec<Value> = cfg
        .keywords
        .iter()
        .map(|k| json!({ "keyword": k, "geo": cfg.geo, "time": time }))
        .collect();
    let req = json!({ "comparisonItem": items, "category": 0, "property": "" });
    build_url(
        &format!("{}/explore", cfg.api_base),
        &[
            ("hl", "en-GB".to_string()),
            ("tz", "0".to_string()),
            ("req", req.to_string()),
        ],
    )
}

fn multiline_url(cfg: &TrendsConfig, request: &Value, token: &str) -> Result<Url, FetchError> {
    build_url(
        &format!("{}/widgetdata/multiline", cfg.api_base),
        &[
            ("hl", "en-GB".to_string()),
            ("tz", "0".to_string()),
            ("req", request.to_string()),
            ("token", token.to_string()),
        ],
    )
}

fn build_url(raw: &str, params: &[(&str, String)]) -> Result<Url, FetchError> {
    Url::parse_with_params(raw, params)
        .map_err(|e| FetchError::Other(anyhow::anyhow!("bad trends url {raw}: {e}")))
}

pub async fn fetch_interest(
    upstream: &dyn Upstream,
    cfg: &TrendsConfig,
) -> Result<TrendsInterest, FetchError> {
    let res = fetch_interest_inner(upstream, cfg).await;
    // Status and transport failures are already counted by `fetch_body`.
    if let Err(e) = &res {
        if matches!(e, FetchError::Shape(_)) {
            record_error(SOURCE, e);
        }
    }
    res
}

async fn fetch_interest_inner(
    upstream: &dyn Upstream,
    cfg: &TrendsConfig,
) -> Result<TrendsInterest, FetchError> {
    let explore = fetch_body(upstream, SOURCE, &explore_url(cfg, Utc::now().date_naive())?).await?;
    let (token, request) = timeseries_widget(&explore)?;

    let url = multiline_url(cfg, &request, &token)?;
    let multiline = fetch_body(upstream, SOURCE, &url).await?;
    latest_interest(&multiline, &cfg.keywords)
}

fn strip_xssi_prefix(body: &str) -> &str {
    match body.find('{') {
        Some(i) => &body[i..],
        None => body,
    }
}

/// Token and request object of the TIMESERIES widget.
pub fn timeseries_widget(body: &str) -> Result<(String, Value), FetchError> {
    let v = parse_json(strip_xssi_prefix(body), "trends explore")?;
    let widget = v
        .get("widgets")
        .and_then(Value::as_array)
        .and_then(|ws| {
            ws.iter().find(|w| {
                w.get("id")
                    .and_then(Value::as_str)
                    .is_some_and(|id| id.starts_with("TIMESERIES"))
            })
        })
        .ok_or_else(|| FetchError::shape("trends explore has no TIMESERIES widget"))?;

    let token = widget
        .get("token")
        .and_then(Value::as_str)
        .ok_or_else(|| FetchError::shape("TIMESERIES widget has no token"))?;
    let request = widget
        .get("request")
        .filter(|r| r.is_object())
        .ok_or_else(|| FetchError::shape("TIMESERIES widget has no request"))?;

    Ok((token.to_string(), request.clone()))
}

/// Each keyword's value from the newest row. A keyword is absent only when
/// there are no rows or the newest row has no value at its index.
pub fn latest_interest(body: &str, keywords: &[String]) -> Result<TrendsInterest, FetchError> {
    let v = parse_json(strip_xssi_prefix(body), "trends multiline")?;
    let rows = v
        .pointer("/default/timelineData")
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::shape("trends multiline has no default.timelineData"))?;

    let mut out = TrendsInterest::new();
    let Some(values) = rows.last().and_then(|row| row.get("value")) else {
        return Ok(out);
    };
    for (i, kw) in keywords.iter().enumerate() {
        if let Some(n) = values.get(i).and_then(Value::as_i64) {
            out.insert(kw.clone(), n);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kws() -> Vec<String> {
        vec!["a".into(), "b".into(), "c".into(), "d".into()]
    }

    #[test]
    fn timeframe_is_trailing_week() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        assert_eq!(timeframe(d), "2024-03-01 2024-03-08");
    }

    #[test]
    fn explore_widget_is_found_after_prefix() {
        let body = ")]}'\n{\"widgets\":[{\"id\":\"GEO_MAP\",\"token\":\"x\",\"request\":{}},{\"id\":\"TIMESERIES\",\"token\":\"tok\",\"request\":{\"time\":\"t\"}}]}";
        let (tok, req) = timeseries_widget(body).unwrap();
        assert_eq!(tok, "tok");
        assert_eq!(req["time"], "t");
    }

    #[test]
    fn newest_row_wins_even_without_data() {
        let body = r#")]}',
{"default":{"timelineData":[
  {"time":"1","value":[10,20,30,0],"hasData":[true,true,true,false]},
  {"time":"2","value":[11,0,31,0],"hasData":[true,false,true,false]}
]}}"#;
        let out = latest_interest(body, &kws()).unwrap();
        assert_eq!(out.get("a"), Some(&11));
        assert_eq!(out.get("b"), Some(&0));
        assert_eq!(out.get("c"), Some(&31));
        assert_eq!(out.get("d"), Some(&0));
    }

    #[test]
    fn short_value_row_omits_trailing_keywords() {
        let body = r#"{"default":{"timelineData":[{"time":"1","value":[5,6]}]}}"#;
        let out = latest_interest(body, &kws()).unwrap();
        assert_eq!(out.len(), 2);
        assert!(!out.contains_key("c"));
        assert!(!out.contains_key("d"));
    }

    #[test]
    fn no_rows_means_empty_not_error() {
        let out = latest_interest(r#"{"default":{"timelineData":[]}}"#, &kws()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn explore_url_lists_every_keyword() {
        let cfg = TrendsConfig {
            api_base: "https://trends.test/api".into(),
            geo: "GB".into(),
            keywords: kws(),
        };
        let u = explore_url(&cfg, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()).unwrap();
        assert_eq!(u.path(), "/api/explore");
        let req = u
            .query_pairs()
            .find(|(k, _)| k == "req")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        let v: Value = serde_json::from_str(&req).unwrap();
        assert_eq!(v["comparisonItem"].as_array().unwrap().len(), 4);
        assert_eq!(v["comparisonItem"][0]["time"], "2024-01-01 2024-01-08");
    }
}
