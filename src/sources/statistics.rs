// src/sources/statistics.rs
//! Generic ONS series fetcher.
//!
//! Talks to the versioned datasets API:
//! `<base>/datasets/<id>/editions/<edition>/versions/<v>/observations?<dimensions>`.
//! Each element of `observations` looks like
//! `{"dimensions": {"Time": {"id": "Jan-24", "label": "Jan-24"}}, "observation": "4.2"}`.
//! A body without an `observations` array is a shape error, never an empty list.

use reqwest::Url;
use serde::Serialize;
use serde_json::{Map, Value};

use super::{fetch_body, parse_json, record_error, FetchError};
use crate::config::SeriesSpec;
use crate::upstream::Upstream;

pub const MISSING: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub value: String,
    pub date: String,
}

impl Observation {
    /// Render with the series' own column names.
    fn to_json(&self, spec: &SeriesSpec) -> Value {
        let mut m = Map::with_capacity(2);
        m.insert(spec.value_key.clone(), Value::String(self.value.clone()));
        m.insert(spec.date_key.clone(), Value::String(self.date.clone()));
        Value::Object(m)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SeriesReport {
    pub data_source: String,
    pub description: String,
    pub latest_data: Vec<Value>,
}

pub fn observations_url(base: &str, spec: &SeriesSpec) -> Result<Url, FetchError> {
    let raw = format!(
        "{}/datasets/{}/editions/{}/versions/{}/observations",
        base.trim_end_matches('/'),
        spec.dataset,
        spec.edition,
        spec.version
    );
    Url::parse_with_params(&raw, spec.dimensions.iter())
        .map_err(|e| FetchError::Other(anyhow::anyhow!("bad ONS url {raw}: {e}")))
}

pub async fn fetch_series(
    upstream: &dyn Upstream,
    base: &str,
    spec: &SeriesSpec,
) -> Result<SeriesReport, FetchError> {
    let url = observations_url(base, spec)?;
    let body = fetch_body(upstream, &spec.topic, &url).await?;
    let report = build_report(&body, spec);
    if let Err(e) = &report {
        record_error(&spec.topic, e);
        tracing::warn!(topic = %spec.topic, error = %e, "ONS response rejected");
    }
    report
}

pub fn build_report(body: &str, spec: &SeriesSpec) -> Result<SeriesReport, FetchError> {
    let obs = parse_observations(body, spec.window)?;
    Ok(SeriesReport {
        data_source: spec.data_source.clone(),
        description: spec.description.clone(),
        latest_data: obs.iter().map(|o| o.to_json(spec)).collect(),
    })
}

/// Last `window` observations, upstream order preserved.
pub fn parse_observations(body: &str, window: usize) -> Result<Vec<Observation>, FetchError> {
    let v = parse_json(body, "ONS observations")?;
    let arr = v
        .get("observations")
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::shape("ONS response has no 'observations' array"))?;

    let start = arr.len().saturating_sub(window);
    Ok(arr[start..].iter().map(observation_from).collect())
}

fn observation_from(item: &Value) -> Observation {
    let value = item
        .get("observation")
        .and_then(scalar_to_string)
        .unwrap_or_else(|| MISSING.to_string());

    let date = item
        .get("dimensions")
        .and_then(Value::as_object)
        .and_then(|dims| {
            dims.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("time"))
                .map(|(_, v)| v)
        })
        .and_then(|t| {
            t.get("label")
                .and_then(scalar_to_string)
                .or_else(|| t.get("id").and_then(scalar_to_string))
        })
        .unwrap_or_else(|| MISSING.to_string());

    Observation { value, date }
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeriesCatalog;
    use serde_json::json;

    fn body_with(n: usize) -> String {
        let obs: Vec<Value> = (0..n)
            .map(|i| {
                json!({
                    "dimensions": {"Time": {"id": format!("t{i}"), "label": format!("L{i}")}},
                    "observation": format!("{i}.0")
                })
            })
            .collect();
        json!({ "observations": obs }).to_string()
    }

    #[test]
    fn keeps_last_window_in_order() {
        let out = parse_observations(&body_with(20), 12).unwrap();
        assert_eq!(out.len(), 12);
        assert_eq!(out.first().unwrap().value, "8.0");
        assert_eq!(out.last().unwrap().date, "L19");
    }

    #[test]
    fn shorter_than_window_returns_all() {
        let out = parse_observations(&body_with(3), 5).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].date, "L0");
    }

    #[test]
    fn missing_fields_become_placeholder() {
        let body = json!({"observations": [{"observation": ""}, {"dimensions": {"time": {"id": "2024"}}, "observation": 4.5}]}).to_string();
        let out = parse_observations(&body, 5).unwrap();
        assert_eq!(out[0], Observation { value: MISSING.into(), date: MISSING.into() });
        assert_eq!(out[1], Observation { value: "4.5".into(), date: "2024".into() });
    }

    #[test]
    fn missing_observations_is_shape_error() {
        let err = parse_observations(r#"{"items": []}"#, 5).unwrap_err();
        assert!(matches!(err, FetchError::Shape(_)));
        let err = parse_observations("<html>", 5).unwrap_err();
        assert!(matches!(err, FetchError::Shape(_)));
    }

    #[test]
    fn report_uses_series_column_names() {
        let cat = SeriesCatalog::default_seed();
        let pop = cat.get("population").unwrap();
        let r = build_report(&body_with(2), pop).unwrap();
        assert_eq!(r.latest_data[0], json!({"population_thousands": "0.0", "year": "L0"}));
        assert_eq!(r.data_source, "ONS UK Population");
    }

    #[test]
    fn url_carries_dimensions() {
        let cat = SeriesCatalog::default_seed();
        let u = observations_url("https://ons.test/v1/", cat.get("inflation").unwrap()).unwrap();
        assert_eq!(u.path(), "/v1/datasets/cpih01/editions/time-series/versions/6/observations");
        let q: Vec<(String, String)> = u.query_pairs().into_owned().collect();
        assert!(q.contains(&("aggregate".into(), "cpih1dim1A0".into())));
        assert!(q.contains(&("time".into(), "*".into())));
    }
}
