//! Year and event enumeration
//!
//! The results site exposes its search form fields as JSON. The years list
//! sits under `branches.lists.fields.event_main_group.data` and the events
//! of one year under `branches.lists.fields.event.data`; every entry carries
//! its values in a `v` array.

use crate::config::SiteConfig;
use crate::url::{events_url, years_url};
use crate::{HarvestError, Result};
use reqwest::Client;
use serde_json::Value;
use url::Url;

const YEARS_POINTER: &str = "/branches/lists/fields/event_main_group/data";
const EVENTS_POINTER: &str = "/branches/lists/fields/event/data";

/// Years with published results, in response order
pub async fn fetch_years(client: &Client, site: &SiteConfig) -> Result<Vec<String>> {
    let url = years_url(site)?;
    let body = get_json(client, &url).await?;
    let years = parse_years(&body).map_err(|message| HarvestError::CatalogShape {
        url: url.to_string(),
        message,
    })?;

    tracing::info!("Catalog lists {} years", years.len());
    Ok(years)
}

/// Events of one year as `(id, name)` pairs, in response order
pub async fn fetch_events(
    client: &Client,
    site: &SiteConfig,
    year: &str,
) -> Result<Vec<(String, String)>> {
    let url = events_url(site, year)?;
    let body = get_json(client, &url).await?;
    let events = parse_events(&body).map_err(|message| HarvestError::CatalogShape {
        url: url.to_string(),
        message,
    })?;

    tracing::debug!("Catalog lists {} events for {}", events.len(), year);
    Ok(events)
}

async fn get_json(client: &Client, url: &Url) -> Result<Value> {
    tracing::debug!("Fetching catalog {}", url);

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|source| HarvestError::Http {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(HarvestError::UnexpectedStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let text = response.text().await.map_err(|source| HarvestError::Http {
        url: url.to_string(),
        source,
    })?;

    Ok(serde_json::from_str(&text)?)
}

/// Reads the year list; entries whose first value is not an integer are skipped
pub fn parse_years(body: &Value) -> std::result::Result<Vec<String>, String> {
    let entries = data_array(body, YEARS_POINTER)?;

    Ok(entries
        .iter()
        .filter_map(first_value)
        .filter_map(|value| match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
            _ => None,
        })
        .collect())
}

/// Reads one year's events as `(id, name)` pairs
///
/// Identifiers may be strings or numbers. Pairs keep the order of the
/// response; a later duplicate id replaces the earlier name but keeps the
/// earlier position.
pub fn parse_events(body: &Value) -> std::result::Result<Vec<(String, String)>, String> {
    let entries = data_array(body, EVENTS_POINTER)?;
    let mut events: Vec<(String, String)> = Vec::new();

    for (position, entry) in entries.iter().enumerate() {
        let values = entry
            .get("v")
            .and_then(Value::as_array)
            .ok_or_else(|| format!("event entry {} has no 'v' array", position))?;

        let id = values
            .first()
            .and_then(scalar_text)
            .ok_or_else(|| format!("event entry {} has no identifier", position))?;
        let name = values.get(1).and_then(scalar_text).unwrap_or_default();

        match events.iter_mut().find(|(known, _)| *known == id) {
            Some((_, known_name)) => *known_name = name,
            None => events.push((id, name)),
        }
    }

    Ok(events)
}

fn data_array<'a>(body: &'a Value, pointer: &str) -> std::result::Result<&'a Vec<Value>, String> {
    body.pointer(pointer)
        .and_then(Value::as_array)
        .ok_or_else(|| format!("missing array at {}", pointer))
}

fn first_value(entry: &Value) -> Option<&Value> {
    entry.get("v").and_then(Value::as_array).and_then(|v| v.first())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
