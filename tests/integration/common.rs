//! Shared fixtures: configuration, result pages and catalog payloads

use serde_json::{json, Value};
use std::path::Path;
use vasa_harvest::config::{
    Config, CrawlerConfig, OutputConfig, SelectorConfig, SiteConfig, UserAgentConfig,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration pointing at a mock server, with fast retries and no delay
pub fn test_config(base_url: &str, dir: &Path) -> Config {
    Config {
        site: SiteConfig {
            base_url: base_url.to_string(),
            years_path: "/catalog/years".to_string(),
            events_path: "/catalog/events/{year}".to_string(),
            seed_path: "/list/{event}".to_string(),
        },
        crawler: CrawlerConfig {
            request_delay: 0,
            max_retries: 2,
            retry_delay: 10,
            request_timeout: 5,
            max_pages: 100,
            max_concurrent_events: 2,
            obey_robots: false,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestHarvester".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        selectors: SelectorConfig::default(),
        output: OutputConfig {
            events_dir: dir.join("events").display().to_string(),
            index_path: dir.join("index.json").display().to_string(),
        },
    }
}

/// A listing page with pagination anchors and result-table anchors
pub fn listing_page(pagination: &[(&str, &str)], links: &[&str]) -> String {
    let nav: String = pagination
        .iter()
        .map(|(href, label)| {
            format!(
                r#"<li class="pages-nav-button"><a href="{}">{}</a></li>"#,
                href, label
            )
        })
        .collect();
    let rows: String = links
        .iter()
        .map(|href| format!(r#"<tr><td><a href="{}">Participant</a></td></tr>"#, href))
        .collect();

    format!(
        r##"<html><body>
        <table class="list">{}</table>
        <ul class="pagination"><li class="active"><a href="#">1</a></li>{}</ul>
        <a href="/about">About</a>
        </body></html>"##,
        rows, nav
    )
}

/// A detail page; each split is (location, time, pace)
pub fn detail_page(bib: &str, splits: &[(&str, &str, &str)]) -> String {
    let rows: String = splits
        .iter()
        .map(|(location, time, pace)| {
            format!(
                r#"<tr><th class="desc">{}</th><td class="time">{}</td><td class="min_km">{}</td></tr>"#,
                location, time, pace
            )
        })
        .collect();

    format!(
        r#"<html><body>
        <table>
          <tr><th>Bib</th><td class="f-start_no_text last">{}</td></tr>
          <tr><th>Class</th><td class="f-_type_age_class last">H21</td></tr>
          <tr><th>Group</th><td class="f-start_group last">Led 5</td></tr>
        </table>
        <div class="box-splits"><div><table><tbody>{}</tbody></table></div></div>
        </body></html>"#,
        bib, rows
    )
}

pub fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

/// Mounts a GET mock for `route` that must be hit exactly `times` times
pub async fn mount_page(server: &MockServer, route: &str, response: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

pub fn years_payload(years: &[Value]) -> Value {
    let data: Vec<Value> = years
        .iter()
        .map(|year| json!({ "v": [year, year.to_string()] }))
        .collect();
    json!({ "branches": { "lists": { "fields": { "event_main_group": { "data": data } } } } })
}

pub fn events_payload(events: &[(&str, &str)]) -> Value {
    let data: Vec<Value> = events
        .iter()
        .map(|(id, name)| json!({ "v": [id, name] }))
        .collect();
    json!({ "branches": { "lists": { "fields": { "event": { "data": data } } } } })
}
