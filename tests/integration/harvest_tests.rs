//! Integration tests for the harvest loop: catalog, output files and index

use crate::common::{
    detail_page, events_payload, html, listing_page, mount_page, test_config, years_payload,
};
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use vasa_harvest::harvest::{harvest, harvest_event, HarvestOptions};
use vasa_harvest::{ParticipantRecord, ProgressIndex};
use wiremock::{MockServer, ResponseTemplate};

async fn mount_event(server: &MockServer, event_id: &str, bib: &str, times: u64) {
    let detail_route = format!("/detail/{}", bib);
    let detail_link = format!("{}?content=detail&idp={}", detail_route, bib);

    mount_page(
        server,
        &format!("/list/{}", event_id),
        html(listing_page(&[], &[detail_link.as_str()])),
        times,
    )
    .await;
    mount_page(
        server,
        &detail_route,
        html(detail_page(bib, &[("Smågan", "00:40:00", "3:45")])),
        times,
    )
    .await;
}

fn read_records(path: &Path) -> Vec<ParticipantRecord> {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_harvest_skips_indexed_events() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path());

    mount_page(
        &server,
        "/catalog/years",
        ResponseTemplate::new(200).set_body_json(years_payload(&[json!(2024), json!("all")])),
        1,
    )
    .await;
    mount_page(
        &server,
        "/catalog/events/2024",
        ResponseTemplate::new(200).set_body_json(events_payload(&[
            ("VL_A", "Vasaloppet"),
            ("VL_B", "Öppet Spår"),
        ])),
        1,
    )
    .await;
    mount_event(&server, "VL_A", "101", 1).await;
    mount_event(&server, "VL_B", "202", 0).await;

    let mut index = ProgressIndex::new();
    index.mark_complete("2024", "VL_B", "Öppet Spår");
    index.save(&dir.path().join("index.json")).unwrap();

    let summary = harvest(&config, &HarvestOptions::default()).await.unwrap();

    assert_eq!(summary.years, 1);
    assert_eq!(summary.events_crawled, 1);
    assert_eq!(summary.events_skipped, 1);
    assert_eq!(summary.events_failed, 0);
    assert_eq!(summary.records, 1);

    let records = read_records(&dir.path().join("events/2024/VL_A.json"));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].bib_number.as_deref(), Some("101"));
    assert_eq!(records[0].splits["Smågan"].pace, Some(3.75));
    assert!(!dir.path().join("events/2024/VL_B.json").exists());

    let index = ProgressIndex::load(&dir.path().join("index.json")).unwrap();
    assert_eq!(index.event_name("2024", "VL_A"), Some("Vasaloppet"));
    assert!(index.is_complete("2024", "VL_B"));

    let raw = fs::read_to_string(dir.path().join("index.json")).unwrap();
    assert!(raw.contains("Öppet Spår"));
    assert!(raw.contains("\n    \"2024\": {"));
}

#[tokio::test]
async fn test_failed_event_left_unmarked() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server.uri(), dir.path());
    config.crawler.max_retries = 0;

    mount_page(
        &server,
        "/catalog/events/2023",
        ResponseTemplate::new(200).set_body_json(events_payload(&[
            ("VL_OK", "Vasaloppet"),
            ("VL_DOWN", "Kortvasan"),
        ])),
        1,
    )
    .await;
    mount_event(&server, "VL_OK", "7", 1).await;
    mount_page(&server, "/list/VL_DOWN", ResponseTemplate::new(500), 1).await;

    let options = HarvestOptions {
        years: vec!["2023".to_string()],
        fresh: false,
    };
    let summary = harvest(&config, &options).await.unwrap();

    assert_eq!(summary.events_crawled, 1);
    assert_eq!(summary.events_failed, 1);

    let events_dir = dir.path().join("events/2023");
    assert!(events_dir.join("VL_OK.json").exists());
    assert!(!events_dir.join("VL_DOWN.json").exists());
    assert!(!events_dir.join("VL_DOWN.json.part").exists());

    let index = ProgressIndex::load(&dir.path().join("index.json")).unwrap();
    assert!(index.is_complete("2023", "VL_OK"));
    assert!(!index.is_complete("2023", "VL_DOWN"));
}

#[tokio::test]
async fn test_fresh_recrawls_indexed_events() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path());

    mount_page(
        &server,
        "/catalog/events/2022",
        ResponseTemplate::new(200).set_body_json(events_payload(&[("VL_A", "Vasaloppet")])),
        1,
    )
    .await;
    mount_event(&server, "VL_A", "55", 1).await;

    let mut index = ProgressIndex::new();
    index.mark_complete("2022", "VL_A", "Vasaloppet");
    index.save(&dir.path().join("index.json")).unwrap();

    let options = HarvestOptions {
        years: vec!["2022".to_string()],
        fresh: true,
    };
    let summary = harvest(&config, &options).await.unwrap();

    assert_eq!(summary.events_crawled, 1);
    assert_eq!(summary.events_skipped, 0);
    assert_eq!(
        read_records(&dir.path().join("events/2022/VL_A.json")).len(),
        1
    );
}

#[tokio::test]
async fn test_unlisted_year_is_skipped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path());

    mount_page(&server, "/catalog/events/1922", ResponseTemplate::new(404), 1).await;

    let options = HarvestOptions {
        years: vec!["1922".to_string()],
        fresh: false,
    };
    let summary = harvest(&config, &options).await.unwrap();

    assert_eq!(summary.years, 0);
    assert_eq!(summary.events_crawled, 0);
}

#[tokio::test]
async fn test_years_failure_is_fatal() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path());

    mount_page(
        &server,
        "/catalog/years",
        ResponseTemplate::new(200).set_body_json(json!({ "branches": [] })),
        1,
    )
    .await;

    assert!(harvest(&config, &HarvestOptions::default()).await.is_err());
}

#[tokio::test]
async fn test_harvest_single_event() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path());

    mount_page(
        &server,
        "/catalog/events/2024",
        ResponseTemplate::new(200).set_body_json(events_payload(&[("VL_S", "Stafettvasan")])),
        1,
    )
    .await;
    mount_event(&server, "VL_S", "9", 1).await;

    let stats = harvest_event(&config, "2024", "VL_S").await.unwrap();

    assert_eq!(stats.records_emitted, 1);
    assert_eq!(read_records(&dir.path().join("events/2024/VL_S.json")).len(), 1);

    let index = ProgressIndex::load(&dir.path().join("index.json")).unwrap();
    assert_eq!(index.event_name("2024", "VL_S"), Some("Stafettvasan"));
}
