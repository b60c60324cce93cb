//! Integration tests for single event runs
//!
//! Each test serves a small result site from wiremock and checks what the
//! traversal fetched and which records came out.

use crate::common::{detail_page, html, listing_page, mount_page, test_config};
use tempfile::TempDir;
use vasa_harvest::crawler::Crawler;
use vasa_harvest::{crawl_event, HarvestError, ParticipantRecord};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_two_listings_two_details() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path());

    // Page 1 -> page 2 and detail 1; page 2 -> back to page 1, detail 1 again, detail 2.
    // Detail 1 has two complete rows and one incomplete row, detail 2 none.
    mount_page(
        &server,
        "/list/VL_1",
        html(listing_page(
            &[("/list/VL_1/2", "&gt;")],
            &["/detail/1?content=detail&idp=1"],
        )),
        1,
    )
    .await;
    mount_page(
        &server,
        "/list/VL_1/2",
        html(listing_page(
            &[("/list/VL_1", "&lt;")],
            &[
                "/detail/1?content=detail&idp=1",
                "/detail/2?content=detail&idp=2",
            ],
        )),
        1,
    )
    .await;
    mount_page(
        &server,
        "/detail/1",
        html(detail_page(
            "10432",
            &[
                ("Smågan", "01:02:03", "5:10"),
                ("Oxberg", "", "4:30"),
                ("Mora", "07:00:00", "4:55"),
            ],
        )),
        1,
    )
    .await;
    mount_page(
        &server,
        "/detail/2",
        html(detail_page("10433", &[("Smågan", "", "")])),
        1,
    )
    .await;

    let mut records: Vec<ParticipantRecord> = Vec::new();
    let stats = crawl_event(&config, "VL_1", &mut records).await.unwrap();

    assert_eq!(stats.pages_fetched, 4);
    assert_eq!(stats.listing_pages, 2);
    assert_eq!(stats.detail_pages, 2);
    assert_eq!(stats.records_emitted, 1);
    assert_eq!(stats.failed_pages, 0);
    assert!(!stats.truncated);

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.bib_number.as_deref(), Some("10432"));
    assert_eq!(record.age_class.as_deref(), Some("H21"));
    assert_eq!(record.start_group.as_deref(), Some("Led 5"));
    assert_eq!(record.splits.len(), 2);
    assert_eq!(record.splits["Smågan"].time, Some(3723));
    assert_eq!(record.splits["Mora"].time, Some(25200));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
}

#[tokio::test]
async fn test_redundant_links_fetched_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path());

    // The same detail page under differently ordered query strings and a fragment
    mount_page(
        &server,
        "/list/VL_1",
        html(listing_page(
            &[("/list/VL_1", "1"), ("/list/VL_1#top", "top")],
            &[
                "/detail/7?content=detail&idp=7",
                "/detail/7?idp=7&content=detail",
                "/detail/7?content=detail&idp=7#splits",
            ],
        )),
        1,
    )
    .await;
    mount_page(
        &server,
        "/detail/7",
        html(detail_page("7", &[("Oxberg", "04:00:00", "4:20")])),
        1,
    )
    .await;

    let mut records: Vec<ParticipantRecord> = Vec::new();
    let stats = crawl_event(&config, "VL_1", &mut records).await.unwrap();

    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_seed_failure_is_fatal() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path());

    // One attempt plus two retries
    mount_page(&server, "/list/VL_1", ResponseTemplate::new(500), 3).await;

    let mut records: Vec<ParticipantRecord> = Vec::new();
    let err = crawl_event(&config, "VL_1", &mut records).await.unwrap_err();

    match err {
        HarvestError::SeedFetch { url, reason } => {
            assert!(url.ends_with("/list/VL_1"));
            assert!(reason.contains("500"));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_seed_not_found_is_not_retried() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path());

    mount_page(&server, "/list/VL_1", ResponseTemplate::new(404), 1).await;

    let mut records: Vec<ParticipantRecord> = Vec::new();
    let result = crawl_event(&config, "VL_1", &mut records).await;
    assert!(matches!(result, Err(HarvestError::SeedFetch { .. })));
}

#[tokio::test]
async fn test_transient_error_is_retried() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path());

    mount_page(
        &server,
        "/list/VL_1",
        html(listing_page(&[], &["/detail/1?content=detail&idp=1"])),
        1,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/detail/1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/detail/1",
        html(detail_page("1", &[("Risberg", "03:00:00", "4:00")])),
        1,
    )
    .await;

    let mut records: Vec<ParticipantRecord> = Vec::new();
    let stats = crawl_event(&config, "VL_1", &mut records).await.unwrap();

    assert_eq!(stats.failed_pages, 0);
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_failed_pages_are_skipped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path());

    mount_page(
        &server,
        "/list/VL_1",
        html(listing_page(
            &[],
            &[
                "/detail/1?content=detail&idp=1",
                "/detail/2?content=detail&idp=2",
                "/detail/3?content=detail&idp=3",
            ],
        )),
        1,
    )
    .await;
    mount_page(&server, "/detail/1", ResponseTemplate::new(404), 1).await;
    mount_page(
        &server,
        "/detail/2",
        ResponseTemplate::new(200).set_body_raw("{}", "application/json"),
        1,
    )
    .await;
    mount_page(
        &server,
        "/detail/3",
        html(detail_page("3", &[("Hökberg", "05:00:00", "4:40")])),
        1,
    )
    .await;

    let mut records: Vec<ParticipantRecord> = Vec::new();
    let stats = crawl_event(&config, "VL_1", &mut records).await.unwrap();

    assert_eq!(stats.failed_pages, 2);
    assert_eq!(stats.detail_pages, 1);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].bib_number.as_deref(), Some("3"));
}

#[tokio::test]
async fn test_page_limit_truncates_run() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server.uri(), dir.path());
    config.crawler.max_pages = 2;

    // Endless pagination: every page links to the next one
    for page in 1..=3 {
        let route = format!("/list/VL_1/{}", page);
        let next = format!("/list/VL_1/{}", page + 1);
        let times = if page == 1 { 1 } else { 0 };
        mount_page(&server, &route, html(listing_page(&[(next.as_str(), "&gt;")], &[])), times).await;
    }
    mount_page(
        &server,
        "/list/VL_1",
        html(listing_page(&[("/list/VL_1/1", "&gt;")], &[])),
        1,
    )
    .await;

    let mut records: Vec<ParticipantRecord> = Vec::new();
    let stats = crawl_event(&config, "VL_1", &mut records).await.unwrap();

    assert_eq!(stats.pages_fetched, 2);
    assert!(stats.truncated);
}

#[tokio::test]
async fn test_robots_ignored_by_default() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path());

    mount_page(
        &server,
        "/robots.txt",
        ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"),
        0,
    )
    .await;
    mount_page(
        &server,
        "/list/VL_1",
        html(listing_page(&[], &["/detail/1?content=detail&idp=1"])),
        1,
    )
    .await;
    mount_page(
        &server,
        "/detail/1",
        html(detail_page("1", &[("Mora", "07:30:00", "4:59")])),
        1,
    )
    .await;

    let mut records: Vec<ParticipantRecord> = Vec::new();
    crawl_event(&config, "VL_1", &mut records).await.unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_robots_enforced_when_enabled() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server.uri(), dir.path());
    config.crawler.obey_robots = true;

    mount_page(
        &server,
        "/robots.txt",
        ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /detail/"),
        1,
    )
    .await;
    mount_page(
        &server,
        "/list/VL_1",
        html(listing_page(
            &[],
            &[
                "/detail/1?content=detail&idp=1",
                "/detail/2?content=detail&idp=2",
            ],
        )),
        1,
    )
    .await;
    mount_page(&server, "/detail/1", html(String::new()), 0).await;
    mount_page(&server, "/detail/2", html(String::new()), 0).await;

    let mut records: Vec<ParticipantRecord> = Vec::new();
    let stats = crawl_event(&config, "VL_1", &mut records).await.unwrap();

    assert_eq!(stats.disallowed_pages, 2);
    assert_eq!(stats.pages_fetched, 1);
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_robots_denying_seed_fails_run() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server.uri(), dir.path());
    config.crawler.obey_robots = true;

    mount_page(
        &server,
        "/robots.txt",
        ResponseTemplate::new(200).set_body_string("User-agent: TestHarvester\nDisallow: /"),
        1,
    )
    .await;
    mount_page(&server, "/list/VL_1", html(String::new()), 0).await;

    let crawler = Crawler::new(&config).unwrap();
    let mut records: Vec<ParticipantRecord> = Vec::new();
    let result = crawler.crawl_event("VL_1", &mut records).await;

    assert!(matches!(result, Err(HarvestError::RobotsDenied { .. })));
}

#[tokio::test]
async fn test_crawler_serves_several_runs() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path());

    for event in ["VL_1", "VL_2"] {
        mount_page(
            &server,
            &format!("/list/{}", event),
            html(listing_page(&[], &["/detail/1?content=detail&idp=1"])),
            1,
        )
        .await;
    }
    // Visited sets are per run, so both runs fetch the shared detail page
    mount_page(
        &server,
        "/detail/1",
        html(detail_page("1", &[("Mora", "07:30:00", "4:59")])),
        2,
    )
    .await;

    let crawler = Crawler::new(&config).unwrap();
    for event in ["VL_1", "VL_2"] {
        let mut records: Vec<ParticipantRecord> = Vec::new();
        crawler.crawl_event(event, &mut records).await.unwrap();
        assert_eq!(records.len(), 1);
    }
}
