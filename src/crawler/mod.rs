//! Crawler module for result page fetching and traversal
//!
//! This module contains the per-event crawling logic, including:
//! - HTTP fetching with retry logic
//! - Link discovery and classification on listing pages
//! - Request pacing
//! - The traversal loop feeding detail pages to the extractor

mod fetcher;
mod links;
mod pacer;
mod task;
mod traversal;

pub use fetcher::{
    build_http_client, fetch_url, fetch_with_retry, user_agent_string, FetchResult, RetryPolicy,
};
pub use links::{resolve_link, LinkKind, LinkRules};
pub use pacer::Pacer;
pub use task::{CrawlTask, TaskKind};

use crate::config::{Config, SiteConfig};
use crate::extract::DetailExtractor;
use crate::output::RecordSink;
use crate::url::seed_url;
use crate::Result;
use reqwest::Client;
use std::time::Duration;
use traversal::Traversal;
use url::Url;

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Pages fetched successfully, seed included
    pub pages_fetched: u32,
    pub listing_pages: u32,
    pub detail_pages: u32,
    pub records_emitted: u32,
    /// Pages skipped after the fetch failed
    pub failed_pages: u32,
    /// Pages skipped because robots.txt disallows them
    pub disallowed_pages: u32,
    /// The run stopped at `crawler.max-pages` with work left in the queue
    pub truncated: bool,
}

/// Everything a run needs, built once from the configuration
///
/// A `Crawler` is immutable and can serve any number of runs, concurrently
/// if shared behind an `Arc`. Each run owns its own queue, visited set and
/// pacer.
#[derive(Debug, Clone)]
pub struct Crawler {
    client: Client,
    rules: LinkRules,
    extractor: DetailExtractor,
    retry: RetryPolicy,
    request_delay: Duration,
    max_pages: u32,
    obey_robots: bool,
    robots_agent: String,
    site: SiteConfig,
}

impl Crawler {
    /// Builds the HTTP client and compiles the configured selectors
    pub fn new(config: &Config) -> Result<Self> {
        let client = build_http_client(&config.user_agent, &config.crawler)?;
        Self::with_client(config, client)
    }

    /// Like [`Crawler::new`], reusing an existing HTTP client
    pub fn with_client(config: &Config, client: Client) -> Result<Self> {
        Ok(Self {
            client,
            rules: LinkRules::new(&config.selectors)?,
            extractor: DetailExtractor::new(&config.selectors)?,
            retry: RetryPolicy::from_config(&config.crawler),
            request_delay: Duration::from_millis(config.crawler.request_delay),
            max_pages: config.crawler.max_pages,
            obey_robots: config.crawler.obey_robots,
            robots_agent: config.user_agent.crawler_name.clone(),
            site: config.site.clone(),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Crawls one event from its seed listing page into `sink`
    ///
    /// On success the sink has been finished; on error it has not, and a
    /// file sink dropped in that state discards its partial output.
    pub async fn crawl_event<S>(&self, event_id: &str, sink: &mut S) -> Result<RunStats>
    where
        S: RecordSink + ?Sized,
    {
        let seed = seed_url(&self.site, event_id)?;
        tracing::info!("Crawling event {} from {}", event_id, seed);

        let stats = self.crawl_from(seed, sink).await?;

        tracing::info!(
            "Event {} done: {} records from {} detail pages ({} pages fetched, {} failed)",
            event_id,
            stats.records_emitted,
            stats.detail_pages,
            stats.pages_fetched,
            stats.failed_pages
        );
        Ok(stats)
    }

    /// Crawls from an arbitrary seed listing page into `sink`
    pub async fn crawl_from<S>(&self, seed: Url, sink: &mut S) -> Result<RunStats>
    where
        S: RecordSink + ?Sized,
    {
        let stats = Traversal::new(self).run(seed, sink).await?;
        sink.finish()?;
        Ok(stats)
    }
}

/// Crawls one event with a crawler built from `config`
///
/// Convenience wrapper for single runs; use [`Crawler`] directly to share
/// the HTTP client between runs.
pub async fn crawl_event<S>(config: &Config, event_id: &str, sink: &mut S) -> Result<RunStats>
where
    S: RecordSink + ?Sized,
{
    Crawler::new(config)?.crawl_event(event_id, sink).await
}
