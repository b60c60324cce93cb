//! Queue-based traversal of one event's result pages
//!
//! A run starts from the seed listing page and repeatedly pops a task,
//! fetches it and dispatches on its kind: listing pages are scanned for
//! more links, detail pages go to the extractor. Every URL is marked in the
//! visited set when it is enqueued, so no page is fetched twice in a run.

use crate::crawler::fetcher::{fetch_with_retry, FetchResult};
use crate::crawler::pacer::Pacer;
use crate::crawler::task::{CrawlTask, TaskKind};
use crate::crawler::{Crawler, RunStats};
use crate::output::RecordSink;
use crate::robots::{fetch_robots, ParsedRobots};
use crate::url::normalize_url;
use crate::{HarvestError, Result};
use std::collections::{HashSet, VecDeque};
use url::Url;

const PROGRESS_INTERVAL: u32 = 100;

pub(crate) struct Traversal<'c> {
    crawler: &'c Crawler,
    queue: VecDeque<CrawlTask>,
    visited: HashSet<String>,
    pacer: Pacer,
    robots: Option<ParsedRobots>,
    stats: RunStats,
}

impl<'c> Traversal<'c> {
    pub(crate) fn new(crawler: &'c Crawler) -> Self {
        Self {
            crawler,
            queue: VecDeque::new(),
            visited: HashSet::new(),
            pacer: Pacer::new(crawler.request_delay),
            robots: None,
            stats: RunStats::default(),
        }
    }

    /// Runs until the queue is empty or the page bound is reached
    ///
    /// # Errors
    ///
    /// * `SeedFetch` - The seed page could not be fetched after retries
    /// * `RobotsDenied` - robots.txt is enforced and forbids the seed
    /// * `Output` - The sink rejected a record
    pub(crate) async fn run<S>(mut self, seed: Url, sink: &mut S) -> Result<RunStats>
    where
        S: RecordSink + ?Sized,
    {
        self.mark_visited(&seed);

        if self.crawler.obey_robots {
            let robots = fetch_robots(&self.crawler.client, &seed).await;
            if let Some(delay) = robots.crawl_delay(&self.crawler.robots_agent) {
                self.pacer.raise_min_interval(delay);
            }
            if !robots.is_allowed(seed.as_str(), &self.crawler.robots_agent) {
                return Err(HarvestError::RobotsDenied {
                    url: seed.to_string(),
                });
            }
            self.robots = Some(robots);
        }

        self.pacer.wait_turn().await;
        match fetch_with_retry(&self.crawler.client, &seed, &self.crawler.retry).await {
            FetchResult::Success { final_url, body, .. } => {
                self.stats.pages_fetched += 1;
                self.stats.listing_pages += 1;
                self.mark_visited(&final_url);
                self.handle_listing(&body, &final_url);
            }
            failure => {
                return Err(HarvestError::SeedFetch {
                    url: seed.to_string(),
                    reason: failure.describe(),
                });
            }
        }

        while let Some(task) = self.queue.pop_front() {
            if self.stats.pages_fetched >= self.crawler.max_pages {
                self.stats.truncated = true;
                tracing::warn!(
                    "Page limit of {} reached for {}, {} queued pages left unvisited",
                    self.crawler.max_pages,
                    seed,
                    self.queue.len() + 1
                );
                break;
            }

            if !self.robots_allow(&task.url) {
                tracing::debug!("Skipping {} (disallowed by robots.txt)", task.url);
                self.stats.disallowed_pages += 1;
                continue;
            }

            self.pacer.wait_turn().await;
            let result = fetch_with_retry(&self.crawler.client, &task.url, &self.crawler.retry).await;

            let (final_url, body) = match result {
                FetchResult::Success { final_url, body, .. } => (final_url, body),
                failure => {
                    tracing::warn!("Skipping {}: {}", task.url, failure.describe());
                    self.stats.failed_pages += 1;
                    continue;
                }
            };

            self.stats.pages_fetched += 1;
            self.mark_visited(&final_url);

            match task.kind {
                TaskKind::Listing => {
                    self.stats.listing_pages += 1;
                    self.handle_listing(&body, &final_url);
                }
                TaskKind::Detail => {
                    self.stats.detail_pages += 1;
                    if let Some(record) = self.crawler.extractor.extract_html(&body) {
                        sink.accept(record)?;
                        self.stats.records_emitted += 1;
                    } else {
                        tracing::debug!("No record on {}", final_url);
                    }
                }
            }

            if self.stats.pages_fetched % PROGRESS_INTERVAL == 0 {
                tracing::info!(
                    "Progress: {} pages fetched, {} records, {} queued",
                    self.stats.pages_fetched,
                    self.stats.records_emitted,
                    self.queue.len()
                );
            }
        }

        Ok(self.stats)
    }

    /// Enqueues the unvisited links of a listing page
    fn handle_listing(&mut self, body: &str, page_url: &Url) {
        let mut added = 0;

        for task in self.crawler.rules.discover(body, page_url) {
            if self.mark_visited(&task.url) {
                self.queue.push_back(task);
                added += 1;
            }
        }

        tracing::debug!("{}: {} new links queued", page_url, added);
    }

    /// Marks a URL as visited, returning false if it already was
    fn mark_visited(&mut self, url: &Url) -> bool {
        self.visited.insert(visit_key(url))
    }

    fn robots_allow(&self, url: &Url) -> bool {
        self.robots
            .as_ref()
            .map_or(true, |robots| robots.is_allowed(url.as_str(), &self.crawler.robots_agent))
    }
}

/// Key under which a URL is stored in the visited set
fn visit_key(url: &Url) -> String {
    match normalize_url(url.as_str()) {
        Ok(normalized) => normalized.to_string(),
        Err(_) => url.to_string(),
    }
}
