//! The harvest loop: years, then events, then one crawl per pending event
//!
//! Event runs execute as independent tokio tasks, at most
//! `crawler.max-concurrent-events` at a time. Only this loop touches the
//! progress index; it marks an event and saves the index as soon as that
//! event's output file has been committed.

use crate::catalog::{fetch_events, fetch_years};
use crate::config::Config;
use crate::crawler::{Crawler, RunStats};
use crate::index::ProgressIndex;
use crate::output::{event_output_path, JsonArraySink};
use crate::{HarvestError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Which events a harvest covers
#[derive(Debug, Clone, Default)]
pub struct HarvestOptions {
    /// Restrict to these years; empty means every year in the catalog
    pub years: Vec<String>,

    /// Crawl events again even if the index lists them as complete
    pub fresh: bool,
}

/// Totals over a whole harvest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    pub years: u32,
    pub events_crawled: u32,
    pub events_skipped: u32,
    pub events_failed: u32,
    pub records: u64,
}

/// Runs the full harvest described by `config` and `options`
///
/// # Errors
///
/// Fails if the crawler cannot be built, the year list cannot be fetched,
/// or the index cannot be read or written. Failures of single events or of
/// one year's event list are logged and counted instead.
pub async fn harvest(config: &Config, options: &HarvestOptions) -> Result<HarvestSummary> {
    let crawler = Arc::new(Crawler::new(config)?);
    let index_path = PathBuf::from(&config.output.index_path);
    let events_dir = PathBuf::from(&config.output.events_dir);
    let mut index = ProgressIndex::load(&index_path)?;

    let years = if options.years.is_empty() {
        fetch_years(crawler.client(), &config.site).await?
    } else {
        options.years.clone()
    };

    let mut summary = HarvestSummary::default();

    for year in &years {
        let events = match fetch_events(crawler.client(), &config.site, year).await {
            Ok(events) => events,
            Err(e) => {
                tracing::error!("Skipping year {}: {}", year, e);
                continue;
            }
        };
        summary.years += 1;

        let listed = events.len();
        let pending: Vec<(String, String)> = events
            .into_iter()
            .filter(|(event_id, _)| options.fresh || !index.is_complete(year, event_id))
            .collect();

        let skipped = listed - pending.len();
        summary.events_skipped += u32::try_from(skipped).unwrap_or(u32::MAX);
        tracing::info!(
            "Year {}: {} events to crawl, {} already harvested",
            year,
            pending.len(),
            skipped
        );

        run_year(
            &crawler,
            config,
            year,
            pending,
            &events_dir,
            &index_path,
            &mut index,
            &mut summary,
        )
        .await?;
    }

    tracing::info!(
        "Harvest finished: {} events crawled, {} failed, {} skipped, {} records",
        summary.events_crawled,
        summary.events_failed,
        summary.events_skipped,
        summary.records
    );
    Ok(summary)
}

#[allow(clippy::too_many_arguments)]
async fn run_year(
    crawler: &Arc<Crawler>,
    config: &Config,
    year: &str,
    pending: Vec<(String, String)>,
    events_dir: &Path,
    index_path: &Path,
    index: &mut ProgressIndex,
    summary: &mut HarvestSummary,
) -> Result<()> {
    let limit = config.crawler.max_concurrent_events.max(1) as usize;
    let mut pending = pending.into_iter();
    let mut running: JoinSet<(String, String, Result<RunStats>)> = JoinSet::new();

    loop {
        while running.len() < limit {
            let Some((event_id, event_name)) = pending.next() else {
                break;
            };

            let crawler = Arc::clone(crawler);
            let target = event_output_path(events_dir, year, &event_id);
            running.spawn(async move {
                let result = crawl_to_file(&crawler, &event_id, &target).await;
                (event_id, event_name, result)
            });
        }

        let Some(joined) = running.join_next().await else {
            break;
        };

        match joined {
            Ok((event_id, event_name, Ok(stats))) => {
                index.mark_complete(year, &event_id, &event_name);
                index.save(index_path)?;
                summary.events_crawled += 1;
                summary.records += u64::from(stats.records_emitted);
                if stats.truncated {
                    tracing::warn!("Event {} ({}) was cut off at the page limit", event_id, year);
                }
            }
            Ok((event_id, _, Err(e))) => {
                tracing::error!("Event {} ({}) failed: {}", event_id, year, e);
                summary.events_failed += 1;
            }
            Err(join_error) => {
                tracing::error!("{}", HarvestError::from(join_error));
                summary.events_failed += 1;
            }
        }
    }

    Ok(())
}

/// Crawls one event and harvests it into its own output file and the index
///
/// The event name is looked up in the catalog; if that fails the id is
/// used as the name.
pub async fn harvest_event(config: &Config, year: &str, event_id: &str) -> Result<RunStats> {
    let crawler = Crawler::new(config)?;
    let index_path = PathBuf::from(&config.output.index_path);
    let mut index = ProgressIndex::load(&index_path)?;

    let event_name = match fetch_events(crawler.client(), &config.site, year).await {
        Ok(events) => event_name_or_id(&events, event_id),
        Err(e) => {
            tracing::warn!("Could not look up the name of event {}: {}", event_id, e);
            event_id.to_string()
        }
    };

    let target = event_output_path(Path::new(&config.output.events_dir), year, event_id);
    let stats = crawl_to_file(&crawler, event_id, &target).await?;

    index.mark_complete(year, event_id, &event_name);
    index.save(&index_path)?;
    Ok(stats)
}

fn event_name_or_id(events: &[(String, String)], event_id: &str) -> String {
    match events.iter().find(|(id, _)| id == event_id) {
        Some((_, name)) if !name.is_empty() => name.clone(),
        _ => event_id.to_string(),
    }
}

async fn crawl_to_file(crawler: &Crawler, event_id: &str, target: &Path) -> Result<RunStats> {
    let mut sink = JsonArraySink::create(target)?;
    crawler.crawl_event(event_id, &mut sink).await
}
