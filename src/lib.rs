//! Vasa-Harvest: a race-result harvester
//!
//! This crate crawls the paginated result listings of a multi-year event
//! series, follows them to per-participant detail pages, and extracts bib
//! numbers, classes, and split times into one JSON file per event, tracked by
//! a resumable progress index.

pub mod catalog;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod harvest;
pub mod index;
pub mod output;
pub mod robots;
pub mod url;

use thiserror::Error;

/// Main error type for harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Failed to fetch seed page {url}: {reason}")]
    SeedFetch { url: String, reason: String },

    #[error("Unexpected catalog response from {url}: {message}")]
    CatalogShape { url: String, message: String },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL disallowed by robots.txt: {url}")]
    RobotsDenied { url: String },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Index error: {0}")]
    Index(#[from] index::IndexError),

    #[error("Crawl task aborted: {0}")]
    TaskAborted(#[from] tokio::task::JoinError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector for {name}: {message}")]
    InvalidSelector { name: String, message: String },

    #[error("Invalid link pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl_event, RunStats};
pub use extract::{parse_elapsed, parse_pace, DetailExtractor, ParticipantRecord, SplitEntry};
pub use index::ProgressIndex;
pub use url::normalize_url;
