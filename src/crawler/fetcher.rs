//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for a run, including:
//! - Building the shared HTTP client with the crawler's user agent
//! - GET requests for listing and detail pages
//! - Retry with exponential backoff for transient failures
//! - Error classification

use crate::config::{CrawlerConfig, UserAgentConfig};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Longest pause between two retries of the same URL
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: Url,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// Page is not HTML (Content-Type mismatch)
    ContentMismatch {
        /// The actual Content-Type received
        content_type: String,
    },

    /// Non-success HTTP status
    HttpError {
        /// The HTTP status code
        status_code: u16,
        /// Whether a retry may succeed
        retryable: bool,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
        /// Whether a retry may succeed
        retryable: bool,
    },
}

impl FetchResult {
    /// Returns true for failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchResult::HttpError { retryable, .. }
            | FetchResult::NetworkError { retryable, .. } => *retryable,
            FetchResult::Success { .. } | FetchResult::ContentMismatch { .. } => false,
        }
    }

    /// Short description of a failure for logs and error messages
    pub fn describe(&self) -> String {
        match self {
            FetchResult::Success { status_code, .. } => format!("HTTP {}", status_code),
            FetchResult::ContentMismatch { content_type } => {
                format!("not an HTML page (Content-Type '{}')", content_type)
            }
            FetchResult::HttpError { status_code, .. } => format!("HTTP {}", status_code),
            FetchResult::NetworkError { error, .. } => error.clone(),
        }
    }
}

/// Formats the crawler's user agent: `Name/Version (+ContactURL; ContactEmail)`
pub fn user_agent_string(config: &UserAgentConfig) -> String {
    format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    )
}

/// Builds an HTTP client with proper configuration
///
/// The client is shared by every run of a harvest. Redirects are followed
/// (up to 10 hops) so that relative links resolve against the final URL.
///
/// # Example
///
/// ```no_run
/// use vasa_harvest::config::{CrawlerConfig, UserAgentConfig};
/// use vasa_harvest::crawler::build_http_client;
///
/// let user_agent = UserAgentConfig {
///     crawler_name: "VasaHarvest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&user_agent, &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent_string(user_agent))
        .timeout(Duration::from_secs(crawler.request_timeout))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a single HTML page without retrying
///
/// | Condition | Result | Retryable |
/// |-----------|--------|-----------|
/// | 2xx with `text/html` | Success | - |
/// | 2xx with other Content-Type | ContentMismatch | no |
/// | HTTP 429 | HttpError | yes |
/// | HTTP 5xx | HttpError | yes |
/// | Other 4xx | HttpError | no |
/// | Timeout | NetworkError | yes |
/// | Connection failure | NetworkError | yes |
/// | Redirect loop / too many redirects | NetworkError | no |
pub async fn fetch_url(client: &Client, url: &Url) -> FetchResult {
    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => return classify_network_error(&e),
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
            retryable: is_retryable_status(status),
        };
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !content_type.contains("text/html") {
        return FetchResult::ContentMismatch { content_type };
    }

    let final_url = response.url().clone();

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            body,
        },
        Err(e) => classify_network_error(&e),
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn classify_network_error(error: &reqwest::Error) -> FetchResult {
    if error.is_timeout() {
        FetchResult::NetworkError {
            error: "Request timeout".to_string(),
            retryable: true,
        }
    } else if error.is_connect() {
        FetchResult::NetworkError {
            error: format!("Connection failed: {}", error),
            retryable: true,
        }
    } else if error.is_redirect() {
        FetchResult::NetworkError {
            error: format!("Redirect error: {}", error),
            retryable: false,
        }
    } else {
        FetchResult::NetworkError {
            error: error.to_string(),
            retryable: false,
        }
    }
}

/// Retry schedule for transient failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff before the first retry, doubled for every further retry
    pub initial_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.retry_delay),
        }
    }

    /// Backoff before retry number `retry` (starting at 1)
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF)
    }
}

/// Fetches a page, retrying transient failures per the policy
///
/// Returns the last result once it is a success, a permanent failure, or the
/// retries are exhausted.
pub async fn fetch_with_retry(client: &Client, url: &Url, policy: &RetryPolicy) -> FetchResult {
    let mut retry = 0;

    loop {
        let result = fetch_url(client, url).await;

        if !result.is_retryable() || retry >= policy.max_retries {
            return result;
        }

        retry += 1;
        let delay = policy.backoff(retry);
        tracing::debug!(
            "Transient failure for {} ({}), retry {}/{} in {:?}",
            url,
            result.describe(),
            retry,
            policy.max_retries,
            delay
        );
        tokio::time::sleep(delay).await;
    }
}
