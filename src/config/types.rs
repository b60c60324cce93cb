use serde::Deserialize;

/// Main configuration structure for Vasa-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    pub output: OutputConfig,
}

/// Results site location and endpoint templates
///
/// Templates are relative to `base-url`. `{year}` and `{event}` are replaced
/// with the percent-encoded year or event identifier.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Scheme and host of the results site, e.g. "https://results.vasaloppet.se"
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Search-field endpoint listing the available years
    #[serde(rename = "years-path", default = "default_years_path")]
    pub years_path: String,

    /// Search-field endpoint listing the events of one year
    #[serde(rename = "events-path", default = "default_events_path")]
    pub events_path: String,

    /// First listing page of one event
    #[serde(rename = "seed-path", default = "default_seed_path")]
    pub seed_path: String,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Minimum time between two requests of the same run (milliseconds)
    #[serde(rename = "request-delay", default)]
    pub request_delay: u64,

    /// Number of retries after a transient fetch failure
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff before the first retry (milliseconds), doubled per attempt
    #[serde(rename = "retry-delay", default = "default_retry_delay")]
    pub retry_delay: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Upper bound on pages fetched in one run
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Number of event runs allowed in flight at once
    #[serde(rename = "max-concurrent-events", default = "default_max_concurrent_events")]
    pub max_concurrent_events: u32,

    /// Honor robots.txt of the results host. Off unless explicitly enabled.
    #[serde(rename = "obey-robots", default)]
    pub obey_robots: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            request_delay: 0,
            max_retries: default_max_retries(),
            retry_delay: default_retry_delay(),
            request_timeout: default_request_timeout(),
            max_pages: default_max_pages(),
            max_concurrent_events: default_max_concurrent_events(),
            obey_robots: false,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// CSS selectors and link pattern tied to the results site markup
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Elements whose anchors lead to further listing pages
    pub pagination: String,

    /// Regular expression searched in absolute URLs to spot detail pages
    #[serde(rename = "detail-link")]
    pub detail_link: String,

    #[serde(rename = "bib-number")]
    pub bib_number: String,

    #[serde(rename = "age-class")]
    pub age_class: String,

    #[serde(rename = "start-group")]
    pub start_group: String,

    /// One element per split row on a detail page
    #[serde(rename = "split-rows")]
    pub split_rows: String,

    /// Cell selectors, evaluated inside a split row
    #[serde(rename = "split-location")]
    pub split_location: String,

    #[serde(rename = "split-time")]
    pub split_time: String,

    #[serde(rename = "split-pace")]
    pub split_pace: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            pagination: "ul.pagination > li.pages-nav-button".to_string(),
            detail_link: r"\?content=detail".to_string(),
            bib_number: ".f-start_no_text.last".to_string(),
            age_class: ".f-_type_age_class.last".to_string(),
            start_group: ".f-start_group.last".to_string(),
            split_rows: "div.box-splits > div > table > tbody > tr".to_string(),
            split_location: ".desc".to_string(),
            split_time: ".time".to_string(),
            split_pace: ".min_km".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving `<year>/<event_id>.json`
    #[serde(rename = "events-dir")]
    pub events_dir: String,

    /// Path to the progress index file
    #[serde(rename = "index-path")]
    pub index_path: String,
}

fn default_years_path() -> String {
    "/index.php?content=ajax2&func=getSearchFields&options".to_string()
}

fn default_events_path() -> String {
    "/2025/index.php?content=ajax2&func=getSearchFields&options%5Bb%5D%5Blists%5D%5Bevent_main_group%5D={year}"
        .to_string()
}

fn default_seed_path() -> String {
    "/?event={event}&pid=list".to_string()
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay() -> u64 {
    1000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_pages() -> u32 {
    10_000
}

fn default_max_concurrent_events() -> u32 {
    1
}
