use url::Url;

/// What a fetched page will be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Listing page: scanned for further listing and detail links
    Listing,

    /// Detail page: handed to the extractor, never scanned for links
    Detail,
}

/// A page queued for fetching within one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub url: Url,
    pub kind: TaskKind,
}

impl CrawlTask {
    pub fn listing(url: Url) -> Self {
        Self {
            url,
            kind: TaskKind::Listing,
        }
    }

    pub fn detail(url: Url) -> Self {
        Self {
            url,
            kind: TaskKind::Detail,
        }
    }
}
