use thiserror::Error;

/// Crawl-level error taxonomy. Only `Config` is fatal; everything else is
/// absorbed by the worker loop that hit it.
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Lookup error: {0}")]
    Lookup(String),

    /// The API refused access to the account (protected or suspended).
    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl CrawlError {
    pub fn is_authorization(&self) -> bool {
        matches!(self, CrawlError::Authorization(_))
    }
}
