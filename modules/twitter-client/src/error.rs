use thiserror::Error;

pub type Result<T> = std::result::Result<T, TwitterError>;

#[derive(Debug, Error)]
pub enum TwitterError {
    #[error("Network error: {0}")]
    Network(String),

    /// 401 for a protected target account (`{"error":"Not authorized."}`).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 401 caused by our own credentials: bad signature, expired token, clock skew.
    #[error("Credentials rejected: {0}")]
    Credentials(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl TwitterError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, TwitterError::Unauthorized(_))
    }
}

impl From<reqwest::Error> for TwitterError {
    fn from(err: reqwest::Error) -> Self {
        TwitterError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for TwitterError {
    fn from(err: serde_json::Error) -> Self {
        TwitterError::Parse(err.to_string())
    }
}
