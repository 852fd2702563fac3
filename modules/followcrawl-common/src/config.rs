use std::time::Duration;

use tracing::info;

use crate::error::CrawlError;
use crate::types::{UserId, MAX_PROFILE_BATCH};

pub const DEFAULT_NEO4J_URI: &str = "bolt://localhost:7687";
pub const DEFAULT_NEO4J_USER: &str = "neo4j";

/// Account the frontier query measures its two hops from.
pub const DEFAULT_ROOT_USER_ID: UserId = 221_902_776;

/// Handle re-resolved to restart the crawl when the frontier is empty.
pub const DEFAULT_SEED_SCREEN_NAME: &str = "wefreema";

pub const DEFAULT_EXPANSION_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_HYDRATION_INTERVAL_SECS: u64 = 15;
pub const DEFAULT_HYDRATION_BATCH_SIZE: usize = 99;

/// Crawler configuration. Assembled by the binary from flags and env vars.
#[derive(Clone)]
pub struct Config {
    // Twitter credentials
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,

    // Neo4j
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,

    // Crawl shape
    pub root_user_id: UserId,
    pub seed_screen_name: String,
    pub expansion_interval_secs: u64,
    pub hydration_interval_secs: u64,
    pub hydration_batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            consumer_key: String::new(),
            consumer_secret: String::new(),
            access_token: String::new(),
            access_token_secret: String::new(),
            neo4j_uri: DEFAULT_NEO4J_URI.to_string(),
            neo4j_user: DEFAULT_NEO4J_USER.to_string(),
            neo4j_password: String::new(),
            root_user_id: DEFAULT_ROOT_USER_ID,
            seed_screen_name: DEFAULT_SEED_SCREEN_NAME.to_string(),
            expansion_interval_secs: DEFAULT_EXPANSION_INTERVAL_SECS,
            hydration_interval_secs: DEFAULT_HYDRATION_INTERVAL_SECS,
            hydration_batch_size: DEFAULT_HYDRATION_BATCH_SIZE,
        }
    }
}

impl Config {
    /// Reject configurations the crawler cannot start with.
    pub fn validate(&self) -> Result<(), CrawlError> {
        if self.consumer_key.is_empty() || self.consumer_secret.is_empty() {
            return Err(CrawlError::Config(
                "You must set the --consumerkey and --consumersecret flags.".to_string(),
            ));
        }
        if self.seed_screen_name.trim().is_empty() {
            return Err(CrawlError::Config(
                "seed screen name must not be empty".to_string(),
            ));
        }
        if self.hydration_batch_size == 0 || self.hydration_batch_size > MAX_PROFILE_BATCH {
            return Err(CrawlError::Config(format!(
                "hydration batch size must be between 1 and {MAX_PROFILE_BATCH}, got {}",
                self.hydration_batch_size
            )));
        }
        Ok(())
    }

    pub fn expansion_interval(&self) -> Duration {
        Duration::from_secs(self.expansion_interval_secs)
    }

    pub fn hydration_interval(&self) -> Duration {
        Duration::from_secs(self.hydration_interval_secs)
    }

    /// Log the effective configuration with secrets masked.
    pub fn log_redacted(&self) {
        let consumer_key = redact(&self.consumer_key);
        let access_token = redact(&self.access_token);
        info!(
            consumer_key = consumer_key.as_str(),
            access_token = access_token.as_str(),
            neo4j_uri = self.neo4j_uri.as_str(),
            neo4j_user = self.neo4j_user.as_str(),
            root_user_id = self.root_user_id,
            seed_screen_name = self.seed_screen_name.as_str(),
            expansion_interval_secs = self.expansion_interval_secs,
            hydration_interval_secs = self.hydration_interval_secs,
            hydration_batch_size = self.hydration_batch_size,
            "Loaded config"
        );
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("consumer_key", &redact(&self.consumer_key))
            .field("consumer_secret", &redact(&self.consumer_secret))
            .field("access_token", &redact(&self.access_token))
            .field("access_token_secret", &redact(&self.access_token_secret))
            .field("neo4j_uri", &self.neo4j_uri)
            .field("neo4j_user", &self.neo4j_user)
            .field("neo4j_password", &redact(&self.neo4j_password))
            .field("root_user_id", &self.root_user_id)
            .field("seed_screen_name", &self.seed_screen_name)
            .field("expansion_interval_secs", &self.expansion_interval_secs)
            .field("hydration_interval_secs", &self.hydration_interval_secs)
            .field("hydration_batch_size", &self.hydration_batch_size)
            .finish()
    }
}

/// Keep the first four characters so operators can tell keys apart.
fn redact(secret: &str) -> String {
    if secret.is_empty() {
        return "<unset>".to_string();
    }
    let prefix: String = secret.chars().take(4).collect();
    format!("{prefix}***")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_keys() -> Config {
        Config {
            consumer_key: "ckey".into(),
            consumer_secret: "csecret".into(),
            ..Config::default()
        }
    }

    #[test]
    fn defaults_match_the_reference_crawl() {
        let c = Config::default();
        assert_eq!(c.root_user_id, 221_902_776);
        assert_eq!(c.seed_screen_name, "wefreema");
        assert_eq!(c.expansion_interval(), Duration::from_secs(30));
        assert_eq!(c.hydration_interval(), Duration::from_secs(15));
        assert_eq!(c.hydration_batch_size, 99);
    }

    #[test]
    fn missing_consumer_credentials_is_a_config_error() {
        let err = Config::default().validate().unwrap_err();
        assert!(matches!(err, CrawlError::Config(_)));

        let only_key = Config {
            consumer_key: "ckey".into(),
            ..Config::default()
        };
        assert!(only_key.validate().is_err());
    }

    #[test]
    fn access_token_pair_is_optional() {
        assert!(with_keys().validate().is_ok());
    }

    #[test]
    fn batch_size_is_bounded_by_the_lookup_endpoint() {
        let mut c = with_keys();
        c.hydration_batch_size = 0;
        assert!(c.validate().is_err());
        c.hydration_batch_size = 101;
        assert!(c.validate().is_err());
        c.hydration_batch_size = 100;
        assert!(c.validate().is_ok());
    }

    #[test]
    fn debug_output_masks_secrets() {
        let mut c = with_keys();
        c.neo4j_password = "hunter2".into();
        let shown = format!("{c:?}");
        assert!(!shown.contains("csecret"));
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("ckey***"));
    }
}
