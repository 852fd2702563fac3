use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use followcrawl_common::{CrawlError, UserId};

use crate::traits::{FollowStore, SocialApi};

/// Per-iteration summary of the hydration loop.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HydrationStats {
    pub candidates: usize,
    pub profiles_fetched: usize,
    pub profiles_written: usize,
    pub misses: usize,
    pub errors: u32,
}

impl fmt::Display for HydrationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "candidates={} fetched={} written={} misses={} errors={}",
            self.candidates,
            self.profiles_fetched,
            self.profiles_written,
            self.misses,
            self.errors
        )
    }
}

/// Backfills profile attributes for nodes known only by id.
pub struct HydrationWorker {
    store: Arc<dyn FollowStore>,
    api: Arc<dyn SocialApi>,
    batch_size: usize,
    interval: Duration,
}

impl HydrationWorker {
    pub fn new(
        store: Arc<dyn FollowStore>,
        api: Arc<dyn SocialApi>,
        batch_size: usize,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            api,
            batch_size,
            interval,
        }
    }

    /// Run forever. Each iteration's errors are absorbed and logged.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        loop {
            match self.run_once().await {
                Ok(stats) => info!("Hydration iteration complete. {stats}"),
                Err(e) => warn!(error = %e, "Hydration iteration aborted"),
            }
            debug!(secs = self.interval.as_secs(), "Hydration sleeping");
            tokio::time::sleep(self.interval).await;
        }
    }

    /// One iteration without the trailing sleep.
    ///
    /// Nodes whose profile does not come back stay nameless and are picked
    /// up again by a later iteration, behind nodes with fewer misses.
    pub async fn run_once(&self) -> Result<HydrationStats, CrawlError> {
        let mut stats = HydrationStats::default();

        let candidates = match self.store.users_missing_profile(self.batch_size).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "Hydration candidate query failed");
                stats.errors += 1;
                Vec::new()
            }
        };
        stats.candidates = candidates.len();
        if candidates.is_empty() {
            return Ok(stats);
        }

        let profiles = self.api.lookup_profiles(&candidates).await?;
        stats.profiles_fetched = profiles.len();

        for profile in &profiles {
            debug!(user_id = profile.id, name = profile.name.as_str(), "Hydrating");
            match self.store.upsert_profile(profile).await {
                Ok(()) => stats.profiles_written += 1,
                Err(e) => {
                    stats.errors += 1;
                    warn!(user_id = profile.id, error = %e, "Failed to write profile");
                }
            }
        }

        let returned: HashSet<UserId> = profiles.iter().map(|p| p.id).collect();
        let missed: Vec<UserId> = candidates
            .iter()
            .copied()
            .filter(|id| !returned.contains(id))
            .collect();
        stats.misses = missed.len();
        if !missed.is_empty() {
            debug!(count = missed.len(), "Lookup returned no profile for some ids");
            if let Err(e) = self.store.record_profile_misses(&missed).await {
                stats.errors += 1;
                warn!(error = %e, "Failed to record profile misses");
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_line() {
        let stats = HydrationStats {
            candidates: 99,
            profiles_fetched: 97,
            profiles_written: 97,
            misses: 2,
            errors: 0,
        };
        assert_eq!(
            stats.to_string(),
            "candidates=99 fetched=97 written=97 misses=2 errors=0"
        );
    }
}
