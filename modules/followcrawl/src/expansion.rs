use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use followcrawl_common::{CrawlError, UserId, FIRST_CURSOR};

use crate::frontier::{FrontierPick, FrontierSelector, PickSource};
use crate::traits::{FollowStore, SocialApi};

/// How a follow-list fetch ended.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Every page was read up to the zero cursor.
    Complete,
    /// The API refused access; the node can never be expanded.
    Unauthorized,
    /// Pagination stopped on some other error. Ids read so far are kept.
    Failed(CrawlError),
}

#[derive(Debug)]
pub struct FollowFetch {
    pub ids: Vec<UserId>,
    pub pages: u32,
    pub outcome: FetchOutcome,
}

/// Per-iteration summary of the expansion loop.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExpansionStats {
    pub user_id: Option<UserId>,
    pub from_seed: bool,
    pub pages: u32,
    pub follows_found: u64,
    pub edges_merged: u64,
    pub marked_visited: bool,
    pub errors: u32,
}

impl fmt::Display for ExpansionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.user_id {
            Some(id) => write!(f, "user={id}")?,
            None => write!(f, "user=none")?,
        }
        if self.from_seed {
            write!(f, " (seed)")?;
        }
        write!(
            f,
            " pages={} follows={} edges={} visited={} errors={}",
            self.pages, self.follows_found, self.edges_merged, self.marked_visited, self.errors
        )
    }
}

/// The graph-expansion loop: pick a node, read its follow list, persist the
/// edges, retire dead ends, sleep.
pub struct ExpansionWorker {
    frontier: FrontierSelector,
    store: Arc<dyn FollowStore>,
    api: Arc<dyn SocialApi>,
    interval: Duration,
}

impl ExpansionWorker {
    pub fn new(
        frontier: FrontierSelector,
        store: Arc<dyn FollowStore>,
        api: Arc<dyn SocialApi>,
        interval: Duration,
    ) -> Self {
        Self {
            frontier,
            store,
            api,
            interval,
        }
    }

    /// Run forever. Each iteration's errors are absorbed and logged.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        loop {
            match self.run_once().await {
                Ok(stats) => info!("Expansion iteration complete. {stats}"),
                Err(e) => warn!(error = %e, "Expansion iteration aborted"),
            }
            info!(secs = self.interval.as_secs(), "Expansion sleeping");
            tokio::time::sleep(self.interval).await;
        }
    }

    /// One iteration without the trailing sleep.
    pub async fn run_once(&self) -> Result<ExpansionStats, CrawlError> {
        let FrontierPick { user_id, source } = self.frontier.next_user().await?;
        let mut stats = ExpansionStats {
            user_id: Some(user_id),
            from_seed: source == PickSource::Seed,
            ..Default::default()
        };

        let fetch = self.fetch_follows(user_id).await;
        stats.pages = fetch.pages;
        stats.follows_found = fetch.ids.len() as u64;

        if !fetch.ids.is_empty() {
            info!(user_id, count = fetch.ids.len(), "Connecting follows");
            match self.store.merge_follows(user_id, &fetch.ids).await {
                Ok(n) => stats.edges_merged = n,
                Err(e) => {
                    stats.errors += 1;
                    warn!(user_id, error = %e, "Failed to persist follows");
                }
            }
        }

        let retire = match &fetch.outcome {
            FetchOutcome::Unauthorized => Some("unauthorized"),
            FetchOutcome::Complete if fetch.ids.is_empty() => Some("no follows"),
            FetchOutcome::Complete => None,
            FetchOutcome::Failed(e) => {
                stats.errors += 1;
                warn!(user_id, error = %e, "Follow list fetch failed");
                None
            }
        };

        if let Some(reason) = retire {
            info!(user_id, reason, "Marking as visited");
            match self.store.mark_visited(user_id).await {
                Ok(()) => stats.marked_visited = true,
                Err(e) => {
                    stats.errors += 1;
                    warn!(user_id, error = %e, "Failed to mark visited");
                }
            }
        }

        Ok(stats)
    }

    /// Read the whole follow list, one page per call, until the zero cursor.
    pub async fn fetch_follows(&self, user_id: UserId) -> FollowFetch {
        let mut ids = Vec::new();
        let mut pages = 0u32;
        let mut cursor = FIRST_CURSOR;
        let mut seen_cursors = HashSet::new();

        let outcome = loop {
            let page = match self.api.friend_ids(user_id, cursor).await {
                Ok(page) => page,
                Err(e) if e.is_authorization() => {
                    warn!(user_id, error = %e, "Follow list not accessible");
                    break FetchOutcome::Unauthorized;
                }
                Err(e) => break FetchOutcome::Failed(e),
            };
            pages += 1;
            ids.extend(page.ids.iter().copied());

            if page.is_last() {
                break FetchOutcome::Complete;
            }
            if !seen_cursors.insert(page.next_cursor) {
                break FetchOutcome::Failed(CrawlError::Network(format!(
                    "cursor {} repeated while paging follows of {user_id}",
                    page.next_cursor
                )));
            }
            cursor = page.next_cursor;
        };

        FollowFetch { ids, pages, outcome }
    }
}
