use std::sync::Arc;

use tracing::{info, warn};

use followcrawl_common::{CrawlError, UserId};

use crate::traits::{FollowStore, SocialApi};

/// Where a frontier node came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickSource {
    /// Two hops out from the root, not yet expanded.
    Frontier,
    /// The frontier was empty (or unreadable); the seed handle was re-resolved.
    Seed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontierPick {
    pub user_id: UserId,
    pub source: PickSource,
}

/// Chooses the next node for the expansion loop.
pub struct FrontierSelector {
    store: Arc<dyn FollowStore>,
    api: Arc<dyn SocialApi>,
    root_user_id: UserId,
    seed_screen_name: String,
}

impl FrontierSelector {
    pub fn new(
        store: Arc<dyn FollowStore>,
        api: Arc<dyn SocialApi>,
        root_user_id: UserId,
        seed_screen_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            api,
            root_user_id,
            seed_screen_name: seed_screen_name.into(),
        }
    }

    /// Pick the next node to expand.
    ///
    /// A failed frontier query is logged and treated as an empty frontier.
    /// The only error surfaced is a failure to resolve the seed handle.
    pub async fn next_user(&self) -> Result<FrontierPick, CrawlError> {
        match self.store.frontier_candidate(self.root_user_id).await {
            Ok(Some(user_id)) => {
                return Ok(FrontierPick {
                    user_id,
                    source: PickSource::Frontier,
                })
            }
            Ok(None) => {
                info!(root = self.root_user_id, "Frontier empty, falling back to seed");
            }
            Err(e) => {
                warn!(root = self.root_user_id, error = %e, "Frontier query failed, falling back to seed");
            }
        }

        let user_id = self
            .api
            .resolve_screen_name(&self.seed_screen_name)
            .await?;
        info!(
            screen_name = self.seed_screen_name.as_str(),
            user_id,
            "Resolved seed user"
        );

        if let Err(e) = self.store.ensure_user(user_id).await {
            warn!(user_id, error = %e, "Failed to create seed node");
        }

        Ok(FrontierPick {
            user_id,
            source: PickSource::Seed,
        })
    }
}
