// Trait abstractions for the crawl loops' two collaborators.
//
// FollowStore — the persistent graph: frontier/hydration reads plus the
//   idempotent writes both loops perform.
// SocialApi — the three remote operations the crawl needs.
//
// Both report failures as CrawlError so the loops can branch on the
// taxonomy (Authorization retires a node, everything else is logged).
// MockStore / MockApi in `testing` implement them without network or Docker.

use async_trait::async_trait;

use followcrawl_common::{CrawlError, FriendIdsPage, UserId, UserProfile};
use followcrawl_graph::{GraphClient, GraphError, GraphReader, GraphWriter};
use twitter_client::{TwitterClient, TwitterError, TwitterUser};

// ---------------------------------------------------------------------------
// FollowStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait FollowStore: Send + Sync {
    /// One unexpanded, unvisited node two FOLLOWS hops from `root`, if any.
    async fn frontier_candidate(&self, root: UserId) -> Result<Option<UserId>, CrawlError>;

    /// Up to `limit` ids of nodes without profile data.
    async fn users_missing_profile(&self, limit: usize) -> Result<Vec<UserId>, CrawlError>;

    async fn ensure_user(&self, id: UserId) -> Result<(), CrawlError>;

    /// Merge `user -> friend` for each friend. Returns the number of edges submitted.
    async fn merge_follows(&self, user: UserId, friends: &[UserId]) -> Result<u64, CrawlError>;

    async fn mark_visited(&self, id: UserId) -> Result<(), CrawlError>;

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), CrawlError>;

    /// Note that a bulk lookup returned no profile for these ids.
    async fn record_profile_misses(&self, ids: &[UserId]) -> Result<(), CrawlError>;
}

/// Neo4j-backed store. One clone of the client's pool per store.
#[derive(Clone)]
pub struct Neo4jStore {
    reader: GraphReader,
    writer: GraphWriter,
}

impl Neo4jStore {
    pub fn new(client: GraphClient) -> Self {
        Self {
            reader: GraphReader::new(client.clone()),
            writer: GraphWriter::new(client),
        }
    }
}

fn store_error(err: GraphError) -> CrawlError {
    match err {
        GraphError::Query(e) => CrawlError::Query(e.to_string()),
        other => CrawlError::Decode(other.to_string()),
    }
}

#[async_trait]
impl FollowStore for Neo4jStore {
    async fn frontier_candidate(&self, root: UserId) -> Result<Option<UserId>, CrawlError> {
        self.reader.frontier_candidate(root).await.map_err(store_error)
    }

    async fn users_missing_profile(&self, limit: usize) -> Result<Vec<UserId>, CrawlError> {
        self.reader
            .users_missing_profile(limit)
            .await
            .map_err(store_error)
    }

    async fn ensure_user(&self, id: UserId) -> Result<(), CrawlError> {
        self.writer.ensure_user(id).await.map_err(store_error)
    }

    async fn merge_follows(&self, user: UserId, friends: &[UserId]) -> Result<u64, CrawlError> {
        self.writer
            .merge_follows(user, friends)
            .await
            .map_err(store_error)
    }

    async fn mark_visited(&self, id: UserId) -> Result<(), CrawlError> {
        self.writer.mark_visited(id).await.map_err(store_error)
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), CrawlError> {
        self.writer.upsert_profile(profile).await.map_err(store_error)
    }

    async fn record_profile_misses(&self, ids: &[UserId]) -> Result<(), CrawlError> {
        self.writer
            .record_profile_misses(ids)
            .await
            .map_err(store_error)
    }
}

// ---------------------------------------------------------------------------
// SocialApi
// ---------------------------------------------------------------------------

#[async_trait]
pub trait SocialApi: Send + Sync {
    async fn resolve_screen_name(&self, screen_name: &str) -> Result<UserId, CrawlError>;

    /// One page of `user`'s outbound follows starting at `cursor`.
    async fn friend_ids(&self, user: UserId, cursor: i64) -> Result<FriendIdsPage, CrawlError>;

    async fn lookup_profiles(&self, ids: &[UserId]) -> Result<Vec<UserProfile>, CrawlError>;
}

/// Only a protected target account is an authorization failure. Rejected
/// credentials and everything else are network errors, so no node is retired.
fn follow_list_error(err: TwitterError) -> CrawlError {
    match err {
        TwitterError::Unauthorized(msg) => CrawlError::Authorization(msg),
        other => CrawlError::Network(other.to_string()),
    }
}

fn lookup_error(err: TwitterError) -> CrawlError {
    CrawlError::Lookup(err.to_string())
}

fn to_profile(user: TwitterUser) -> UserProfile {
    UserProfile {
        id: user.id,
        screen_name: user.screen_name,
        name: user.name,
        description: user.description.unwrap_or_default(),
    }
}

#[async_trait]
impl SocialApi for TwitterClient {
    async fn resolve_screen_name(&self, screen_name: &str) -> Result<UserId, CrawlError> {
        TwitterClient::resolve_screen_name(self, screen_name)
            .await
            .map_err(lookup_error)
    }

    async fn friend_ids(&self, user: UserId, cursor: i64) -> Result<FriendIdsPage, CrawlError> {
        let resp = TwitterClient::friend_ids(self, user, cursor)
            .await
            .map_err(follow_list_error)?;
        Ok(FriendIdsPage {
            ids: resp.ids,
            next_cursor: resp.next_cursor,
        })
    }

    async fn lookup_profiles(&self, ids: &[UserId]) -> Result<Vec<UserProfile>, CrawlError> {
        let users = self.lookup_users(ids).await.map_err(lookup_error)?;
        Ok(users.into_iter().map(to_profile).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_follow_list_becomes_authorization_error() {
        let err = follow_list_error(TwitterError::Unauthorized("Not authorized.".into()));
        assert!(err.is_authorization());

        let err = follow_list_error(TwitterError::Api {
            status: 503,
            message: "Over capacity".into(),
        });
        assert!(matches!(err, CrawlError::Network(_)));
    }

    #[test]
    fn rejected_credentials_never_retire_a_node() {
        let err = follow_list_error(TwitterError::Credentials(
            "Invalid or expired token. (code 89)".into(),
        ));
        assert!(!err.is_authorization());
        assert!(matches!(err, CrawlError::Network(_)));
    }

    #[test]
    fn lookup_failures_are_lookup_errors_even_when_unauthorized() {
        let err = lookup_error(TwitterError::Unauthorized("nope".into()));
        assert!(matches!(err, CrawlError::Lookup(_)));
    }

    #[test]
    fn missing_description_becomes_empty_string() {
        let profile = to_profile(TwitterUser {
            id: 9,
            screen_name: "nine".into(),
            name: "Nine".into(),
            description: None,
        });
        assert_eq!(profile.description, "");
        assert_eq!(profile.name, "Nine");
    }
}
