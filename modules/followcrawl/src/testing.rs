// Test mocks for the crawl loops.
//
// Two mocks matching the two trait boundaries:
// - MockStore (FollowStore) — stateful in-memory graph with MERGE semantics
// - MockApi (SocialApi) — HashMap-based scripted pages, handles and profiles
//
// Both record what they were asked so tests can assert on call patterns.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use followcrawl_common::{CrawlError, FriendIdsPage, UserId, UserProfile, END_CURSOR, FIRST_CURSOR};

use crate::traits::{FollowStore, SocialApi};

// ---------------------------------------------------------------------------
// MockStore
// ---------------------------------------------------------------------------

/// Node state as the in-memory graph holds it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockUser {
    pub visited: bool,
    pub screen_name: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub profile_misses: u32,
}

#[derive(Default)]
struct MockGraph {
    users: BTreeMap<UserId, MockUser>,
    follows: BTreeSet<(UserId, UserId)>,
    candidate_limits: Vec<usize>,
    frontier_queries: u32,
}

impl MockGraph {
    fn touch(&mut self, id: UserId) -> &mut MockUser {
        self.users.entry(id).or_default()
    }

    fn outbound(&self, id: UserId) -> impl Iterator<Item = UserId> + '_ {
        self.follows
            .range((id, UserId::MIN)..=(id, UserId::MAX))
            .map(|(_, to)| *to)
    }
}

/// In-memory graph store. Edges and nodes merge idempotently, `visited` only
/// ever goes from false to true, and the frontier is computed the same way
/// the Cypher query does (two hops, no outbound edge, not visited, highest id).
/// Hydration candidates come back fewest lookup misses first, then by id.
#[derive(Default)]
pub struct MockStore {
    graph: Mutex<MockGraph>,
    fail_frontier: bool,
    fail_candidates: bool,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed `user -> friend` edges.
    pub fn with_follows(self, user: UserId, friends: &[UserId]) -> Self {
        {
            let mut g = self.graph.lock().unwrap();
            g.touch(user);
            for f in friends {
                g.touch(*f);
                g.follows.insert((user, *f));
            }
        }
        self
    }

    /// Pre-seed bare nodes with no profile.
    pub fn with_users(self, ids: impl IntoIterator<Item = UserId>) -> Self {
        {
            let mut g = self.graph.lock().unwrap();
            for id in ids {
                g.touch(id);
            }
        }
        self
    }

    pub fn with_visited(self, id: UserId) -> Self {
        self.graph.lock().unwrap().touch(id).visited = true;
        self
    }

    /// Make every frontier query fail with a `Query` error.
    pub fn failing_frontier(mut self) -> Self {
        self.fail_frontier = true;
        self
    }

    /// Make every hydration candidate query fail with a `Query` error.
    pub fn failing_candidates(mut self) -> Self {
        self.fail_candidates = true;
        self
    }

    pub fn has_edge(&self, from: UserId, to: UserId) -> bool {
        self.graph.lock().unwrap().follows.contains(&(from, to))
    }

    pub fn edge_count(&self) -> usize {
        self.graph.lock().unwrap().follows.len()
    }

    pub fn user_count(&self) -> usize {
        self.graph.lock().unwrap().users.len()
    }

    pub fn user(&self, id: UserId) -> Option<MockUser> {
        self.graph.lock().unwrap().users.get(&id).cloned()
    }

    pub fn is_visited(&self, id: UserId) -> bool {
        self.user(id).map(|u| u.visited).unwrap_or(false)
    }

    /// Limits passed to each `users_missing_profile` call, in order.
    pub fn candidate_limits(&self) -> Vec<usize> {
        self.graph.lock().unwrap().candidate_limits.clone()
    }

    pub fn frontier_queries(&self) -> u32 {
        self.graph.lock().unwrap().frontier_queries
    }
}

#[async_trait]
impl FollowStore for MockStore {
    async fn frontier_candidate(&self, root: UserId) -> Result<Option<UserId>, CrawlError> {
        let mut g = self.graph.lock().unwrap();
        g.frontier_queries += 1;
        if self.fail_frontier {
            return Err(CrawlError::Query("frontier query failed".into()));
        }

        let candidate = g
            .outbound(root)
            .flat_map(|hop| g.outbound(hop).collect::<Vec<_>>())
            .filter(|n| g.outbound(*n).next().is_none())
            .filter(|n| !g.users.get(n).map(|u| u.visited).unwrap_or(false))
            .max();
        Ok(candidate)
    }

    async fn users_missing_profile(&self, limit: usize) -> Result<Vec<UserId>, CrawlError> {
        let mut g = self.graph.lock().unwrap();
        g.candidate_limits.push(limit);
        if self.fail_candidates {
            return Err(CrawlError::Query("candidate query failed".into()));
        }
        let mut missing: Vec<(u32, UserId)> = g
            .users
            .iter()
            .filter(|(_, u)| u.name.is_none())
            .map(|(id, u)| (u.profile_misses, *id))
            .collect();
        missing.sort();
        Ok(missing.into_iter().map(|(_, id)| id).take(limit).collect())
    }

    async fn ensure_user(&self, id: UserId) -> Result<(), CrawlError> {
        self.graph.lock().unwrap().touch(id);
        Ok(())
    }

    async fn merge_follows(&self, user: UserId, friends: &[UserId]) -> Result<u64, CrawlError> {
        let mut g = self.graph.lock().unwrap();
        g.touch(user);
        for f in friends {
            g.touch(*f);
            g.follows.insert((user, *f));
        }
        Ok(friends.len() as u64)
    }

    async fn mark_visited(&self, id: UserId) -> Result<(), CrawlError> {
        self.graph.lock().unwrap().touch(id).visited = true;
        Ok(())
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), CrawlError> {
        let mut g = self.graph.lock().unwrap();
        let user = g.touch(profile.id);
        user.screen_name = Some(profile.screen_name.clone());
        user.name = Some(profile.name.clone());
        user.description = Some(profile.description.clone());
        Ok(())
    }

    async fn record_profile_misses(&self, ids: &[UserId]) -> Result<(), CrawlError> {
        let mut g = self.graph.lock().unwrap();
        for id in ids {
            if let Some(user) = g.users.get_mut(id) {
                if user.name.is_none() {
                    user.profile_misses += 1;
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockApi
// ---------------------------------------------------------------------------

/// A recorded call against [`MockApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    ResolveScreenName(String),
    FriendIds { user: UserId, cursor: i64 },
    LookupProfiles(Vec<UserId>),
}

/// Scripted social API. Unregistered screen names fail with `Lookup`,
/// unregistered follow pages fail with `Network`.
/// Builder pattern: `.on_screen_name()`, `.on_page()`, `.on_follows()`,
/// `.on_unauthorized()`, `.on_profile()`.
#[derive(Default)]
pub struct MockApi {
    screen_names: HashMap<String, UserId>,
    pages: HashMap<(UserId, i64), FriendIdsPage>,
    unauthorized: HashSet<(UserId, i64)>,
    profiles: HashMap<UserId, UserProfile>,
    fail_lookups: bool,
    calls: Mutex<Vec<ApiCall>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_screen_name(mut self, screen_name: &str, id: UserId) -> Self {
        self.screen_names.insert(screen_name.to_string(), id);
        self
    }

    /// Register the page returned for `(user, cursor)`.
    pub fn on_page(mut self, user: UserId, cursor: i64, ids: &[UserId], next_cursor: i64) -> Self {
        self.pages.insert(
            (user, cursor),
            FriendIdsPage {
                ids: ids.to_vec(),
                next_cursor,
            },
        );
        self
    }

    /// Register a complete single-page follow list.
    pub fn on_follows(self, user: UserId, ids: &[UserId]) -> Self {
        self.on_page(user, FIRST_CURSOR, ids, END_CURSOR)
    }

    /// The account's follow list is protected from the first page on.
    pub fn on_unauthorized(self, user: UserId) -> Self {
        self.unauthorized_at(user, FIRST_CURSOR)
    }

    /// Access is refused when `cursor` is requested.
    pub fn unauthorized_at(mut self, user: UserId, cursor: i64) -> Self {
        self.unauthorized.insert((user, cursor));
        self
    }

    pub fn on_profile(mut self, id: UserId, screen_name: &str, name: &str) -> Self {
        self.profiles.insert(
            id,
            UserProfile {
                id,
                screen_name: screen_name.to_string(),
                name: name.to_string(),
                description: format!("profile of {screen_name}"),
            },
        );
        self
    }

    /// Make every bulk profile lookup fail.
    pub fn failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Cursors requested for `user`, in order.
    pub fn friend_id_cursors(&self, user: UserId) -> Vec<i64> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::FriendIds { user: u, cursor } if u == user => Some(cursor),
                _ => None,
            })
            .collect()
    }

    /// Id lists passed to each bulk profile lookup.
    pub fn lookup_batches(&self) -> Vec<Vec<UserId>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::LookupProfiles(ids) => Some(ids),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SocialApi for MockApi {
    async fn resolve_screen_name(&self, screen_name: &str) -> Result<UserId, CrawlError> {
        self.record(ApiCall::ResolveScreenName(screen_name.to_string()));
        self.screen_names
            .get(screen_name)
            .copied()
            .ok_or_else(|| CrawlError::Lookup(format!("unknown screen name {screen_name}")))
    }

    async fn friend_ids(&self, user: UserId, cursor: i64) -> Result<FriendIdsPage, CrawlError> {
        self.record(ApiCall::FriendIds { user, cursor });
        if self.unauthorized.contains(&(user, cursor)) {
            return Err(CrawlError::Authorization("Not authorized.".into()));
        }
        self.pages
            .get(&(user, cursor))
            .cloned()
            .ok_or_else(|| CrawlError::Network(format!("no page for user {user} cursor {cursor}")))
    }

    async fn lookup_profiles(&self, ids: &[UserId]) -> Result<Vec<UserProfile>, CrawlError> {
        self.record(ApiCall::LookupProfiles(ids.to_vec()));
        if self.fail_lookups {
            return Err(CrawlError::Lookup("lookup failed".into()));
        }
        Ok(ids
            .iter()
            .filter_map(|id| self.profiles.get(id).cloned())
            .collect())
    }
}
