use neo4rs::query;
use tracing::debug;

use followcrawl_common::{UserId, UserProfile};

use crate::rows::id_param;
use crate::{GraphClient, GraphError};

/// Edges merged per UNWIND statement.
const EDGE_CHUNK: usize = 1000;

/// Write-side wrapper for the graph. Every write is a MERGE or a monotonic
/// flag set, so both crawl loops can write concurrently without locking.
#[derive(Clone)]
pub struct GraphWriter {
    client: GraphClient,
}

impl GraphWriter {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// Make sure a bare `User` node exists for `id`.
    pub async fn ensure_user(&self, id: UserId) -> Result<(), GraphError> {
        let q = query("MERGE (:User {id: $id})").param("id", id_param(id)?);
        self.client.graph.run(q).await?;
        Ok(())
    }

    /// Merge `(user)-[:FOLLOWS]->(friend)` for every friend, creating either
    /// endpoint if it is missing. Re-merging an existing edge is a no-op.
    pub async fn merge_follows(&self, user: UserId, friends: &[UserId]) -> Result<u64, GraphError> {
        let user_param = id_param(user)?;
        let mut merged = 0u64;

        for chunk in friends.chunks(EDGE_CHUNK) {
            let friend_params = chunk
                .iter()
                .map(|id| id_param(*id))
                .collect::<Result<Vec<i64>, _>>()?;

            let q = query(
                "MERGE (u:User {id: $id})
                 WITH u
                 UNWIND $friend_ids AS friend_id
                 MERGE (f:User {id: friend_id})
                 MERGE (u)-[:FOLLOWS]->(f)",
            )
            .param("id", user_param)
            .param("friend_ids", friend_params);

            self.client.graph.run(q).await?;
            merged += chunk.len() as u64;
            debug!(user_id = user, count = chunk.len(), "Merged FOLLOWS edges");
        }

        Ok(merged)
    }

    /// Retire a node from the frontier. The flag is never cleared.
    pub async fn mark_visited(&self, id: UserId) -> Result<(), GraphError> {
        let q = query(
            "MERGE (u:User {id: $id})
             SET u.visited = true",
        )
        .param("id", id_param(id)?);

        self.client.graph.run(q).await?;
        Ok(())
    }

    /// Count one more lookup that came back without these nodes' profiles.
    pub async fn record_profile_misses(&self, ids: &[UserId]) -> Result<(), GraphError> {
        if ids.is_empty() {
            return Ok(());
        }
        let id_params = ids
            .iter()
            .map(|id| id_param(*id))
            .collect::<Result<Vec<i64>, _>>()?;

        let q = query(
            "UNWIND $ids AS id
             MATCH (u:User {id: id})
             WHERE u.name IS NULL
             SET u.profile_misses = coalesce(u.profile_misses, 0) + 1",
        )
        .param("ids", id_params);

        self.client.graph.run(q).await?;
        Ok(())
    }

    /// Write profile fields onto the node, creating it if needed.
    pub async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), GraphError> {
        let q = query(
            "MERGE (u:User {id: $id})
             SET u.screenName = $screen_name,
                 u.description = $description,
                 u.name = $name",
        )
        .param("id", id_param(profile.id)?)
        .param("screen_name", profile.screen_name.as_str())
        .param("description", profile.description.as_str())
        .param("name", profile.name.as_str());

        self.client.graph.run(q).await?;
        Ok(())
    }
}
