use neo4rs::query;
use tracing::{debug, warn};

use followcrawl_common::UserId;

use crate::rows::{self, id_param};
use crate::{GraphClient, GraphError};

/// Read-side queries that drive the two crawl loops.
#[derive(Clone)]
pub struct GraphReader {
    client: GraphClient,
}

impl GraphReader {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// Next node to expand: exactly two FOLLOWS hops from `root`, with no
    /// outbound FOLLOWS of its own and no `visited` flag.
    ///
    /// Ties break on highest id first so repeated calls against an unchanged
    /// graph return the same node.
    pub async fn frontier_candidate(&self, root: UserId) -> Result<Option<UserId>, GraphError> {
        let q = query(
            "MATCH (root:User {id: $root_id})-[:FOLLOWS*2]->(n:User)
             WHERE NOT EXISTS { (n)-[:FOLLOWS]->() }
               AND n.visited IS NULL
             WITH DISTINCT n
             ORDER BY n.id DESC
             LIMIT 1
             RETURN toString(n.id) AS id",
        )
        .param("root_id", id_param(root)?);

        let mut stream = self.client.graph.execute(q).await?;
        match stream.next().await? {
            Some(row) => {
                let id = rows::user_id(&row)?;
                debug!(root, user_id = id, "Frontier candidate found");
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    /// Up to `limit` ids of nodes that have never been hydrated (no `name`).
    ///
    /// Nodes the lookup endpoint has already omitted (suspended or deleted
    /// accounts) sort behind fresh ones by `profile_misses`.
    /// Rows whose id fails to decode are logged and left out of the batch.
    pub async fn users_missing_profile(&self, limit: usize) -> Result<Vec<UserId>, GraphError> {
        let q = query(
            "MATCH (u:User)
             WHERE u.name IS NULL
             RETURN toString(u.id) AS id
             ORDER BY coalesce(u.profile_misses, 0) ASC, u.id ASC
             LIMIT $limit",
        )
        .param("limit", limit as i64);

        let mut stream = self.client.graph.execute(q).await?;
        let mut ids = Vec::with_capacity(limit);
        while let Some(row) = stream.next().await? {
            match rows::user_id(&row) {
                Ok(id) => ids.push(id),
                Err(e) => warn!(error = %e, "Skipping undecodable hydration candidate"),
            }
        }
        Ok(ids)
    }
}
