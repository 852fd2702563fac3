use neo4rs::{ConfigBuilder, Graph};

/// Bolt connection pool for the follow graph.
///
/// The expansion and hydration loops each hold a clone; clones share one pool.
#[derive(Clone)]
pub struct GraphClient {
    pub(crate) graph: Graph,
}

impl GraphClient {
    /// Open a small pool against `uri`.
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self, neo4rs::Error> {
        let config = ConfigBuilder::default()
            .uri(uri)
            .user(user)
            .password(password)
            .fetch_size(500)
            .max_connections(4)
            .build()?;
        let graph = Graph::connect(config).await?;
        Ok(Self { graph })
    }

    /// Raw handle, for ad-hoc Cypher the reader and writer do not cover.
    pub fn inner(&self) -> &Graph {
        &self.graph
    }
}
