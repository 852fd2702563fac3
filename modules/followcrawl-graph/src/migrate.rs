use neo4rs::query;
use tracing::{info, warn};

use crate::GraphClient;

/// Run idempotent schema migrations.
///
/// The uniqueness constraint on `User.id` is what makes concurrent `MERGE`s
/// from the expansion and hydration loops converge on a single node.
pub async fn migrate(client: &GraphClient) -> Result<(), neo4rs::Error> {
    let g = &client.graph;

    info!("Running schema migrations...");

    let constraints = [
        "CREATE CONSTRAINT user_id_unique IF NOT EXISTS FOR (u:User) REQUIRE u.id IS UNIQUE",
    ];
    for c in &constraints {
        run_ignoring_exists(g, c).await?;
    }
    info!("User id uniqueness constraint ensured");

    // Hydration scans for nodes without a name.
    let indexes = ["CREATE INDEX user_name IF NOT EXISTS FOR (u:User) ON (u.name)"];
    for i in &indexes {
        run_ignoring_exists(g, i).await?;
    }
    info!("Schema migrations complete");

    Ok(())
}

async fn run_ignoring_exists(g: &neo4rs::Graph, cypher: &str) -> Result<(), neo4rs::Error> {
    match g.run(query(cypher)).await {
        Ok(_) => Ok(()),
        Err(e) => {
            let msg = e.to_string().to_lowercase();
            if msg.contains("already exists") || msg.contains("equivalent") {
                warn!("Already exists (skipped): {}", cypher.chars().take(80).collect::<String>());
                Ok(())
            } else {
                Err(e)
            }
        }
    }
}
