use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Cypher query failed: {0}")]
    Query(#[from] neo4rs::Error),

    #[error("Failed to decode column `{column}`: {reason}")]
    Decode { column: String, reason: String },

    /// Ids are stored as signed 64-bit integers.
    #[error("User id {0} does not fit in a graph integer")]
    IdOutOfRange(u64),
}
