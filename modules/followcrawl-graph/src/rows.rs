//! Typed decoding of query result rows.
//!
//! User ids are persisted as Bolt integers but every read query returns them
//! via `toString(...)`, so decoding is a string parse into `u64` that reports
//! a `GraphError::Decode` instead of panicking.

use followcrawl_common::UserId;
use neo4rs::Row;

use crate::GraphError;

/// Column name every id-returning query uses.
pub const ID_COLUMN: &str = "id";

pub fn user_id(row: &Row) -> Result<UserId, GraphError> {
    let raw: String = row.get(ID_COLUMN).map_err(|e| GraphError::Decode {
        column: ID_COLUMN.to_string(),
        reason: e.to_string(),
    })?;
    parse_user_id(&raw)
}

pub fn parse_user_id(raw: &str) -> Result<UserId, GraphError> {
    raw.trim().parse::<UserId>().map_err(|e| GraphError::Decode {
        column: ID_COLUMN.to_string(),
        reason: format!("{raw:?}: {e}"),
    })
}

/// Convert an id into the integer form it is stored as.
pub fn id_param(id: UserId) -> Result<i64, GraphError> {
    i64::try_from(id).map_err(|_| GraphError::IdOutOfRange(id))
}
