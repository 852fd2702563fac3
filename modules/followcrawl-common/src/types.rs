use serde::{Deserialize, Serialize};

/// Numeric account id assigned by the social network.
pub type UserId = u64;

/// Cursor requesting the first page of a follow list.
pub const FIRST_CURSOR: i64 = -1;

/// Cursor value marking the end of a follow list.
pub const END_CURSOR: i64 = 0;

/// Upper bound the bulk profile endpoint accepts per call.
pub const MAX_PROFILE_BATCH: usize = 100;

/// One page of a user's outbound follows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendIdsPage {
    pub ids: Vec<UserId>,
    pub next_cursor: i64,
}

impl FriendIdsPage {
    pub fn is_last(&self) -> bool {
        self.next_cursor == END_CURSOR
    }
}

/// Profile attributes written onto a `User` node by hydration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub screen_name: String,
    pub name: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_zero_cursor_ends_pagination() {
        let page = |c| FriendIdsPage { ids: vec![], next_cursor: c };
        assert!(page(0).is_last());
        assert!(!page(-1).is_last());
        assert!(!page(1_500_000_000_000).is_last());
    }
}
