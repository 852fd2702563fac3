use serde::Deserialize;

/// A user object as returned by `users/lookup.json`. Only the fields the
/// crawler persists are decoded.
#[derive(Debug, Clone, Deserialize)]
pub struct TwitterUser {
    pub id: u64,
    #[serde(default)]
    pub screen_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// One page of `friends/ids.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct FriendIdsResponse {
    #[serde(default)]
    pub ids: Vec<u64>,
    #[serde(default)]
    pub next_cursor: i64,
}

/// Error body. Coded failures use `{"errors":[{"code":34,"message":"..."}]}`;
/// protected-account refusals use `{"request":"...","error":"Not authorized."}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorEnvelope {
    #[serde(default)]
    pub errors: Vec<ApiErrorItem>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorItem {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

impl ErrorEnvelope {
    pub(crate) fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    pub(crate) fn has_code(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Flatten the envelope into one human-readable line, falling back to the raw body.
    pub(crate) fn describe(body: &str) -> String {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(env) if !env.errors.is_empty() => env
                .errors
                .iter()
                .map(|e| format!("{} (code {})", e.message, e.code))
                .collect::<Vec<_>>()
                .join("; "),
            _ => body.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn friend_ids_page_decodes_with_string_cursor_fields_ignored() {
        let body = r#"{"ids":[2,3],"next_cursor":0,"next_cursor_str":"0","previous_cursor":0}"#;
        let page: FriendIdsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(page.ids, vec![2, 3]);
        assert_eq!(page.next_cursor, 0);
    }

    #[test]
    fn user_without_description_decodes() {
        let body = r#"[{"id":12,"id_str":"12","screen_name":"jack","name":"jack","description":null}]"#;
        let users: Vec<TwitterUser> = serde_json::from_str(body).unwrap();
        assert_eq!(users[0].id, 12);
        assert_eq!(users[0].screen_name, "jack");
        assert!(users[0].description.is_none());
    }

    #[test]
    fn error_envelope_is_flattened() {
        let body = r#"{"errors":[{"code":89,"message":"Invalid or expired token."}]}"#;
        assert_eq!(ErrorEnvelope::describe(body), "Invalid or expired token. (code 89)");
        assert_eq!(ErrorEnvelope::describe("Not authorized."), "Not authorized.");
    }

    #[test]
    fn protected_account_body_has_no_code() {
        let env = ErrorEnvelope::parse(r#"{"request":"/1.1/friends/ids.json","error":"Not authorized."}"#);
        assert!(!env.has_code());
        assert_eq!(env.error.as_deref(), Some("Not authorized."));

        let env = ErrorEnvelope::parse(r#"{"errors":[{"code":89,"message":"Invalid or expired token."}]}"#);
        assert!(env.has_code());
        assert!(!ErrorEnvelope::parse("<html>").has_code());
    }
}
