pub mod error;
pub mod oauth;
pub mod types;

pub use error::{Result, TwitterError};
pub use oauth::Credentials;
pub use types::{FriendIdsResponse, TwitterUser};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use types::ErrorEnvelope;

const BASE_URL: &str = "https://api.twitter.com/1.1";

/// Largest page `friends/ids.json` will return.
pub const FRIEND_IDS_PAGE_SIZE: u32 = 5000;

/// Method, path and unencoded parameters of one API call. GET parameters go
/// in the query string, POST parameters in a form body; both are signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ApiRequest {
    pub method: Method,
    pub path: &'static str,
    pub params: Vec<(&'static str, String)>,
}

impl ApiRequest {
    fn param_refs(&self) -> Vec<(&str, &str)> {
        self.params.iter().map(|(k, v)| (*k, v.as_str())).collect()
    }

    fn resolve_screen_name(screen_name: &str) -> Self {
        Self {
            method: Method::GET,
            path: "users/lookup.json",
            params: vec![("screen_name", screen_name.to_string())],
        }
    }

    fn friend_ids(user_id: u64, cursor: i64) -> Self {
        Self {
            method: Method::GET,
            path: "friends/ids.json",
            params: vec![
                ("user_id", user_id.to_string()),
                ("count", FRIEND_IDS_PAGE_SIZE.to_string()),
                ("cursor", cursor.to_string()),
            ],
        }
    }

    /// `None` for an empty id list: there is nothing to ask for.
    fn lookup_users(user_ids: &[u64]) -> Option<Self> {
        if user_ids.is_empty() {
            return None;
        }
        let joined = user_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        Some(Self {
            method: Method::POST,
            path: "users/lookup.json",
            params: vec![("user_id", joined)],
        })
    }
}

pub struct TwitterClient {
    client: reqwest::Client,
    credentials: Credentials,
}

impl TwitterClient {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
        }
    }

    /// Resolve a screen name (handle) to its numeric user id.
    pub async fn resolve_screen_name(&self, screen_name: &str) -> Result<u64> {
        let users: Vec<TwitterUser> = self
            .send(ApiRequest::resolve_screen_name(screen_name))
            .await?;
        let user = users
            .into_iter()
            .next()
            .ok_or_else(|| TwitterError::NotFound(format!("screen name {screen_name}")))?;
        tracing::debug!(screen_name, user_id = user.id, "Resolved screen name");
        Ok(user.id)
    }

    /// Fetch one page of the ids `user_id` follows.
    ///
    /// Start with cursor -1; a returned `next_cursor` of 0 means the list is complete.
    pub async fn friend_ids(&self, user_id: u64, cursor: i64) -> Result<FriendIdsResponse> {
        self.send(ApiRequest::friend_ids(user_id, cursor)).await
    }

    /// Bulk-fetch user objects. The API caps this at 100 ids per call; the
    /// caller is responsible for batching.
    pub async fn lookup_users(&self, user_ids: &[u64]) -> Result<Vec<TwitterUser>> {
        match ApiRequest::lookup_users(user_ids) {
            Some(req) => self.send(req).await,
            None => Ok(Vec::new()),
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: ApiRequest) -> Result<T> {
        let url = format!("{}/{}", BASE_URL, req.path);
        let params = req.param_refs();
        let auth = self
            .credentials
            .authorization_header(req.method.as_str(), &url, &params);
        let encoded = oauth::encode_pairs(&params);

        let builder = if req.method == Method::POST {
            self.client
                .post(&url)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(encoded)
        } else if encoded.is_empty() {
            self.client.request(req.method.clone(), &url)
        } else {
            self.client
                .request(req.method.clone(), format!("{url}?{encoded}"))
        };

        let resp = builder.header(AUTHORIZATION, auth).send().await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(error_for_status(status, &body));
    }
    let body = resp.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// A 401 only means "protected account" when it carries the bare
/// `{"error": ...}` body. Coded 401s (32, 89, 135, ...) are about our own
/// credentials and say nothing about the target account.
fn error_for_status(status: StatusCode, body: &str) -> TwitterError {
    let envelope = ErrorEnvelope::parse(body);
    let message = ErrorEnvelope::describe(body);
    match status {
        StatusCode::UNAUTHORIZED if envelope.error.is_some() && !envelope.has_code() => {
            TwitterError::Unauthorized(message)
        }
        StatusCode::UNAUTHORIZED => TwitterError::Credentials(message),
        StatusCode::NOT_FOUND => TwitterError::NotFound(message),
        _ => TwitterError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(req: &'a ApiRequest, key: &str) -> Option<&'a str> {
        req.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn protected_account_maps_to_unauthorized() {
        let err = error_for_status(
            StatusCode::UNAUTHORIZED,
            r#"{"request":"/1.1/friends/ids.json","error":"Not authorized."}"#,
        );
        assert!(err.is_unauthorized());
    }

    #[test]
    fn expired_token_is_a_credentials_error() {
        let err = error_for_status(
            StatusCode::UNAUTHORIZED,
            r#"{"errors":[{"code":89,"message":"Invalid or expired token."}]}"#,
        );
        assert!(!err.is_unauthorized());
        assert!(matches!(err, TwitterError::Credentials(ref m) if m == "Invalid or expired token. (code 89)"));
    }

    #[test]
    fn failed_authentication_and_clock_skew_are_credentials_errors() {
        for code in [32, 135] {
            let body = format!(r#"{{"errors":[{{"code":{code},"message":"x"}}]}}"#);
            let err = error_for_status(StatusCode::UNAUTHORIZED, &body);
            assert!(matches!(err, TwitterError::Credentials(_)), "code {code}: {err}");
        }
    }

    #[test]
    fn unparseable_401_is_not_treated_as_protected() {
        let err = error_for_status(StatusCode::UNAUTHORIZED, "<html>401</html>");
        assert!(matches!(err, TwitterError::Credentials(_)));
    }

    #[test]
    fn rate_limit_is_a_plain_api_error() {
        let err = error_for_status(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"errors":[{"code":88,"message":"Rate limit exceeded"}]}"#,
        );
        match err {
            TwitterError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Rate limit exceeded (code 88)");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn friend_ids_requests_a_full_page_at_the_cursor() {
        let req = ApiRequest::friend_ids(221_902_776, -1);
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.path, "friends/ids.json");
        assert_eq!(param(&req, "user_id"), Some("221902776"));
        assert_eq!(param(&req, "count"), Some("5000"));
        assert_eq!(param(&req, "cursor"), Some("-1"));

        let next = ApiRequest::friend_ids(7, 1_500_000_000_001);
        assert_eq!(param(&next, "cursor"), Some("1500000000001"));
    }

    #[test]
    fn lookup_users_posts_comma_joined_ids() {
        let req = ApiRequest::lookup_users(&[2, 3, 5]).unwrap();
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.path, "users/lookup.json");
        assert_eq!(req.params, vec![("user_id", "2,3,5".to_string())]);
        assert_eq!(oauth::encode_pairs(&req.param_refs()), "user_id=2%2C3%2C5");
    }

    #[test]
    fn lookup_users_with_no_ids_builds_no_request() {
        assert!(ApiRequest::lookup_users(&[]).is_none());
    }

    #[tokio::test]
    async fn lookup_users_with_no_ids_short_circuits() {
        let client = TwitterClient::new(Credentials::new("k", "s", "", ""));
        assert!(client.lookup_users(&[]).await.unwrap().is_empty());
    }

    #[test]
    fn resolve_screen_name_queries_by_handle() {
        let req = ApiRequest::resolve_screen_name("wefreema");
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.path, "users/lookup.json");
        assert_eq!(param(&req, "screen_name"), Some("wefreema"));
    }
}
