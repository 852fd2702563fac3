//! OAuth 1.0a request signing (HMAC-SHA1), as required by the v1.1 REST API.
//!
//! Only the "signed request" half of the protocol lives here. The three-legged
//! token handshake is done out of band: callers hand in an access-token pair
//! they already hold, or none at all for application-only requests.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::distr::Alphanumeric;
use rand::Rng;
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

const NONCE_LEN: usize = 32;

/// Consumer credentials plus the optional access-token pair.
#[derive(Clone)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"***")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"***")
            .finish()
    }
}

impl Credentials {
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            access_token: access_token.into(),
            access_token_secret: access_token_secret.into(),
        }
    }

    /// Build the `Authorization` header value for a request.
    ///
    /// `params` are the request's query-string or form parameters, unencoded.
    pub fn authorization_header(&self, method: &str, url: &str, params: &[(&str, &str)]) -> String {
        let nonce: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        self.authorization_header_with(method, url, params, &nonce, &timestamp)
    }

    pub(crate) fn authorization_header_with(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> String {
        let mut oauth_params: Vec<(&str, &str)> = vec![
            ("oauth_consumer_key", self.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp),
            ("oauth_version", "1.0"),
        ];
        if !self.access_token.is_empty() {
            oauth_params.push(("oauth_token", self.access_token.as_str()));
        }

        let mut all: Vec<(&str, &str)> = params.to_vec();
        all.extend(oauth_params.iter().copied());
        let base = signature_base_string(method, url, &all);
        let signature = self.sign(&base);

        let mut header: Vec<String> = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect();
        header.push(format!("oauth_signature=\"{}\"", encode(&signature)));
        header.sort();
        format!("OAuth {}", header.join(", "))
    }

    fn sign(&self, base: &str) -> String {
        let key = format!(
            "{}&{}",
            encode(&self.consumer_secret),
            encode(&self.access_token_secret)
        );
        let mut mac =
            HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
        mac.update(base.as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }
}

/// RFC 3986 percent-encoding: everything but `A-Z a-z 0-9 - . _ ~`.
pub fn encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// `METHOD&encoded-url&encoded-sorted-params`.
pub(crate) fn signature_base_string(method: &str, url: &str, params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    encoded.sort();
    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(url),
        encode(&param_string)
    )
}

/// Encode parameters as `k=v&k=v` for a query string or form body.
pub(crate) fn encode_pairs(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(token: &str) -> Credentials {
        Credentials::new("ckey", "csecret", token, "tsecret")
    }

    #[test]
    fn encode_leaves_unreserved_characters() {
        assert_eq!(encode("abcXYZ019-._~"), "abcXYZ019-._~");
        assert_eq!(encode("Ladies + Gentlemen"), "Ladies%20%2B%20Gentlemen");
        assert_eq!(encode("1,2,3"), "1%2C2%2C3");
    }

    #[test]
    fn base_string_sorts_and_double_encodes_parameters() {
        let base = signature_base_string(
            "get",
            "https://api.twitter.com/1.1/friends/ids.json",
            &[("user_id", "7"), ("cursor", "-1"), ("count", "5000")],
        );
        assert_eq!(
            base,
            "GET&https%3A%2F%2Fapi.twitter.com%2F1.1%2Ffriends%2Fids.json&count%3D5000%26cursor%3D-1%26user_id%3D7"
        );
    }

    #[test]
    fn header_is_deterministic_for_fixed_nonce_and_timestamp() {
        let c = creds("token");
        let a = c.authorization_header_with("GET", "https://x/y", &[("a", "1")], "n", "1");
        let b = c.authorization_header_with("GET", "https://x/y", &[("a", "1")], "n", "1");
        assert_eq!(a, b);
        assert!(a.starts_with("OAuth "));
        assert!(a.contains("oauth_token=\"token\""));
        assert!(a.contains("oauth_signature_method=\"HMAC-SHA1\""));
        assert!(a.contains("oauth_signature=\""));
    }

    #[test]
    fn signature_changes_with_parameters() {
        let c = creds("token");
        let a = c.authorization_header_with("GET", "https://x/y", &[("a", "1")], "n", "1");
        let b = c.authorization_header_with("GET", "https://x/y", &[("a", "2")], "n", "1");
        assert_ne!(a, b);
    }

    #[test]
    fn empty_access_token_is_omitted() {
        let header = creds("").authorization_header("GET", "https://x/y", &[]);
        assert!(!header.contains("oauth_token="));
        assert!(header.contains("oauth_consumer_key=\"ckey\""));
    }

    #[test]
    fn debug_masks_secrets() {
        let shown = format!("{:?}", creds("token"));
        assert!(!shown.contains("csecret"));
        assert!(!shown.contains("tsecret"));
    }

    #[test]
    fn pairs_are_percent_encoded() {
        assert_eq!(encode_pairs(&[("user_id", "1,2"), ("x", "a b")]), "user_id=1%2C2&x=a%20b");
    }
}
