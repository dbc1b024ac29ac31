//! Two-legged OAuth 1.0 with the PLAINTEXT signature method.
//!
//! Schoology accepts a consumer key and secret with an empty token, so there
//! is no request signing beyond concatenating the escaped secrets.

use chrono::Utc;
use scal_core::config::Credentials;

/// `Authorization` header value for one request.
pub fn authorization_header(credentials: &Credentials) -> String {
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    let timestamp = Utc::now().timestamp();
    header_with(credentials, &nonce, timestamp)
}

fn header_with(credentials: &Credentials, nonce: &str, timestamp: i64) -> String {
    // consumer_secret & token_secret, where the token secret is empty
    let signature = format!("{}&", urlencoding::encode(&credentials.secret));

    format!(
        "OAuth realm=\"Schoology API\", \
         oauth_consumer_key=\"{}\", \
         oauth_token=\"\", \
         oauth_nonce=\"{nonce}\", \
         oauth_timestamp=\"{timestamp}\", \
         oauth_signature_method=\"PLAINTEXT\", \
         oauth_version=\"1.0\", \
         oauth_signature=\"{}\"",
        urlencoding::encode(&credentials.key),
        urlencoding::encode(&signature),
    )
}
