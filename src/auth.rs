//! Request token signing.

use crate::models::Credentials;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Builds an `x-api-token` value for the given wall-clock second.
///
/// The token is `"<timestamp>.<hex hmac>"`, where the HMAC-SHA256 is keyed with the
/// API secret and covers exactly `"<timestamp>:<api_key>"`. The server checks freshness,
/// so a token must be built per request rather than reused.
pub fn create_token(api_key: &str, api_secret: &str, timestamp: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(api_secret.as_bytes())
        .expect("HMAC-SHA256 accepts keys of any length");
    mac.update(format!("{timestamp}:{api_key}").as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("{timestamp}.{signature}")
}

/// Builds a token for `credentials` stamped with the current time.
pub fn create_token_now(credentials: &Credentials) -> String {
    create_token(
        &credentials.api_key,
        &credentials.api_secret,
        chrono::Utc::now().timestamp(),
    )
}
