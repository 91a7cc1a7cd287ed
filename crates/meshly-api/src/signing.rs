// Request signing for the CloudMesh REST API.
//
// Every signed call carries an auth string `key=...,timestamp=...,nonce=...`
// in the `Authorization` header, and an HMAC-SHA256 signature over
// `auth_string + path [+ json_body]` (hex-encoded, keyed by the shared
// secret) in the `Signature` header. The nonce is a fresh random
// alphanumeric token per request so a captured signature cannot be replayed.

use hmac::{Hmac, Mac};
use rand::{Rng, distributions::Alphanumeric};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Default nonce length in characters.
pub const DEFAULT_NONCE_LEN: usize = 32;

/// Return a randomly-generated alphanumeric string of the given length.
pub fn make_nonce(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// The two header values a signed request must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSignature {
    /// `Authorization` header value: `key=...,timestamp=...,nonce=...`
    pub auth: String,
    /// `Signature` header value: hex-encoded HMAC-SHA256.
    pub signature: String,
}

/// Sign a request deterministically from its parts.
///
/// The timestamp and nonce are parameters (rather than sampled here) so the
/// scheme is testable; [`sign_now`] is the production entry point.
pub fn sign_request(
    key: &str,
    secret: &SecretString,
    timestamp: i64,
    nonce: &str,
    path: &str,
    json_body: Option<&str>,
) -> RequestSignature {
    let auth = format!("key={key},timestamp={timestamp},nonce={nonce}");

    let mut payload = String::with_capacity(auth.len() + path.len());
    payload.push_str(&auth);
    payload.push_str(path);
    if let Some(body) = json_body {
        payload.push_str(body);
    }

    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    RequestSignature { auth, signature }
}

/// Sign a request with the current unix time and a fresh nonce.
pub fn sign_now(
    key: &str,
    secret: &SecretString,
    path: &str,
    json_body: Option<&str>,
) -> RequestSignature {
    sign_request(
        key,
        secret,
        chrono::Utc::now().timestamp(),
        &make_nonce(DEFAULT_NONCE_LEN),
        path,
        json_body,
    )
}
