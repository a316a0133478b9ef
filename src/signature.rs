//! Slack request signing.
//!
//! See <https://api.slack.com/authentication/verifying-requests-from-slack>.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Maximum allowed distance, in seconds, between the request timestamp and now.
pub const REPLAY_WINDOW_SECS: i64 = 300;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Returns true only if `signature` is the `v0=` HMAC-SHA256 of
/// `v0:{timestamp}:{raw_body}` under `secret` and `timestamp` lies within
/// [`REPLAY_WINDOW_SECS`] of `now`.
pub fn verify(raw_body: &str, signature: &str, timestamp: &str, secret: &[u8], now: i64) -> bool {
    let ts: i64 = match timestamp.parse() {
        Ok(ts) => ts,
        Err(_) => return false,
    };
    if now.abs_diff(ts) > REPLAY_WINDOW_SECS.unsigned_abs() {
        return false;
    }

    let expected = match sign(raw_body, timestamp, secret) {
        Some(expected) => expected,
        None => return false,
    };
    constant_time_eq(expected.as_bytes(), signature.as_bytes())
}

/// Computes the `v0=` signature Slack would send for this body and timestamp.
pub fn sign(raw_body: &str, timestamp: &str, secret: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(format!("v0:{}:{}", timestamp, raw_body).as_bytes());
    Some(format!("v0={}", hex::encode(mac.finalize().into_bytes())))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
