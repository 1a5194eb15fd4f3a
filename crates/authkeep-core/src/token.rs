//! Local bearer-token inspection.
//!
//! Tokens are treated as opaque strings everywhere else; this module is the
//! one place that peeks inside. It expects the compact three-part form
//! (`header.payload.signature`) with a base64url JSON payload carrying a
//! numeric `exp` in Unix seconds. Nothing here verifies signatures — the
//! result is an optimistic local reading, not a security boundary.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

/// Outcome of inspecting a token's payload.
///
/// Collapsed to a boolean at the store boundary; kept tri-state here so
/// callers can tell an expired credential (refresh it) from a mangled one
/// (re-login).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    /// Payload decoded and `exp` is in the future.
    Valid,
    /// Payload decoded but `exp` has passed.
    Expired,
    /// Not a three-part token, or the payload failed to decode.
    Malformed,
}

impl TokenStatus {
    /// Returns true only for [`TokenStatus::Valid`].
    pub fn is_valid(self) -> bool {
        matches!(self, TokenStatus::Valid)
    }
}

/// Claims subset this module cares about. Unknown claims are ignored.
#[derive(Debug, Deserialize)]
struct Claims {
    /// Expiry timestamp in Unix seconds (integer or fractional).
    exp: f64,
}

/// Current Unix time in seconds.
///
/// A clock before the epoch reads as infinity so every token evaluates as
/// expired rather than valid.
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(f64::INFINITY)
}

/// Inspects a token against the current wall clock.
pub fn evaluate(token: &str) -> TokenStatus {
    evaluate_at(token, now_secs())
}

/// Inspects a token against an explicit clock reading.
///
/// Any structural failure (wrong segment count, bad base64, bad JSON,
/// missing or non-numeric `exp`) reads as [`TokenStatus::Malformed`];
/// this never errors or panics.
pub fn evaluate_at(token: &str, now_secs: f64) -> TokenStatus {
    match decode_claims(token) {
        Some(claims) if claims.exp > now_secs => TokenStatus::Valid,
        Some(_) => TokenStatus::Expired,
        None => TokenStatus::Malformed,
    }
}

/// Returns the decoded `exp` (Unix seconds) if the payload parses.
pub fn expiry(token: &str) -> Option<f64> {
    decode_claims(token).map(|claims| claims.exp)
}

/// Returns a masked version of a token for display (first 12 chars + ...).
pub fn mask(token: &str) -> String {
    if token.chars().count() <= 16 {
        return "***".to_string();
    }
    let prefix: String = token.chars().take(12).collect();
    format!("{prefix}...")
}

fn decode_claims(token: &str) -> Option<Claims> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    let decoded = URL_SAFE_NO_PAD.decode(parts[1]).ok()?;
    serde_json::from_slice(&decoded).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a three-part token around the given JSON payload.
    fn forge(payload: &serde_json::Value) -> String {
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("header.{body}.signature")
    }

    /// Test: future `exp` evaluates as valid.
    #[test]
    fn test_future_exp_is_valid() {
        let token = forge(&serde_json::json!({ "exp": 2_000_000_000 }));
        assert_eq!(evaluate_at(&token, 1_000_000_000.0), TokenStatus::Valid);
    }

    /// Test: past `exp` evaluates as expired.
    #[test]
    fn test_past_exp_is_expired() {
        let token = forge(&serde_json::json!({ "exp": 1_000_000_000 }));
        assert_eq!(evaluate_at(&token, 2_000_000_000.0), TokenStatus::Expired);
    }

    /// Test: `exp` equal to the clock is already expired (strict compare).
    #[test]
    fn test_exp_at_now_is_expired() {
        let token = forge(&serde_json::json!({ "exp": 1_000_000_000 }));
        assert_eq!(evaluate_at(&token, 1_000_000_000.0), TokenStatus::Expired);
    }

    /// Test: fractional `exp` values are accepted.
    #[test]
    fn test_fractional_exp_accepted() {
        let token = forge(&serde_json::json!({ "exp": 1_000_000_000.5 }));
        assert_eq!(evaluate_at(&token, 1_000_000_000.0), TokenStatus::Valid);
        assert_eq!(evaluate_at(&token, 1_000_000_001.0), TokenStatus::Expired);
    }

    /// Test: extra claims alongside `exp` are ignored.
    #[test]
    fn test_extra_claims_ignored() {
        let token = forge(&serde_json::json!({
            "sub": "u1",
            "iat": 1_000_000_000,
            "exp": 2_000_000_000,
        }));
        assert_eq!(evaluate_at(&token, 1_000_000_000.0), TokenStatus::Valid);
    }

    /// Test: a string with no `.` separators is malformed.
    #[test]
    fn test_no_separators_is_malformed() {
        assert_eq!(evaluate_at("opaque", 0.0), TokenStatus::Malformed);
        assert_eq!(evaluate_at("", 0.0), TokenStatus::Malformed);
    }

    /// Test: wrong segment counts are malformed.
    #[test]
    fn test_wrong_segment_count_is_malformed() {
        assert_eq!(evaluate_at("a.b", 0.0), TokenStatus::Malformed);
        assert_eq!(evaluate_at("a.b.c.d", 0.0), TokenStatus::Malformed);
    }

    /// Test: a middle segment that is not base64 is malformed.
    #[test]
    fn test_invalid_base64_is_malformed() {
        assert_eq!(evaluate_at("a.!!!.c", 0.0), TokenStatus::Malformed);
    }

    /// Test: a decoded payload that is not JSON is malformed.
    #[test]
    fn test_invalid_json_is_malformed() {
        let body = URL_SAFE_NO_PAD.encode("not json");
        let token = format!("a.{body}.c");
        assert_eq!(evaluate_at(&token, 0.0), TokenStatus::Malformed);
    }

    /// Test: a payload without `exp` (or with a non-numeric one) is malformed.
    #[test]
    fn test_missing_or_bad_exp_is_malformed() {
        let no_exp = forge(&serde_json::json!({ "sub": "u1" }));
        assert_eq!(evaluate_at(&no_exp, 0.0), TokenStatus::Malformed);

        let string_exp = forge(&serde_json::json!({ "exp": "tomorrow" }));
        assert_eq!(evaluate_at(&string_exp, 0.0), TokenStatus::Malformed);
    }

    /// Test: expiry extraction.
    #[test]
    fn test_expiry_extraction() {
        let token = forge(&serde_json::json!({ "exp": 1_234_567_890 }));
        assert_eq!(expiry(&token), Some(1_234_567_890.0));
        assert_eq!(expiry("garbage"), None);
    }

    /// Test: token masking.
    #[test]
    fn test_mask_token() {
        assert_eq!(mask("sk-ant-oat-long-token-here"), "sk-ant-oat-l...");
        assert_eq!(mask("short"), "***");
    }

    /// Test: is_valid helper collapses correctly.
    #[test]
    fn test_status_is_valid() {
        assert!(TokenStatus::Valid.is_valid());
        assert!(!TokenStatus::Expired.is_valid());
        assert!(!TokenStatus::Malformed.is_valid());
    }
}
