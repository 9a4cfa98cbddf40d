//! Best-effort display name derived from an access token.
//!
//! The token payload is decoded without verification, so the result is only a
//! greeting hint. Authorization is always decided by the service.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value;

/// Name shown when the token carries nothing usable.
pub const DEFAULT_DISPLAY_NAME: &str = "User";

/// Extract `email`, then `username`, from a JWT payload; falls back to `User`.
#[must_use]
pub fn display_name_hint(token: &str) -> String {
    decode_claims(token)
        .and_then(|claims| {
            ["email", "username"].into_iter().find_map(|key| {
                claims
                    .get(key)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string())
}

fn decode_claims(token: &str) -> Option<Value> {
    let payload = token.trim().split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(value) if value.is_object() => Some(value),
        Ok(_) => None,
        Err(err) => {
            tracing::debug!(error = %err, "access token payload is not JSON");
            None
        }
    }
}
