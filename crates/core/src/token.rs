//! Client-side session token expiry check.
//!
//! The backend issues a JWT at login. The storefront never verifies the
//! signature (the backend does that on every call); it only reads the `exp`
//! claim so an expired session is dropped before a request is wasted on it.

use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    exp: Option<i64>,
}

/// Outcome of decoding a token's claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenExpiry {
    /// The token carries an `exp` claim.
    At(DateTime<Utc>),
    /// The token decodes but has no `exp` claim.
    Never,
    /// The token is not a decodable JWT.
    Malformed,
}

/// Decode the `exp` claim without verifying the signature.
///
/// Padded base64 segments are accepted; `=` never appears in a JWT otherwise.
#[must_use]
pub fn expiry(token: &str) -> TokenExpiry {
    let token = token.replace('=', "");

    let Ok(header) = decode_header(&token) else {
        return TokenExpiry::Malformed;
    };

    // Claims only: no signature, no registered-claim checks
    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let Ok(data) = decode::<Claims>(&token, &DecodingKey::from_secret(&[]), &validation) else {
        return TokenExpiry::Malformed;
    };

    match data.claims.exp {
        None => TokenExpiry::Never,
        Some(exp) => {
            DateTime::from_timestamp(exp, 0).map_or(TokenExpiry::Malformed, TokenExpiry::At)
        }
    }
}

/// Whether a session holding `token` should be treated as logged out at
/// `now`. Malformed tokens count as expired.
#[must_use]
pub fn is_expired(token: &str, now: DateTime<Utc>) -> bool {
    match expiry(token) {
        TokenExpiry::At(exp) => exp <= now,
        TokenExpiry::Never => false,
        TokenExpiry::Malformed => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};

    fn token_with_payload(payload: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload);
        format!("{header}.{body}.signature")
    }

    fn at(ts: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(ts, 0).unwrap_or_default()
    }

    #[test]
    fn test_past_exp_is_expired() {
        let token = token_with_payload(r#"{"id":"u1","exp":1000}"#);
        assert!(is_expired(&token, at(2000)));
        assert!(is_expired(&token, at(1000)));
    }

    #[test]
    fn test_future_exp_is_valid() {
        let token = token_with_payload(r#"{"id":"u1","exp":5000}"#);
        assert!(!is_expired(&token, at(2000)));
        assert_eq!(expiry(&token), TokenExpiry::At(at(5000)));
    }

    #[test]
    fn test_missing_exp_never_expires() {
        let token = token_with_payload(r#"{"id":"u1"}"#);
        assert_eq!(expiry(&token), TokenExpiry::Never);
        assert!(!is_expired(&token, at(i64::from(i32::MAX))));
    }

    #[test]
    fn test_padded_payload_is_accepted() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256"}"#);
        // 13 bytes, so the standard encoding ends in "==".
        let body = URL_SAFE.encode(r#"{"exp": 5000}"#);
        assert!(body.ends_with('='));
        let token = format!("{header}.{body}.sig");
        assert_eq!(expiry(&token), TokenExpiry::At(at(5000)));
    }

    #[test]
    fn test_malformed_tokens_are_expired() {
        assert!(is_expired("", at(0)));
        assert!(is_expired("not-a-jwt", at(0)));
        assert!(is_expired("a.b.c.d", at(0)));
        assert!(is_expired("a.!!!.c", at(0)));
        assert!(is_expired(&token_with_payload("not json"), at(0)));
    }

    #[test]
    fn test_unreadable_header_is_malformed() {
        let payload = URL_SAFE_NO_PAD.encode(r#"{"exp":5000}"#);
        assert_eq!(expiry(&format!("garbage.{payload}.x")), TokenExpiry::Malformed);

        let no_alg = URL_SAFE_NO_PAD.encode(r#"{"typ":"JWT"}"#);
        assert_eq!(expiry(&format!("{no_alg}.{payload}.x")), TokenExpiry::Malformed);
    }

    #[test]
    fn test_audience_and_issuer_claims_are_ignored() {
        let token = token_with_payload(r#"{"aud":"storefront","iss":"api","exp":5000}"#);
        assert_eq!(expiry(&token), TokenExpiry::At(at(5000)));
    }
}
