//! Signed session tokens.
//!
//! Compact three-segment tokens in the JWT style, but issued and verified by
//! hand: `base64url(header) . base64url(payload) . base64url(hmac-sha256)`,
//! all base64url without padding. The header is always
//! `{"alg":"HS256","typ":"TOK"}`. The payload is the caller's claims plus
//! `iat` and `exp` in Unix seconds.
//!
//! Issuing is deterministic: claims are carried in a `serde_json::Map`,
//! which serializes with sorted keys, so the same claims at the same instant
//! with the same secret always produce the same bytes.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Claims carried in a token payload. Sorted-key map so encoding is canonical.
pub type Claims = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Not three dot-separated segments, or a segment that does not decode
    /// to the expected JSON.
    #[error("malformed token")]
    Malformed,

    /// Recomputed signature does not match the supplied third segment.
    #[error("invalid token signature")]
    BadSignature,

    /// `exp` is in the past.
    #[error("token expired")]
    Expired,
}

/// Fixed token header. Field order matters: it is part of the wire format.
#[derive(Serialize)]
struct Header {
    alg: &'static str,
    typ: &'static str,
}

const HEADER: Header = Header {
    alg: "HS256",
    typ: "TOK",
};

/// Issues and verifies signed session tokens with a shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    secret: Vec<u8>,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    /// Issue a token for `claims` expiring `ttl_seconds` from now.
    pub fn issue(&self, claims: &Claims, ttl_seconds: i64) -> String {
        self.issue_at(claims, ttl_seconds, chrono::Utc::now().timestamp())
    }

    /// Issue a token as of the explicit instant `now` (Unix seconds).
    ///
    /// Split out from [`issue`](Self::issue) so expiry behavior is testable
    /// without sleeping.
    pub fn issue_at(&self, claims: &Claims, ttl_seconds: i64, now: i64) -> String {
        let mut payload = claims.clone();
        payload.insert("iat".to_string(), now.into());
        payload.insert("exp".to_string(), (now + ttl_seconds).into());

        let header_json =
            serde_json::to_vec(&HEADER).expect("static header always serializes");
        let payload_json =
            serde_json::to_vec(&payload).expect("string-keyed JSON map always serializes");

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(payload_json)
        );

        let signature = self.sign(signing_input.as_bytes());
        format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature))
    }

    /// Verify a token and return its claims (including `iat` and `exp`).
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    /// Verify a token as of the explicit instant `now` (Unix seconds).
    ///
    /// The signature is checked before the payload is decoded, so a tampered
    /// token is always reported as [`TokenError::BadSignature`] rather than
    /// whatever decoding error the tampering happens to cause.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(TokenError::Malformed);
        }

        let signing_input = format!("{}.{}", parts[0], parts[1]);
        let expected = URL_SAFE_NO_PAD.encode(self.sign(signing_input.as_bytes()));
        if expected != parts[2] {
            return Err(TokenError::BadSignature);
        }

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(parts[1])
            .map_err(|_| TokenError::Malformed)?;
        let payload: serde_json::Value =
            serde_json::from_slice(&payload_bytes).map_err(|_| TokenError::Malformed)?;
        let claims = payload.as_object().ok_or(TokenError::Malformed)?.clone();

        if let Some(exp) = claims.get("exp").and_then(|v| v.as_i64()) {
            if exp < now {
                return Err(TokenError::Expired);
            }
        }

        Ok(claims)
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}
