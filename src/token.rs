//! Bearer token claims decoding. The token is treated as opaque-but-decodable:
//! the claims segment is parsed so the frontend can route by role, and the
//! signature segment is never examined. This is a deliberate trust boundary:
//! role claims steer UX routing only, and the backend must re-authorize every
//! privileged operation on its own.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Authorization tier carried in the token's `role` claim.
///
/// The claim string is mapped totally onto this closed enum; values outside it
/// are a [`DecodeError::UnknownRole`], never an unmatched role at a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

impl Role {
    /// The wire spelling used in claims and registration payloads.
    pub fn as_claim(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }

    /// Maps a claim string onto the enum, tolerating case and whitespace.
    pub fn from_claim(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "student" => Some(Role::Student),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Claims payload read from the token's middle segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject email of the authenticated account.
    pub sub: String,
    pub role: Role,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl Claims {
    /// True once the expiry has passed. Callers that want proactive logout can
    /// poll this; the guard itself leaves stale-bearer rejection to the
    /// backend.
    pub fn is_expired(&self, now_unix_seconds: i64) -> bool {
        self.exp <= now_unix_seconds
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid claims json")]
    Json,
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

/// Raw claims as they appear on the wire, before role mapping.
#[derive(Deserialize)]
struct RawClaims {
    sub: String,
    role: String,
    iat: i64,
    exp: i64,
}

/// Decode the claims segment of a three-part bearer token.
///
/// # Errors
///
/// Returns an error if the token does not have exactly three dot-separated
/// segments, the middle segment is not base64url, the payload is not the
/// expected JSON shape, or the role claim is outside the closed [`Role`] set.
/// The signature segment is ignored by design.
pub fn decode(token: &str) -> Result<Claims, DecodeError> {
    let mut parts = token.split('.');
    let _header = parts.next().ok_or(DecodeError::TokenFormat)?;
    let claims_b64 = parts.next().ok_or(DecodeError::TokenFormat)?;
    let _signature = parts.next().ok_or(DecodeError::TokenFormat)?;
    if parts.next().is_some() {
        return Err(DecodeError::TokenFormat);
    }

    // Issuers differ on padding; strip it so both spellings decode.
    let claims_b64 = claims_b64.trim_end_matches('=');
    let bytes = Base64UrlUnpadded::decode_vec(claims_b64).map_err(|_| DecodeError::Base64)?;
    let raw: RawClaims = serde_json::from_slice(&bytes).map_err(|_| DecodeError::Json)?;

    let role = Role::from_claim(&raw.role).ok_or_else(|| DecodeError::UnknownRole(raw.role))?;

    Ok(Claims {
        sub: raw.sub,
        role,
        iat: raw.iat,
        exp: raw.exp,
    })
}
