//! Crate-wide error taxonomy for auth flows. Validation failures never reach
//! the network; server rejections carry the backend's reason verbatim; network
//! failures stay generic so transport details never leak into user-facing
//! copy.

use crate::token::DecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// A required field is missing or malformed. Raised before any request is
    /// sent.
    #[error("{0}")]
    Validation(String),

    /// The backend answered with a non-2xx status and a human-readable reason.
    #[error("request failed ({status}): {reason}")]
    Rejected { status: u16, reason: String },

    /// No response was received. The message is intentionally generic.
    #[error("unable to reach the server: {0}")]
    Network(String),

    /// The transport timed out waiting for a response.
    #[error("request timed out, please try again")]
    Timeout,

    /// The session token could not be decoded. The only error with an
    /// automatic corrective action: the session is cleared and the caller is
    /// redirected to login.
    #[error("session token is unreadable: {0}")]
    Decode(#[from] DecodeError),

    /// The client-side OTP attempt limit was hit; no request was sent.
    #[error("too many attempts, retry in {retry_after_secs}s")]
    AttemptsExhausted { retry_after_secs: u64 },
}

impl AuthError {
    /// True when the failure invalidates the session itself rather than the
    /// single attempt.
    pub fn invalidates_session(&self) -> bool {
        matches!(self, AuthError::Decode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::DecodeError;

    #[test]
    fn rejected_displays_status_and_reason() {
        let err = AuthError::Rejected {
            status: 403,
            reason: "Invalid admin secret key".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "request failed (403): Invalid admin secret key"
        );
    }

    #[test]
    fn only_decode_invalidates_session() {
        assert!(AuthError::Decode(DecodeError::TokenFormat).invalidates_session());
        assert!(!AuthError::Timeout.invalidates_session());
        assert!(!AuthError::Validation("Email is required.".to_string()).invalidates_session());
        assert!(!AuthError::Rejected {
            status: 401,
            reason: "Invalid password".to_string(),
        }
        .invalidates_session());
    }
}
