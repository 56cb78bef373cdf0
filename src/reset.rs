//! Password Reset Flow as a typed two-step machine: request a reset code,
//! verify it, then submit the new password. Each state is only obtainable from
//! the previous one, so entering the final step without a verified challenge
//! is unrepresentable; there is no email-in-the-URL shortcut to guard
//! against. The flow runs independently of any active session.

use crate::client::{
    classify_otp_rejection, normalize_email, validate_email, AuthClient, OtpRejection,
};
use crate::errors::AuthError;
use crate::guard::Route;
use crate::limit::{AttemptDecision, OtpPurpose};
use crate::types::{ForgotPasswordRequest, ResetPasswordRequest, VerifyOtpRequest, VerifyResetOtpResponse};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

/// Entry point of the Password Reset Flow.
pub struct ResetFlow;

impl ResetFlow {
    /// Asks the backend to issue a reset code. Issuing supersedes any earlier
    /// outstanding reset challenge for the same email.
    pub async fn request(client: &AuthClient, email: &str) -> Result<ResetRequested, AuthError> {
        let email = normalize_email(email);
        validate_email(&email)?;

        let request = ForgotPasswordRequest {
            email: email.clone(),
        };
        client
            .http()
            .post_json("/auth/forgot-password", &request, client.bearer().as_deref())
            .await?;

        debug!("reset code requested");
        Ok(ResetRequested { email })
    }
}

/// A reset code has been requested; waiting for the user to enter it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResetRequested {
    email: String,
}

/// Outcome of a reset-code submission. `Invalid` and `Expired` leave the
/// machine in the requested state so the user can resubmit or re-request.
#[derive(Debug)]
pub enum ResetVerify {
    Authorized(ResetAuthorized),
    Invalid { reason: String },
    Expired,
}

impl ResetRequested {
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Validates the code against the active reset challenge.
    pub async fn verify(&self, client: &AuthClient, code: &str) -> Result<ResetVerify, AuthError> {
        if code.trim().is_empty() {
            return Err(AuthError::Validation("Enter the OTP code.".to_string()));
        }

        if let AttemptDecision::Limited { retry_after_secs } = client
            .limiter()
            .check(&self.email, OtpPurpose::PasswordReset)
        {
            return Err(AuthError::AttemptsExhausted { retry_after_secs });
        }

        let request = VerifyOtpRequest {
            email: self.email.clone(),
            otp: code.trim().to_string(),
        };

        let response: Result<VerifyResetOtpResponse, AuthError> = client
            .http()
            .post_json_response("/auth/verify-reset-otp", &request, client.bearer().as_deref())
            .await;

        match response {
            Ok(body) => {
                client
                    .limiter()
                    .record_success(&self.email, OtpPurpose::PasswordReset);
                if body.reset_token.is_none() {
                    // Without a server-issued authorization token, knowing the
                    // email is the only thing gating the final reset step.
                    warn!("backend issued no reset authorization token");
                }
                Ok(ResetVerify::Authorized(ResetAuthorized {
                    email: self.email.clone(),
                    reset_token: body.reset_token,
                }))
            }
            Err(AuthError::Rejected { status, reason }) if status < 500 => {
                match classify_otp_rejection(&reason) {
                    OtpRejection::Expired => Ok(ResetVerify::Expired),
                    OtpRejection::Invalid { reason } => {
                        client
                            .limiter()
                            .record_failure(&self.email, OtpPurpose::PasswordReset);
                        Ok(ResetVerify::Invalid { reason })
                    }
                }
            }
            Err(err) => Err(err),
        }
    }
}

/// The reset challenge was verified; one password change is authorized.
#[derive(Debug)]
pub struct ResetAuthorized {
    email: String,
    reset_token: Option<String>,
}

impl ResetAuthorized {
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Finalizes the credential change, consuming the authorization. The
    /// outstanding challenge is invalidated by the backend; the caller
    /// returns to the login entry point.
    pub async fn finish(
        self,
        client: &AuthClient,
        new_password: &SecretString,
    ) -> Result<Route, AuthError> {
        if new_password.expose_secret().trim().is_empty() {
            return Err(AuthError::Validation("Password is required.".to_string()));
        }

        let request = ResetPasswordRequest {
            email: self.email,
            new_password: new_password.expose_secret().to_string(),
            reset_token: self.reset_token,
        };
        client
            .http()
            .post_json("/auth/reset-password", &request, client.bearer().as_deref())
            .await?;

        debug!("password reset complete");
        Ok(Route::Login)
    }
}
