//! Registration, OTP verification, and login flows against the identity
//! backend. `AuthClient` owns the HTTP plumbing, the session store, and the
//! OTP attempt limiter, so flows stay consistent and every session mutation is
//! traceable to one place. Passwords and the admin enrollment key arrive as
//! `SecretString` and are exposed only while the request payload is built.

use crate::api::Http;
use crate::config::PortalConfig;
use crate::errors::AuthError;
use crate::guard::{AccessGuard, Route};
use crate::limit::{AttemptDecision, OtpLimiter, OtpPurpose, WindowedLimiter};
use crate::session::SessionStore;
use crate::token::{self, Claims, Role};
use crate::types::{LoginRequest, LoginResponse, RegisterRequest, VerifyOtpRequest};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::debug;

/// Form input for the Registration Flow.
#[derive(Debug)]
pub struct NewAccount {
    pub email: String,
    pub password: SecretString,
    pub department: String,
    pub role: Role,
    /// Required when `role` is `Admin`. The value is verified only by the
    /// backend, which holds the real secret.
    pub admin_key: Option<SecretString>,
}

/// Flow-state handoff from registration to OTP verification. Held in memory
/// only; abandoning the flow loses it and the user restarts at registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingVerification {
    pub email: String,
}

impl PendingVerification {
    pub async fn verify(&self, client: &AuthClient, code: &str) -> Result<OtpOutcome, AuthError> {
        client.verify_registration(&self.email, code).await
    }
}

/// Result of submitting an OTP code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OtpOutcome {
    Verified,
    /// The code did not match the active challenge; reason is the backend's,
    /// verbatim.
    Invalid { reason: String },
    /// The challenge's expiry has passed; every code value is rejected,
    /// including the originally correct one.
    Expired,
}

/// Successful login: the token is already in the session store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginOutcome {
    pub claims: Claims,
    pub landing: Route,
}

/// Client for the portal's identity endpoints.
pub struct AuthClient {
    http: Http,
    session: Arc<SessionStore>,
    limiter: Arc<dyn OtpLimiter>,
}

impl AuthClient {
    /// Builds a client with the default windowed OTP attempt limiter.
    pub fn new(config: &PortalConfig) -> Result<Self, AuthError> {
        Self::with_limiter(config, Arc::new(WindowedLimiter::default()))
    }

    pub fn with_limiter(
        config: &PortalConfig,
        limiter: Arc<dyn OtpLimiter>,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            http: Http::new(config)?,
            session: Arc::new(SessionStore::new()),
            limiter,
        })
    }

    /// The owning session store; share this handle with guards and logout UI.
    pub fn session(&self) -> Arc<SessionStore> {
        Arc::clone(&self.session)
    }

    /// An access guard bound to this client's session store.
    pub fn guard(&self) -> AccessGuard {
        AccessGuard::new(self.session())
    }

    /// Creates an unverified account and triggers the registration OTP.
    ///
    /// Validation failures are returned before any request is sent. On
    /// success the backend emails a code and the returned
    /// [`PendingVerification`] carries the email to the verification step.
    pub async fn register(&self, account: &NewAccount) -> Result<PendingVerification, AuthError> {
        let email = normalize_email(&account.email);
        validate_email(&email)?;
        if account.password.expose_secret().trim().is_empty() {
            return Err(AuthError::Validation("Password is required.".to_string()));
        }
        if account.department.trim().is_empty() {
            return Err(AuthError::Validation("Department is required.".to_string()));
        }

        let admin_key = match (account.role, &account.admin_key) {
            (Role::Admin, Some(key)) if !key.expose_secret().trim().is_empty() => {
                Some(key.expose_secret().to_string())
            }
            (Role::Admin, _) => {
                return Err(AuthError::Validation(
                    "Admin secret key is required for admin accounts.".to_string(),
                ));
            }
            (Role::Student, _) => None,
        };

        let request = RegisterRequest {
            email: email.clone(),
            password: account.password.expose_secret().to_string(),
            role: account.role,
            department: account.department.trim().to_string(),
            admin_key,
        };

        self.http
            .post_json("/auth/register", &request, self.bearer().as_deref())
            .await?;

        debug!("registration accepted, awaiting OTP verification");
        Ok(PendingVerification { email })
    }

    /// Submits the registration OTP, flipping the account to verified.
    pub async fn verify_registration(
        &self,
        email: &str,
        code: &str,
    ) -> Result<OtpOutcome, AuthError> {
        self.submit_otp(
            "/auth/verify-otp",
            email,
            code,
            OtpPurpose::Registration,
        )
        .await
    }

    /// Exchanges credentials for a session token, stores it, and resolves the
    /// landing area from the role claim.
    ///
    /// A token that does not decode right after login is handled like any
    /// other codec failure: the store is cleared and the caller returns to
    /// login rather than proceeding with an unknown role.
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<LoginOutcome, AuthError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        if password.expose_secret().trim().is_empty() {
            return Err(AuthError::Validation("Password is required.".to_string()));
        }

        let request = LoginRequest {
            email,
            password: password.expose_secret().to_string(),
        };

        let response: LoginResponse = self
            .http
            .post_json_response("/auth/login", &request, self.bearer().as_deref())
            .await?;

        self.session.set(response.access_token.clone());

        let claims = match token::decode(&response.access_token) {
            Ok(claims) => claims,
            Err(err) => {
                self.session.clear();
                return Err(AuthError::Decode(err));
            }
        };

        let landing = Route::landing(claims.role);
        debug!(landing = landing.path(), "login complete");
        Ok(LoginOutcome { claims, landing })
    }

    /// Drops the session. Purely client-side; the bearer simply stops being
    /// presented.
    pub fn logout(&self) {
        self.session.clear();
    }

    /// Validated, limiter-gated OTP submission for the registration challenge.
    pub(crate) async fn submit_otp(
        &self,
        path: &str,
        email: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<OtpOutcome, AuthError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        if code.trim().is_empty() {
            return Err(AuthError::Validation("Enter the OTP code.".to_string()));
        }

        if let AttemptDecision::Limited { retry_after_secs } = self.limiter.check(&email, purpose)
        {
            return Err(AuthError::AttemptsExhausted { retry_after_secs });
        }

        let request = VerifyOtpRequest {
            email: email.clone(),
            otp: code.trim().to_string(),
        };

        match self
            .http
            .post_json(path, &request, self.bearer().as_deref())
            .await
        {
            Ok(()) => {
                self.limiter.record_success(&email, purpose);
                Ok(OtpOutcome::Verified)
            }
            Err(AuthError::Rejected { status, reason }) if status < 500 => {
                match classify_otp_rejection(&reason) {
                    OtpRejection::Expired => Ok(OtpOutcome::Expired),
                    OtpRejection::Invalid { reason } => {
                        // Only wrong guesses feed the limiter; an expired
                        // challenge needs a new code, not a lockout.
                        self.limiter.record_failure(&email, purpose);
                        Ok(OtpOutcome::Invalid { reason })
                    }
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Raw `/auth/verify-reset-otp` and `/auth/reset-password` plumbing lives
    /// in [`crate::reset`]; it reaches the transport through this.
    pub(crate) fn http(&self) -> &Http {
        &self.http
    }

    pub(crate) fn bearer(&self) -> Option<String> {
        self.session.get()
    }

    pub(crate) fn limiter(&self) -> &Arc<dyn OtpLimiter> {
        &self.limiter
    }
}

/// Normalize an email for payloads and limiter keys.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Email must be present and look like an address before anything is sent.
pub(crate) fn validate_email(email_normalized: &str) -> Result<(), AuthError> {
    if email_normalized.is_empty() {
        return Err(AuthError::Validation("Email is required.".to_string()));
    }
    let well_formed = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
        .is_ok_and(|regex| regex.is_match(email_normalized));
    if well_formed {
        Ok(())
    } else {
        Err(AuthError::Validation(
            "Enter a valid email address.".to_string(),
        ))
    }
}

/// A 4xx OTP rejection, split into the two meanings the flows distinguish.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum OtpRejection {
    Invalid { reason: String },
    Expired,
}

/// Classifies a 4xx OTP rejection. The wire contract carries only a
/// human-readable reason, so expiry is recognized by its wording.
pub(crate) fn classify_otp_rejection(reason: &str) -> OtpRejection {
    if reason.to_lowercase().contains("expired") {
        OtpRejection::Expired
    } else {
        OtpRejection::Invalid {
            reason: reason.to_string(),
        }
    }
}
