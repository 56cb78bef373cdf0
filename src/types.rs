//! Request and response payloads for the auth endpoints. These shapes are the
//! compatibility contract with the identity backend; field names must not
//! drift. Credential-bearing payloads are built at send time from
//! `SecretString` inputs and dropped immediately after, and must never be
//! logged.

use crate::token::Role;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_key: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Success body of `/auth/verify-reset-otp`. Backends that close the
/// reset-authorization gap return a short-lived `reset_token` here; older
/// ones return only a message.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct VerifyResetOtpResponse {
    #[serde(default)]
    pub reset_token: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub new_password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}
