//! Navigation gating for protected routes. The guard is synchronous, does no
//! I/O, and runs on every attempted navigation to a protected route. It is a
//! UX-only gate; real access control lives on the API.
//!
//! Two failure modes are deliberately asymmetric: a token that no longer
//! decodes makes the session itself unusable, so the store is cleared; a role
//! mismatch means the session is valid but insufficient for this resource, so
//! the token is retained.

use crate::session::SessionStore;
use crate::token::{self, Claims, Role};
use std::sync::Arc;
use tracing::debug;

/// Portal route table. Public entry points carry no role requirement; the two
/// protected areas name their permitted roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    VerifyOtp,
    ForgotPassword,
    VerifyResetOtp,
    ResetPassword,
    Chat,
    Admin,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::VerifyOtp => "/verify-otp",
            Route::ForgotPassword => "/forgot-password",
            Route::VerifyResetOtp => "/verify-reset-otp",
            Route::ResetPassword => "/reset-password",
            Route::Chat => "/chat",
            Route::Admin => "/admin",
        }
    }

    /// Roles permitted on this route; empty means public.
    pub fn allowed_roles(self) -> &'static [Role] {
        match self {
            Route::Chat => &[Role::Student, Role::Admin],
            Route::Admin => &[Role::Admin],
            _ => &[],
        }
    }

    /// Landing area after a successful login.
    pub fn landing(role: Role) -> Self {
        match role {
            Role::Admin => Route::Admin,
            Role::Student => Route::Chat,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No token is present; the user has not logged in.
    NoSession,
    /// The token no longer decodes; the session was cleared.
    InvalidToken,
    /// The session is valid but the role is not permitted on this route.
    RoleMismatch,
}

impl DenyReason {
    /// Where to send the user after a denial.
    pub fn redirect(self) -> Route {
        Route::Login
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Granted { claims: Claims },
    Denied { reason: DenyReason },
}

impl Access {
    pub fn is_granted(&self) -> bool {
        matches!(self, Access::Granted { .. })
    }
}

/// Decision function gating protected-route navigation.
pub struct AccessGuard {
    session: Arc<SessionStore>,
}

impl AccessGuard {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    /// Evaluates the current session against a set of permitted roles.
    ///
    /// An empty `allowed_roles` slice is public-route semantics: any decodable
    /// session passes. Decode failures clear the session store before denying.
    pub fn evaluate(&self, allowed_roles: &[Role]) -> Access {
        let Some(token) = self.session.get() else {
            return Access::Denied {
                reason: DenyReason::NoSession,
            };
        };

        let claims = match token::decode(&token) {
            Ok(claims) => claims,
            Err(err) => {
                debug!("session token no longer decodes: {err}");
                self.session.clear();
                return Access::Denied {
                    reason: DenyReason::InvalidToken,
                };
            }
        };

        if allowed_roles.is_empty() || allowed_roles.contains(&claims.role) {
            Access::Granted { claims }
        } else {
            // Token retained: insufficient for this route, valid elsewhere.
            Access::Denied {
                reason: DenyReason::RoleMismatch,
            }
        }
    }

    /// Evaluates against a route's static policy.
    pub fn evaluate_route(&self, route: Route) -> Access {
        self.evaluate(route.allowed_roles())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64ct::{Base64UrlUnpadded, Encoding};
    use serde_json::json;

    fn store_with_role(role: &str) -> Arc<SessionStore> {
        let claims = json!({
            "sub": "a@x.com",
            "role": role,
            "iat": 1_700_000_000,
            "exp": 1_700_003_600,
        });
        let payload = Base64UrlUnpadded::encode_string(claims.to_string().as_bytes());
        let store = Arc::new(SessionStore::new());
        store.set(format!("header.{payload}.sig"));
        store
    }

    #[test]
    fn denies_without_session() {
        let guard = AccessGuard::new(Arc::new(SessionStore::new()));
        assert_eq!(
            guard.evaluate(&[Role::Student]),
            Access::Denied {
                reason: DenyReason::NoSession
            }
        );
    }

    #[test]
    fn undecodable_token_clears_session() {
        let store = Arc::new(SessionStore::new());
        store.set("not-a-token".to_string());
        let guard = AccessGuard::new(Arc::clone(&store));

        assert_eq!(
            guard.evaluate(&[Role::Student]),
            Access::Denied {
                reason: DenyReason::InvalidToken
            }
        );
        assert!(!store.is_present());
    }

    #[test]
    fn unknown_role_claim_clears_session() {
        let store = store_with_role("superuser");
        let guard = AccessGuard::new(Arc::clone(&store));

        assert_eq!(
            guard.evaluate(&[Role::Admin]),
            Access::Denied {
                reason: DenyReason::InvalidToken
            }
        );
        assert!(!store.is_present());
    }

    #[test]
    fn student_allowed_on_shared_route() {
        let guard = AccessGuard::new(store_with_role("student"));
        assert!(guard.evaluate(&[Role::Student, Role::Admin]).is_granted());
    }

    #[test]
    fn role_mismatch_denies_but_retains_token() {
        let store = store_with_role("student");
        let before = store.get();
        let guard = AccessGuard::new(Arc::clone(&store));

        assert_eq!(
            guard.evaluate(&[Role::Admin]),
            Access::Denied {
                reason: DenyReason::RoleMismatch
            }
        );
        assert_eq!(store.get(), before);
    }

    #[test]
    fn empty_role_set_is_public() {
        let guard = AccessGuard::new(store_with_role("student"));
        assert!(guard.evaluate(&[]).is_granted());
    }

    #[test]
    fn route_policy_matches_table() {
        assert_eq!(Route::Chat.allowed_roles(), &[Role::Student, Role::Admin]);
        assert_eq!(Route::Admin.allowed_roles(), &[Role::Admin]);
        assert!(Route::Login.allowed_roles().is_empty());

        let guard = AccessGuard::new(store_with_role("admin"));
        assert!(guard.evaluate_route(Route::Admin).is_granted());
        assert!(guard.evaluate_route(Route::Chat).is_granted());
    }

    #[test]
    fn landing_routes_by_role() {
        assert_eq!(Route::landing(Role::Admin), Route::Admin);
        assert_eq!(Route::landing(Role::Student), Route::Chat);
    }

    #[test]
    fn denial_redirects_to_login() {
        assert_eq!(DenyReason::RoleMismatch.redirect(), Route::Login);
        assert_eq!(DenyReason::NoSession.redirect().path(), "/login");
    }
}
