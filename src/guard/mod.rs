use serde::Serialize;

use crate::access::{AccessGate, AdminPermission};
use crate::session::{SessionError, SessionProvider, SessionUser};

/// Where denied requests are sent. The route layer performs the actual
/// navigation; the guard only decides.
pub const SIGN_IN_REDIRECT: &str = "/auth/signin?callbackUrl=/admin";
pub const UNAUTHORIZED_REDIRECT: &str = "/dashboard?error=unauthorized";
pub const INSUFFICIENT_PERMISSIONS_REDIRECT: &str = "/dashboard?error=insufficient_permissions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    NotAuthenticated,
    NotAdmin,
    InsufficientPermissions,
}

/// Outcome of an admin route check. Denial is a value, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Authorized(SessionUser),
    RedirectTo { path: String, reason: DenyReason },
}

impl AccessDecision {
    fn deny(reason: DenyReason) -> Self {
        let path = match reason {
            DenyReason::NotAuthenticated => SIGN_IN_REDIRECT,
            DenyReason::NotAdmin => UNAUTHORIZED_REDIRECT,
            DenyReason::InsufficientPermissions => INSUFFICIENT_PERMISSIONS_REDIRECT,
        };
        AccessDecision::RedirectTo {
            path: path.to_string(),
            reason,
        }
    }
}

/// Non-redirecting check result for machine-readable endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct AdminCheck {
    pub is_admin: bool,
    pub user: Option<SessionUser>,
}

/// Route protection over [`AccessGate`]. Fetches the session once per call
/// and resolves to a decision; only a session-provider failure is an `Err`.
#[derive(Debug, Clone)]
pub struct AdminGuard {
    gate: AccessGate,
}

impl AdminGuard {
    pub fn new(gate: AccessGate) -> Self {
        Self { gate }
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    /// Admin page guard: unauthenticated users go to sign-in, non-admins to
    /// the dashboard with an unauthorized marker.
    pub async fn require_admin_access<P: SessionProvider>(
        &self,
        provider: &P,
    ) -> Result<AccessDecision, SessionError> {
        let Some(user) = provider.session().await? else {
            return Ok(AccessDecision::deny(DenyReason::NotAuthenticated));
        };

        if !self.gate.is_admin(user.email.as_deref()) {
            tracing::debug!(email = ?user.email, "admin access denied");
            return Ok(AccessDecision::deny(DenyReason::NotAdmin));
        }

        Ok(AccessDecision::Authorized(user))
    }

    /// Permission-specific guard. With the flat policy this only diverges
    /// from [`Self::require_admin_access`] in the redirect it picks.
    pub async fn require_admin_permission<P: SessionProvider>(
        &self,
        provider: &P,
        permission: AdminPermission,
    ) -> Result<AccessDecision, SessionError> {
        let Some(user) = provider.session().await? else {
            return Ok(AccessDecision::deny(DenyReason::NotAuthenticated));
        };

        if !self.gate.has_permission(user.email.as_deref(), permission) {
            return Ok(AccessDecision::deny(DenyReason::InsufficientPermissions));
        }

        Ok(AccessDecision::Authorized(user))
    }

    /// Decision without redirect semantics, for JSON endpoints.
    pub async fn check_admin_access<P: SessionProvider>(
        &self,
        provider: &P,
    ) -> Result<AdminCheck, SessionError> {
        let Some(user) = provider.session().await? else {
            return Ok(AdminCheck {
                is_admin: false,
                user: None,
            });
        };

        let is_admin = self.gate.is_admin(user.email.as_deref());
        Ok(AdminCheck {
            is_admin,
            user: Some(user),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use uuid::Uuid;

    struct StaticSession(Option<SessionUser>);

    #[async_trait]
    impl SessionProvider for StaticSession {
        async fn session(&self) -> Result<Option<SessionUser>, SessionError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSession;

    #[async_trait]
    impl SessionProvider for FailingSession {
        async fn session(&self) -> Result<Option<SessionUser>, SessionError> {
            Err(SessionError::SecretMissing)
        }
    }

    fn guard() -> AdminGuard {
        AdminGuard::new(AccessGate::new(vec!["admin@example.com".to_string()]))
    }

    fn user(email: &str) -> SessionUser {
        SessionUser {
            id: Some(Uuid::new_v4()),
            email: Some(email.to_string()),
            name: None,
        }
    }

    #[tokio::test]
    async fn unauthenticated_redirects_to_sign_in() {
        let decision = guard()
            .require_admin_access(&StaticSession(None))
            .await
            .unwrap();

        assert_eq!(
            decision,
            AccessDecision::RedirectTo {
                path: SIGN_IN_REDIRECT.to_string(),
                reason: DenyReason::NotAuthenticated,
            }
        );
    }

    #[tokio::test]
    async fn non_admin_redirects_to_dashboard() {
        let decision = guard()
            .require_admin_access(&StaticSession(Some(user("other@example.com"))))
            .await
            .unwrap();

        match decision {
            AccessDecision::RedirectTo { path, reason } => {
                assert_eq!(path, UNAUTHORIZED_REDIRECT);
                assert_eq!(reason, DenyReason::NotAdmin);
            }
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn admin_is_authorized() {
        let admin = user("Admin@Example.com");
        let decision = guard()
            .require_admin_access(&StaticSession(Some(admin.clone())))
            .await
            .unwrap();

        assert_eq!(decision, AccessDecision::Authorized(admin));
    }

    #[tokio::test]
    async fn permission_check_redirects_non_admin() {
        let decision = guard()
            .require_admin_permission(
                &StaticSession(Some(user("other@example.com"))),
                AdminPermission::DeleteUsers,
            )
            .await
            .unwrap();

        match decision {
            AccessDecision::RedirectTo { path, reason } => {
                assert_eq!(path, INSUFFICIENT_PERMISSIONS_REDIRECT);
                assert_eq!(reason, DenyReason::InsufficientPermissions);
            }
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn permission_check_authorizes_admin_for_every_permission() {
        let guard = guard();
        for permission in AdminPermission::ALL {
            let decision = guard
                .require_admin_permission(
                    &StaticSession(Some(user("admin@example.com"))),
                    *permission,
                )
                .await
                .unwrap();
            assert!(matches!(decision, AccessDecision::Authorized(_)));
        }
    }

    #[tokio::test]
    async fn check_admin_access_without_user() {
        let check = guard()
            .check_admin_access(&StaticSession(None))
            .await
            .unwrap();

        assert!(!check.is_admin);
        assert!(check.user.is_none());
    }

    #[tokio::test]
    async fn check_admin_access_echoes_non_admin_user() {
        let check = guard()
            .check_admin_access(&StaticSession(Some(user("other@example.com"))))
            .await
            .unwrap();

        assert!(!check.is_admin);
        assert_eq!(
            check.user.unwrap().email.as_deref(),
            Some("other@example.com")
        );
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        assert!(guard().require_admin_access(&FailingSession).await.is_err());
        assert!(guard().check_admin_access(&FailingSession).await.is_err());
    }
}
