//! Session context carrying the authenticated user and token.

use std::fmt;

use chrono::{DateTime, Utc};

use quartermaster_core::AppError;
use quartermaster_core::config::auth::AuthConfig;
use quartermaster_core::types::id::UserId;
use quartermaster_entity::user::{Permission, UserRole};

/// Who the client is acting as.
///
/// Resolved once at login and passed into every service call and into the
/// live channel, so that each operation knows which token to send and which
/// role checks apply.
#[derive(Clone)]
pub struct SessionContext {
    /// Bearer token issued by the backend.
    pub token: String,
    /// The logged-in user's ID.
    pub user_id: UserId,
    /// The user's role.
    pub role: UserRole,
    /// Display name.
    pub username: String,
    /// When this context was created.
    pub started_at: DateTime<Utc>,
}

impl SessionContext {
    /// Creates a new session context.
    pub fn new(
        token: impl Into<String>,
        user_id: UserId,
        role: UserRole,
        username: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            user_id,
            role,
            username: username.into(),
            started_at: Utc::now(),
        }
    }

    /// Builds a context from configured credentials.
    ///
    /// A missing or blank token or user id yields `AuthRequired`. The role
    /// defaults to unit leader, the least privileged role.
    pub fn from_config(auth: &AuthConfig) -> Result<Self, AppError> {
        let token = auth
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::auth_required("No session token configured"))?;

        let user_id = auth
            .user_id
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| AppError::auth_required("No user configured for the session"))?
            .parse::<UserId>()?;

        let role = match auth.role.as_deref() {
            Some(role) => role.parse()?,
            None => UserRole::UnitLeader,
        };

        let username = auth
            .username
            .clone()
            .unwrap_or_else(|| format!("user-{user_id}"));

        Ok(Self::new(token, user_id, role, username))
    }

    /// Returns whether the context carries a usable token.
    pub fn is_authenticated(&self) -> bool {
        !self.token.trim().is_empty()
    }

    /// Fails with `AuthRequired` unless the context carries a usable token.
    pub fn ensure_authenticated(&self) -> Result<(), AppError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(AppError::auth_required("Session token is empty"))
        }
    }

    /// Fails unless the user is authenticated and the role holds `permission`.
    pub fn require(&self, permission: Permission) -> Result<(), AppError> {
        self.ensure_authenticated()?;
        self.role.require(permission)
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("role", &self.role)
            .field("username", &self.username)
            .field("started_at", &self.started_at)
            .finish()
    }
}
