//! Sign-in, sign-up and role-gated entry points
//!
//! Every successful sign-in stores the session, persists it and hands the
//! access token to the backend. Runner and admin sign-in additionally
//! require the matching `user_roles` row; without it the fresh session is
//! signed out again and the caller gets a forced-sign-out error.

use crate::backend::{AuthBackend, AuthSession, Backend, Query, Table};
use crate::error::ClientResult;
use crate::session::{SessionManager, SessionState};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::Role;
use shared::validation::{FieldErrors, is_valid_email, is_valid_password, sanitize_email};
use std::sync::Arc;

pub const RUNNER_ACCESS_DENIED: &str = "Access denied. Runner accounts only.";
pub const ADMIN_ACCESS_DENIED: &str = "Access denied — not an admin account";

/// Customer sign-up form
#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

pub struct AuthService {
    backend: Arc<dyn Backend>,
    auth: Arc<dyn AuthBackend>,
    session: Arc<SessionManager>,
}

impl AuthService {
    pub fn new(
        backend: Arc<dyn Backend>,
        auth: Arc<dyn AuthBackend>,
        session: Arc<SessionManager>,
    ) -> Self {
        Self {
            backend,
            auth,
            session,
        }
    }

    // ========== Customer ==========

    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<SessionState> {
        let email = sanitize_email(email);
        let mut errors = FieldErrors::new();
        errors.check(is_valid_email(&email), "email", "Enter a valid email address");
        errors.check_as(
            is_valid_password(password),
            ErrorCode::PasswordTooWeak,
            "password",
            "Min 8 characters with at least 1 number",
        );
        errors.into_result(ErrorCode::ValidationFailed)?;

        let auth = self.auth.sign_in_with_password(&email, password).await?;
        self.establish(auth, Role::Customer).await
    }

    /// Create a customer account. `Ok(None)` when the account still has to
    /// be confirmed before a session is issued.
    pub async fn sign_up(&self, form: &SignUpForm) -> AppResult<Option<SessionState>> {
        let email = sanitize_email(&form.email);
        let name = form.name.trim();
        let mut errors = FieldErrors::new();
        errors.check(is_valid_email(&email), "email", "Enter a valid email address");
        errors.check_as(
            is_valid_password(&form.password),
            ErrorCode::PasswordTooWeak,
            "password",
            "Min 8 characters with at least 1 number",
        );
        errors.check(!name.is_empty(), "name", "Name is required");
        errors.check_as(
            form.password == form.confirm_password,
            ErrorCode::PasswordMismatch,
            "confirm_password",
            "Passwords do not match",
        );
        errors.into_result(ErrorCode::ValidationFailed)?;

        match self.auth.sign_up(&email, &form.password, name).await? {
            Some(auth) => Ok(Some(self.establish(auth, Role::Customer).await?)),
            None => {
                tracing::info!(%email, "Sign-up pending confirmation");
                Ok(None)
            }
        }
    }

    /// Browse and order without an account.
    ///
    /// Any persisted session is removed so a later `restore` stays a guest.
    pub async fn continue_as_guest(&self) -> AppResult<SessionState> {
        self.backend.set_access_token(None);
        self.session.clear().await?;
        self.session.set_guest();
        Ok(self.session.snapshot())
    }

    // ========== Runner / Admin ==========

    pub async fn sign_in_runner(&self, email: &str, password: &str) -> AppResult<SessionState> {
        let email = sanitize_email(email);
        let mut errors = FieldErrors::new();
        errors.check(is_valid_email(&email), "email", "Enter a valid email address");
        errors.check_as(
            !password.is_empty(),
            ErrorCode::RequiredField,
            "password",
            "Password is required",
        );
        errors.into_result(ErrorCode::ValidationFailed)?;

        let auth = self.auth.sign_in_with_password(&email, password).await?;
        self.gate(auth, Role::Runner, ErrorCode::RoleRequired, RUNNER_ACCESS_DENIED)
            .await
    }

    pub async fn sign_in_admin(&self, email: &str, password: &str) -> AppResult<SessionState> {
        let email = sanitize_email(email);
        if !is_valid_email(&email) {
            return Err(AppError::validation("Invalid email").with_detail("email", "Invalid email"));
        }
        if !is_valid_password(password) {
            return Err(AppError::validation("Invalid password")
                .with_detail("password", "Invalid password"));
        }

        let auth = self.auth.sign_in_with_password(&email, password).await?;
        self.gate(auth, Role::Admin, ErrorCode::AdminRequired, ADMIN_ACCESS_DENIED)
            .await
    }

    // ========== Session lifecycle ==========

    /// End the session. The remote sign-out is best effort; local state is
    /// always cleared.
    pub async fn sign_out(&self) -> AppResult<()> {
        if let Some(token) = self.session.access_token()
            && let Err(e) = self.auth.sign_out(&token).await
        {
            tracing::warn!(error = %e, "Remote sign-out failed");
        }
        self.backend.set_access_token(None);
        self.session.clear().await?;
        tracing::info!("Signed out");
        Ok(())
    }

    /// Resume the persisted session, refreshing it when expired.
    ///
    /// A session that cannot be refreshed is discarded and `None` returned.
    pub async fn restore(&self) -> AppResult<Option<SessionState>> {
        let Some(stored) = self.session.load().await? else {
            return Ok(None);
        };

        let auth = if stored.auth.is_expired() {
            match self.auth.refresh_session(&stored.auth.refresh_token).await {
                Ok(auth) => auth,
                Err(e) => {
                    tracing::warn!(error = %e, "Stored session could not be refreshed");
                    self.session.clear().await?;
                    return Ok(None);
                }
            }
        } else {
            stored.auth
        };

        let state = self.establish(auth, stored.role).await?;
        tracing::info!(role = %state.role, "Session restored");
        Ok(Some(state))
    }

    // ========== Internals ==========

    async fn establish(&self, auth: AuthSession, role: Role) -> AppResult<SessionState> {
        self.backend.set_access_token(Some(auth.access_token.clone()));
        let user_id = auth.user.id.clone();
        self.session.establish(auth, role).await?;
        tracing::info!(%user_id, %role, "Signed in");
        Ok(self.session.snapshot())
    }

    /// Keep `auth` only if the user holds `role`
    async fn gate(
        &self,
        auth: AuthSession,
        role: Role,
        code: ErrorCode,
        denied: &str,
    ) -> AppResult<SessionState> {
        self.backend.set_access_token(Some(auth.access_token.clone()));
        let allowed = match has_role(self.backend.as_ref(), &auth.user.id, role).await {
            Ok(allowed) => allowed,
            Err(e) => {
                tracing::warn!(user_id = %auth.user.id, error = %e, "Role lookup failed");
                false
            }
        };

        if !allowed {
            tracing::warn!(user_id = %auth.user.id, %role, "Role gate denied sign-in");
            if let Err(e) = self.auth.sign_out(&auth.access_token).await {
                tracing::warn!(error = %e, "Sign-out after denied sign-in failed");
            }
            self.backend.set_access_token(None);
            self.session.clear().await?;
            return Err(AppError::with_message(code, denied));
        }

        self.establish(auth, role).await
    }
}

/// Whether `user_id` has a `user_roles` row for `role`
pub async fn has_role(backend: &dyn Backend, user_id: &str, role: Role) -> ClientResult<bool> {
    let rows = backend
        .select(
            Query::table(Table::UserRoles)
                .select("role")
                .eq("user_id", user_id)
                .eq("role", role.as_str())
                .limit(1),
        )
        .await?;
    Ok(!rows.is_empty())
}
