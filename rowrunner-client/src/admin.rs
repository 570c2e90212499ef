//! Runner account provisioning

use crate::backend::{AuthBackend, AuthUser, Backend, Query, Table, decode_rows};
use serde_json::json;
use shared::error::{AppResult, ErrorCode};
use shared::models::{Role, RunnerProfile, UserRoleWithProfile};
use shared::validation::{FieldErrors, is_valid_email, is_valid_password, sanitize_email, sanitize_text};
use std::sync::Arc;

/// New runner account
#[derive(Debug, Clone, Default)]
pub struct NewRunner {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub struct AdminService {
    backend: Arc<dyn Backend>,
    auth: Arc<dyn AuthBackend>,
}

impl AdminService {
    pub fn new(backend: Arc<dyn Backend>, auth: Arc<dyn AuthBackend>) -> Self {
        Self { backend, auth }
    }

    /// Create a confirmed account and give it the runner role
    pub async fn create_runner(&self, form: &NewRunner) -> AppResult<AuthUser> {
        let email = sanitize_email(&form.email);
        let mut errors = FieldErrors::new();
        errors.check(is_valid_email(&email), "email", "Enter a valid email");
        errors.check(!form.name.trim().is_empty(), "name", "Name is required");
        errors.check_as(
            is_valid_password(&form.password),
            ErrorCode::PasswordTooWeak,
            "password",
            "Min 8 chars with 1 number",
        );
        errors.into_result(ErrorCode::ValidationFailed)?;

        let user = self
            .auth
            .admin_create_user(&email, &form.password, &sanitize_text(&form.name))
            .await?;
        self.backend
            .insert(
                Table::UserRoles,
                vec![json!({ "user_id": user.id, "role": Role::Runner.as_str() })],
            )
            .await?;

        tracing::info!(user_id = %user.id, %email, "Runner account created");
        Ok(user)
    }

    /// Every runner with profile email and name
    pub async fn list_runners(&self) -> AppResult<Vec<RunnerProfile>> {
        let rows = self
            .backend
            .select(
                Query::table(Table::UserRoles)
                    .select("user_id, profiles(email, full_name)")
                    .eq("role", Role::Runner.as_str()),
            )
            .await?;
        let rows: Vec<UserRoleWithProfile> = decode_rows(rows)?;
        Ok(rows.into_iter().map(RunnerProfile::from).collect())
    }
}
