//! Admin directory collaborator.
//!
//! Account CRUD, approval workflows and password storage belong to the wider
//! admin backend; this layer only needs to verify a login, change a role and
//! delete an account. The trait keeps that seam explicit, the Postgres
//! implementation is a thin adapter over the `admins` table.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

use crate::error::{AuthError, AuthResult};
use crate::models::{Principal, Role};
use crate::security::password;

#[async_trait]
pub trait AdminDirectory: Send + Sync {
    /// Verify email/password and return the principal on success.
    async fn verify_credentials(&self, email: &str, password: &str) -> AuthResult<Principal>;

    /// Change an admin's role. The caller invalidates the admin's sessions.
    async fn assign_role(&self, email: &str, role: Role) -> AuthResult<()>;

    /// Delete an admin account. The caller invalidates the admin's sessions.
    async fn remove(&self, email: &str) -> AuthResult<()>;
}

pub struct PgAdminDirectory {
    pool: PgPool,
}

#[derive(FromRow)]
struct AdminRow {
    email: String,
    password_hash: String,
    role: String,
}

impl PgAdminDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminDirectory for PgAdminDirectory {
    async fn verify_credentials(&self, email: &str, candidate: &str) -> AuthResult<Principal> {
        let row = sqlx::query_as::<_, AdminRow>(
            r#"
            SELECT email, password_hash, role
            FROM admins
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        // Unknown email and wrong password are indistinguishable to the client
        let row = row.ok_or(AuthError::InvalidCredentials)?;
        password::verify_password(candidate, &row.password_hash)?;

        let role = Role::from_str(&row.role)
            .map_err(|e| AuthError::Internal(format!("corrupt role in directory: {e}")))?;

        Ok(Principal {
            email: row.email,
            role,
        })
    }

    async fn assign_role(&self, email: &str, role: Role) -> AuthResult<()> {
        let result = sqlx::query("UPDATE admins SET role = $2 WHERE email = $1")
            .bind(email)
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::AdminNotFound);
        }
        tracing::info!(email = %email, role = %role, "admin role changed");
        Ok(())
    }

    async fn remove(&self, email: &str) -> AuthResult<()> {
        let result = sqlx::query("DELETE FROM admins WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::AdminNotFound);
        }
        tracing::info!(email = %email, "admin deleted");
        Ok(())
    }
}
