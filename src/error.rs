use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Malformed credential")]
    MalformedCredential,

    #[error("Credential expired")]
    ExpiredCredential,

    #[error("Credential revoked")]
    RevokedCredential,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Insufficient role")]
    InsufficientRole,

    #[error("Rate limit exceeded")]
    RateLimitExceeded { retry_after_secs: u64 },

    #[error("IP temporarily blocked")]
    IpBlocked { retry_after_secs: u64 },

    #[error("Concurrent session limit reached")]
    SessionLimitExceeded,

    #[error("Admin not found")]
    AdminNotFound,

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type AuthResult<T> = std::result::Result<T, AuthError>;

impl AuthError {
    /// Stable machine-readable code surfaced in every rejection body.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::MalformedCredential => "malformed_credential",
            AuthError::ExpiredCredential => "expired_credential",
            AuthError::RevokedCredential => "revoked_credential",
            AuthError::SessionNotFound => "session_not_found",
            AuthError::InsufficientRole => "insufficient_role",
            AuthError::RateLimitExceeded { .. } => "rate_limit_exceeded",
            AuthError::IpBlocked { .. } => "ip_blocked",
            AuthError::SessionLimitExceeded => "session_limit_exceeded",
            AuthError::AdminNotFound => "admin_not_found",
            AuthError::StoreUnavailable(_) => "store_unavailable",
            AuthError::Database(_) => "database_error",
            AuthError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials
            | AuthError::MalformedCredential
            | AuthError::ExpiredCredential
            | AuthError::RevokedCredential
            | AuthError::SessionNotFound => StatusCode::UNAUTHORIZED,
            // 403 for both wrong-role and blocked-IP, matching the original filter
            AuthError::InsufficientRole | AuthError::IpBlocked { .. } => StatusCode::FORBIDDEN,
            AuthError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            AuthError::SessionLimitExceeded => StatusCode::CONFLICT,
            AuthError::AdminNotFound => StatusCode::NOT_FOUND,
            AuthError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            AuthError::RateLimitExceeded { retry_after_secs }
            | AuthError::IpBlocked { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }

    /// Message safe to show to clients. Internal detail stays in the logs.
    fn public_message(&self) -> String {
        match self {
            AuthError::StoreUnavailable(_) => "Service temporarily unavailable".to_string(),
            AuthError::Database(_) | AuthError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        }

        let mut body = json!({
            "error": self.code(),
            "message": self.public_message(),
            "status": status.as_u16(),
        });
        if let Some(secs) = self.retry_after_secs() {
            body["retry_after_secs"] = json!(secs);
        }

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = self.retry_after_secs() {
            if let Ok(value) = secs.to_string().parse() {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AuthError::AdminNotFound,
            other => AuthError::Database(other.to_string()),
        }
    }
}

impl From<redis::RedisError> for AuthError {
    fn from(err: redis::RedisError) -> Self {
        AuthError::StoreUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_rejections_are_unauthorized() {
        for err in [
            AuthError::MalformedCredential,
            AuthError::ExpiredCredential,
            AuthError::RevokedCredential,
            AuthError::SessionNotFound,
        ] {
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn blocked_ip_and_wrong_role_are_forbidden() {
        let blocked = AuthError::IpBlocked {
            retry_after_secs: 60,
        };
        assert_eq!(blocked.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::InsufficientRole.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn rate_limit_is_429_with_hint() {
        let err = AuthError::RateLimitExceeded {
            retry_after_secs: 3600,
        };
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.retry_after_secs(), Some(3600));
    }

    #[test]
    fn store_failures_do_not_leak_detail() {
        let err = AuthError::StoreUnavailable("redis://internal-host refused".to_string());
        assert!(!err.public_message().contains("internal-host"));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(AuthError::RevokedCredential.code(), "revoked_credential");
        assert_eq!(AuthError::SessionNotFound.code(), "session_not_found");
        let blocked = AuthError::IpBlocked {
            retry_after_secs: 1,
        };
        assert_eq!(blocked.code(), "ip_blocked");
    }
}
