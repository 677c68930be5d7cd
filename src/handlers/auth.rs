use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};
use crate::middleware::AuthContext;
use crate::models::Role;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub email: String,
    pub role: Role,
}

/// Issue a credential. The jti is registered synchronously before the token
/// leaves the server, so no request carrying it can race registration.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AuthResult<Response> {
    let principal = state
        .directory
        .verify_credentials(&body.email, &body.password)
        .await?;

    let issued = state.codec.issue(&principal.email, principal.role)?;
    state
        .sessions
        .register(&issued.jti, &principal.email, state.config.token_ttl_secs)
        .await?;

    tracing::info!(email = %principal.email, role = %principal.role, "login succeeded");

    let mut response = Json(LoginResponse {
        token: issued.token.clone(),
        expires_at: issued.expires_at,
    })
    .into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        session_cookie(&issued.token, state.config.token_ttl_secs)?,
    );
    Ok(response)
}

/// Invalidate the caller's own session and clear the cookie.
pub async fn logout(State(state): State<AppState>, context: AuthContext) -> AuthResult<Response> {
    state.invalidator.invalidate_session(&context.jti).await?;

    tracing::info!(email = %context.principal.email, "logout");

    let mut response = StatusCode::NO_CONTENT.into_response();
    response
        .headers_mut()
        .insert(header::SET_COOKIE, expired_cookie()?);
    Ok(response)
}

/// Identity of the authenticated caller.
pub async fn me(context: AuthContext) -> Json<MeResponse> {
    Json(MeResponse {
        email: context.principal.email,
        role: context.principal.role,
    })
}

fn session_cookie(token: &str, max_age_secs: u64) -> AuthResult<HeaderValue> {
    format!("token={token}; HttpOnly; Secure; Path=/; Max-Age={max_age_secs}")
        .parse()
        .map_err(|_| AuthError::Internal("invalid cookie value".to_string()))
}

fn expired_cookie() -> AuthResult<HeaderValue> {
    "token=; HttpOnly; Secure; Path=/; Max-Age=0"
        .parse()
        .map_err(|_| AuthError::Internal("invalid cookie value".to_string()))
}
