use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::error::AuthError;
use crate::models::{Principal, Role};
use crate::AppState;

/// Authenticated request context, inserted by [`authenticate`] and carried as
/// a request extension. Downstream code reads the principal from here instead
/// of any ambient global.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub principal: Principal,
    pub jti: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::SessionNotFound)
    }
}

/// Credential validation stage.
///
/// Signature/expiry first (pure), then the revocation list, then the
/// registry. A valid-looking signature with no registry entry is rejected the
/// same as a revoked one: fail closed.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = extract_token(req.headers()).ok_or(AuthError::MalformedCredential)?;
    let claims = state.codec.verify(&token)?;

    if state.revocations.is_revoked(&claims.jti).await? {
        tracing::debug!(jti = %claims.jti, "revoked credential presented");
        return Err(AuthError::RevokedCredential);
    }

    let owner = state
        .sessions
        .lookup(&claims.jti)
        .await?
        .ok_or(AuthError::SessionNotFound)?;
    if owner != claims.sub {
        tracing::warn!(jti = %claims.jti, "registry owner does not match credential subject");
        return Err(AuthError::SessionNotFound);
    }

    req.extensions_mut().insert(AuthContext {
        principal: Principal {
            email: claims.sub,
            role: claims.role,
        },
        jti: claims.jti,
    });

    Ok(next.run(req).await)
}

/// Authorization stage for the ROOT-only route tier.
pub async fn require_root(req: Request, next: Next) -> Result<Response, AuthError> {
    enforce_role(req, next, &[Role::Root]).await
}

/// Reject with `insufficient_role` unless the authenticated role is in the
/// allowed set. Must run inside [`authenticate`].
pub async fn enforce_role(
    req: Request,
    next: Next,
    allowed: &[Role],
) -> Result<Response, AuthError> {
    let context = req
        .extensions()
        .get::<AuthContext>()
        .ok_or(AuthError::SessionNotFound)?;

    if !allowed.contains(&context.principal.role) {
        tracing::debug!(
            email = %context.principal.email,
            role = %context.principal.role,
            "role not allowed for route"
        );
        return Err(AuthError::InsufficientRole);
    }

    Ok(next.run(req).await)
}

/// `Authorization: Bearer` header first, `token` cookie as fallback.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(bearer) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        return Some(bearer.to_string());
    }

    headers
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(token_cookie)
}

fn token_cookie(cookie_header: &str) -> Option<String> {
    cookie_header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == "token" && !value.is_empty()).then(|| value.to_string())
    })
}
