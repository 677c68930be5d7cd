/// Route definitions and pipeline assembly.
///
/// Middleware order (outermost first): trace → IP abuse guard → credential
/// validation → role authorization → handler. The guard wraps everything,
/// login included; credential validation wraps only the authenticated tier.
use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::{authenticate, ip_abuse_guard, require_root};
use crate::AppState;

pub fn router(state: AppState) -> Router {
    let root_tier = Router::new()
        .route("/admins/role", patch(handlers::change_admin_role))
        .route("/admins", delete(handlers::delete_admin))
        .route("/blocked-ips", get(handlers::list_blocked_ips))
        .route("/blocked-ips/unblock", post(handlers::unblock_ip))
        .layer(middleware::from_fn(require_root));

    let authenticated = Router::new()
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/auth/me", get(handlers::me))
        .nest("/root", root_tier)
        .layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .route("/api/auth/login", post(handlers::login))
        .route("/health", get(health_check))
        .merge(authenticated)
        .layer(middleware::from_fn_with_state(state.clone(), ip_abuse_guard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
