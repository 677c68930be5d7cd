//! ROOT-only administration: role changes and account deletion (both of
//! which mass-invalidate the target's sessions) and blocked-IP management.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::db;
use crate::error::AuthResult;
use crate::middleware::ip_guard;
use crate::models::{BlockedIpRecord, Role};
use crate::AppState;

const BLOCK_HISTORY_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct AdminTargetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UnblockRequest {
    pub ip: String,
}

/// Change an admin's role, then invalidate every session they hold. Once this
/// returns, no credential issued under the old role is accepted again.
pub async fn change_admin_role(
    State(state): State<AppState>,
    Json(body): Json<ChangeRoleRequest>,
) -> AuthResult<StatusCode> {
    state.directory.assign_role(&body.email, body.role).await?;
    state.invalidator.invalidate_all(&body.email).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete an admin account and invalidate every session they hold.
pub async fn delete_admin(
    State(state): State<AppState>,
    Json(body): Json<AdminTargetRequest>,
) -> AuthResult<StatusCode> {
    state.directory.remove(&body.email).await?;
    state.invalidator.invalidate_all(&body.email).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Block history, newest first.
pub async fn list_blocked_ips(
    State(state): State<AppState>,
) -> AuthResult<Json<Vec<BlockedIpRecord>>> {
    let records = db::blocked_ips::list_blocks(&state.db, BLOCK_HISTORY_LIMIT).await?;
    Ok(Json(records))
}

/// Manual unblock: resolve durable rows, then drop the fast-store mirror so
/// the next request from the IP is evaluated fresh. The input is canonicalized
/// first; blocks are keyed by the canonical spelling.
pub async fn unblock_ip(
    State(state): State<AppState>,
    Json(body): Json<UnblockRequest>,
) -> AuthResult<StatusCode> {
    let ip = ip_guard::canonical_ip(&body.ip);
    let resolved = db::blocked_ips::resolve_blocks(&state.db, &ip).await?;
    ip_guard::clear_block_mirror(&state.redis, &ip).await?;

    tracing::info!(ip = %ip, resolved, "ip manually unblocked");
    Ok(StatusCode::NO_CONTENT)
}
