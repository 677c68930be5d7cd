//! Per-IP abuse guard.
//!
//! Fixed-window counter in Redis (`req_count:{ip}`, INCR + EXPIRE on the
//! window's first hit). Crossing the threshold writes a block mirror key
//! (`blocked_ip:{ip}`) with the block TTL and appends a durable history row.
//! The blocked check is a single EXISTS and runs before any other pipeline
//! stage.
//!
//! Failure policy: a Redis error or timeout here may fail open (configurable)
//! so a store outage does not become a full denial of service. The durable
//! insert failing never lets the triggering request through.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::{Duration as ChronoDuration, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::time::timeout;

use crate::db;
use crate::error::{AuthError, AuthResult};
use crate::AppState;

const BLOCK_REASON: &str = "Rate limit exceeded";

fn blocked_key(ip: &str) -> String {
    format!("blocked_ip:{ip}")
}

fn counter_key(ip: &str) -> String {
    format!("req_count:{ip}")
}

enum GuardDecision {
    Allow,
    /// Already blocked; remaining block TTL for the retry hint.
    Blocked { retry_after_secs: u64 },
    /// This request crossed the threshold; mirror key was just written.
    ThresholdCrossed,
}

pub async fn ip_abuse_guard(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let ip = client_ip(req.headers(), req.extensions().get::<ConnectInfo<SocketAddr>>());

    let decision = timeout(
        Duration::from_millis(state.config.guard_timeout_ms),
        check_ip(&state, &ip),
    )
    .await;

    match decision {
        Ok(Ok(GuardDecision::Allow)) => Ok(next.run(req).await),
        Ok(Ok(GuardDecision::Blocked { retry_after_secs })) => {
            tracing::debug!(ip = %ip, "request from blocked ip rejected");
            Err(AuthError::IpBlocked { retry_after_secs })
        }
        Ok(Ok(GuardDecision::ThresholdCrossed)) => {
            let now = Utc::now();
            let unblock_at = now + ChronoDuration::seconds(state.config.ip_block_secs as i64);
            if let Err(e) =
                db::blocked_ips::insert_block(&state.db, &ip, BLOCK_REASON, now, Some(unblock_at))
                    .await
            {
                // The mirror key already blocks the IP; losing the audit row
                // must not unblock it.
                tracing::error!(ip = %ip, error = %e, "failed to persist block record");
            }
            tracing::warn!(ip = %ip, until = %unblock_at, "ip blocked: rate limit exceeded");
            Err(AuthError::RateLimitExceeded {
                retry_after_secs: state.config.ip_block_secs,
            })
        }
        Ok(Err(e)) => {
            if state.config.guard_fail_open {
                tracing::warn!(ip = %ip, error = %e, "abuse guard store error, failing open");
                Ok(next.run(req).await)
            } else {
                Err(e.into())
            }
        }
        Err(_elapsed) => {
            if state.config.guard_fail_open {
                tracing::warn!(
                    ip = %ip,
                    timeout_ms = state.config.guard_timeout_ms,
                    "abuse guard timed out, failing open"
                );
                Ok(next.run(req).await)
            } else {
                Err(AuthError::StoreUnavailable(
                    "abuse guard timed out".to_string(),
                ))
            }
        }
    }
}

async fn check_ip(state: &AppState, ip: &str) -> Result<GuardDecision, redis::RedisError> {
    let mut conn = state.redis.clone();

    let blocked: bool = conn.exists(blocked_key(ip)).await?;
    if blocked {
        let ttl: i64 = conn.ttl(blocked_key(ip)).await?;
        return Ok(GuardDecision::Blocked {
            retry_after_secs: ttl.max(0) as u64,
        });
    }

    let count: u64 = conn.incr(counter_key(ip), 1i64).await?;
    // First request of the window starts its clock
    if count == 1 {
        let _: () = conn
            .expire(counter_key(ip), state.config.rate_window_secs as i64)
            .await?;
    }

    if count > u64::from(state.config.rate_max_requests) {
        redis::cmd("SET")
            .arg(blocked_key(ip))
            .arg("1")
            .arg("EX")
            .arg(state.config.ip_block_secs)
            .query_async::<_, ()>(&mut conn)
            .await?;
        return Ok(GuardDecision::ThresholdCrossed);
    }

    Ok(GuardDecision::Allow)
}

/// Remove the block mirror key so a manual unblock takes effect immediately.
pub async fn clear_block_mirror(redis: &ConnectionManager, ip: &str) -> AuthResult<()> {
    let mut conn = redis.clone();
    let _: () = conn.del(blocked_key(ip)).await?;
    Ok(())
}

/// Rebuild the mirror from the durable block history at startup. Returns the
/// number of mirror keys written.
pub async fn rehydrate_block_mirror(
    pool: &sqlx::PgPool,
    redis: &ConnectionManager,
) -> AuthResult<usize> {
    let now = Utc::now();
    let records = db::blocked_ips::active_blocks(pool).await?;
    let mut conn = redis.clone();
    let mut written = 0;

    for record in &records {
        if !record.is_active(now) {
            continue;
        }
        let mut cmd = redis::cmd("SET");
        cmd.arg(blocked_key(&record.ip)).arg("1");
        // Indefinite blocks get no TTL; only a manual unblock removes them
        if let Some(until) = record.unblock_at {
            cmd.arg("EX").arg((until - now).num_seconds().max(1) as u64);
        }
        cmd.query_async::<_, ()>(&mut conn).await?;
        written += 1;
    }

    if written > 0 {
        tracing::info!(count = written, "block mirror rehydrated from durable store");
    }
    Ok(written)
}

/// Client IP: first hop of `X-Forwarded-For` when present, else the transport
/// remote address. Loopback spellings collapse to `127.0.0.1` so the limiter
/// cannot be bypassed by address-format variation.
fn client_ip(headers: &HeaderMap, connect_info: Option<&ConnectInfo<SocketAddr>>) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return canonical_ip(forwarded);
    }

    connect_info
        .map(|ConnectInfo(addr)| canonical(addr.ip()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Canonical spelling of an IP as stored in counter/mirror keys and durable
/// rows. Admin input (manual unblock) must pass through here too, or a
/// differently spelled IPv6 address would miss the keys it targets.
pub fn canonical_ip(ip: &str) -> String {
    match ip.trim().parse::<IpAddr>() {
        Ok(addr) => canonical(addr),
        // Unparseable values still get counted under their literal spelling
        Err(_) => ip.trim().to_string(),
    }
}

fn canonical(addr: IpAddr) -> String {
    if addr.is_loopback() {
        return "127.0.0.1".to_string();
    }
    if let IpAddr::V6(v6) = addr {
        if let Some(v4) = v6.to_ipv4_mapped() {
            return v4.to_string();
        }
    }
    addr.to_string()
}
