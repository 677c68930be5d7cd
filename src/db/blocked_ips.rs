use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::AuthResult;
use crate::models::BlockedIpRecord;

/// Append one block event to the history. Source of truth for audit; the
/// Redis mirror is only a cache of "is this IP blocked right now".
pub async fn insert_block(
    pool: &PgPool,
    ip: &str,
    reason: &str,
    blocked_at: DateTime<Utc>,
    unblock_at: Option<DateTime<Utc>>,
) -> AuthResult<BlockedIpRecord> {
    let record = sqlx::query_as::<_, BlockedIpRecord>(
        r#"
        INSERT INTO blocked_ips (ip, reason, blocked_at, unblock_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, ip, reason, blocked_at, unblock_at
        "#,
    )
    .bind(ip)
    .bind(reason)
    .bind(blocked_at)
    .bind(unblock_at)
    .fetch_one(pool)
    .await?;

    Ok(record)
}

/// Block history, newest first.
pub async fn list_blocks(pool: &PgPool, limit: i64) -> AuthResult<Vec<BlockedIpRecord>> {
    let records = sqlx::query_as::<_, BlockedIpRecord>(
        r#"
        SELECT id, ip, reason, blocked_at, unblock_at
        FROM blocked_ips
        ORDER BY blocked_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Blocks that are still in force (unblock_at unset or in the future).
/// Used to rebuild the Redis mirror at startup.
pub async fn active_blocks(pool: &PgPool) -> AuthResult<Vec<BlockedIpRecord>> {
    let records = sqlx::query_as::<_, BlockedIpRecord>(
        r#"
        SELECT id, ip, reason, blocked_at, unblock_at
        FROM blocked_ips
        WHERE unblock_at IS NULL OR unblock_at > NOW()
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Manual unblock: resolve every in-force row for the IP. The history rows
/// stay; only their `unblock_at` moves to now. Returns how many were resolved.
pub async fn resolve_blocks(pool: &PgPool, ip: &str) -> AuthResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE blocked_ips
        SET unblock_at = NOW()
        WHERE ip = $1 AND (unblock_at IS NULL OR unblock_at > NOW())
        "#,
    )
    .bind(ip)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
