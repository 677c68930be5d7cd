use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Durable block-history row. Append-only: every block event produces one row,
/// and a manual unblock resolves it by moving `unblock_at` into the past.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BlockedIpRecord {
    pub id: i64,
    pub ip: String,
    pub reason: String,
    pub blocked_at: DateTime<Utc>,
    /// None means blocked indefinitely until a manual unblock.
    pub unblock_at: Option<DateTime<Utc>>,
}

impl BlockedIpRecord {
    /// A record still blocks traffic while `unblock_at` is unset or in the future.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.unblock_at {
            None => true,
            Some(until) => until > now,
        }
    }
}
