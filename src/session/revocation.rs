use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::error::AuthResult;

/// Revoked-jti tracking.
///
/// **Key format**: `jti:{jti}:blacklist`, TTL = the credential's remaining
/// validity at the moment of revocation. An entry never needs to outlive the
/// credential it blocks; when the remaining TTL cannot be determined, a
/// conservative ceiling is applied instead of revoking forever.
#[derive(Clone)]
pub struct RevocationList {
    redis: ConnectionManager,
    default_ceiling_secs: u64,
}

fn revocation_key(jti: &str) -> String {
    format!("jti:{jti}:blacklist")
}

impl RevocationList {
    pub fn new(redis: ConnectionManager, default_ceiling_secs: u64) -> Self {
        Self {
            redis,
            default_ceiling_secs,
        }
    }

    /// Mark a jti invalid until its natural expiry. Idempotent: re-revoking
    /// overwrites the same marker.
    pub async fn revoke(&self, jti: &str, remaining_ttl_secs: Option<u64>) -> AuthResult<()> {
        let ttl = match remaining_ttl_secs {
            Some(secs) if secs > 0 => secs,
            _ => self.default_ceiling_secs,
        };

        let mut conn = self.redis.clone();
        redis::cmd("SET")
            .arg(revocation_key(jti))
            .arg("revoked")
            .arg("EX")
            .arg(ttl)
            .query_async::<_, ()>(&mut conn)
            .await?;

        tracing::info!(jti = %jti, ttl_secs = ttl, "jti revoked");
        Ok(())
    }

    pub async fn is_revoked(&self, jti: &str) -> AuthResult<bool> {
        let mut conn = self.redis.clone();
        let exists: bool = conn.exists(revocation_key(jti)).await?;
        Ok(exists)
    }
}
