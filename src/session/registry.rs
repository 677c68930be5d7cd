use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::error::{AuthError, AuthResult};

/// Per-credential liveness tracking.
///
/// **Key format**: `jti:{jti}` → owning email, TTL = remaining credential
/// validity. A per-principal index set `active_tokens:{email}` supports bulk
/// invalidation; its TTL is refreshed to the newest credential's lifetime so
/// it can never outlive every member. Members whose `jti:{jti}` key lapsed
/// naturally are pruned whenever the set is read, so the index converges on
/// the live sessions rather than every session ever issued.
#[derive(Clone)]
pub struct ActiveSessionRegistry {
    redis: ConnectionManager,
    max_sessions: u32,
}

fn session_key(jti: &str) -> String {
    format!("jti:{jti}")
}

fn index_key(email: &str) -> String {
    format!("active_tokens:{email}")
}

impl ActiveSessionRegistry {
    pub fn new(redis: ConnectionManager, max_sessions: u32) -> Self {
        Self {
            redis,
            max_sessions,
        }
    }

    /// Record a freshly issued jti. Must complete before the credential is
    /// handed to the client so no request can race ahead of registration.
    ///
    /// Refuses once the principal already holds `max_sessions` live entries,
    /// which keeps `all_active_for` bounded.
    pub async fn register(&self, jti: &str, email: &str, ttl_secs: u64) -> AuthResult<()> {
        let mut conn = self.redis.clone();

        let active = self.live_members(&mut conn, email).await?.len();
        if active as u64 >= u64::from(self.max_sessions) {
            tracing::warn!(email = %email, active, "session limit reached at issuance");
            return Err(AuthError::SessionLimitExceeded);
        }

        redis::cmd("SET")
            .arg(session_key(jti))
            .arg(email)
            .arg("EX")
            .arg(ttl_secs)
            .query_async::<_, ()>(&mut conn)
            .await?;

        let _: () = conn.sadd(index_key(email), jti).await?;
        let _: () = conn.expire(index_key(email), ttl_secs as i64).await?;

        tracing::debug!(jti = %jti, email = %email, ttl_secs, "session registered");
        Ok(())
    }

    /// Owner of a live jti, or None when the entry expired or was removed.
    pub async fn lookup(&self, jti: &str) -> AuthResult<Option<String>> {
        let mut conn = self.redis.clone();
        let owner: Option<String> = conn.get(session_key(jti)).await?;
        Ok(owner)
    }

    /// Remaining lifetime of a live jti in seconds.
    pub async fn remaining_ttl(&self, jti: &str) -> AuthResult<Option<u64>> {
        let mut conn = self.redis.clone();
        let ttl: i64 = conn.ttl(session_key(jti)).await?;
        // -2 = missing key, -1 = no expiry set; neither yields a usable TTL
        Ok(if ttl > 0 { Some(ttl as u64) } else { None })
    }

    /// Drop a jti from the registry and the owner's index. Idempotent:
    /// removing an absent key is a no-op.
    pub async fn remove(&self, jti: &str) -> AuthResult<()> {
        let mut conn = self.redis.clone();

        let owner: Option<String> = conn.get(session_key(jti)).await?;
        let _: () = conn.del(session_key(jti)).await?;
        if let Some(email) = owner {
            let _: () = conn.srem(index_key(&email), jti).await?;
        }

        tracing::debug!(jti = %jti, "session removed");
        Ok(())
    }

    /// Every live jti recorded for the principal. Bounded by the issuance cap.
    pub async fn all_active_for(&self, email: &str) -> AuthResult<Vec<String>> {
        let mut conn = self.redis.clone();
        self.live_members(&mut conn, email).await
    }

    /// Index members whose session key still exists. Members left behind by a
    /// natural TTL expiry are dropped from the set as they are encountered, so
    /// a principal who never logs out cannot fill the index with dead entries.
    async fn live_members(
        &self,
        conn: &mut ConnectionManager,
        email: &str,
    ) -> AuthResult<Vec<String>> {
        let members: Vec<String> = conn.smembers(index_key(email)).await?;
        let mut live = Vec::with_capacity(members.len());

        for jti in members {
            let exists: bool = conn.exists(session_key(&jti)).await?;
            if exists {
                live.push(jti);
            } else {
                let _: () = conn.srem(index_key(email), &jti).await?;
            }
        }
        Ok(live)
    }

    /// Clear the principal's index set after bulk invalidation.
    pub async fn clear_index(&self, email: &str) -> AuthResult<()> {
        let mut conn = self.redis.clone();
        let _: () = conn.del(index_key(email)).await?;
        Ok(())
    }
}
