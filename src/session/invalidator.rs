use crate::error::AuthResult;
use crate::session::{ActiveSessionRegistry, RevocationList};

/// Drives revocation and registry removal together so a dead jti is both
/// rejected by the revocation list and absent from the registry — either
/// check alone suffices to reject it.
#[derive(Clone)]
pub struct SessionInvalidator {
    registry: ActiveSessionRegistry,
    revocations: RevocationList,
}

impl SessionInvalidator {
    pub fn new(registry: ActiveSessionRegistry, revocations: RevocationList) -> Self {
        Self {
            registry,
            revocations,
        }
    }

    /// Invalidate a single credential (logout). Revoke first, then remove:
    /// a request racing the removal still hits the revocation marker.
    pub async fn invalidate_session(&self, jti: &str) -> AuthResult<()> {
        let remaining = self.registry.remaining_ttl(jti).await?;
        self.revocations.revoke(jti, remaining).await?;
        self.registry.remove(jti).await?;
        Ok(())
    }

    /// Invalidate every live credential for a principal (role change, account
    /// deletion). Each jti is revoked independently, so partial progress on
    /// interruption is safe; once this returns, no previously valid credential
    /// for the principal passes the pipeline again.
    pub async fn invalidate_all(&self, email: &str) -> AuthResult<usize> {
        let jtis = self.registry.all_active_for(email).await?;
        let count = jtis.len();

        for jti in &jtis {
            self.invalidate_session(jti).await?;
        }
        self.registry.clear_index(email).await?;

        tracing::info!(email = %email, count, "all sessions invalidated");
        Ok(count)
    }
}
