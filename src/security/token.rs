//! Signed bearer credentials.
//!
//! Stateless: issuing embeds principal/role/jti/iat/exp and signs with the
//! shared HS256 secret; verification checks signature and expiry only. Whether
//! a credential is still *live* (registered, not revoked) is the pipeline's
//! concern, not this codec's.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::models::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Principal identifier (admin email).
    pub sub: String,
    pub role: Role,
    /// Unique token identifier, random per issuance.
    pub jti: String,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

/// Result of issuing a credential. The caller is responsible for registering
/// the jti before handing the token out.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub token: String,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a fresh credential for the principal. Side-effect free.
    pub fn issue(&self, email: &str, role: Role) -> AuthResult<IssuedCredential> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: email.to_string(),
            role,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("failed to encode credential: {e}")))?;

        tracing::debug!(jti = %claims.jti, sub = %claims.sub, "credential issued");

        Ok(IssuedCredential {
            token,
            jti: claims.jti,
            expires_at,
        })
    }

    /// Verify signature and expiry. Fails closed: anything malformed,
    /// unsigned or tampered is `MalformedCredential`; a good signature past
    /// its embedded expiry is `ExpiredCredential`.
    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredCredential,
                _ => AuthError::MalformedCredential,
            }
        })?;

        if data.claims.jti.trim().is_empty() {
            return Err(AuthError::MalformedCredential);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret-with-enough-entropy";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, 6 * 60 * 60)
    }

    fn encode_raw(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn issue_then_verify_round_trip() {
        let codec = codec();
        let issued = codec.issue("alice@example.com", Role::Viewer).unwrap();

        let claims = codec.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.role, Role::Viewer);
        assert_eq!(claims.jti, issued.jti);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn jti_is_unique_per_issuance() {
        let codec = codec();
        let a = codec.issue("alice@example.com", Role::Viewer).unwrap();
        let b = codec.issue("alice@example.com", Role::Viewer).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn expired_credential_is_rejected_regardless_of_state() {
        let codec = codec();
        let now = Utc::now();
        let claims = Claims {
            sub: "alice@example.com".to_string(),
            role: Role::Viewer,
            jti: Uuid::new_v4().to_string(),
            iat: (now - Duration::hours(7)).timestamp(),
            exp: (now - Duration::hours(1)).timestamp(),
        };
        let token = encode_raw(&claims, SECRET);

        assert!(matches!(
            codec.verify(&token),
            Err(AuthError::ExpiredCredential)
        ));
    }

    #[test]
    fn tampered_signature_is_malformed() {
        let codec = codec();
        let issued = codec.issue("alice@example.com", Role::Root).unwrap();
        let mut tampered = issued.token.clone();
        tampered.pop();
        tampered.push('x');

        assert!(matches!(
            codec.verify(&tampered),
            Err(AuthError::MalformedCredential)
        ));
    }

    #[test]
    fn foreign_secret_is_malformed() {
        let codec = codec();
        let now = Utc::now();
        let claims = Claims {
            sub: "mallory@example.com".to_string(),
            role: Role::Root,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let token = encode_raw(&claims, "some-other-secret-entirely");

        assert!(matches!(
            codec.verify(&token),
            Err(AuthError::MalformedCredential)
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            codec().verify("not.a.jwt"),
            Err(AuthError::MalformedCredential)
        ));
        assert!(matches!(
            codec().verify(""),
            Err(AuthError::MalformedCredential)
        ));
    }

    #[test]
    fn empty_jti_is_malformed() {
        let codec = codec();
        let now = Utc::now();
        let claims = Claims {
            sub: "alice@example.com".to_string(),
            role: Role::Viewer,
            jti: String::new(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let token = encode_raw(&claims, SECRET);

        assert!(matches!(
            codec.verify(&token),
            Err(AuthError::MalformedCredential)
        ));
    }
}
