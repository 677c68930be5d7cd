//! Session, token and IP-abuse control plane for the storefront admin
//! backend. Catalog CRUD and reporting live elsewhere; this crate owns
//! credential issuance and validation, distributed session liveness,
//! revocation, and per-IP abuse blocking.

pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod security;
pub mod session;


pub use error::{AuthError, AuthResult};

use std::sync::Arc;

use redis::aio::ConnectionManager;
use sqlx::PgPool;

use config::Config;
use directory::AdminDirectory;
use security::TokenCodec;
use session::{ActiveSessionRegistry, RevocationList, SessionInvalidator};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: ConnectionManager,
    pub codec: TokenCodec,
    pub sessions: ActiveSessionRegistry,
    pub revocations: RevocationList,
    pub invalidator: SessionInvalidator,
    pub directory: Arc<dyn AdminDirectory>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        redis: ConnectionManager,
        directory: Arc<dyn AdminDirectory>,
        config: Config,
    ) -> Self {
        let codec = TokenCodec::new(&config.jwt_secret, config.token_ttl_secs);
        let sessions = ActiveSessionRegistry::new(redis.clone(), config.max_sessions_per_admin);
        let revocations = RevocationList::new(redis.clone(), config.revocation_ceiling_secs);
        let invalidator = SessionInvalidator::new(sessions.clone(), revocations.clone());

        Self {
            db,
            redis,
            codec,
            sessions,
            revocations,
            invalidator,
            directory,
            config: Arc::new(config),
        }
    }
}
