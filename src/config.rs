/// Configuration management
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_server_host")]
    pub server_host: String,
    #[serde(default = "default_server_port")]
    pub server_port: u16,
    pub database_url: String,
    pub redis_url: String,

    /// Shared HS256 signing secret.
    pub jwt_secret: String,
    /// Credential validity window (default 6 hours).
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    /// Ceiling applied to revocation entries whose remaining TTL is unknown.
    #[serde(default = "default_revocation_ceiling_secs")]
    pub revocation_ceiling_secs: u64,
    /// Upper bound on concurrent sessions per admin, enforced at issuance.
    #[serde(default = "default_max_sessions_per_admin")]
    pub max_sessions_per_admin: u32,

    /// Request-count window length.
    #[serde(default = "default_rate_window_secs")]
    pub rate_window_secs: u64,
    /// Requests allowed per window before an IP is blocked.
    #[serde(default = "default_rate_max_requests")]
    pub rate_max_requests: u32,
    /// Block duration once the threshold is crossed.
    #[serde(default = "default_ip_block_secs")]
    pub ip_block_secs: u64,
    /// Whether the abuse guard lets requests through when Redis is unreachable.
    /// The registry/revocation checks always fail closed regardless.
    #[serde(default = "default_guard_fail_open")]
    pub guard_fail_open: bool,
    /// Timeout for the guard's Redis round trips.
    #[serde(default = "default_guard_timeout_ms")]
    pub guard_timeout_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_token_ttl_secs() -> u64 {
    6 * 60 * 60
}

fn default_revocation_ceiling_secs() -> u64 {
    60 * 60
}

fn default_max_sessions_per_admin() -> u32 {
    32
}

fn default_rate_window_secs() -> u64 {
    60
}

fn default_rate_max_requests() -> u32 {
    100
}

fn default_ip_block_secs() -> u64 {
    60 * 60
}

fn default_guard_fail_open() -> bool {
    true
}

fn default_guard_timeout_ms() -> u64 {
    100
}
