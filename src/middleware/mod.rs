//! Request pipeline stages.
//!
//! Ordered strictly: IP abuse guard → signature/expiry → revocation →
//! registry liveness → role authorization → handler. Each stage is a plain
//! fallible function over the request; the first failure short-circuits with
//! an `AuthError` response and the handler never runs.

pub mod auth;
pub mod ip_guard;

pub use auth::{authenticate, require_root, AuthContext};
pub use ip_guard::ip_abuse_guard;
