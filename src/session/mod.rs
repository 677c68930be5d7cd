//! Distributed session state.
//!
//! All of it lives in Redis; TTLs do the garbage collection. The registry
//! records which jtis are currently live, the revocation list records jtis
//! that must be rejected before their natural expiry, and the invalidator
//! drives the two together.

pub mod invalidator;
pub mod registry;
pub mod revocation;

pub use invalidator::SessionInvalidator;
pub use registry::ActiveSessionRegistry;
pub use revocation::RevocationList;
