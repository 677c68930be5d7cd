pub mod blocked_ip;
pub mod principal;

pub use blocked_ip::BlockedIpRecord;
pub use principal::{Principal, Role};
