pub mod admin;
pub mod auth;

pub use admin::{change_admin_role, delete_admin, list_blocked_ips, unblock_ip};
pub use auth::{login, logout, me};
