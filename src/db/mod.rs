pub mod blocked_ips;
