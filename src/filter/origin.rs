//! Network-origin filtering.
//!
//! # Responsibilities
//! - Compile configured allow/deny ranges into `IpNet` sets at startup
//! - Answer "is this caller address allowed" for every request
//! - Separate host from port for both address families before matching
//!
//! # Design Decisions
//! - Whitelist mode is default-deny, blacklist mode is default-allow
//! - An address that fails to parse is always rejected
//! - Compiled sets are immutable; no locking on the request path

use std::net::{IpAddr, SocketAddr};

use ipnet::IpNet;

use crate::config::schema::{AccessControlConfig, AccessMode};

/// Parse a configured range: either a CIDR block or a bare address
/// (treated as a /32 or /128 host range).
pub fn parse_range(s: &str) -> Option<IpNet> {
    if let Ok(net) = s.parse::<IpNet>() {
        return Some(net);
    }
    s.parse::<IpAddr>().ok().map(IpNet::from)
}

/// Extract the host part of a caller address string.
///
/// Accepts `1.2.3.4:8080`, `[::1]:8080`, and bare addresses of either
/// family. Returns `None` for anything that does not parse.
fn parse_caller_addr(caller: &str) -> Option<IpAddr> {
    if let Ok(addr) = caller.parse::<SocketAddr>() {
        return Some(addr.ip());
    }
    caller.parse::<IpAddr>().ok()
}

/// Immutable origin filter, compiled once at process start.
#[derive(Debug, Clone)]
pub struct OriginFilter {
    mode: AccessMode,
    allow: Vec<IpNet>,
    deny: Vec<IpNet>,
}

impl OriginFilter {
    /// Compile the filter from validated configuration.
    ///
    /// Ranges that fail to parse are skipped here; `validate_config`
    /// reports them as fatal before this point is reached.
    pub fn from_config(config: &AccessControlConfig) -> Self {
        Self {
            mode: config.mode,
            allow: config.allow_ranges.iter().filter_map(|r| parse_range(r)).collect(),
            deny: config.deny_ranges.iter().filter_map(|r| parse_range(r)).collect(),
        }
    }

    /// Filter that lets everything through.
    pub fn allow_all() -> Self {
        Self {
            mode: AccessMode::AllowAll,
            allow: Vec::new(),
            deny: Vec::new(),
        }
    }

    /// Evaluate a caller address in `host:port` or bare form.
    pub fn is_allowed(&self, caller: &str) -> bool {
        match parse_caller_addr(caller) {
            Some(ip) => self.is_ip_allowed(ip),
            None => {
                tracing::warn!(caller = %caller, "Rejecting unparseable caller address");
                false
            }
        }
    }

    /// Evaluate an already-parsed caller address.
    pub fn is_ip_allowed(&self, ip: IpAddr) -> bool {
        let allowed = match self.mode {
            AccessMode::AllowAll => true,
            AccessMode::Whitelist => self.allow.iter().any(|net| net.contains(&ip)),
            AccessMode::Blacklist => !self.deny.iter().any(|net| net.contains(&ip)),
        };
        if !allowed {
            tracing::debug!(ip = %ip, mode = ?self.mode, "Origin rejected");
        }
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::AccessControlConfig;

    fn filter(mode: AccessMode, allow: &[&str], deny: &[&str]) -> OriginFilter {
        OriginFilter::from_config(&AccessControlConfig {
            mode,
            allow_ranges: allow.iter().map(|s| s.to_string()).collect(),
            deny_ranges: deny.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn allow_all_passes_everything() {
        let f = filter(AccessMode::AllowAll, &[], &[]);
        assert!(f.is_allowed("127.0.0.1"));
        assert!(f.is_allowed("10.0.0.5:9999"));
    }

    #[test]
    fn whitelist_is_default_deny() {
        let f = filter(AccessMode::Whitelist, &["127.0.0.1"], &[]);
        assert!(f.is_allowed("127.0.0.1"));
        assert!(f.is_allowed("127.0.0.1:8080"));
        assert!(!f.is_allowed("10.0.0.5"));
        assert!(!f.is_allowed("10.0.0.5:8080"));
    }

    #[test]
    fn whitelist_matches_cidr_ranges() {
        let f = filter(AccessMode::Whitelist, &["192.168.0.0/16"], &[]);
        assert!(f.is_allowed("192.168.4.20"));
        assert!(!f.is_allowed("192.169.0.1"));
    }

    #[test]
    fn blacklist_is_default_allow() {
        let f = filter(AccessMode::Blacklist, &[], &["10.0.0.0/8"]);
        assert!(f.is_allowed("192.168.1.1"));
        assert!(!f.is_allowed("10.1.2.3"));
        assert!(!f.is_allowed("10.1.2.3:443"));
    }

    #[test]
    fn malformed_address_is_always_rejected() {
        let f = filter(AccessMode::Whitelist, &["0.0.0.0/0"], &[]);
        assert!(!f.is_allowed("not-an-address"));
        assert!(!f.is_allowed(""));
        assert!(!f.is_allowed("300.1.1.1"));
    }

    #[test]
    fn ipv6_callers_are_handled() {
        let f = filter(AccessMode::Whitelist, &["::1"], &[]);
        assert!(f.is_allowed("::1"));
        assert!(f.is_allowed("[::1]:8080"));
        assert!(!f.is_allowed("[2001:db8::1]:8080"));
    }
}
