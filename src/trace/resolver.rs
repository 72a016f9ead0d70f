use crate::trace::error::{Result, TraceError};
use dns_lookup::{lookup_addr, lookup_host};
use std::net::{IpAddr, Ipv4Addr};
use tracing::{debug, warn};

/// Forward and reverse name resolution
pub trait NameResolver {
    /// Resolve a host name to the IPv4 address that will be traced
    fn resolve_forward(&self, host: &str) -> Result<Ipv4Addr>;

    /// Look up the name of `addr`, or `None` when it has no usable name
    fn resolve_reverse(&self, addr: Ipv4Addr) -> Option<String>;

    /// Name to display for a responder, falling back to the literal address
    fn display_name(&self, addr: Ipv4Addr) -> String {
        self.resolve_reverse(addr).unwrap_or_else(|| addr.to_string())
    }
}

/// Resolver backed by the system's `getaddrinfo` / `getnameinfo`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl NameResolver for SystemResolver {
    fn resolve_forward(&self, host: &str) -> Result<Ipv4Addr> {
        if let Ok(addr) = host.parse::<Ipv4Addr>() {
            return Ok(addr);
        }
        let addrs = lookup_host(host).map_err(|e| {
            warn!(host = host, error = %e, "Forward lookup failed");
            TraceError::Resolution {
                host: host.to_string(),
                reason: e.to_string(),
            }
        })?;
        let addr = first_ipv4(&addrs).ok_or_else(|| TraceError::Resolution {
            host: host.to_string(),
            reason: "no IPv4 address".to_string(),
        })?;
        debug!(host = host, addr = %addr, "Host resolved");
        Ok(addr)
    }

    fn resolve_reverse(&self, addr: Ipv4Addr) -> Option<String> {
        match lookup_addr(&IpAddr::V4(addr)) {
            Ok(name) if !name.is_empty() => Some(name),
            Ok(_) => None,
            Err(e) => {
                debug!(addr = %addr, error = %e, "Reverse lookup failed");
                None
            }
        }
    }
}

fn first_ipv4(addrs: &[IpAddr]) -> Option<Ipv4Addr> {
    addrs.iter().find_map(|addr| match addr {
        IpAddr::V4(v4) => Some(*v4),
        IpAddr::V6(_) => None,
    })
}


#[cfg(test)]
pub use tests::MockNameResolver;
