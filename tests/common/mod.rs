//! In-memory network used by the integration tests

#![allow(dead_code)]

use pathtrace::trace::{
    Notification, NameResolver, Result, Transport, TraceError, TraceSettings, TransportFactory,
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::rc::Rc;
use std::time::Duration;

pub const DESTINATION: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 80);

/// Router address for a given TTL
pub fn router(ttl: u8) -> Ipv4Addr {
    Ipv4Addr::new(10, 0, ttl, 1)
}

#[derive(Debug, Default)]
pub struct Log {
    pub opened_ttls: Vec<u8>,
    pub sends: usize,
    pub released: usize,
}

/// Path whose hop at TTL `n` is `hops[n - 1]`; `None` never answers.
///
/// TTLs past the end of `hops` are answered by `beyond`, if set.
pub struct SimNetwork {
    hops: Vec<Option<Ipv4Addr>>,
    beyond: Option<Ipv4Addr>,
    /// Timeouts to produce before answering, per TTL, for each transport pair
    flaky: HashMap<u8, u32>,
    pub log: Rc<RefCell<Log>>,
}

impl SimNetwork {
    pub fn new(hops: Vec<Option<Ipv4Addr>>) -> Self {
        Self {
            hops,
            beyond: None,
            flaky: HashMap::new(),
            log: Rc::new(RefCell::new(Log::default())),
        }
    }

    /// Routers at TTL 1..len, destination at TTL len
    pub fn reachable_in(len: u8) -> Self {
        let mut hops: Vec<Option<Ipv4Addr>> = (1..len).map(|ttl| Some(router(ttl))).collect();
        hops.push(Some(DESTINATION));
        Self::new(hops)
    }

    pub fn answering_beyond(mut self, addr: Ipv4Addr) -> Self {
        self.beyond = Some(addr);
        self
    }

    pub fn flaky(mut self, ttl: u8, timeouts: u32) -> Self {
        self.flaky.insert(ttl, timeouts);
        self
    }

    fn responder(&self, ttl: u8) -> Option<Ipv4Addr> {
        match self.hops.get(usize::from(ttl) - 1) {
            Some(hop) => *hop,
            None => self.beyond,
        }
    }
}

impl TransportFactory for SimNetwork {
    fn open(&self, ttl: u8, _rx_timeout: Duration, _rx_port: u16) -> Result<Box<dyn Transport>> {
        self.log.borrow_mut().opened_ttls.push(ttl);
        Ok(Box::new(SimTransport {
            responder: self.responder(ttl),
            timeouts_left: self.flaky.get(&ttl).copied().unwrap_or(0),
            log: Rc::clone(&self.log),
        }))
    }
}

struct SimTransport {
    responder: Option<Ipv4Addr>,
    timeouts_left: u32,
    log: Rc<RefCell<Log>>,
}

impl Transport for SimTransport {
    fn send_probe(&mut self, _dst: SocketAddrV4) -> Result<usize> {
        self.log.borrow_mut().sends += 1;
        Ok(0)
    }

    fn recv_notification(&mut self) -> Result<Notification> {
        if self.timeouts_left > 0 {
            self.timeouts_left -= 1;
            return Err(TraceError::ReadTimeout);
        }
        match self.responder {
            Some(sender) => Ok(Notification { sender, len: 56 }),
            None => Err(TraceError::ReadTimeout),
        }
    }
}

impl Drop for SimTransport {
    fn drop(&mut self) {
        self.log.borrow_mut().released += 1;
    }
}

/// Resolver with a fixed set of names; unnamed addresses fail reverse lookup
pub struct SimResolver {
    names: HashMap<Ipv4Addr, String>,
    unknown_hosts: HashSet<String>,
}

impl SimResolver {
    pub fn new() -> Self {
        Self {
            names: HashMap::new(),
            unknown_hosts: HashSet::new(),
        }
    }

    pub fn with_name(mut self, addr: Ipv4Addr, name: &str) -> Self {
        self.names.insert(addr, name.to_string());
        self
    }

    pub fn with_unknown_host(mut self, host: &str) -> Self {
        self.unknown_hosts.insert(host.to_string());
        self
    }
}

impl NameResolver for SimResolver {
    fn resolve_forward(&self, host: &str) -> Result<Ipv4Addr> {
        if self.unknown_hosts.contains(host) {
            return Err(TraceError::Resolution {
                host: host.to_string(),
                reason: "unknown host".to_string(),
            });
        }
        Ok(DESTINATION)
    }

    fn resolve_reverse(&self, addr: Ipv4Addr) -> Option<String> {
        self.names.get(&addr).cloned()
    }
}

pub fn settings(max_hops: u8, attempts: u32, samples: u32) -> TraceSettings {
    TraceSettings {
        max_hops,
        rx_timeout: Duration::from_millis(5),
        attempts_per_probe: attempts,
        sample_count: samples,
        ..TraceSettings::default()
    }
}
