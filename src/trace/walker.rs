use crate::trace::config::TraceSettings;
use crate::trace::error::{Result, TraceError};
use crate::trace::hop::{measure_hop, HopOutcome};
use crate::trace::reporter::Reporter;
use crate::trace::resolver::NameResolver;
use crate::trace::transport::TransportFactory;
use std::io::Write;
use std::net::Ipv4Addr;
use tracing::{debug, info, warn};

/// Position of the walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    /// The given TTL is probed next
    Probing(u8),
    /// The destination answered at the given TTL
    Succeeded(u8),
    /// `max_hops` was reached without the destination answering
    Exhausted,
}

/// Walker state: the next step plus every hop measured so far, in TTL order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteState {
    pub state: WalkState,
    pub hops: Vec<HopOutcome>,
    destination: Ipv4Addr,
    max_hops: u8,
}

impl RouteState {
    pub fn new(destination: Ipv4Addr, max_hops: u8) -> Self {
        let state = if max_hops == 0 {
            WalkState::Exhausted
        } else {
            WalkState::Probing(1)
        };
        Self {
            state,
            hops: Vec::with_capacity(max_hops as usize),
            destination,
            max_hops,
        }
    }

    /// Record the outcome of the TTL being probed and move to the next state.
    ///
    /// Outcomes for any other TTL, or arriving after the walk has ended, are
    /// ignored and leave the state unchanged.
    pub fn record(&mut self, outcome: HopOutcome) -> WalkState {
        let WalkState::Probing(ttl) = self.state else {
            return self.state;
        };
        if outcome.ttl() != ttl {
            warn!(
                expected = ttl,
                received = outcome.ttl(),
                "Ignoring hop outcome for another TTL"
            );
            return self.state;
        }

        let reached = outcome.responder() == Some(self.destination);
        self.hops.push(outcome);

        self.state = if reached {
            WalkState::Succeeded(ttl)
        } else if ttl >= self.max_hops {
            WalkState::Exhausted
        } else {
            WalkState::Probing(ttl + 1)
        };
        self.state
    }
}

/// Completed walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteResult {
    pub host: String,
    pub destination: Ipv4Addr,
    pub hops: Vec<HopOutcome>,
    /// Either [`WalkState::Succeeded`] or [`WalkState::Exhausted`]
    pub state: WalkState,
}

impl RouteResult {
    pub fn reached(&self) -> bool {
        matches!(self.state, WalkState::Succeeded(_))
    }

    /// Converts an exhausted walk into [`TraceError::RouteExhausted`]
    pub fn ensure_reached(self, max_hops: u8) -> Result<Self> {
        if self.reached() {
            Ok(self)
        } else {
            Err(TraceError::RouteExhausted { max_hops })
        }
    }
}

/// Trace the path to `host`, one TTL at a time starting at 1.
///
/// `host` is resolved before anything is probed; failure to resolve it is
/// returned as an error. Each TTL's line is written to `reporter` as it is
/// measured, followed by a final success or failure line.
pub fn walk<F, R, W>(
    factory: &F,
    resolver: &R,
    reporter: &mut Reporter<W>,
    host: &str,
    settings: &TraceSettings,
) -> Result<RouteResult>
where
    F: TransportFactory + ?Sized,
    R: NameResolver + ?Sized,
    W: Write,
{
    reporter.banner(host)?;
    let destination = resolver.resolve_forward(host)?;
    info!(
        host = host,
        destination = %destination,
        max_hops = settings.max_hops,
        samples = settings.sample_count,
        "Starting trace"
    );

    let mut route = RouteState::new(destination, settings.max_hops);
    while let WalkState::Probing(ttl) = route.state {
        reporter.hop_start(ttl)?;
        let outcome = measure_hop(factory, resolver, reporter, destination, ttl, settings)?;
        reporter.hop_end(&outcome)?;
        let next = route.record(outcome);
        debug!(ttl = ttl, next = ?next, "Hop recorded");
    }

    match route.state {
        WalkState::Succeeded(hops) => {
            info!(hops = hops, "Destination reached");
            reporter.success(hops)?;
        }
        _ => {
            warn!(max_hops = settings.max_hops, "Destination not reached");
            reporter.failure(settings.max_hops)?;
        }
    }

    Ok(RouteResult {
        host: host.to_string(),
        destination,
        hops: route.hops,
        state: route.state,
    })
}
