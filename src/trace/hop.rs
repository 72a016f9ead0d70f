use crate::trace::config::TraceSettings;
use crate::trace::error::Result;
use crate::trace::prober::{probe, Probe, ProbeOutcome};
use crate::trace::reporter::Reporter;
use crate::trace::resolver::NameResolver;
use crate::trace::transport::TransportFactory;
use std::io::Write;
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, warn};

/// Samples collected for one TTL that answered every probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopReport {
    pub ttl: u8,
    pub responder: Ipv4Addr,
    pub name: String,
    /// Elapsed time per sample, in the order the samples were taken
    pub rtts: Vec<Duration>,
}

/// What one TTL produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HopOutcome {
    Responded(HopReport),
    Silent { ttl: u8 },
}

impl HopOutcome {
    pub fn ttl(&self) -> u8 {
        match self {
            HopOutcome::Responded(report) => report.ttl,
            HopOutcome::Silent { ttl } => *ttl,
        }
    }

    pub fn responder(&self) -> Option<Ipv4Addr> {
        match self {
            HopOutcome::Responded(report) => Some(report.responder),
            HopOutcome::Silent { .. } => None,
        }
    }

    pub fn is_silent(&self) -> bool {
        matches!(self, HopOutcome::Silent { .. })
    }
}

/// Probe `target` at `ttl` `sample_count` times.
///
/// The first probe that exhausts its attempts abandons the hop: samples
/// already taken are discarded and the hop is reported silent. The responder
/// name is looked up once, after the first reply.
pub fn measure_hop<F, R, W>(
    factory: &F,
    resolver: &R,
    reporter: &mut Reporter<W>,
    target: Ipv4Addr,
    ttl: u8,
    settings: &TraceSettings,
) -> Result<HopOutcome>
where
    F: TransportFactory + ?Sized,
    R: NameResolver + ?Sized,
    W: Write,
{
    let request = Probe {
        target,
        dst_port: settings.dst_port,
        ttl,
        rx_timeout: settings.rx_timeout,
        rx_port: settings.rx_port,
    };
    let mut rtts = Vec::with_capacity(settings.sample_count as usize);
    let mut first: Option<(Ipv4Addr, String)> = None;

    for sample in 0..settings.sample_count {
        match probe(factory, reporter, &request, settings.attempts_per_probe)? {
            ProbeOutcome::Reply { responder, elapsed } => {
                if let Some((addr, _)) = &first {
                    if *addr != responder {
                        debug!(
                            ttl = ttl,
                            first = %addr,
                            responder = %responder,
                            "Later sample answered by a different responder"
                        );
                    }
                } else {
                    let name = resolver.display_name(responder);
                    debug!(
                        ttl = ttl,
                        responder = %responder,
                        name = %name,
                        "Hop responder identified"
                    );
                    first = Some((responder, name));
                }
                rtts.push(elapsed);
            }
            ProbeOutcome::Exhausted { attempts } => {
                warn!(
                    ttl = ttl,
                    sample = sample + 1,
                    attempts = attempts,
                    discarded_samples = rtts.len(),
                    "Hop silent"
                );
                return Ok(HopOutcome::Silent { ttl });
            }
        }
    }

    match first {
        Some((responder, name)) => Ok(HopOutcome::Responded(HopReport {
            ttl,
            responder,
            name,
            rtts,
        })),
        None => Ok(HopOutcome::Silent { ttl }),
    }
}
