use crate::trace::error::Result;
use crate::trace::reporter::Reporter;
use crate::trace::transport::TransportFactory;
use std::io::Write;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A single probe: where it goes, with which TTL, and how long to wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    pub target: Ipv4Addr,
    pub dst_port: u16,
    pub ttl: u8,
    pub rx_timeout: Duration,
    pub rx_port: u16,
}

impl Probe {
    pub fn destination(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.target, self.dst_port)
    }
}

/// Result of one probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// A notification arrived from `responder` after `elapsed`
    Reply { responder: Ipv4Addr, elapsed: Duration },
    /// Every attempt failed
    Exhausted { attempts: u32 },
}

/// Send `probe` and wait for a notification, re-sending up to `attempts` times.
///
/// The transport pair is opened for this call only and released on every
/// return path. Each failed attempt writes one `* ` marker to `reporter`.
/// The notification is attributed to the probe by arrival alone; no
/// identifier in the payload is checked.
///
/// Elapsed time is measured from the first send, so an answer to a retry
/// includes the time already spent waiting on earlier attempts.
pub fn probe<F, W>(
    factory: &F,
    reporter: &mut Reporter<W>,
    probe: &Probe,
    attempts: u32,
) -> Result<ProbeOutcome>
where
    F: TransportFactory + ?Sized,
    W: Write,
{
    let mut transport = factory.open(probe.ttl, probe.rx_timeout, probe.rx_port)?;
    let destination = probe.destination();
    let mut attempts_remaining = attempts;
    let start = Instant::now();

    while attempts_remaining > 0 {
        let received = match transport.send_probe(destination) {
            Ok(_) => transport.recv_notification(),
            Err(e) => Err(e),
        };

        match received {
            Ok(notification) => {
                let elapsed = truncate_to_millis(start.elapsed());
                debug!(
                    ttl = probe.ttl,
                    responder = %notification.sender,
                    elapsed_ms = elapsed.as_millis(),
                    "Probe answered"
                );
                return Ok(ProbeOutcome::Reply {
                    responder: notification.sender,
                    elapsed,
                });
            }
            Err(e) if !e.is_fatal() => {
                attempts_remaining -= 1;
                debug!(
                    ttl = probe.ttl,
                    attempts_remaining = attempts_remaining,
                    error = %e,
                    "Probe attempt failed"
                );
                reporter.retry_marker()?;
            }
            Err(e) => {
                warn!(ttl = probe.ttl, error = %e, "Probe aborted");
                return Err(e);
            }
        }
    }

    debug!(ttl = probe.ttl, attempts = attempts, "Probe exhausted");
    Ok(ProbeOutcome::Exhausted { attempts })
}

/// Timings are reported at millisecond resolution
fn truncate_to_millis(elapsed: Duration) -> Duration {
    Duration::from_millis(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::error::TraceError;
    use crate::trace::transport::{MockTransport, MockTransportFactory, Notification, Transport};
    use mockall::predicate::eq;
    use mockall::Sequence;
    use std::io::ErrorKind;

    const TARGET: Ipv4Addr = Ipv4Addr::new(198, 51, 100, 1);
    const ROUTER: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);

    fn test_probe() -> Probe {
        Probe {
            target: TARGET,
            dst_port: 33434,
            ttl: 4,
            rx_timeout: Duration::from_millis(50),
            rx_port: 33434,
        }
    }

    fn factory_with(transport: MockTransport) -> MockTransportFactory {
        let mut factory = MockTransportFactory::new();
        let mut slot = Some(transport);
        factory
            .expect_open()
            .with(eq(4u8), eq(Duration::from_millis(50)), eq(33434u16))
            .times(1)
            .returning(move |_, _, _| match slot.take() {
                Some(transport) => Ok(Box::new(transport) as Box<dyn Transport>),
                None => Err(TraceError::Socket("transport already taken".into())),
            });
        factory
    }

    fn reporter() -> Reporter<Vec<u8>> {
        Reporter::new(Vec::new(), false)
    }

    #[test]
    fn test_probe_first_attempt_succeeds() -> Result<()> {
        let mut transport = MockTransport::new();
        transport
            .expect_send_probe()
            .with(eq(SocketAddrV4::new(TARGET, 33434)))
            .times(1)
            .returning(|_| Ok(0));
        transport.expect_recv_notification().times(1).returning(|| {
            Ok(Notification {
                sender: ROUTER,
                len: 56,
            })
        });

        let factory = factory_with(transport);
        let mut reporter = reporter();
        let outcome = probe(&factory, &mut reporter, &test_probe(), 3)?;

        assert!(
            matches!(outcome, ProbeOutcome::Reply { responder, .. } if responder == ROUTER)
        );
        assert!(reporter.into_inner().is_empty());
        Ok(())
    }

    #[test]
    fn test_probe_resends_after_timeout() -> Result<()> {
        let mut seq = Sequence::new();
        let mut transport = MockTransport::new();
        transport
            .expect_send_probe()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(0));
        transport
            .expect_recv_notification()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(TraceError::ReadTimeout));
        transport
            .expect_send_probe()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(0));
        transport
            .expect_recv_notification()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| {
                Ok(Notification {
                    sender: ROUTER,
                    len: 56,
                })
            });

        let factory = factory_with(transport);
        let mut reporter = reporter();
        let outcome = probe(&factory, &mut reporter, &test_probe(), 3)?;

        assert!(matches!(outcome, ProbeOutcome::Reply { .. }));
        assert_eq!(reporter.into_inner(), b"* ");
        Ok(())
    }

    #[test]
    fn test_probe_exhausts_attempts() -> Result<()> {
        let mut transport = MockTransport::new();
        transport.expect_send_probe().times(3).returning(|_| Ok(0));
        transport
            .expect_recv_notification()
            .times(3)
            .returning(|| Err(TraceError::ReadTimeout));

        let factory = factory_with(transport);
        let mut reporter = reporter();
        let outcome = probe(&factory, &mut reporter, &test_probe(), 3)?;

        assert_eq!(outcome, ProbeOutcome::Exhausted { attempts: 3 });
        assert_eq!(reporter.into_inner(), b"* * * ");
        Ok(())
    }

    #[test]
    fn test_probe_absorbs_channel_errors() -> Result<()> {
        let mut transport = MockTransport::new();
        transport
            .expect_send_probe()
            .times(2)
            .returning(|_| Err(TraceError::Io(std::io::Error::from(ErrorKind::ConnectionRefused))));

        let factory = factory_with(transport);
        let mut reporter = reporter();
        let outcome = probe(&factory, &mut reporter, &test_probe(), 2)?;

        assert_eq!(outcome, ProbeOutcome::Exhausted { attempts: 2 });
        assert_eq!(reporter.into_inner(), b"* * ");
        Ok(())
    }

    #[test]
    fn test_probe_open_failure_propagates() {
        let mut factory = MockTransportFactory::new();
        factory
            .expect_open()
            .times(1)
            .returning(|_, _, _| Err(TraceError::Privilege("no raw sockets".into())));

        let mut reporter = reporter();
        let result = probe(&factory, &mut reporter, &test_probe(), 3);
        assert!(matches!(result, Err(TraceError::Privilege(_))));
    }

    #[test]
    fn test_truncate_to_millis() {
        assert_eq!(
            truncate_to_millis(Duration::from_micros(12_999)),
            Duration::from_millis(12)
        );
    }
}
