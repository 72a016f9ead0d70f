use crate::trace::constants::NOTIFICATION_BUFFER_SIZE;
use crate::trace::error::{Result, TraceError};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io::{self, ErrorKind};
use std::mem::MaybeUninit;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;
use tracing::{debug, warn};

/// An ICMP notification read from the inbound channel.
///
/// Only the sender is extracted; the payload is not inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notification {
    pub sender: Ipv4Addr,
    pub len: usize,
}

/// One outbound probe channel paired with one inbound notification channel.
///
/// A pair lives for exactly one probe; both channels are released when the
/// value is dropped.
pub trait Transport {
    /// Send a zero-length probe datagram with the pair's TTL
    fn send_probe(&mut self, dst: SocketAddrV4) -> Result<usize>;

    /// Block for at most the pair's read timeout waiting for a notification
    fn recv_notification(&mut self) -> Result<Notification>;
}

/// Opens a fresh [`Transport`] for each probe.
pub trait TransportFactory {
    fn open(&self, ttl: u8, rx_timeout: Duration, rx_port: u16) -> Result<Box<dyn Transport>>;
}

/// Raw-socket implementation: UDP out, ICMP in
#[derive(Debug)]
pub struct SocketTransport {
    tx: Socket,
    rx: Socket,
    ttl: u8,
}

impl SocketTransport {
    /// Create the outbound UDP channel with its TTL fixed
    fn open_tx(ttl: u8) -> Result<Socket> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).map_err(|e| {
            warn!(error = %e, "Failed to create probe socket");
            TraceError::Socket(format!("Failed to create probe socket: {}", e))
        })?;
        socket.set_ttl(u32::from(ttl)).map_err(|e| {
            warn!(error = %e, ttl = ttl, "Failed to set TTL");
            TraceError::Socket(format!("Failed to set TTL {}: {}", ttl, e))
        })?;
        Ok(socket)
    }

    /// Create the inbound raw ICMP channel bound to `rx_port`
    fn open_rx(rx_timeout: Duration, rx_port: u16) -> Result<Socket> {
        let socket = open_raw_icmp()?;
        socket.set_read_timeout(Some(rx_timeout)).map_err(|e| {
            warn!(error = %e, "Failed to set read timeout");
            TraceError::Socket(format!("Failed to set timeout: {}", e))
        })?;
        let local = SocketAddr::from((Ipv4Addr::UNSPECIFIED, rx_port));
        socket.bind(&SockAddr::from(local)).map_err(|e| {
            warn!(error = %e, rx_port = rx_port, "Failed to bind notification socket");
            TraceError::Socket(format!("Failed to bind to {}: {}", local, e))
        })?;
        Ok(socket)
    }
}

impl Transport for SocketTransport {
    fn send_probe(&mut self, dst: SocketAddrV4) -> Result<usize> {
        let bytes_sent = self
            .tx
            .send_to(&[], &SockAddr::from(SocketAddr::V4(dst)))
            .map_err(|e| {
                warn!(error = %e, dst = %dst, "Failed to send probe");
                TraceError::Io(e)
            })?;
        debug!(dst = %dst, ttl = self.ttl, "Probe sent");
        Ok(bytes_sent)
    }

    fn recv_notification(&mut self) -> Result<Notification> {
        let mut buf = [MaybeUninit::<u8>::uninit(); NOTIFICATION_BUFFER_SIZE];
        let (len, addr) = self.rx.recv_from(&mut buf).map_err(classify_recv_error)?;
        let sender = addr.as_socket_ipv4().map(|a| *a.ip()).ok_or_else(|| {
            TraceError::Io(io::Error::new(
                ErrorKind::InvalidData,
                "notification from a non-IPv4 sender",
            ))
        })?;
        debug!(sender = %sender, bytes_received = len, "Notification received");
        Ok(Notification { sender, len })
    }
}

impl Drop for SocketTransport {
    fn drop(&mut self) {
        debug!(ttl = self.ttl, "Transport pair released");
    }
}

/// Factory for [`SocketTransport`] pairs.
///
/// Construction fails with [`TraceError::Privilege`] when the process cannot
/// open raw ICMP sockets, so missing privilege surfaces before any probing.
#[derive(Debug)]
pub struct SocketTransportFactory {
    _private: (),
}

impl SocketTransportFactory {
    pub fn new() -> Result<Self> {
        debug!("Checking raw socket privilege");
        drop(open_raw_icmp()?);
        debug!("Raw socket privilege available");
        Ok(Self { _private: () })
    }
}

impl TransportFactory for SocketTransportFactory {
    fn open(&self, ttl: u8, rx_timeout: Duration, rx_port: u16) -> Result<Box<dyn Transport>> {
        let tx = SocketTransport::open_tx(ttl)?;
        let rx = SocketTransport::open_rx(rx_timeout, rx_port)?;
        debug!(
            ttl = ttl,
            timeout_ms = rx_timeout.as_millis(),
            rx_port = rx_port,
            "Transport pair opened"
        );
        Ok(Box::new(SocketTransport { tx, rx, ttl }))
    }
}

fn open_raw_icmp() -> Result<Socket> {
    Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4)).map_err(classify_open_error)
}

/// Map a failed raw socket creation to `Privilege` when access was refused.
fn classify_open_error(e: io::Error) -> TraceError {
    match e.kind() {
        ErrorKind::PermissionDenied => {
            TraceError::Privilege("raw ICMP sockets require root or CAP_NET_RAW".to_string())
        }
        _ => {
            warn!(error = %e, "Failed to create notification socket");
            TraceError::Socket(format!("Failed to create raw ICMP socket: {}", e))
        }
    }
}

/// Map a failed read to `ReadTimeout` when the timeout elapsed.
///
/// Unix reports an expired `SO_RCVTIMEO` as `WouldBlock`, Windows as `TimedOut`.
fn classify_recv_error(e: io::Error) -> TraceError {
    match e.kind() {
        ErrorKind::WouldBlock | ErrorKind::TimedOut => TraceError::ReadTimeout,
        _ => {
            debug!(error = %e, "Failed to receive notification");
            TraceError::Io(e)
        }
    }
}


#[cfg(test)]
pub use tests::{MockTransport, MockTransportFactory};
