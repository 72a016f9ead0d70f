//! Pathtrace - hop-by-hop network path tracer
//!
//! This library discovers the routers between the local host and a remote
//! host by sending UDP probes with increasing TTL values and listening for
//! the ICMP notifications they provoke. Each hop can be sampled several
//! times to report round-trip times alongside the responder's reverse-DNS
//! name.

pub mod trace;
