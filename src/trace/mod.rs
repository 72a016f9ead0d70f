//! Probe engine and route walker for Pathtrace

pub mod config;
pub mod constants;
pub mod error;
pub mod hop;
pub mod logging;
pub mod prober;
pub mod reporter;
pub mod resolver;
pub mod statistics;
pub mod transport;
pub mod walker;

pub use config::{Config, TraceSettings};
pub use constants::*;
pub use error::{Result, TraceError};
pub use hop::{measure_hop, HopOutcome, HopReport};
pub use logging::init_logging_with_config;
pub use prober::{probe, Probe, ProbeOutcome};
pub use reporter::Reporter;
pub use resolver::{NameResolver, SystemResolver};
pub use statistics::Statistics;
pub use transport::{Notification, SocketTransportFactory, Transport, TransportFactory};
pub use walker::{walk, RouteResult, RouteState, WalkState};
