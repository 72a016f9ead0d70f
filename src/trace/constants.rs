//! Constants used throughout the tracer

/// Default maximum number of hops before giving up
pub const DEFAULT_MAX_HOPS: u8 = 30;

/// Default per-attempt read timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 4000;

/// Conventional traceroute destination port
pub const DEFAULT_PORT: u16 = 33434;

/// Default number of read attempts per probe
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Default number of RTT samples per hop
pub const DEFAULT_SAMPLES: u32 = 3;

/// Size of the buffer used to read one notification
pub const NOTIFICATION_BUFFER_SIZE: usize = 512;

/// Histogram lower bound in microseconds
pub const HISTOGRAM_LOW_BOUND_US: u64 = 1;

/// Histogram upper bound in microseconds
pub const HISTOGRAM_HIGH_BOUND_US: u64 = 600_000_000;

/// Histogram significant digits for precision
pub const HISTOGRAM_SIGNIFICANT_DIGITS: u8 = 3;
