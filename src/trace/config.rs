use crate::trace::constants::*;
use crate::trace::error::{Result, TraceError};
use clap::Parser;
use std::time::Duration;
use tracing::debug;

#[derive(Parser, Debug, Clone)]
#[command(name = "pathtrace")]
#[command(about = "Trace the network path to a host one TTL at a time")]
pub struct Config {
    /// Host name or IPv4 address to trace
    pub host: String,

    /// Maximum number of hops to probe
    #[arg(long, default_value_t = DEFAULT_MAX_HOPS)]
    pub max_hops: u8,

    /// Per-attempt read timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Destination port for probe datagrams
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Local port for the notification channel (defaults to --port)
    #[arg(long)]
    pub rx_port: Option<u16>,

    /// Read attempts per probe before the probe is abandoned
    #[arg(long, default_value_t = DEFAULT_ATTEMPTS)]
    pub attempts: u32,

    /// RTT samples taken per hop
    #[arg(long, default_value_t = DEFAULT_SAMPLES)]
    pub samples: u32,

    /// Print min/mean/max RTT per hop once the walk finishes
    #[arg(long)]
    pub summary: bool,

    /// Disable coloured banner and summary lines
    #[arg(long)]
    pub no_color: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Log format (text or json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub log_format: String,
}

/// Immutable probing parameters derived from a validated [`Config`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceSettings {
    pub max_hops: u8,
    pub rx_timeout: Duration,
    pub dst_port: u16,
    pub rx_port: u16,
    pub attempts_per_probe: u32,
    pub sample_count: u32,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
            rx_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            dst_port: DEFAULT_PORT,
            rx_port: DEFAULT_PORT,
            attempts_per_probe: DEFAULT_ATTEMPTS,
            sample_count: DEFAULT_SAMPLES,
        }
    }
}

impl Config {
    /// Returns the configured timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validates the configuration values
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");
        if self.host.trim().is_empty() {
            return Err(TraceError::Config("host must not be empty".into()));
        }
        if self.max_hops == 0 {
            return Err(TraceError::Config("max_hops must be > 0".into()));
        }
        if self.timeout_ms == 0 {
            return Err(TraceError::Config("timeout must be > 0".into()));
        }
        if self.attempts == 0 {
            return Err(TraceError::Config("attempts must be > 0".into()));
        }
        if self.samples == 0 {
            return Err(TraceError::Config("samples must be > 0".into()));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(TraceError::Config(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }
        debug!("Configuration validated successfully");
        Ok(())
    }

    /// Returns true if JSON format logging is enabled
    pub fn is_json_format(&self) -> bool {
        self.log_format.to_lowercase() == "json"
    }

    /// Builds the probing parameters used by the walker
    pub fn settings(&self) -> TraceSettings {
        TraceSettings {
            max_hops: self.max_hops,
            rx_timeout: self.timeout(),
            dst_port: self.port,
            rx_port: self.rx_port.unwrap_or(self.port),
            attempts_per_probe: self.attempts,
            sample_count: self.samples,
        }
    }
}
