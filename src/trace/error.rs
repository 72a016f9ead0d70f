use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not resolve {host}: {reason}")]
    Resolution { host: String, reason: String },

    #[error("Timed out waiting for a notification")]
    ReadTimeout,

    #[error("Could not trace route in {max_hops} hops")]
    RouteExhausted { max_hops: u8 },

    #[error("Insufficient privilege: {0}")]
    Privilege(String),

    #[error("Socket error: {0}")]
    Socket(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Statistics error: {0}")]
    Statistics(String),
}

impl TraceError {
    /// Returns true for errors that abort the walk instead of being absorbed
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TraceError::ReadTimeout | TraceError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, TraceError>;
