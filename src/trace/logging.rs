use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured logging with an explicit level and format
///
/// `RUST_LOG` takes precedence over `level` when it is set.
/// Examples:
/// - `RUST_LOG=info` - Info level and above
/// - `RUST_LOG=pathtrace=debug` - Debug level for pathtrace only
///
/// Output goes to stderr so stdout carries nothing but the hop lines.
pub fn init_logging_with_config(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_line_number(true)
                    .with_file(true),
            )
            .init();
    }
}
