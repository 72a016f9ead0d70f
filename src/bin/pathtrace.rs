use anyhow::{Context, Result};
use clap::Parser;
use pathtrace::trace::{
    init_logging_with_config, walk, Config, NameResolver, Reporter, SocketTransportFactory,
    SystemResolver, TraceError, TransportFactory,
};
use std::io::{self, Write};
use tracing::{error, info};

fn main() {
    let config = Config::parse();

    init_logging_with_config(&config.log_level, config.is_json_format());

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(&config) {
        std::process::exit(report_failure(&e));
    }
}

/// Log a failed run and return the process exit status.
///
/// An exhausted route has already printed its failure line on stdout, so it
/// only sets the status.
fn report_failure(e: &anyhow::Error) -> i32 {
    if !matches!(
        e.downcast_ref::<TraceError>(),
        Some(TraceError::RouteExhausted { .. })
    ) {
        error!(error = %e, "Trace failed");
        eprintln!("Error: {:#}", e);
    }
    1
}

fn run(config: &Config) -> Result<()> {
    if config.no_color {
        colored::control::set_override(false);
    }

    let factory = SocketTransportFactory::new()
        .context("Cannot open the ICMP notification channel")?;
    trace(&factory, &SystemResolver, config, io::stdout().lock())
}

fn trace<F, R, W>(factory: &F, resolver: &R, config: &Config, out: W) -> Result<()>
where
    F: TransportFactory,
    R: NameResolver,
    W: Write,
{
    let settings = config.settings();
    let mut reporter = Reporter::new(out, !config.no_color);

    let route = walk(factory, resolver, &mut reporter, &config.host, &settings)?;

    if config.summary {
        reporter.summary(&route)?;
    }

    let route = route.ensure_reached(settings.max_hops)?;
    info!(
        destination = %route.destination,
        hops = route.hops.len(),
        "Trace completed"
    );
    Ok(())
}
