use crate::trace::error::Result;
use crate::trace::hop::{HopOutcome, HopReport};
use crate::trace::statistics::Statistics;
use crate::trace::walker::RouteResult;
use colored::*;
use std::io::Write;
use tracing::{debug, warn};

/// Line-oriented status stream.
///
/// Every write is flushed immediately so hop progress is visible while the
/// next probe is still waiting.
pub struct Reporter<W: Write> {
    out: W,
    color: bool,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    /// Consume the reporter and return the underlying sink
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    pub fn banner(&mut self, host: &str) -> Result<()> {
        let line = format!("----> Traceroute for {} <----", host);
        let line = if self.color {
            line.cyan().bold().to_string()
        } else {
            line
        };
        self.emit(&format!("{}\n", line))
    }

    /// Hop number prefix, written before the first probe of a TTL
    pub fn hop_start(&mut self, ttl: u8) -> Result<()> {
        self.emit(&format!(" {} ", ttl))
    }

    /// One failed attempt
    pub fn retry_marker(&mut self) -> Result<()> {
        self.emit("* ")
    }

    /// Finish the current hop line
    pub fn hop_end(&mut self, outcome: &HopOutcome) -> Result<()> {
        match outcome {
            HopOutcome::Responded(report) => self.emit(&format!("{}\n", format_hop(report))),
            HopOutcome::Silent { .. } => self.emit("\n"),
        }
    }

    pub fn success(&mut self, hops: u8) -> Result<()> {
        let line = format!("-----> SUCCESS: Done in {} hops <-----", hops);
        let line = if self.color {
            line.green().bold().to_string()
        } else {
            line
        };
        self.emit(&format!("{}\n", line))
    }

    pub fn failure(&mut self, max_hops: u8) -> Result<()> {
        let line = format!("----> ERROR: Could not trace route in {} hops <----", max_hops);
        let line = if self.color {
            line.red().bold().to_string()
        } else {
            line
        };
        self.emit(&format!("{}\n", line))
    }

    /// Per-hop RTT table, printed after the walk when requested
    pub fn summary(&mut self, route: &RouteResult) -> Result<()> {
        debug!(hops = route.hops.len(), "Printing RTT summary");
        self.emit(&format!(
            "\nRTT summary for {} ({}), in ms:\n",
            route.host, route.destination
        ))?;
        self.emit(&format!(
            "  {:>3}  {:<40} {:>8} {:>8} {:>8} {:>8}\n",
            "hop", "host", "min", "median", "mean", "max"
        ))?;

        let mut clamped = 0usize;
        for outcome in &route.hops {
            let line = match outcome {
                HopOutcome::Responded(report) => {
                    let stats = Statistics::new(&report.rtts)?;
                    clamped += stats.clamped_count();
                    format!(
                        "  {:>3}  {:<40} {:>8.1} {:>8.1} {:>8.1} {:>8.1}\n",
                        report.ttl,
                        truncate(&report.name, 40),
                        stats.min() as f64 / 1000.0,
                        stats.percentile(0.5) as f64 / 1000.0,
                        stats.mean() / 1000.0,
                        stats.max() as f64 / 1000.0,
                    )
                }
                HopOutcome::Silent { ttl } => format!("  {:>3}  {:<40}\n", ttl, "*"),
            };
            self.emit(&line)?;
        }

        if clamped > 0 {
            warn!(clamped_count = clamped, "Some RTT samples were clamped to histogram bounds");
            self.emit(&format!(
                "  Note: {} sample(s) exceeded histogram bounds and were clamped\n",
                clamped
            ))?;
        }
        Ok(())
    }
}

/// Formats a responding hop as `name (address) [t1ms|t2ms|...]`
pub fn format_hop(report: &HopReport) -> String {
    let timings: Vec<String> = report
        .rtts
        .iter()
        .map(|rtt| format!("{}ms", rtt.as_millis()))
        .collect();
    format!(
        "{} ({}) [{}]",
        report.name,
        report.responder,
        timings.join("|")
    )
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
        short.push('~');
        short
    }
}
