use crate::trace::constants::*;
use crate::trace::error::{Result, TraceError};
use hdrhistogram::Histogram;
use std::time::Duration;
use tracing::{debug, warn};

/// RTT statistics for one hop, recorded in microseconds
pub struct Statistics {
    hist: Histogram<u64>,
    real_min: u64,
    real_max: u64,
    clamped_count: usize,
}

impl Statistics {
    /// Create a new Statistics instance from RTT samples
    pub fn new(samples: &[Duration]) -> Result<Self> {
        debug!(sample_count = samples.len(), "Creating statistics from RTT samples");
        let mut hist = Histogram::<u64>::new_with_bounds(
            HISTOGRAM_LOW_BOUND_US,
            HISTOGRAM_HIGH_BOUND_US,
            HISTOGRAM_SIGNIFICANT_DIGITS,
        )
        .map_err(|e| TraceError::Statistics(format!("Failed to create histogram: {}", e)))?;

        let mut real_min = u64::MAX;
        let mut real_max = 0;
        let mut clamped_count = 0;

        for sample in samples {
            let micros = u64::try_from(sample.as_micros()).unwrap_or(u64::MAX);
            real_min = real_min.min(micros);
            real_max = real_max.max(micros);

            let clamped = micros.clamp(HISTOGRAM_LOW_BOUND_US, HISTOGRAM_HIGH_BOUND_US);
            if micros != clamped {
                clamped_count += 1;
            }

            hist.record(clamped).map_err(|e| {
                warn!(rtt_us = micros, error = %e, "Failed to record RTT");
                TraceError::Statistics(format!("Failed to record RTT: {}", e))
            })?;
        }

        Ok(Self {
            hist,
            real_min: if real_min == u64::MAX { 0 } else { real_min },
            real_max,
            clamped_count,
        })
    }

    /// Mean RTT in microseconds
    pub fn mean(&self) -> f64 {
        self.hist.mean()
    }

    /// Minimum RTT in microseconds (unclamped)
    pub fn min(&self) -> u64 {
        self.real_min
    }

    /// Maximum RTT in microseconds (unclamped)
    pub fn max(&self) -> u64 {
        self.real_max
    }

    pub fn percentile(&self, quantile: f64) -> u64 {
        self.hist.value_at_quantile(quantile)
    }

    /// Number of samples that fell outside the histogram bounds
    pub fn clamped_count(&self) -> usize {
        self.clamped_count
    }
}
