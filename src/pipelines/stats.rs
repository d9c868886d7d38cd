use std::time::{Duration, Instant};

/// Timing statistics for one pipeline or batch run.
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total execution time.
    pub total_time: Duration,
    /// Number of items processed, failed ones included.
    pub items_processed: usize,
    /// Number of items that failed.
    pub items_failed: usize,
}

impl PipelineStats {
    /// Create a new stats tracker (call at start of operation).
    pub(crate) fn start() -> PipelineStatsBuilder {
        PipelineStatsBuilder {
            start_time: Instant::now(),
        }
    }

    /// Items processed per second, or 0 for an instantaneous run.
    pub fn items_per_second(&self) -> f64 {
        let secs = self.total_time.as_secs_f64();
        if secs > 0.0 {
            self.items_processed as f64 / secs
        } else {
            0.0
        }
    }
}

/// Tracks timing from creation to `finish`.
pub(crate) struct PipelineStatsBuilder {
    start_time: Instant,
}

impl PipelineStatsBuilder {
    /// Finalize stats with the number of items processed and failed.
    pub fn finish(self, items_processed: usize, items_failed: usize) -> PipelineStats {
        PipelineStats {
            total_time: self.start_time.elapsed(),
            items_processed,
            items_failed,
        }
    }

    #[cfg(test)]
    pub(crate) fn started_at(start_time: Instant) -> Self {
        Self { start_time }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calculates_timings_and_rate() {
        let start = Instant::now() - Duration::from_secs(2);
        let stats = PipelineStatsBuilder::started_at(start).finish(10, 1);

        assert_eq!(stats.items_processed, 10);
        assert_eq!(stats.items_failed, 1);
        assert!(stats.total_time >= Duration::from_secs(2));
        assert!(stats.items_per_second() > 0.0);
        assert!(stats.items_per_second() <= 5.0);
    }

    #[test]
    fn empty_run_has_zero_rate() {
        let stats = PipelineStats::default();
        assert_eq!(stats.items_per_second(), 0.0);
    }
}
