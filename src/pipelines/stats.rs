use std::time::{Duration, Instant};

/// Statistics for one review prediction.
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// Total execution time (tokenize + forward + post-processing).
    pub total_time: Duration,
    /// Number of non-padding tokens fed to the encoder.
    pub tokens: usize,
}

impl PipelineStats {
    /// Create a new stats tracker (call at start of operation).
    pub(crate) fn start() -> PipelineStatsBuilder {
        PipelineStatsBuilder {
            start_time: Instant::now(),
        }
    }

    /// Total time in milliseconds.
    pub fn total_ms(&self) -> f64 {
        self.total_time.as_secs_f64() * 1000.0
    }
}

/// Builder for PipelineStats - tracks timing from creation to finish.
pub(crate) struct PipelineStatsBuilder {
    start_time: Instant,
}

impl PipelineStatsBuilder {
    /// Finalize stats with the number of tokens processed.
    pub fn finish(self, tokens: usize) -> PipelineStats {
        PipelineStats {
            total_time: self.start_time.elapsed(),
            tokens,
        }
    }
}
