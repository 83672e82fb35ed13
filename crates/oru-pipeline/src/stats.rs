//! Counters reported by the pipeline and the producer

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Statistics for one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    /// Messages read from the source
    pub received: usize,
    /// Documents inserted into the store
    pub stored: usize,
    /// Messages dropped because they had no header
    pub malformed: usize,
    /// Inserts that failed
    pub store_failures: usize,
    /// Observation occurrences skipped across all stored messages
    pub skipped_occurrences: usize,
    /// Failed polls
    pub source_errors: usize,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages that did not end up in the store
    pub fn dropped(&self) -> usize {
        self.malformed + self.store_failures
    }
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} received, {} stored", self.received, self.stored)?;
        if self.malformed > 0 {
            write!(f, ", {} malformed", self.malformed)?;
        }
        if self.store_failures > 0 {
            write!(f, ", {} store failures", self.store_failures)?;
        }
        if self.skipped_occurrences > 0 {
            write!(f, ", {} observations skipped", self.skipped_occurrences)?;
        }
        if self.source_errors > 0 {
            write!(f, ", {} source errors", self.source_errors)?;
        }
        Ok(())
    }
}

/// Statistics for one producer run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProduceStats {
    /// Files found in the input directory
    pub files: usize,
    /// Delivery reports that confirmed a publish
    pub delivered: usize,
    /// Delivery reports that carried an error
    pub failed: usize,
    /// Reports still outstanding when the flush timed out
    pub unreported: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl ProduceStats {
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.unreported == 0
    }
}

impl fmt::Display for ProduceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} files, {} delivered", self.files, self.delivered)?;
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        if self.unreported > 0 {
            write!(f, ", {} unreported", self.unreported)?;
        }
        write!(f, " in {:.2}s", self.elapsed.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_stats_display() {
        let stats = PipelineStats {
            received: 5,
            stored: 3,
            malformed: 1,
            store_failures: 1,
            skipped_occurrences: 2,
            source_errors: 0,
        };
        assert_eq!(
            stats.to_string(),
            "5 received, 3 stored, 1 malformed, 1 store failures, 2 observations skipped"
        );
        assert_eq!(stats.dropped(), 2);
        assert_eq!(PipelineStats::new().to_string(), "0 received, 0 stored");
    }

    #[test]
    fn test_produce_stats_display() {
        let stats = ProduceStats {
            files: 3,
            delivered: 2,
            failed: 1,
            unreported: 0,
            elapsed: Duration::from_millis(1500),
        };
        assert_eq!(stats.to_string(), "3 files, 2 delivered, 1 failed in 1.50s");
        assert!(!stats.is_success());
    }
}
