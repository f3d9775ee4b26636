//! Pipeline statistics and metrics.

use std::time::Duration;

use observability::EpochMetricsAggregator;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total epoch bundles emitted
    pub epochs_emitted: u64,

    /// Total observations received from feeds
    pub observations_received: u64,

    /// Ticks that found the epoch buffer incomplete
    pub incomplete_ticks: u64,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Number of feeds that were active
    pub active_feeds: usize,

    /// Number of sinks that received bundles
    pub active_sinks: usize,

    /// Aggregation engine metrics aggregator
    pub epoch_metrics: EpochMetricsAggregator,
}

impl PipelineStats {
    /// Calculate epochs per second throughput
    pub fn eps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.epochs_emitted as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Fraction of ticks that emitted nothing, as percentage
    #[allow(dead_code)]
    pub fn incomplete_rate(&self) -> f64 {
        let total = self.epochs_emitted + self.incomplete_ticks;
        if total > 0 {
            (self.incomplete_ticks as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Pipeline Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Epochs emitted: {}", self.epochs_emitted);
        println!("   ├─ Observations received: {}", self.observations_received);
        println!("   ├─ Incomplete ticks: {}", self.incomplete_ticks);
        println!("   ├─ Epochs/s: {:.2}", self.eps());
        println!("   ├─ Active feeds: {}", self.active_feeds);
        println!("   └─ Active sinks: {}", self.active_sinks);

        let summary = self.epoch_metrics.summary();

        println!("\n📈 Aggregation Metrics");
        println!("   ├─ Unknown-id drops: {}", summary.total_unknown_id);
        println!(
            "   ├─ Unrecognized-edge drops: {}",
            summary.total_unrecognized_edge
        );
        println!(
            "   ├─ Bundles with overwrites: {} ({:.2}%)",
            summary.bundles_with_overwrites, summary.overwrite_rate
        );
        println!("   ├─ Overwrites per bundle: {}", summary.overwrites);
        println!("   └─ Emission spacing (ms): {}", summary.spacing_ms);

        println!();
    }
}
