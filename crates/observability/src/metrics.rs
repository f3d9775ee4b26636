//! Epoch metrics collection.
//!
//! Collects and aggregates aggregation-engine metrics from `EpochMeta`.

use contracts::EpochMeta;
use metrics::{counter, gauge, histogram};

/// Record metrics from an emitted bundle's EpochMeta.
///
/// Call once per emitted `EpochBundle`.
///
/// # Example
///
/// ```ignore
/// use observability::record_epoch_metrics;
///
/// if let Some(bundle) = engine.tick(now) {
///     record_epoch_metrics(&bundle.meta, bundle.epoch_id);
///     // ...
/// }
/// ```
pub fn record_epoch_metrics(meta: &EpochMeta, epoch_id: u64) {
    counter!("fleet_epoch_bundles_total").increment(1);

    // Epoch id (detects skipped epochs)
    gauge!("fleet_epoch_last_epoch_id").set(epoch_id as f64);

    // Slot fill state at emission
    gauge!("fleet_epoch_expected_ranges").set(meta.expected_ranges as f64);
    gauge!("fleet_epoch_neighbor_count").set(meta.neighbor_count as f64);

    // Drop counters
    if meta.dropped_unknown_id > 0 {
        counter!("fleet_epoch_unknown_id_dropped_total")
            .increment(meta.dropped_unknown_id as u64);
    }
    if meta.dropped_unrecognized_edge > 0 {
        counter!("fleet_epoch_unrecognized_edge_dropped_total")
            .increment(meta.dropped_unrecognized_edge as u64);
    }

    // Overwrites (fast feeds racing the tick)
    if meta.overwrites > 0 {
        counter!("fleet_epoch_overwrites_total").increment(meta.overwrites as u64);
    }
    histogram!("fleet_epoch_overwrites_per_epoch").record(meta.overwrites as f64);
}

/// Record an observation received from a feed.
pub fn record_observation_received(source_id: &str, kind: &str) {
    counter!(
        "fleet_epoch_observations_received_total",
        "source_id" => source_id.to_string(),
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Record an incomplete tick with its fill counts.
pub fn record_incomplete_tick(filled_ranges: usize, filled_poses: usize, filled_controls: usize) {
    counter!("fleet_epoch_incomplete_ticks_total").increment(1);
    gauge!("fleet_epoch_filled_ranges").set(filled_ranges as f64);
    gauge!("fleet_epoch_filled_poses").set(filled_poses as f64);
    gauge!("fleet_epoch_filled_controls").set(filled_controls as f64);
}

/// Record a bundle dispatch to a sink.
pub fn record_bundle_dispatched(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "fleet_epoch_bundles_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record epoch latency (oldest buffered observation to emission).
pub fn record_epoch_latency_ms(latency_ms: f64) {
    histogram!("fleet_epoch_latency_ms").record(latency_ms);
}

/// Epoch metrics aggregator
///
/// Aggregates metrics in memory for end-of-run summaries.
#[derive(Debug, Clone, Default)]
pub struct EpochMetricsAggregator {
    /// Total bundles emitted
    pub total_bundles: u64,

    /// Observations dropped for unknown ids
    pub total_unknown_id: u64,

    /// Range observations dropped for unrecognized edges
    pub total_unrecognized_edge: u64,

    /// Bundles that saw at least one in-epoch overwrite
    pub bundles_with_overwrites: u64,

    /// Overwrite count statistics
    pub overwrite_stats: RunningStats,

    /// Inter-emission spacing statistics (epoch ids are dense, so this
    /// tracks bundle timestamps handed in by the caller)
    pub spacing_stats: RunningStats,

    /// Last bundle timestamp seen
    last_timestamp: Option<f64>,
}

impl EpochMetricsAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Update aggregate statistics from one emitted bundle.
    pub fn update(&mut self, meta: &EpochMeta, timestamp: f64) {
        self.total_bundles += 1;
        self.total_unknown_id += meta.dropped_unknown_id as u64;
        self.total_unrecognized_edge += meta.dropped_unrecognized_edge as u64;

        if meta.overwrites > 0 {
            self.bundles_with_overwrites += 1;
        }
        self.overwrite_stats.push(meta.overwrites as f64);

        if let Some(last) = self.last_timestamp {
            self.spacing_stats.push(((timestamp - last) * 1000.0).abs());
        }
        self.last_timestamp = Some(timestamp);
    }

    /// Produce a summary report.
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_bundles: self.total_bundles,
            total_unknown_id: self.total_unknown_id,
            total_unrecognized_edge: self.total_unrecognized_edge,
            bundles_with_overwrites: self.bundles_with_overwrites,
            overwrite_rate: if self.total_bundles > 0 {
                self.bundles_with_overwrites as f64 / self.total_bundles as f64 * 100.0
            } else {
                0.0
            },
            overwrites: StatsSummary::from(&self.overwrite_stats),
            spacing_ms: StatsSummary::from(&self.spacing_stats),
        }
    }

    /// Reset all statistics.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_bundles: u64,
    pub total_unknown_id: u64,
    pub total_unrecognized_edge: u64,
    pub bundles_with_overwrites: u64,
    pub overwrite_rate: f64,
    pub overwrites: StatsSummary,
    pub spacing_ms: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Epoch Metrics Summary ===")?;
        writeln!(f, "Total bundles: {}", self.total_bundles)?;
        writeln!(f, "Unknown-id drops: {}", self.total_unknown_id)?;
        writeln!(
            f,
            "Unrecognized-edge drops: {}",
            self.total_unrecognized_edge
        )?;
        writeln!(
            f,
            "Bundles with overwrites: {} ({:.2}%)",
            self.bundles_with_overwrites, self.overwrite_rate
        )?;
        writeln!(f, "Overwrites per bundle: {}", self.overwrites)?;
        writeln!(f, "Emission spacing (ms): {}", self.spacing_ms)?;

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a new value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum
    pub fn max(&self) -> f64 {
        self.max
    }
}
