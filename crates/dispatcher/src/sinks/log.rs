//! LogSink - logs bundle summary via tracing

use contracts::{BundleSink, ContractError, EpochBundle};
use tracing::{info, instrument};

/// Sink that logs bundle summaries for debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_bundle_summary(&self, bundle: &EpochBundle) {
        info!(
            sink = %self.name,
            epoch_id = bundle.epoch_id,
            agent = %bundle.agent,
            timestamp = bundle.timestamp,
            ranges = bundle.ranges.len(),
            poses = bundle.poses.len(),
            controls = bundle.controls.len(),
            overwrites = bundle.meta.overwrites,
            "EpochBundle received"
        );
    }
}

impl BundleSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, bundle),
        fields(sink = %self.name, epoch_id = bundle.epoch_id)
    )]
    async fn write(&mut self, bundle: &EpochBundle) -> Result<(), ContractError> {
        self.log_bundle_summary(bundle);
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{AgentId, EpochMeta};

    #[tokio::test]
    async fn test_log_sink_write() {
        let mut sink = LogSink::new("test_log");
        let bundle = EpochBundle {
            agent: AgentId::new(0),
            epoch_id: 1,
            timestamp: 1.0,
            ranges: Vec::new(),
            poses: Vec::new(),
            controls: Vec::new(),
            meta: EpochMeta::default(),
        };

        let result = sink.write(&bundle).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_log_sink_name() {
        let sink = LogSink::new("my_logger");
        assert_eq!(sink.name(), "my_logger");
    }
}
