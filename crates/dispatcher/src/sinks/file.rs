//! FileSink - writes bundles to disk with folder structure

use contracts::{BundleSink, ContractError, EpochBundle};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::path::PathBuf;
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Base output directory
    pub base_path: PathBuf,

    /// Create a timestamped run directory under base_path
    pub timestamped_runs: bool,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));

        let timestamped_runs = params
            .get("timestamped_runs")
            .map(|v| v == "true")
            .unwrap_or(true);

        Self {
            base_path,
            timestamped_runs,
        }
    }
}

/// Sink that writes bundles to disk files
///
/// Layout: `<run_dir>/bundles/<epoch>.json` and `<run_dir>/meta/<epoch>.json`.
pub struct FileSink {
    name: String,
    run_dir: PathBuf,
    created_dirs: HashSet<PathBuf>,
}

impl FileSink {
    /// Create a new FileSink
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        let run_dir = if config.timestamped_runs {
            let stamp = chrono::Local::now().format("run_%Y%m%d_%H%M%S");
            config.base_path.join(stamp.to_string())
        } else {
            config.base_path.clone()
        };

        fs::create_dir_all(&run_dir)?;

        Ok(Self {
            name: name.into(),
            run_dir,
            created_dirs: HashSet::new(),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params);
        Self::new(name, config)
    }

    /// Directory the sink writes into
    pub fn run_dir(&self) -> &PathBuf {
        &self.run_dir
    }

    fn ensure_dir(&mut self, dir: PathBuf) -> std::io::Result<PathBuf> {
        if !self.created_dirs.contains(&dir) {
            fs::create_dir_all(&dir)?;
            self.created_dirs.insert(dir.clone());
        }
        Ok(dir)
    }

    fn write_bundle_to_disk(&mut self, bundle: &EpochBundle) -> std::io::Result<()> {
        let epoch_id = bundle.epoch_id;

        let bundle_dir = self.ensure_dir(self.run_dir.join("bundles"))?;
        let bundle_file = File::create(bundle_dir.join(format!("{}.json", epoch_id)))?;
        serde_json::to_writer(bundle_file, bundle)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let meta_dir = self.ensure_dir(self.run_dir.join("meta"))?;
        let meta_file = File::create(meta_dir.join(format!("{}.json", epoch_id)))?;
        serde_json::to_writer(meta_file, &bundle.meta)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        Ok(())
    }

    fn persist_bundle(&mut self, bundle: &EpochBundle) -> Result<(), ContractError> {
        self.write_bundle_to_disk(bundle).map_err(|e| {
            error!(sink = %self.name, epoch_id = bundle.epoch_id, error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }
}

impl BundleSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, bundle),
        fields(sink = %self.name, epoch_id = bundle.epoch_id)
    )]
    async fn write(&mut self, bundle: &EpochBundle) -> Result<(), ContractError> {
        self.persist_bundle(bundle)?;
        Ok(())
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}
