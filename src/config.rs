//! Runtime configuration
//!
//! Settings for the pipeline and the simulated recognition worker.
//! There is no config file: everything is set from the CLI or the
//! defaults below, and the queue directory is the only persisted state.

use std::path::PathBuf;
use std::time::Duration;

/// Settings for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Slide deck to annotate: a directory of rendered page images
    pub document: PathBuf,
    /// Queue directory where crops and recognized .tex files are stored
    pub out_dir: PathBuf,
    /// Worker timing
    pub worker: WorkerConfig,
}

/// Timing for the simulated recognition worker
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Granularity at which the worker polls the stop signal
    pub tick: Duration,
    /// Number of ticks one simulated recognition takes
    pub ticks_per_item: u32,
    /// Wait between scan passes that found no pending work
    pub idle_wait: Duration,
    /// Wait while the queue directory does not exist yet
    pub missing_dir_wait: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(100),
            ticks_per_item: 30,
            idle_wait: Duration::from_secs(1),
            missing_dir_wait: Duration::from_secs(2),
        }
    }
}

impl WorkerConfig {
    /// Duration of one full simulated recognition
    pub fn recognition_time(&self) -> Duration {
        self.tick * self.ticks_per_item
    }
}
