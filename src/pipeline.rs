//! Pipeline orchestration
//!
//! Validates inputs, starts the recognition worker, runs the annotation
//! session, and guarantees the worker is signalled and joined on every
//! exit path, including a failing session.

use anyhow::{bail, Result};
use tracing::info;

use crate::capture::CaptureSession;
use crate::config::PipelineConfig;
use crate::document::{ImageDirDocument, PageSource};
use crate::queue::FsQueue;
use crate::{viewer, worker};

/// Run the full annotate-and-recognize pipeline
pub fn run(config: PipelineConfig) -> Result<()> {
    // Configuration errors are fatal before any worker starts
    if !config.document.exists() {
        bail!("document path not found: {}", config.document.display());
    }
    let document = ImageDirDocument::open(&config.document)?;
    let queue = FsQueue::create(&config.out_dir)?;
    info!(
        "annotating {} ({} pages) into {}",
        config.document.display(),
        document.page_count(),
        config.out_dir.display()
    );

    let session = CaptureSession::new(document, queue.clone())?;

    // The handle's Drop also cancels and joins, so the worker is
    // released even if the viewer panics.
    let worker = worker::spawn(queue, config.worker.clone());
    let result = viewer::run(session);
    worker.shutdown();

    info!("all done");
    result
}
