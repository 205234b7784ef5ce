//! latex-regions - Annotate LaTeX regions in lecture slides
//!
//! Opens a slide viewer for drawing boxes around formulas while a
//! background worker watches the output directory and writes a
//! (simulated) recognition result next to every saved crop.

mod capture;
mod config;
mod document;
mod pipeline;
mod queue;
mod viewer;
mod worker;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::config::{PipelineConfig, WorkerConfig};

/// Annotate LaTeX regions in a deck of slide images
#[derive(Parser, Debug)]
#[command(name = "latex-regions")]
#[command(about = "Draw boxes around formulas in slides; a worker recognizes each crop")]
struct Args {
    /// Directory of rendered slide images, one file per page
    #[arg(default_value = "slides")]
    slides: PathBuf,

    /// Directory to store image crops and recognized .tex files
    #[arg(short, long, default_value = "latex_regions")]
    out: PathBuf,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    pipeline::run(PipelineConfig {
        document: args.slides,
        out_dir: args.out,
        worker: WorkerConfig::default(),
    })
}
