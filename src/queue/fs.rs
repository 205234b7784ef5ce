//! Filesystem implementation of the work queue

use anyhow::{Context, Result};
use image::RgbaImage;
use std::path::{Path, PathBuf};

use crate::queue::{WorkQueue, CROP_EXT, RESULT_EXT};

/// Work queue backed by a single directory of crop and result files
#[derive(Debug, Clone)]
pub struct FsQueue {
    root: PathBuf,
}

impl FsQueue {
    /// Wrap an existing (or not-yet-existing) queue directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Wrap a queue directory, creating it (and parents) if missing
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("creating queue directory {}", root.display()))?;
        Ok(Self { root })
    }

    /// Queue directory path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist a crop image under `stem`, returning the file name
    ///
    /// Overwrites any previous crop with the same stem; re-annotating a
    /// previously visited page re-saves under identical names.
    pub fn save_crop(&self, stem: &str, crop: &RgbaImage) -> Result<String> {
        let file_name = format!("{stem}.{CROP_EXT}");
        let path = self.root.join(&file_name);
        crop.save(&path)
            .with_context(|| format!("saving crop {}", path.display()))?;
        Ok(file_name)
    }

    /// Stems of every file in the queue directory with extension `ext`
    fn stems_with_extension(&self, ext: &str) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("reading queue directory {}", self.root.display()))?;

        let mut stems = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ext) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                stems.push(stem.to_string());
            }
        }
        Ok(stems)
    }

    fn result_path(&self, stem: &str) -> PathBuf {
        self.root.join(format!("{stem}.{RESULT_EXT}"))
    }
}

impl WorkQueue for FsQueue {
    fn ready(&self) -> bool {
        self.root.is_dir()
    }

    fn list_pending(&self) -> Result<Vec<String>> {
        // Directory enumeration order; results are independent per
        // item so no order is promised.
        let stems = self.stems_with_extension(CROP_EXT)?;
        Ok(stems
            .into_iter()
            .filter(|stem| !self.result_path(stem).exists())
            .collect())
    }

    fn mark_done(&self, stem: &str, text: &str) -> Result<()> {
        // Write to a temp name and rename so no reader can observe a
        // partially written result.
        let tmp = self.root.join(format!("{stem}.{RESULT_EXT}.tmp"));
        let path = self.result_path(stem);
        std::fs::write(&tmp, format!("{text}\n"))
            .with_context(|| format!("writing result {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("publishing result {}", path.display()))?;
        Ok(())
    }

    fn list_done(&self) -> Result<Vec<String>> {
        self.stems_with_extension(RESULT_EXT)
    }
}
