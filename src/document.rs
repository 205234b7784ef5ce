//! Paginated slide documents
//!
//! The pipeline only needs two things from a document: how many pages it
//! has, and a raster image for page N. [`PageSource`] is that seam; the
//! shipped implementation reads a directory of pre-rendered page images
//! (one file per slide, ordered by file name).

use anyhow::Result;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors opening or rendering a slide document
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document path not found: {0}")]
    NotFound(PathBuf),
    #[error("document path is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("document contains no page images: {0}")]
    Empty(PathBuf),
    #[error("page index {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },
}

/// A paginated document that can render pages to raster images
pub trait PageSource {
    /// Total number of pages
    fn page_count(&self) -> usize;

    /// Render page `index` (0-based) to an RGBA image
    fn render_page(&self, index: usize) -> Result<RgbaImage>;
}

/// Raster file extensions accepted as page images
const PAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// A slide deck stored as a directory of page images
///
/// Pages are the image files directly inside the directory, sorted by
/// file name, so `page_01.png` .. `page_12.png` enumerate in deck order.
#[derive(Debug)]
pub struct ImageDirDocument {
    pages: Vec<PathBuf>,
}

impl ImageDirDocument {
    /// Open a slide directory, enumerating its page images
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        if !path.exists() {
            return Err(DocumentError::NotFound(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(DocumentError::NotADirectory(path.to_path_buf()));
        }

        let mut pages: Vec<PathBuf> = std::fs::read_dir(path)
            .map_err(|_| DocumentError::NotFound(path.to_path_buf()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && has_page_extension(p))
            .collect();
        pages.sort();

        if pages.is_empty() {
            return Err(DocumentError::Empty(path.to_path_buf()));
        }

        Ok(Self { pages })
    }
}

fn has_page_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            PAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

impl PageSource for ImageDirDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn render_page(&self, index: usize) -> Result<RgbaImage> {
        let path = self.pages.get(index).ok_or(DocumentError::PageOutOfRange {
            index,
            count: self.pages.len(),
        })?;
        Ok(image::open(path)?.to_rgba8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_page(dir: &Path, name: &str, w: u32, h: u32) {
        let img = RgbaImage::from_pixel(w, h, image::Rgba([40, 40, 40, 255]));
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_pages_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "page_02.png", 4, 4);
        write_page(dir.path(), "page_01.png", 8, 8);
        write_page(dir.path(), "page_03.png", 2, 2);
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let doc = ImageDirDocument::open(dir.path()).unwrap();
        assert_eq!(doc.page_count(), 3);
        // First page by name is the 8x8 one
        assert_eq!(doc.render_page(0).unwrap().width(), 8);
        assert_eq!(doc.render_page(2).unwrap().width(), 2);
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let err = ImageDirDocument::open(Path::new("/no/such/deck")).unwrap_err();
        assert!(matches!(err, DocumentError::NotFound(_)));
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageDirDocument::open(dir.path()).unwrap_err();
        assert!(matches!(err, DocumentError::Empty(_)));
    }

    #[test]
    fn test_page_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "only.png", 4, 4);
        let doc = ImageDirDocument::open(dir.path()).unwrap();
        assert!(doc.render_page(1).is_err());
    }
}
