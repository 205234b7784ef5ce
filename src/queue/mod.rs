//! Directory-backed work queue
//!
//! The output directory is the only coordination channel between the
//! annotation GUI (producer) and the recognition worker (consumer). A
//! crop is *pending* while its `.png` exists and no `.tex` with the same
//! stem exists; writing the `.tex` marks it done. There is no other
//! ledger.

pub mod fs;

pub use fs::FsQueue;

use anyhow::Result;

/// Extension of crop item files
pub const CROP_EXT: &str = "png";
/// Extension of recognition result files
pub const RESULT_EXT: &str = "tex";

/// File stem for the crop of page `page_index` (0-based) with draw-order
/// sequence number `seq` (1-based)
///
/// Stems are stable across runs: re-annotating a page overwrites the
/// same names rather than inventing new ones.
pub fn crop_stem(page_index: usize, seq: usize) -> String {
    format!("slide_{:03}_crop_{}", page_index + 1, seq)
}

/// Polling interface the recognition worker runs against
///
/// Claiming is advisory: `list_pending` does not lock or rename items,
/// which is only sound with a single worker instance per queue.
pub trait WorkQueue {
    /// Whether the queue's backing storage exists yet
    fn ready(&self) -> bool;

    /// Stems of items that have a crop but no result
    fn list_pending(&self) -> Result<Vec<String>>;

    /// Persist the recognition result for `stem`, marking it done
    ///
    /// Must be atomic from a reader's perspective: no reader may ever
    /// observe a truncated result file.
    fn mark_done(&self, stem: &str, text: &str) -> Result<()>;

    /// Stems of items that already have a result
    fn list_done(&self) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_stem_is_one_based_and_zero_padded() {
        assert_eq!(crop_stem(0, 1), "slide_001_crop_1");
        assert_eq!(crop_stem(1, 2), "slide_002_crop_2");
        assert_eq!(crop_stem(99, 12), "slide_100_crop_12");
    }
}
