//! Interactive region capture session
//!
//! The per-page annotation loop, kept apart from any window toolkit: the
//! viewer (or a test script) feeds [`InputEvent`]s in and the session
//! maintains the page cursor, the region stack, and crop persistence.

use anyhow::{Context, Result};
use image::imageops;
use image::RgbaImage;
use tracing::{debug, info};

use crate::capture::Region;
use crate::document::PageSource;
use crate::queue::{crop_stem, FsQueue};

/// One interaction on the current page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Mouse press: start of a drag, in image pixel coordinates
    DragStart { x: i32, y: i32 },
    /// Mouse release: end of a drag, appends a region
    DragEnd { x: i32, y: i32 },
    /// Remove the most recently drawn region
    Undo,
    /// Save this page's crops and move forward one page
    Advance,
    /// Save this page's crops and move back one page
    Retreat,
    /// Abandon the current page's regions and end the session
    Quit,
}

/// Whether the session is still accepting events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Finished,
}

/// Source of interaction events, pulled by [`CaptureSession::run`]
pub trait EventSource {
    /// Next event, or `None` when the source is exhausted
    fn next_event(&mut self) -> Option<InputEvent>;
}

/// Per-page annotation state over a paginated document
pub struct CaptureSession<D: PageSource> {
    document: D,
    queue: FsQueue,
    cursor: usize,
    page: RgbaImage,
    regions: Vec<Region>,
    drag_origin: Option<(i32, i32)>,
    finished: bool,
}

impl<D: PageSource> CaptureSession<D> {
    /// Start a session at the first page
    pub fn new(document: D, queue: FsQueue) -> Result<Self> {
        let finished = document.page_count() == 0;
        let page = if finished {
            RgbaImage::new(1, 1)
        } else {
            document.render_page(0).context("rendering first page")?
        };
        Ok(Self {
            document,
            queue,
            cursor: 0,
            page,
            regions: Vec::new(),
            drag_origin: None,
            finished,
        })
    }

    /// Current page index (0-based)
    pub fn page_cursor(&self) -> usize {
        self.cursor
    }

    /// Total page count of the document
    pub fn page_count(&self) -> usize {
        self.document.page_count()
    }

    /// Rendered image of the current page
    pub fn page_image(&self) -> &RgbaImage {
        &self.page
    }

    /// Regions drawn on the current page, in draw order
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Start point of an in-progress drag, if any
    pub fn drag_origin(&self) -> Option<(i32, i32)> {
        self.drag_origin
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Apply one event to the session
    pub fn handle_event(&mut self, event: InputEvent) -> Result<SessionStatus> {
        if self.finished {
            return Ok(SessionStatus::Finished);
        }
        match event {
            InputEvent::DragStart { x, y } => {
                self.drag_origin = Some((x, y));
            }
            InputEvent::DragEnd { x, y } => {
                if let Some(start) = self.drag_origin.take() {
                    self.regions.push(Region::new(start, (x, y)));
                }
            }
            InputEvent::Undo => {
                // Strict stack discipline; undo on an empty page is a no-op
                self.regions.pop();
            }
            InputEvent::Advance => {
                self.commit_page()?;
                self.cursor += 1;
                if self.cursor >= self.document.page_count() {
                    self.finished = true;
                } else {
                    self.load_page()?;
                }
            }
            InputEvent::Retreat => {
                self.commit_page()?;
                // Clamped at the first page: commit happened, cursor stays
                if self.cursor > 0 {
                    self.cursor -= 1;
                }
                self.load_page()?;
            }
            InputEvent::Quit => {
                // Uncommitted regions on the current page are dropped
                self.finished = true;
            }
        }
        Ok(self.status())
    }

    /// Drive the session from an event source until it finishes
    ///
    /// An exhausted source ends the session like a quit: the current
    /// page's uncommitted regions are dropped.
    pub fn run<E: EventSource>(&mut self, events: &mut E) -> Result<()> {
        while !self.finished {
            match events.next_event() {
                Some(event) => {
                    self.handle_event(event)?;
                }
                None => {
                    self.finished = true;
                }
            }
        }
        Ok(())
    }

    fn status(&self) -> SessionStatus {
        if self.finished {
            SessionStatus::Finished
        } else {
            SessionStatus::Active
        }
    }

    /// Persist every non-degenerate region on the current page as a crop
    ///
    /// Sequence numbers follow draw order and are assigned before the
    /// degeneracy check, so two runs drawing the same regions produce
    /// the same names.
    fn commit_page(&mut self) -> Result<()> {
        let (width, height) = (self.page.width(), self.page.height());
        for (i, region) in self.regions.iter().enumerate() {
            let stem = crop_stem(self.cursor, i + 1);
            let Some(rect) = region.clamped(width, height) else {
                debug!("skipping degenerate region {stem}");
                continue;
            };
            let crop =
                imageops::crop_imm(&self.page, rect.x, rect.y, rect.width, rect.height).to_image();
            let file_name = self.queue.save_crop(&stem, &crop)?;
            info!("saved {file_name}");
        }
        self.regions.clear();
        self.drag_origin = None;
        Ok(())
    }

    fn load_page(&mut self) -> Result<()> {
        self.page = self
            .document
            .render_page(self.cursor)
            .with_context(|| format!("rendering page {}", self.cursor + 1))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    /// Fixed-size blank pages, no files involved
    struct BlankDeck {
        pages: usize,
        width: u32,
        height: u32,
    }

    impl PageSource for BlankDeck {
        fn page_count(&self) -> usize {
            self.pages
        }

        fn render_page(&self, _index: usize) -> Result<RgbaImage> {
            Ok(RgbaImage::from_pixel(
                self.width,
                self.height,
                image::Rgba([255, 255, 255, 255]),
            ))
        }
    }

    fn session_in(dir: &Path, pages: usize) -> CaptureSession<BlankDeck> {
        let deck = BlankDeck {
            pages,
            width: 100,
            height: 80,
        };
        CaptureSession::new(deck, FsQueue::new(dir)).unwrap()
    }

    fn drag(session: &mut CaptureSession<BlankDeck>, start: (i32, i32), end: (i32, i32)) {
        session
            .handle_event(InputEvent::DragStart {
                x: start.0,
                y: start.1,
            })
            .unwrap();
        session
            .handle_event(InputEvent::DragEnd { x: end.0, y: end.1 })
            .unwrap();
    }

    fn crops_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_commit_persists_only_non_degenerate_regions() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path(), 2);

        drag(&mut session, (10, 10), (40, 40));
        drag(&mut session, (50, 50), (50, 70)); // zero width, discarded
        drag(&mut session, (60, 10), (90, 30));
        session.handle_event(InputEvent::Advance).unwrap();

        // Sequence numbers follow draw order, skipping the degenerate one
        assert_eq!(
            crops_in(dir.path()),
            vec!["slide_001_crop_1.png", "slide_001_crop_3.png"]
        );
    }

    #[test]
    fn test_undo_is_a_strict_stack() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path(), 1);

        drag(&mut session, (0, 0), (10, 10));
        drag(&mut session, (20, 20), (30, 30));
        session.handle_event(InputEvent::Undo).unwrap();
        assert_eq!(session.regions().len(), 1);
        assert_eq!(session.regions()[0].start, (0, 0));

        session.handle_event(InputEvent::Undo).unwrap();
        // Undo on an empty page is a no-op
        session.handle_event(InputEvent::Undo).unwrap();
        assert!(session.regions().is_empty());
        assert_eq!(session.page_cursor(), 0);
    }

    #[test]
    fn test_retreat_clamps_at_first_page_but_still_commits() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path(), 3);

        drag(&mut session, (5, 5), (25, 25));
        session.handle_event(InputEvent::Retreat).unwrap();

        assert_eq!(session.page_cursor(), 0);
        assert!(session.regions().is_empty());
        assert_eq!(crops_in(dir.path()), vec!["slide_001_crop_1.png"]);
    }

    #[test]
    fn test_advance_past_last_page_ends_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path(), 2);

        session.handle_event(InputEvent::Advance).unwrap();
        let status = session.handle_event(InputEvent::Advance).unwrap();
        assert_eq!(status, SessionStatus::Finished);
        assert!(session.is_finished());
    }

    #[test]
    fn test_quit_drops_uncommitted_regions() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path(), 3);

        drag(&mut session, (10, 10), (40, 40));
        session.handle_event(InputEvent::Advance).unwrap();

        // Page 2: drawn but abandoned
        drag(&mut session, (10, 10), (40, 40));
        session.handle_event(InputEvent::Quit).unwrap();

        assert_eq!(crops_in(dir.path()), vec!["slide_001_crop_1.png"]);
    }

    #[test]
    fn test_identical_runs_produce_identical_names() {
        let dir = tempfile::tempdir().unwrap();
        for _ in 0..2 {
            let mut session = session_in(dir.path(), 1);
            drag(&mut session, (10, 10), (40, 40));
            drag(&mut session, (50, 10), (80, 40));
            session.handle_event(InputEvent::Advance).unwrap();
        }
        // Second run overwrote the first, no error, no extra files
        assert_eq!(
            crops_in(dir.path()),
            vec!["slide_001_crop_1.png", "slide_001_crop_2.png"]
        );
    }

    #[test]
    fn test_drag_end_without_start_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path(), 1);
        session
            .handle_event(InputEvent::DragEnd { x: 5, y: 5 })
            .unwrap();
        assert!(session.regions().is_empty());
    }

    #[test]
    fn test_crop_pixels_match_rectangle() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path(), 1);

        // Dragged bottom-right to top-left, partly out of bounds
        drag(&mut session, (120, 60), (70, -10));
        session.handle_event(InputEvent::Advance).unwrap();

        let crop = image::open(dir.path().join("slide_001_crop_1.png")).unwrap();
        assert_eq!((crop.width(), crop.height()), (30, 60));
    }
}
