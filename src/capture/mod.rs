//! Region capture
//!
//! Interactive annotation of slide pages: region geometry and the
//! per-page session state machine the viewer drives.

pub mod region;
pub mod session;

pub use region::{CropRect, Region};
pub use session::{CaptureSession, EventSource, InputEvent, SessionStatus};
