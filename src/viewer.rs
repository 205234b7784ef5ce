//! Slide viewer window
//!
//! Thin egui shell around [`CaptureSession`]: shows the current page,
//! draws the region rectangles, and translates mouse drags and key
//! presses into session events.
//!
//! Key bindings: click-drag draws a box, `u` undoes the last box,
//! `n`/space saves and advances, `b` saves and goes back one slide,
//! Esc quits.

use anyhow::Result;
use egui::{Color32, Key, Pos2, Rect, Rounding, Sense, Stroke, ViewportCommand};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::error;

use crate::capture::{CaptureSession, InputEvent, SessionStatus};
use crate::document::PageSource;

const REGION_STROKE: Stroke = Stroke {
    width: 2.0,
    color: Color32::from_rgb(0, 200, 0),
};

/// The annotation window
struct SlideViewer<D: PageSource> {
    session: CaptureSession<D>,
    /// Session failure handed back to the caller of [`run`]
    failure: Arc<Mutex<Option<anyhow::Error>>>,
    texture: Option<egui::TextureHandle>,
    texture_page: usize,
    /// Live pointer position while dragging, in image coordinates
    drag_pointer: Option<(i32, i32)>,
}

impl<D: PageSource> SlideViewer<D> {
    fn new(session: CaptureSession<D>, failure: Arc<Mutex<Option<anyhow::Error>>>) -> Self {
        Self {
            session,
            failure,
            texture: None,
            texture_page: 0,
            drag_pointer: None,
        }
    }

    /// Upload the current page as a texture when it changed
    fn page_texture(&mut self, ctx: &egui::Context) -> egui::TextureHandle {
        let cursor = self.session.page_cursor();
        if let Some(texture) = &self.texture {
            if self.texture_page == cursor {
                return texture.clone();
            }
        }
        let page = self.session.page_image();
        let size = [page.width() as usize, page.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, page.as_raw());
        let texture = ctx.load_texture("slide", color_image, Default::default());
        self.texture = Some(texture.clone());
        self.texture_page = cursor;
        texture
    }

    fn apply(&mut self, ctx: &egui::Context, event: InputEvent) {
        match self.session.handle_event(event) {
            Ok(SessionStatus::Active) => {}
            Ok(SessionStatus::Finished) => ctx.send_viewport_cmd(ViewportCommand::Close),
            Err(err) => {
                error!("capture session failed: {err:#}");
                *self.failure.lock() = Some(err);
                ctx.send_viewport_cmd(ViewportCommand::Close);
            }
        }
    }

    fn key_events(ctx: &egui::Context) -> Vec<InputEvent> {
        let mut events = Vec::new();
        ctx.input(|i| {
            if i.key_pressed(Key::U) {
                events.push(InputEvent::Undo);
            }
            if i.key_pressed(Key::N) || i.key_pressed(Key::Space) {
                events.push(InputEvent::Advance);
            }
            if i.key_pressed(Key::B) {
                events.push(InputEvent::Retreat);
            }
            if i.key_pressed(Key::Escape) || i.viewport().close_requested() {
                events.push(InputEvent::Quit);
            }
        });
        events
    }
}

/// Image-coordinate point for a pointer position over the slide
fn image_pos(pos: Pos2, origin: Pos2) -> (i32, i32) {
    (
        (pos.x - origin.x).round() as i32,
        (pos.y - origin.y).round() as i32,
    )
}

fn region_rect(origin: Pos2, a: (i32, i32), b: (i32, i32)) -> Rect {
    let p1 = Pos2::new(origin.x + a.0 as f32, origin.y + a.1 as f32);
    let p2 = Pos2::new(origin.x + b.0 as f32, origin.y + b.1 as f32);
    Rect::from_two_pos(p1, p2)
}

impl<D: PageSource> eframe::App for SlideViewer<D> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.session.is_finished() {
            ctx.send_viewport_cmd(ViewportCommand::Close);
            return;
        }

        ctx.send_viewport_cmd(ViewportCommand::Title(format!(
            "Slide Viewer - ({} / {})",
            self.session.page_cursor() + 1,
            self.session.page_count()
        )));

        let mut events = Self::key_events(ctx);
        let texture = self.page_texture(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both().show(ui, |ui| {
                let size = texture.size_vec2();
                let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());
                let painter = ui.painter_at(rect);

                painter.image(
                    texture.id(),
                    rect,
                    Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(1.0, 1.0)),
                    Color32::WHITE,
                );

                // Committed boxes on this page
                for region in self.session.regions() {
                    painter.rect_stroke(
                        region_rect(rect.min, region.start, region.end),
                        Rounding::ZERO,
                        REGION_STROKE,
                    );
                }

                // Mouse drag -> session events
                let pointer = response.interact_pointer_pos();
                if response.drag_started() {
                    if let Some(pos) = pointer {
                        let (x, y) = image_pos(pos, rect.min);
                        self.drag_pointer = Some((x, y));
                        events.push(InputEvent::DragStart { x, y });
                    }
                }
                if response.dragged() {
                    if let Some(pos) = pointer {
                        self.drag_pointer = Some(image_pos(pos, rect.min));
                    }
                }
                if response.drag_stopped() {
                    if let Some(pos) = pointer {
                        let (x, y) = image_pos(pos, rect.min);
                        events.push(InputEvent::DragEnd { x, y });
                    }
                    self.drag_pointer = None;
                }

                // Rubber band for the in-progress drag
                if let (Some(origin), Some(current)) =
                    (self.session.drag_origin(), self.drag_pointer)
                {
                    painter.rect_stroke(
                        region_rect(rect.min, origin, current),
                        Rounding::ZERO,
                        REGION_STROKE,
                    );
                }
            });
        });

        for event in events {
            self.apply(ctx, event);
            if self.session.is_finished() {
                break;
            }
        }
    }
}

/// Run the annotation window until the session finishes
///
/// Blocks on the GUI event loop; a failure inside the session is
/// re-raised here after the window closes.
pub fn run<D: PageSource + 'static>(session: CaptureSession<D>) -> Result<()> {
    let failure: Arc<Mutex<Option<anyhow::Error>>> = Arc::new(Mutex::new(None));
    let slot = failure.clone();

    let page = session.page_image();
    let size = [
        (page.width() as f32).clamp(480.0, 1400.0),
        (page.height() as f32).clamp(360.0, 900.0),
    ];
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(size)
            .with_title("Slide Viewer"),
        ..Default::default()
    };

    eframe::run_native(
        "Slide Viewer",
        options,
        Box::new(move |_cc| Ok(Box::new(SlideViewer::new(session, slot)))),
    )
    .map_err(|e| anyhow::anyhow!("slide viewer failed: {e}"))?;

    let result = failure.lock().take();
    match result {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
