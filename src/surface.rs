use crate::config::InkStyle;
use crate::raster::{self, GlyphFont};
use eframe::egui::{self, Pos2, Vec2};
use image::{Rgba, RgbaImage};

/// Visual identifier of a line on the on-screen canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SegmentId(u64);

// ── Visible Canvas ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct CanvasLine {
    pub id: SegmentId,
    pub from: Pos2,
    pub to: Pos2,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CanvasLabel {
    /// Center of the text.
    pub center: Pos2,
    pub text: String,
}

/// Retained display list for the on-screen canvas. Coordinates are canvas
/// local; the shell translates them when painting.
#[derive(Debug, Default)]
pub struct Canvas {
    lines: Vec<CanvasLine>,
    labels: Vec<CanvasLabel>,
    next_id: u64,
}

impl Canvas {
    pub fn add_line(&mut self, from: Pos2, to: Pos2) -> SegmentId {
        let id = SegmentId(self.next_id);
        self.next_id += 1;
        self.lines.push(CanvasLine { id, from, to });
        id
    }

    /// Put a line back under an id it was given earlier.
    pub fn restore_line(&mut self, id: SegmentId, from: Pos2, to: Pos2) {
        self.lines.push(CanvasLine { id, from, to });
    }

    pub fn remove(&mut self, id: SegmentId) {
        self.lines.retain(|line| line.id != id);
    }

    pub fn add_label(&mut self, center: Pos2, text: &str) {
        self.labels.push(CanvasLabel {
            center,
            text: text.to_string(),
        });
    }

    /// Delete every line and label. Ids are never reused.
    pub fn wipe(&mut self) {
        self.lines.clear();
        self.labels.clear();
    }

    pub fn lines(&self) -> &[CanvasLine] {
        &self.lines
    }

    pub fn labels(&self) -> &[CanvasLabel] {
        &self.labels
    }

    pub fn paint(&self, painter: &egui::Painter, origin: Pos2, style: &InkStyle) {
        let offset = origin.to_vec2();
        let stroke = egui::Stroke::new(style.stroke_width, style.stroke);
        for line in self.lines() {
            painter.line_segment([line.from + offset, line.to + offset], stroke);
        }
        for label in self.labels() {
            painter.text(
                label.center + offset,
                egui::Align2::CENTER_CENTER,
                &label.text,
                egui::FontId::proportional(style.font_size),
                style.answer,
            );
        }
    }
}

// ── Raster Surface ──────────────────────────────────────────────────────────

/// Off-screen bitmap mirroring the canvas; this is what gets exported for
/// recognition.
pub struct RasterSurface {
    image: RgbaImage,
    style: InkStyle,
    font: Option<GlyphFont>,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32, style: InkStyle) -> Self {
        let font = GlyphFont::from_egui_defaults();
        if font.is_none() {
            tracing::warn!("no font available, answers will not be drawn on the raster");
        }
        Self {
            image: Self::blank_image(width, height, &style),
            style,
            font,
        }
    }

    fn blank_image(width: u32, height: u32, style: &InkStyle) -> RgbaImage {
        let [r, g, b, _] = style.background.to_array();
        RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255]))
    }

    /// A fresh blank bitmap of the same size and style.
    pub fn blank(&self) -> RgbaImage {
        Self::blank_image(self.image.width(), self.image.height(), &self.style)
    }

    pub fn line(&mut self, from: Pos2, to: Pos2) {
        raster::draw_line(
            &mut self.image,
            from,
            to,
            self.style.stroke,
            self.style.stroke_width,
        );
    }

    pub fn text(&mut self, top_left: Pos2, text: &str) {
        if let Some(font) = &self.font {
            font.draw(
                &mut self.image,
                top_left,
                text,
                self.style.answer,
                self.style.font_size,
            );
        }
    }

    pub fn wipe(&mut self) {
        self.image = self.blank();
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    #[cfg(test)]
    pub fn is_blank(&self) -> bool {
        self.image == self.blank()
    }
}

// ── Both Surfaces ───────────────────────────────────────────────────────────

/// Extra lift applied to answer text on the raster relative to the canvas
/// anchor, since the raster places text by its top-left corner.
pub const RASTER_TEXT_LIFT: Vec2 = Vec2::new(0.0, -50.0);

/// The on-screen canvas and the raster surface, drawn in lockstep.
pub struct Surfaces {
    pub canvas: Canvas,
    pub raster: RasterSurface,
}

impl Surfaces {
    pub fn new(width: u32, height: u32, style: InkStyle) -> Self {
        Self {
            canvas: Canvas::default(),
            raster: RasterSurface::new(width, height, style),
        }
    }

    pub fn draw_segment(&mut self, from: Pos2, to: Pos2) -> SegmentId {
        self.raster.line(from, to);
        self.canvas.add_line(from, to)
    }

    pub fn redraw_segment(&mut self, id: SegmentId, from: Pos2, to: Pos2) {
        self.raster.line(from, to);
        self.canvas.restore_line(id, from, to);
    }

    /// Draw answer text centered on `anchor` on screen, and lifted by
    /// [`RASTER_TEXT_LIFT`] on the raster.
    pub fn draw_answer(&mut self, anchor: Pos2, text: &str) {
        self.canvas.add_label(anchor, text);
        self.raster.text(anchor + RASTER_TEXT_LIFT, text);
    }

    pub fn wipe(&mut self) {
        self.canvas.wipe();
        self.raster.wipe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_ids_are_unique_across_wipes() {
        let mut canvas = Canvas::default();
        let a = canvas.add_line(Pos2::ZERO, Pos2::new(1.0, 1.0));
        canvas.wipe();
        let b = canvas.add_line(Pos2::ZERO, Pos2::new(1.0, 1.0));
        assert_ne!(a, b);
        assert_eq!(canvas.lines().len(), 1);
    }

    #[test]
    fn canvas_remove_only_drops_matching_line() {
        let mut canvas = Canvas::default();
        let a = canvas.add_line(Pos2::ZERO, Pos2::new(1.0, 0.0));
        let b = canvas.add_line(Pos2::ZERO, Pos2::new(0.0, 1.0));
        canvas.remove(a);
        assert_eq!(canvas.lines().len(), 1);
        assert_eq!(canvas.lines()[0].id, b);
    }

    #[test]
    fn new_raster_is_background_colored() {
        let raster = RasterSurface::new(20, 10, InkStyle::default());
        assert!(raster.is_blank());
        assert!(raster.image().pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn segment_lands_on_both_surfaces() {
        let mut surfaces = Surfaces::new(40, 40, InkStyle::default());
        surfaces.draw_segment(Pos2::new(5.0, 5.0), Pos2::new(30.0, 5.0));
        assert_eq!(surfaces.canvas.lines().len(), 1);
        assert!(!surfaces.raster.is_blank());
        surfaces.wipe();
        assert!(surfaces.canvas.lines().is_empty());
        assert!(surfaces.raster.is_blank());
    }

    #[test]
    fn answer_label_is_placed_on_anchor() {
        let mut surfaces = Surfaces::new(200, 200, InkStyle::default());
        surfaces.draw_answer(Pos2::new(120.0, 150.0), "4");
        assert_eq!(
            surfaces.canvas.labels(),
            &[CanvasLabel {
                center: Pos2::new(120.0, 150.0),
                text: "4".to_string(),
            }]
        );
    }
}
