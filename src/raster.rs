use eframe::egui::{self, Color32, Pos2};
use image::{Rgba, RgbaImage};

// ── Pixel Primitives ────────────────────────────────────────────────────────

/// Alpha-blend `color` scaled by `coverage` over the pixel at (`x`, `y`).
fn blend_pixel(img: &mut RgbaImage, x: u32, y: u32, color: Color32, coverage: f32) {
    let coverage = coverage.clamp(0.0, 1.0) * color.a() as f32 / 255.0;
    if coverage <= 0.0 {
        return;
    }
    let dst = img.get_pixel(x, y).0;
    let mix = |src: u8, dst: u8| {
        (src as f32 * coverage + dst as f32 * (1.0 - coverage))
            .round()
            .clamp(0.0, 255.0) as u8
    };
    let alpha = (255.0 * coverage + dst[3] as f32 * (1.0 - coverage))
        .round()
        .clamp(0.0, 255.0) as u8;
    img.put_pixel(
        x,
        y,
        Rgba([
            mix(color.r(), dst[0]),
            mix(color.g(), dst[1]),
            mix(color.b(), dst[2]),
            alpha,
        ]),
    );
}

fn draw_disc(img: &mut RgbaImage, center: Pos2, radius: f32, color: Color32) {
    if radius <= 0.0 {
        return;
    }
    let radius_sq = radius * radius;
    let width = img.width() as i32;
    let height = img.height() as i32;
    let min_x = (center.x - radius).floor().max(0.0) as i32;
    let max_x = (center.x + radius).ceil().min((width - 1) as f32) as i32;
    let min_y = (center.y - radius).floor().max(0.0) as i32;
    let max_y = (center.y + radius).ceil().min((height - 1) as f32) as i32;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = x as f32 + 0.5 - center.x;
            let dy = y as f32 + 0.5 - center.y;
            if dx * dx + dy * dy <= radius_sq {
                blend_pixel(img, x as u32, y as u32, color, 1.0);
            }
        }
    }
}

/// Draw a round-capped line by stamping discs along it.
///
/// Pure function of its inputs: the same segment always lands on the same
/// pixels, which is what lets a full redraw match incremental drawing.
pub fn draw_line(img: &mut RgbaImage, from: Pos2, to: Pos2, color: Color32, thickness: f32) {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as i32;
    let radius = (thickness / 2.0).max(0.5);
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        draw_disc(img, Pos2::new(from.x + dx * t, from.y + dy * t), radius, color);
    }
}

// ── Text ────────────────────────────────────────────────────────────────────

/// A vector font for rasterizing text into an image, taken from egui's
/// bundled proportional font so both surfaces use the same face.
#[derive(Clone)]
pub struct GlyphFont {
    font: ab_glyph::FontArc,
    tweak: egui::FontTweak,
}

impl GlyphFont {
    pub fn from_egui_defaults() -> Option<Self> {
        let definitions = egui::FontDefinitions::default();
        let family = definitions.families.get(&egui::FontFamily::Proportional)?;
        let name = family.first()?;
        let data = definitions.font_data.get(name)?;
        let font = ab_glyph::FontVec::try_from_vec_and_index(data.font.to_vec(), data.index)
            .map(ab_glyph::FontArc::from)
            .ok()?;
        Some(Self {
            font,
            tweak: data.tweak,
        })
    }

    /// Draw `text` with its top-left corner at `pos`.
    pub fn draw(&self, img: &mut RgbaImage, pos: Pos2, text: &str, color: Color32, size: f32) {
        use ab_glyph::{point, Font, ScaleFont};

        let scaled = self.font.as_scaled(size * self.tweak.scale);
        let mut caret = point(pos.x, pos.y + scaled.ascent() + self.tweak.y_offset * size);
        let (w, h) = (img.width() as i32, img.height() as i32);
        for ch in text.chars() {
            let mut glyph = scaled.scaled_glyph(ch);
            glyph.position = caret;
            caret.x += scaled.h_advance(glyph.id);
            let Some(outlined) = scaled.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|x, y, coverage| {
                let px = x as i32 + bounds.min.x as i32;
                let py = y as i32 + bounds.min.y as i32;
                if px >= 0 && py >= 0 && px < w && py < h {
                    blend_pixel(img, px as u32, py as u32, color, coverage);
                }
            });
        }
    }
}

// ── Contrast ────────────────────────────────────────────────────────────────

/// Stretch contrast around the image's mean luma.
///
/// Each channel becomes `mean + factor * (value - mean)`, clamped, where
/// `mean` is the rounded average of `L = (299 R + 587 G + 114 B) / 1000`.
/// A factor of 1.0 returns the image unchanged. Alpha is preserved.
pub fn enhance_contrast(img: &RgbaImage, factor: f32) -> RgbaImage {
    let pixel_count = (img.width() as u64 * img.height() as u64).max(1);
    let luma_sum: u64 = img
        .pixels()
        .map(|p| (p[0] as u64 * 299 + p[1] as u64 * 587 + p[2] as u64 * 114) / 1000)
        .sum();
    let mean = (luma_sum as f64 / pixel_count as f64 + 0.5).floor() as f32;

    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        for channel in pixel.0.iter_mut().take(3) {
            let value = mean + factor * (*channel as f32 - mean);
            *channel = value.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 255]))
    }

    #[test]
    fn line_covers_both_endpoints() {
        let mut img = blank(50, 50);
        draw_line(&mut img, Pos2::new(10.0, 10.0), Pos2::new(40.0, 30.0), Color32::WHITE, 5.0);
        assert_eq!(img.get_pixel(10, 10).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(40, 30).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(45, 5).0, [0, 0, 0, 255]);
    }

    #[test]
    fn line_outside_image_is_clipped() {
        let mut img = blank(10, 10);
        draw_line(&mut img, Pos2::new(-20.0, -20.0), Pos2::new(-5.0, 40.0), Color32::WHITE, 5.0);
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn contrast_leaves_uniform_image_alone() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([90, 90, 90, 255]));
        assert_eq!(enhance_contrast(&img, 2.0), img);
    }

    #[test]
    fn contrast_pushes_values_away_from_mean() {
        // Two pixels: black and gray 100 -> mean luma 50.
        let mut img = blank(2, 1);
        img.put_pixel(1, 0, Rgba([100, 100, 100, 255]));
        let out = enhance_contrast(&img, 2.0);
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(out.get_pixel(1, 0).0, [150, 150, 150, 255]);
    }

    #[test]
    fn contrast_clamps_to_channel_range() {
        let mut img = blank(4, 1);
        img.put_pixel(3, 0, Rgba([255, 255, 255, 255]));
        let out = enhance_contrast(&img, 2.0);
        assert_eq!(out.get_pixel(3, 0).0, [255, 255, 255, 255]);
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn text_marks_pixels_in_its_color() {
        let Some(font) = GlyphFont::from_egui_defaults() else {
            return;
        };
        let mut img = blank(200, 80);
        let green = Color32::from_rgb(0x11, 0xff, 0x00);
        font.draw(&mut img, Pos2::new(5.0, 5.0), "42", green, 40.0);
        assert!(img.pixels().any(|p| p.0 == [0x11, 0xff, 0x00, 255]));
    }
}
