use std::path::Path;
use image::{Rgb, RgbImage};
use rusttype::{point, Font, Scale};
use crate::errors::{AppError, Result};

pub const TEXT_COLOUR: Rgb<u8> = Rgb([255, 255, 255]);
pub const SHADOW_COLOUR: Rgb<u8> = Rgb([0, 0, 0]);

pub fn load_font(path: &Path) -> Result<Font<'static>> {
    let bytes = std::fs::read(path)
        .map_err(|e| AppError::Font(format!("{}: {}", path.display(), e)))?;
    Font::try_from_vec(bytes).ok_or_else(|| AppError::Font(format!("{}: not a usable font", path.display())))
}

/// Rendered `(width, height)` of `text`; height is ascent minus descent.
pub fn text_size(font: &Font<'static>, px: f32, text: &str) -> (f32, f32) {
    let scale = Scale::uniform(px);
    let v_metrics = font.v_metrics(scale);
    let height = (v_metrics.ascent - v_metrics.descent).max(1.0);
    if text.is_empty() {
        return (0.0, height);
    }

    let width = font
        .layout(text, scale, point(0.0, v_metrics.ascent))
        .filter_map(|glyph| glyph.pixel_bounding_box())
        .map(|bb| bb.max.x as f32)
        .fold(0.0_f32, f32::max);
    (width, height)
}

/// Draws `text` with its baseline at `y`, alpha-blending into the canvas.
pub fn draw_text(canvas: &mut RgbImage, font: &Font<'static>, px: f32, x: f32, y: f32, colour: Rgb<u8>, text: &str) {
    let scale = Scale::uniform(px);

    for glyph in font.layout(text, scale, point(x, y)) {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, v| {
            let px = gx as i32 + bb.min.x;
            let py = gy as i32 + bb.min.y;
            if px < 0 || py < 0 {
                return;
            }
            let (px, py) = (px as u32, py as u32);
            if px >= canvas.width() || py >= canvas.height() {
                return;
            }
            let alpha = v.clamp(0.0, 1.0);
            if alpha == 0.0 {
                return;
            }
            let dst = canvas.get_pixel_mut(px, py);
            for channel in 0..3 {
                dst.0[channel] = (colour.0[channel] as f32 * alpha + dst.0[channel] as f32 * (1.0 - alpha)) as u8;
            }
        });
    }
}

/// Shadow at (+1, +1) in black, then the text in white.
pub fn draw_text_with_shadow(canvas: &mut RgbImage, font: &Font<'static>, px: f32, x: f32, y: f32, text: &str) {
    draw_text(canvas, font, px, x + 1.0, y + 1.0, SHADOW_COLOUR, text);
    draw_text(canvas, font, px, x, y, TEXT_COLOUR, text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_font_file_is_a_font_error() {
        let result = load_font(Path::new("/nonexistent/NotoSans-Regular.ttf"));
        assert!(matches!(result, Err(AppError::Font(_))));
    }

    #[test]
    fn garbage_font_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely not a truetype font").unwrap();
        assert!(matches!(load_font(file.path()), Err(AppError::Font(_))));
    }
}
