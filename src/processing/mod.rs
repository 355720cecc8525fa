pub mod encode;
pub mod layout;
pub mod text;

use std::time::Instant;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use rusttype::Font;
use crate::api::DisplayOptions;
use crate::config::FontConfig;
use crate::errors::Result;

/// Text an item can contribute to its cell overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextFields<'a> {
    pub track: Option<&'a str>,
    pub artist: Option<&'a str>,
    pub album: Option<&'a str>,
    pub playcount: Option<&'a str>,
}

/// An entity the compositor can place in a grid cell.
pub trait Drawable {
    fn image(&self) -> Option<&DynamicImage>;
    fn text_fields(&self) -> TextFields<'_>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Webp,
}

impl OutputFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Webp => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Webp => "webp",
        }
    }
}

/// The finished collage and its encoded bytes.
#[derive(Debug, Clone)]
pub struct CollageOutput {
    pub image: DynamicImage,
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
}

pub struct Compositor {
    regular: Option<Font<'static>>,
    bold: Option<Font<'static>>,
}

impl Compositor {
    /// Loads both faces; a face that fails to load is logged and text falls back to the other.
    pub fn new(fonts: &FontConfig) -> Self {
        let load = |path: &std::path::Path| match text::load_font(path) {
            Ok(font) => Some(font),
            Err(e) => {
                log::warn!("⚠️ [COLLAGE] Font unavailable, text overlay degraded: {}", e);
                None
            }
        };
        Self {
            regular: load(fonts.regular.as_path()),
            bold: load(fonts.bold.as_path()),
        }
    }

    /// Compositor that never draws text.
    pub fn without_fonts() -> Self {
        Self { regular: None, bold: None }
    }

    fn font(&self, bold: bool) -> Option<&Font<'static>> {
        if bold {
            self.bold.as_ref().or(self.regular.as_ref())
        } else {
            self.regular.as_ref().or(self.bold.as_ref())
        }
    }

    /// Lays the items out row-major, overlays text and encodes the result.
    pub fn create_collage<T: Drawable>(&self, items: &[T], options: &DisplayOptions) -> Result<CollageOutput> {
        let start = Instant::now();
        let dimension = options.image_dimension;
        let (width, height) = options.canvas_size();
        let mut canvas = RgbImage::from_pixel(width, height, Rgb([0, 0, 0]));

        let font = if options.any_text() {
            let font = self.font(options.bold_font);
            if font.is_none() {
                log::error!("❌ [COLLAGE] No font loaded, skipping text overlay");
            }
            font
        } else {
            None
        };

        let capacity = (options.rows * options.columns) as usize;
        for (index, item) in items.iter().take(capacity).enumerate() {
            let origin = layout::cell_origin(index, options.columns, dimension);

            if let Some(image) = item.image() {
                let cell = if image.width() == dimension && image.height() == dimension {
                    image.to_rgb8()
                } else {
                    image.resize_exact(dimension, dimension, FilterType::Lanczos3).to_rgb8()
                };
                imageops::replace(&mut canvas, &cell, origin.0 as i64, origin.1 as i64);
            }

            if let Some(font) = font {
                let lines = layout::collect_lines(&item.text_fields(), options);
                let placed = layout::layout_text(lines, origin, options, |s| {
                    text::text_size(font, options.font_size, s)
                });
                for line in placed {
                    text::draw_text_with_shadow(&mut canvas, font, options.font_size, line.x, line.y, &line.text);
                }
            }
        }

        let output = encode::finish(DynamicImage::ImageRgb8(canvas), options)?;
        log::info!(
            "🎨 [COLLAGE] Collage created in {:?} ({} rows x {} columns, {})",
            start.elapsed(),
            options.rows,
            options.columns,
            output.format.content_type()
        );
        Ok(output)
    }
}
