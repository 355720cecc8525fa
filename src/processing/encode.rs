use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use webp::WebPConfig;
use crate::api::DisplayOptions;
use crate::errors::{AppError, Result};
use crate::processing::layout::target_dimensions;
use crate::processing::{CollageOutput, OutputFormat};

pub const JPEG_QUALITY: u8 = 75;
pub const WEBP_QUALITY: f32 = 70.0;

/// Lanczos3 resize; zero, identical or degenerate requests return the input.
pub fn resize_image(image: DynamicImage, width: u32, height: u32) -> DynamicImage {
    match target_dimensions((image.width(), image.height()), (width, height)) {
        Some((w, h)) => image.resize_exact(w, h, FilterType::Lanczos3),
        None => {
            if width == 0 && height == 0 {
                log::info!("📐 [COLLAGE] Unable to resize image, both width and height are 0");
            }
            image
        }
    }
}

pub fn to_grayscale(image: DynamicImage) -> DynamicImage {
    DynamicImage::ImageLuma8(image.to_luma8())
}

pub fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY))
        .map_err(|e| AppError::Encode(format!("jpeg: {}", e)))?;
    Ok(bytes)
}

/// Lossy WebP at `WEBP_QUALITY` with libwebp's low-memory mode.
pub fn encode_webp(image: &DynamicImage) -> Result<Vec<u8>> {
    // the encoder only takes 8-bit RGB or RGBA
    let converted;
    let source = match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => image,
        other => {
            converted = DynamicImage::ImageRgb8(other.to_rgb8());
            &converted
        }
    };

    let mut config = WebPConfig::new().map_err(|_| AppError::Encode("webp: unable to initialise config".to_string()))?;
    config.lossless = 0;
    config.quality = WEBP_QUALITY;
    config.low_memory = 1;

    let encoder = webp::Encoder::from_image(source).map_err(|e| AppError::Encode(format!("webp: {}", e)))?;
    let encoded = encoder
        .encode_advanced(&config)
        .map_err(|e| AppError::Encode(format!("webp: {:?}", e)))?;
    Ok(encoded.to_vec())
}

/// Resize, then grayscale, then encode.
///
/// WebP is only attempted when grayscale is off; a WebP failure falls back to JPEG.
pub fn finish(canvas: DynamicImage, options: &DisplayOptions) -> Result<CollageOutput> {
    let mut image = canvas;
    if options.resize() {
        image = resize_image(image, options.width, options.height);
    }
    if options.grayscale {
        image = to_grayscale(image);
    }

    if options.webp && !options.grayscale {
        match encode_webp(&image) {
            Ok(bytes) => {
                return Ok(CollageOutput {
                    image,
                    bytes,
                    format: OutputFormat::Webp,
                })
            }
            Err(e) => log::error!("❌ [COLLAGE] Unable to create Webp image: {}", e),
        }
    }

    let bytes = encode_jpeg(&image)?;
    Ok(CollageOutput {
        image,
        bytes,
        format: OutputFormat::Jpeg,
    })
}
