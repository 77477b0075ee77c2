//! Flat raster preview for the in-memory canvas.
//!
//! Paints the background and the fill of each drawable's axis-aligned bounds.
//! Strokes, rotation and curved outlines are left to real canvas libraries.

use super::{AdapterError, AdapterResult, RasterFormat, RasterOptions, Viewport};
use crate::drawable::{parse_color, Drawable};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, Rgba, RgbaImage};
use kurbo::{Affine, Rect, Size, Vec2};

/// Render and encode the drawables at the requested multiplier.
pub(crate) fn render(
    objects: &[&Drawable],
    background: &str,
    viewport: &Viewport,
    size: Size,
    options: &RasterOptions,
) -> AdapterResult<Vec<u8>> {
    let multiplier = options.multiplier;
    if !multiplier.is_finite() || multiplier <= 0.0 {
        return Err(AdapterError::Encoding(format!("Invalid multiplier: {}", multiplier)));
    }

    let width = ((size.width * multiplier).round() as u32).max(1);
    let height = ((size.height * multiplier).round() as u32).max(1);
    let background = parse_color(background).unwrap_or([0, 0, 0, 0]);
    let mut image = RgbaImage::from_pixel(width, height, Rgba(background));

    let transform = Affine::scale(multiplier) * viewport.transform();
    for drawable in objects {
        paint(&mut image, drawable, Vec2::ZERO, 1.0, transform);
    }

    encode(image, options)
}

fn paint(image: &mut RgbaImage, drawable: &Drawable, origin: Vec2, opacity: f64, transform: Affine) {
    let opacity = opacity * drawable.opacity;
    if drawable.is_group() {
        let child_origin = origin + drawable.position().to_vec2();
        for child in drawable.children() {
            paint(image, child, child_origin, opacity, transform);
        }
        return;
    }

    let Some(fill) = drawable.fill.as_deref().and_then(parse_color) else {
        return;
    };
    let screen = transform.transform_rect_bbox(drawable.bounds() + origin);
    fill_rect(image, screen, fill, opacity);
}

fn fill_rect(image: &mut RgbaImage, rect: Rect, color: [u8; 4], opacity: f64) {
    let alpha = (color[3] as f64 / 255.0) * opacity.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }

    let (width, height) = image.dimensions();
    let x0 = rect.x0.floor().max(0.0) as u32;
    let y0 = rect.y0.floor().max(0.0) as u32;
    let x1 = (rect.x1.ceil().max(0.0) as u32).min(width);
    let y1 = (rect.y1.ceil().max(0.0) as u32).min(height);

    for y in y0..y1 {
        for x in x0..x1 {
            let dst = image.get_pixel_mut(x, y);
            let dst_alpha = dst[3] as f64 / 255.0;
            for channel in 0..3 {
                let blended = color[channel] as f64 * alpha + dst[channel] as f64 * (1.0 - alpha);
                dst[channel] = blended.round() as u8;
            }
            dst[3] = ((alpha + dst_alpha * (1.0 - alpha)) * 255.0).round() as u8;
        }
    }
}

fn encode(image: RgbaImage, options: &RasterOptions) -> AdapterResult<Vec<u8>> {
    let mut buf = Vec::new();
    let result = match options.format {
        RasterFormat::Png => DynamicImage::ImageRgba8(image).write_with_encoder(PngEncoder::new(&mut buf)),
        RasterFormat::Jpeg => {
            let quality = (options.quality.clamp(0.01, 1.0) * 100.0).round() as u8;
            let rgb = DynamicImage::ImageRgba8(image).to_rgb8();
            DynamicImage::ImageRgb8(rgb).write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))
        }
    };
    result.map_err(|e| AdapterError::Encoding(e.to_string()))?;
    Ok(buf)
}
