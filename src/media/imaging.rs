//! Downloaded pictures are normalised to PNG and capped in width.
//!
//! | Step | Implementation |
//! |---|---|
//! | Decode | `image::load_from_memory` (JPEG, PNG, WebP, GIF) |
//! | Downscale | `DynamicImage::resize` with `Lanczos3`, aspect kept |
//! | Encode | PNG |

use super::MediaError;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use log::debug;
use std::path::Path;

/// Scaled dimensions for an image at most `max_width` wide.
///
/// Images already narrow enough keep their size; height is scaled by the
/// same factor and never drops below one pixel.
pub fn target_size(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width || width == 0 {
        return (width, height);
    }
    let scaled = (u64::from(height) * u64::from(max_width) / u64::from(width)).max(1);
    (max_width, scaled as u32)
}

/// Decode `bytes`, downscale to `max_width` when wider, and write a PNG.
pub fn save_png(bytes: &[u8], output: &Path, max_width: u32) -> Result<(), MediaError> {
    let img = image::load_from_memory(bytes)?;
    let img = fit_width(img, max_width);
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    img.save_with_format(output, ImageFormat::Png)?;
    debug!(
        "saved {}x{} image to {}",
        img.width(),
        img.height(),
        output.display()
    );
    Ok(())
}

fn fit_width(img: DynamicImage, max_width: u32) -> DynamicImage {
    let (width, height) = target_size(img.width(), img.height(), max_width);
    if width == img.width() {
        return img;
    }
    img.resize_exact(width, height, FilterType::Lanczos3)
}
