use anyhow::{anyhow, Result};
use image::imageops::FilterType;
use image::{ImageBuffer, Luma, Rgba};

use crate::config::BandConfig;

/// Computes the pixel rectangle `(x, y, width, height)` of the band the
/// username/comment text renders in: a fixed-height strip measured up from
/// the bottom edge of the screenshot.
///
/// Returns an error when the image is too short to contain any of the band.
/// Images taller than `bottom_offset` but shorter than `top_offset` get the
/// band clamped to the top edge.
pub fn comment_band(
    width: u32,
    height: u32,
    band: &BandConfig,
) -> Result<(u32, u32, u32, u32)> {
    if band.bottom_offset >= band.top_offset {
        return Err(anyhow!(
            "Invalid band: bottom_offset {} >= top_offset {}",
            band.bottom_offset,
            band.top_offset
        ));
    }
    if height <= band.bottom_offset {
        return Err(anyhow!(
            "Image height {} leaves no room for the {}px comment band",
            height,
            band.top_offset - band.bottom_offset
        ));
    }

    let top = height.saturating_sub(band.top_offset);
    let band_height = (height - band.bottom_offset) - top;
    Ok((0, top, width, band_height))
}

/// Crops the comment band out of a decoded screenshot.
pub fn crop_comment_band(
    img: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    band: &BandConfig,
) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>> {
    let (width, height) = img.dimensions();
    let (x, y, w, h) = comment_band(width, height, band)?;
    Ok(image::imageops::crop_imm(img, x, y, w, h).to_image())
}

/// Normalizes a cropped region for OCR: grayscale conversion, contrast
/// enhancement around the mean luminance, then a uniform downscale.
///
/// The downscaled dimensions use integer-floor division, so odd dimensions
/// lose a pixel.
pub fn normalize_for_ocr(
    region: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    contrast_factor: f32,
    downscale_factor: u32,
) -> Result<ImageBuffer<Luma<u8>, Vec<u8>>> {
    let gray = image::imageops::grayscale(region);
    let enhanced = enhance_contrast(&gray, contrast_factor);

    let (width, height) = enhanced.dimensions();
    let factor = downscale_factor.max(1);
    let (small_w, small_h) = (width / factor, height / factor);
    if small_w == 0 || small_h == 0 {
        return Err(anyhow!(
            "Region {}x{} too small to downscale by {}",
            width,
            height,
            factor
        ));
    }

    Ok(image::imageops::resize(
        &enhanced,
        small_w,
        small_h,
        FilterType::CatmullRom,
    ))
}

/// Scales each pixel away from the image's mean luminance:
/// `new = mean + (old - mean) * factor`, clamped to 0..=255.
///
/// A factor of 1.0 leaves the image unchanged; higher values increase
/// contrast.
fn enhance_contrast(
    img: &ImageBuffer<Luma<u8>, Vec<u8>>,
    factor: f32,
) -> ImageBuffer<Luma<u8>, Vec<u8>> {
    let (width, height) = img.dimensions();
    let pixel_count = (width as u64 * height as u64).max(1);
    let sum: u64 = img.pixels().map(|p| p[0] as u64).sum();
    let mean = sum as f32 / pixel_count as f32;

    let mut output = ImageBuffer::new(width, height);
    for (x, y, pixel) in img.enumerate_pixels() {
        let value = mean + (pixel[0] as f32 - mean) * factor;
        output.put_pixel(x, y, Luma([value.round().clamp(0.0, 255.0) as u8]));
    }

    output
}
