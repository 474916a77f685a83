pub mod setup;
pub mod preprocess;
pub mod engine;
pub mod extract;

pub use engine::{OcrLine, TesseractEngine, TextRecognizer};
pub use extract::{ParsedComment, assemble_fields, derive_transaction_value};

use anyhow::Result;
use image::{ImageBuffer, Rgba};

use crate::config::PipelineConfig;
use preprocess::{crop_comment_band, normalize_for_ocr};

/// High-level function: decoded screenshot → (username, comment) fields.
///
/// Crops the comment band, normalizes it for OCR, runs the recognizer, and
/// assembles the cleaned fields. Any failure marks the image as malformed
/// for the caller to skip.
pub fn extract_comment_fields(
    img: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    recognizer: &dyn TextRecognizer,
    config: &PipelineConfig,
) -> Result<ParsedComment> {
    let region = crop_comment_band(img, &config.band)?;
    let normalized = normalize_for_ocr(&region, config.contrast_factor, config.downscale_factor)?;
    let lines = recognizer.recognize(&normalized)?;
    assemble_fields(&lines)
}
