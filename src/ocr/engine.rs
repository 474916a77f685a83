use anyhow::{anyhow, Context, Result};
use image::{ImageBuffer, Luma};
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::{ensure_tessdata, find_tesseract_executable};

/// A line of recognized text. The recognizer also reports word geometry;
/// only the text (in recognizer line order) and an averaged confidence are
/// carried forward.
#[derive(Debug, Clone)]
pub struct OcrLine {
    pub text: String,
    pub confidence: f32,
}

/// Text recognition capability: given a normalized raster, return the
/// recognized lines in order. An empty result means no text was detected
/// and is valid output; callers decide how to handle it.
pub trait TextRecognizer {
    fn recognize(&self, img: &ImageBuffer<Luma<u8>, Vec<u8>>) -> Result<Vec<OcrLine>>;
}

/// Tesseract-backed recognizer. Resolves the executable and trained data
/// once at construction; failure here is fatal since no image can be
/// processed without an engine.
pub struct TesseractEngine {
    executable: PathBuf,
    tessdata: PathBuf,
    language: String,
    page_segmentation_mode: u32,
}

impl TesseractEngine {
    pub fn new(language: &str, page_segmentation_mode: u32) -> Result<Self> {
        let executable = find_tesseract_executable()?;
        let tessdata = ensure_tessdata(language)?;
        Ok(Self {
            executable,
            tessdata,
            language: language.to_string(),
            page_segmentation_mode,
        })
    }
}

impl TextRecognizer for TesseractEngine {
    fn recognize(&self, img: &ImageBuffer<Luma<u8>, Vec<u8>>) -> Result<Vec<OcrLine>> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())
            .context("Failed to write raster for OCR")?;

        // Create temporary output file (Tesseract adds .tsv extension)
        let temp_output = NamedTempFile::new()?;
        let output_base = temp_output.path().to_string_lossy().to_string();

        let output = Command::new(&self.executable)
            .arg(temp_input.path())
            .arg(&output_base)
            .arg("--tessdata-dir")
            .arg(&self.tessdata)
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.page_segmentation_mode.to_string())
            .arg("tsv")
            .output()
            .context("Failed to run tesseract")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr));
        }

        let tsv_path = format!("{}.tsv", output_base);
        let tsv_content = std::fs::read_to_string(&tsv_path)
            .map_err(|e| anyhow!("Failed to read Tesseract output: {}", e))?;

        let _ = std::fs::remove_file(&tsv_path);

        Ok(parse_tsv_output(&tsv_content))
    }
}

/// Parses Tesseract TSV output into ordered lines.
///
/// Word rows (level 5) are grouped by their (block, paragraph, line) key and
/// joined with single spaces; each line's confidence is the mean of its word
/// confidences. Rows with empty text are dropped.
fn parse_tsv_output(tsv: &str) -> Vec<OcrLine> {
    let mut lines: Vec<OcrLine> = Vec::new();
    let mut current_key: Option<(i32, i32, i32)> = None;
    let mut current_words: Vec<String> = Vec::new();
    let mut current_conf_sum: f32 = 0.0;

    let flush = |words: &mut Vec<String>, conf_sum: &mut f32, lines: &mut Vec<OcrLine>| {
        if !words.is_empty() {
            let confidence = *conf_sum / words.len() as f32;
            lines.push(OcrLine {
                text: words.join(" "),
                confidence,
            });
            words.clear();
            *conf_sum = 0.0;
        }
    };

    for row in tsv.lines().skip(1) {
        // TSV fields: level, page_num, block_num, par_num, line_num, word_num,
        //             left, top, width, height, conf, text
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        let level: i32 = fields[0].parse().unwrap_or(-1);
        if level != 5 {
            continue;
        }

        let block: i32 = fields[2].parse().unwrap_or(-1);
        let par: i32 = fields[3].parse().unwrap_or(-1);
        let line: i32 = fields[4].parse().unwrap_or(-1);
        let conf: f32 = fields[10].parse().unwrap_or(-1.0);
        let text = fields[11].trim();

        if text.is_empty() || conf < 0.0 {
            continue;
        }

        let key = (block, par, line);
        if current_key != Some(key) {
            flush(&mut current_words, &mut current_conf_sum, &mut lines);
            current_key = Some(key);
        }

        current_words.push(text.to_string());
        current_conf_sum += conf;
    }

    flush(&mut current_words, &mut current_conf_sum, &mut lines);
    lines
}
