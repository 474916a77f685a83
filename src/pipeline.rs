//! Batch processing loop.
//!
//! Walks the extracted image directory and runs each screenshot through the
//! extraction pipeline, one image at a time. Malformed images are skipped
//! with a diagnostic; insert failures are reported; neither stops the batch.

use anyhow::{Context, Result};
use chrono::Local;
use std::path::Path;

use crate::config::PipelineConfig;
use crate::log;
use crate::ocr::{TextRecognizer, derive_transaction_value, extract_comment_fields};
use crate::sink::{CommentRecord, RecordSink};

/// A fully extracted comment, before the record is assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedComment {
    pub username: String,
    pub comment: String,
    pub transaction_value: Option<i64>,
}

/// Outcome counts for one batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub inserted: u32,
    pub skipped: u32,
    pub failed_inserts: u32,
}

/// Runs the extraction pipeline on one screenshot file.
pub fn extract_comment(
    path: &Path,
    recognizer: &dyn TextRecognizer,
    config: &PipelineConfig,
) -> Result<ExtractedComment> {
    let img = image::open(path)
        .with_context(|| format!("Failed to load {}", path.display()))?
        .to_rgba8();

    let parsed = extract_comment_fields(&img, recognizer, config)?;
    let transaction_value = derive_transaction_value(&parsed.comment);

    Ok(ExtractedComment {
        username: parsed.username,
        comment: parsed.comment,
        transaction_value,
    })
}

/// Returns true for the screenshot formats the archive is expected to hold.
fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            ext == "jpg" || ext == "jpeg"
        })
        .unwrap_or(false)
}

/// Processes every image in `image_dir` sequentially, in directory-listing
/// order, emitting one record per successfully extracted screenshot.
pub fn run_batch(
    image_dir: &Path,
    recognizer: &dyn TextRecognizer,
    sink: &mut dyn RecordSink,
    config: &PipelineConfig,
    campaign_name: &str,
) -> Result<BatchSummary> {
    let entries = std::fs::read_dir(image_dir)
        .with_context(|| format!("Failed to list {}", image_dir.display()))?;

    let mut summary = BatchSummary::default();

    for entry in entries {
        let path = entry?.path();
        if !path.is_file() || !is_image_file(&path) {
            continue;
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        log(&format!("Processing {}", name));

        let extracted = match extract_comment(&path, recognizer, config) {
            Ok(extracted) => extracted,
            Err(e) => {
                log(&format!("Skipping {}: {:#}", name, e));
                summary.skipped += 1;
                continue;
            }
        };

        let record = CommentRecord {
            username: extracted.username,
            comment: extracted.comment,
            transaction_value: extracted.transaction_value,
            campaign_name: campaign_name.to_string(),
            created_at: Local::now(),
        };

        match sink.insert(&record) {
            Ok(id) => {
                log(&format!("Record inserted with id: {}", id));
                summary.inserted += 1;
            }
            Err(e) => {
                log(&format!("Failed to insert record for {}: {:#}", name, e));
                summary.failed_inserts += 1;
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::OcrLine;
    use anyhow::anyhow;
    use image::{ImageBuffer, Rgb};
    use tempfile::tempdir;

    /// Recognizer double that ignores pixels and replays canned lines.
    struct FakeRecognizer {
        lines: Vec<String>,
    }

    impl FakeRecognizer {
        fn new(lines: &[&str]) -> Self {
            Self {
                lines: lines.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    impl TextRecognizer for FakeRecognizer {
        fn recognize(
            &self,
            _img: &ImageBuffer<image::Luma<u8>, Vec<u8>>,
        ) -> Result<Vec<OcrLine>> {
            Ok(self
                .lines
                .iter()
                .map(|text| OcrLine {
                    text: text.clone(),
                    confidence: 90.0,
                })
                .collect())
        }
    }

    /// Sink double collecting records in memory.
    #[derive(Default)]
    struct MemorySink {
        records: Vec<CommentRecord>,
        fail: bool,
    }

    impl RecordSink for MemorySink {
        fn insert(&mut self, record: &CommentRecord) -> Result<u64> {
            if self.fail {
                return Err(anyhow!("sink unavailable"));
            }
            self.records.push(record.clone());
            Ok(self.records.len() as u64)
        }
    }

    fn write_screenshot(dir: &Path, name: &str) {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(400, 400, Rgb([255, 255, 255]));
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_extract_comment_full_pipeline() {
        let dir = tempdir().unwrap();
        write_screenshot(dir.path(), "shot.jpg");

        let recognizer = FakeRecognizer::new(&["user1 pinned great shoes 12"]);
        let config = PipelineConfig::default();

        let extracted =
            extract_comment(&dir.path().join("shot.jpg"), &recognizer, &config).unwrap();
        assert_eq!(extracted.username, "user1");
        assert_eq!(extracted.comment, "great shoes 12");
        assert_eq!(extracted.transaction_value, Some(12000));
    }

    #[test]
    fn test_extract_comment_no_value_found() {
        let dir = tempdir().unwrap();
        write_screenshot(dir.path(), "shot.jpg");

        let recognizer = FakeRecognizer::new(&["user1 pinned lovely pair"]);
        let config = PipelineConfig::default();

        let extracted =
            extract_comment(&dir.path().join("shot.jpg"), &recognizer, &config).unwrap();
        assert_eq!(extracted.transaction_value, None);
    }

    #[test]
    fn test_extract_comment_malformed_text_fails() {
        let dir = tempdir().unwrap();
        write_screenshot(dir.path(), "shot.jpg");

        // No separator token: recognition can't be split into two fields
        let recognizer = FakeRecognizer::new(&["just some text"]);
        let config = PipelineConfig::default();

        assert!(extract_comment(&dir.path().join("shot.jpg"), &recognizer, &config).is_err());
    }

    #[test]
    fn test_extract_comment_empty_recognition_fails() {
        let dir = tempdir().unwrap();
        write_screenshot(dir.path(), "shot.jpg");

        let recognizer = FakeRecognizer::new(&[]);
        let config = PipelineConfig::default();

        assert!(extract_comment(&dir.path().join("shot.jpg"), &recognizer, &config).is_err());
    }

    #[test]
    fn test_run_batch_inserts_records_with_campaign() {
        let dir = tempdir().unwrap();
        write_screenshot(dir.path(), "a.jpg");
        write_screenshot(dir.path(), "b.jpeg");
        std::fs::write(dir.path().join("notes.txt"), "not an image").unwrap();

        let recognizer = FakeRecognizer::new(&["user1 pinned nice 3.5k"]);
        let mut sink = MemorySink::default();
        let config = PipelineConfig::default();

        let summary =
            run_batch(dir.path(), &recognizer, &mut sink, &config, "spring_drop").unwrap();

        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.failed_inserts, 0);

        assert_eq!(sink.records.len(), 2);
        assert!(sink.records.iter().all(|r| r.campaign_name == "spring_drop"));
        assert!(
            sink.records
                .iter()
                .all(|r| r.transaction_value == Some(3500))
        );
    }

    #[test]
    fn test_run_batch_skips_malformed_images() {
        let dir = tempdir().unwrap();
        write_screenshot(dir.path(), "a.jpg");
        std::fs::write(dir.path().join("broken.jpg"), b"not a jpeg").unwrap();

        let recognizer = FakeRecognizer::new(&["user1 pinned nice 3.5k"]);
        let mut sink = MemorySink::default();
        let config = PipelineConfig::default();

        let summary =
            run_batch(dir.path(), &recognizer, &mut sink, &config, "spring_drop").unwrap();

        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_run_batch_reports_insert_failures_and_continues() {
        let dir = tempdir().unwrap();
        write_screenshot(dir.path(), "a.jpg");
        write_screenshot(dir.path(), "b.jpg");

        let recognizer = FakeRecognizer::new(&["user1 pinned nice 3.5k"]);
        let mut sink = MemorySink {
            fail: true,
            ..Default::default()
        };
        let config = PipelineConfig::default();

        let summary =
            run_batch(dir.path(), &recognizer, &mut sink, &config, "spring_drop").unwrap();

        assert_eq!(summary.inserted, 0);
        assert_eq!(summary.failed_inserts, 2);
    }

    #[test]
    fn test_run_batch_empty_directory() {
        let dir = tempdir().unwrap();

        let recognizer = FakeRecognizer::new(&["user1 pinned nice"]);
        let mut sink = MemorySink::default();
        let config = PipelineConfig::default();

        let summary =
            run_batch(dir.path(), &recognizer, &mut sink, &config, "spring_drop").unwrap();
        assert_eq!(summary, BatchSummary::default());
    }
}
