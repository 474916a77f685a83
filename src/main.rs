//! Comment Harvester
//!
//! Downloads an archive of campaign comment screenshots, extracts the
//! username, comment, and derived transaction value from each image via OCR
//! on the comment band, and appends one structured record per image to the
//! record sink.

mod config;
mod fetch;
mod ocr;
mod paths;
mod pipeline;
mod sink;

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use config::PipelineConfig;
use ocr::TesseractEngine;
use sink::JsonlSink;

/// Extracts comment records from a remote archive of screenshots.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// URL of the screenshot archive to process
    #[arg(long)]
    url: String,

    /// Campaign label stored on every record
    #[arg(long)]
    campaign_name: String,

    /// Pipeline config file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Record sink file (JSON lines, appended)
    #[arg(long)]
    output: Option<PathBuf>,
}

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join("comment_harvester.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    paths::ensure_directories()?;
    let config = PipelineConfig::load(&args.config);

    // Both external handles are acquired before any image work so that a
    // missing engine or an unwritable sink aborts the run up front.
    let engine = TesseractEngine::new(&config.language, config.page_segmentation_mode)?;
    let records_path = args
        .output
        .unwrap_or_else(paths::get_default_records_path);
    let mut record_sink = JsonlSink::open(&records_path)?;
    log(&format!("Record sink ready: {}", record_sink.path().display()));

    let data_dir = paths::get_data_dir();
    let archive_path = paths::get_archive_path();

    fetch::reset_data_dir(&data_dir, &archive_path)?;
    fetch::download_archive(&args.url, &archive_path)?;
    fetch::extract_archive(&archive_path, &data_dir)?;

    let summary = pipeline::run_batch(
        &data_dir,
        &engine,
        &mut record_sink,
        &config,
        &args.campaign_name,
    )?;

    log(&format!(
        "Done: {} inserted, {} skipped, {} insert failures",
        summary.inserted, summary.skipped, summary.failed_inserts
    ));
    log(&format!("Processed URL: {}", args.url));
    log(&format!("Campaign name: {}", args.campaign_name));

    Ok(())
}
