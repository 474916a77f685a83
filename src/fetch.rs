//! Archive retrieval and extraction.
//!
//! Downloads the campaign screenshot bundle and flattens its image files
//! into the data directory. Both steps are fatal on failure: without the
//! archive there is nothing to process.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::log;

/// Deletes the data directory and any stale archive from a previous run,
/// then recreates the directory empty.
pub fn reset_data_dir(data_dir: &Path, archive_path: &Path) -> Result<()> {
    if data_dir.exists() {
        fs::remove_dir_all(data_dir)
            .with_context(|| format!("Failed to clear {}", data_dir.display()))?;
    }
    if archive_path.exists() {
        fs::remove_file(archive_path)
            .with_context(|| format!("Failed to remove {}", archive_path.display()))?;
    }
    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;
    Ok(())
}

/// Downloads the archive at `url` to `dest`.
pub fn download_archive(url: &str, dest: &Path) -> Result<()> {
    log(&format!("Downloading archive from {}", url));

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(url)
        .header("User-Agent", "comment-harvester")
        .send()
        .with_context(|| format!("Failed to fetch {}", url))?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download archive: HTTP {}",
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    let mut file = fs::File::create(dest)
        .with_context(|| format!("Failed to create {}", dest.display()))?;
    file.write_all(&bytes)?;

    log(&format!("Downloaded archive ({} bytes)", bytes.len()));
    Ok(())
}

/// Extracts every file entry of the zip archive into `dest_dir`, flattened
/// to its base file name. Directory entries, dotfiles, and macOS resource
/// fork junk are skipped. Returns the number of files written.
pub fn extract_archive(archive_path: &Path, dest_dir: &Path) -> Result<usize> {
    let file = fs::File::open(archive_path)
        .with_context(|| format!("Failed to open {}", archive_path.display()))?;
    let mut archive =
        zip::ZipArchive::new(file).context("Failed to read archive")?;

    let mut extracted = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }

        let Some(enclosed) = entry.enclosed_name() else {
            log(&format!("Skipping unsafe archive entry: {}", entry.name()));
            continue;
        };
        if enclosed
            .components()
            .any(|c| c.as_os_str() == "__MACOSX")
        {
            continue;
        }
        let Some(file_name) = enclosed.file_name().map(|n| n.to_owned()) else {
            continue;
        };
        if file_name.to_string_lossy().starts_with('.') {
            continue;
        }

        let out_path = dest_dir.join(&file_name);
        let mut out_file = fs::File::create(&out_path)
            .with_context(|| format!("Failed to create {}", out_path.display()))?;
        std::io::copy(&mut entry, &mut out_file)?;
        extracted += 1;
    }

    log(&format!(
        "Extracted {} files to {}",
        extracted,
        dest_dir.display()
    ));
    Ok(extracted)
}
