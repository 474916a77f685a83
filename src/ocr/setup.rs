use anyhow::{anyhow, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::log;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

/// Returns the directory for storing downloaded trained data
pub fn get_tessdata_cache_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("comment-harvester")
        .join("tessdata")
}

/// Finds the Tesseract executable: PATH first, then common install locations.
pub fn find_tesseract_executable() -> Result<PathBuf> {
    if let Ok(output) = std::process::Command::new("tesseract")
        .arg("--version")
        .output()
    {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    let common_paths = [
        "/usr/bin/tesseract",
        "/usr/local/bin/tesseract",
        "/opt/homebrew/bin/tesseract",
    ];

    for path in &common_paths {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!("Tesseract not found. Please install Tesseract-OCR."))
}

/// Ensures trained data for `language` is available and returns its
/// directory. Checks TESSDATA_PREFIX, system locations, then the local
/// cache; downloads into the cache as a last resort.
pub fn ensure_tessdata(language: &str) -> Result<PathBuf> {
    let traineddata = format!("{}.traineddata", language);

    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let p = PathBuf::from(&prefix);
        if p.join(&traineddata).exists() {
            return Ok(p);
        }
        let p = PathBuf::from(&prefix).join("tessdata");
        if p.join(&traineddata).exists() {
            return Ok(p);
        }
    }

    let system_paths = [
        "/usr/share/tesseract-ocr/5/tessdata",
        "/usr/share/tesseract-ocr/4.00/tessdata",
        "/usr/share/tessdata",
        "/usr/local/share/tessdata",
    ];

    for path in &system_paths {
        let p = PathBuf::from(path);
        if p.join(&traineddata).exists() {
            return Ok(p);
        }
    }

    let cache_dir = get_tessdata_cache_dir();
    if cache_dir.join(&traineddata).exists() {
        return Ok(cache_dir);
    }

    log(&format!(
        "{} not found locally, downloading...",
        traineddata
    ));
    fs::create_dir_all(&cache_dir)?;
    download_traineddata(language, &cache_dir)?;
    Ok(cache_dir)
}

/// Downloads `<language>.traineddata` from the tessdata repository.
fn download_traineddata(language: &str, tessdata_dir: &PathBuf) -> Result<()> {
    let url = format!("{}/{}.traineddata", TESSDATA_REPO, language);
    let dest = tessdata_dir.join(format!("{}.traineddata", language));

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&url)
        .header("User-Agent", "comment-harvester")
        .send()?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}.traineddata: HTTP {}",
            language,
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    let mut file = fs::File::create(&dest)?;
    file.write_all(&bytes)?;

    log(&format!(
        "Downloaded {}.traineddata ({} bytes)",
        language,
        bytes.len()
    ));

    Ok(())
}
