use std::path::PathBuf;

/// Returns the directory extracted images are organized into: `./data/`
pub fn get_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Returns the path the downloaded archive is written to: `./data.zip`
pub fn get_archive_path() -> PathBuf {
    PathBuf::from("data.zip")
}

/// Returns the logs directory: `./logs/`
pub fn get_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}

/// Returns the default record sink file: `./records.jsonl`
pub fn get_default_records_path() -> PathBuf {
    PathBuf::from("records.jsonl")
}

/// Ensures output directories exist. Call at startup.
pub fn ensure_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())?;
    Ok(())
}
