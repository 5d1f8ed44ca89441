use anyhow::Result;
use std::path::PathBuf;

const REBOUNCE_DIR: &str = ".rebounce";
const DB_FILE: &str = "rebounce.db";
const LOGS_DIR: &str = "logs";

/// Environment variable to override the rebounce directory.
const REBOUNCE_DIR_ENV: &str = "REBOUNCE_DIR";

/// Resolve the rebounce data directory.
/// Priority: REBOUNCE_DIR env var > ~/.rebounce/
pub fn resolve_rebounce_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(REBOUNCE_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|h| h.join(REBOUNCE_DIR))
        .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))
}

/// Ensure the rebounce directory exists and return its path.
pub fn ensure_rebounce_dir() -> Result<PathBuf> {
    let dir = resolve_rebounce_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Get the database path: ~/.rebounce/rebounce.db
pub fn database_path() -> Result<PathBuf> {
    Ok(resolve_rebounce_dir()?.join(DB_FILE))
}

/// Ensure the data directory exists and return the database path.
pub fn ensure_database_path() -> Result<PathBuf> {
    Ok(ensure_rebounce_dir()?.join(DB_FILE))
}

/// Convenience helper returning the database path as a UTF-8 string.
pub fn ensure_database_path_string() -> Result<String> {
    Ok(ensure_database_path()?.to_string_lossy().into_owned())
}

/// Get the logs directory: ~/.rebounce/logs/
pub fn logs_dir() -> Result<PathBuf> {
    let dir = resolve_rebounce_dir()?.join(LOGS_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
