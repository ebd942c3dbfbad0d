use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$SCROOGE_HOME`, else `~/.scrooge`.
pub fn scrooge_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("SCROOGE_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".scrooge"))
}

pub fn ensure_scrooge_home() -> Result<PathBuf> {
    let dir = scrooge_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
