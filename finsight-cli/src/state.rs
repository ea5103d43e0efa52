use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$FINSIGHT_HOME`, else `~/.finsight`
pub fn finsight_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("FINSIGHT_HOME").filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".finsight"))
}

pub fn ensure_finsight_home() -> Result<PathBuf> {
    let dir = finsight_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
