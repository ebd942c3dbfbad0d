use anyhow::{Context, Result, bail};
use scrooge_core::SheetsConfig;
use scrooge_sheets::AccessToken;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::LogFormat;
use crate::state::ensure_scrooge_home;

pub const SCHEMA_VERSION: u32 = 1;
pub const TOKEN_ENV: &str = "SCROOGE_ACCESS_TOKEN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schema_version: u32,
    pub spreadsheet: SheetsConfig,
    pub logging: LogSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// EnvFilter directive, e.g. `info` or `scrooge_sheets=debug`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            spreadsheet: SheetsConfig::default(),
            logging: LogSection::default(),
        }
    }
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(p) => Ok(p.to_path_buf()),
        None => Ok(ensure_scrooge_home()?.join("config.toml")),
    }
}

/// A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: Config = toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
    if cfg.schema_version != SCHEMA_VERSION {
        bail!(
            "{}: unsupported schema_version {} (expected {})",
            path.display(),
            cfg.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(cfg)
}

pub fn save_config(path: &Path, cfg: &Config) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Config already exists: {}", path.display());
        return Ok(());
    }
    save_config(path, &Config::default())?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Bearer token from `env_token` (the `SCROOGE_ACCESS_TOKEN` value) or, when
/// that is unset or blank, from `access_token_file`.
pub fn resolve_token(cfg: &SheetsConfig, env_token: Option<String>) -> Result<AccessToken> {
    if let Some(token) = env_token.filter(|t| !t.trim().is_empty()) {
        return Ok(AccessToken::new(token));
    }
    let Some(path) = cfg.access_token_file.as_deref() else {
        bail!("no access token: set {TOKEN_ENV} or spreadsheet.access_token_file");
    };
    let token = fs::read_to_string(path).with_context(|| format!("read token file {}", path.display()))?;
    if token.trim().is_empty() {
        bail!("token file {} is empty", path.display());
    }
    Ok(AccessToken::new(token))
}
