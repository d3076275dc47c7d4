use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;

use crate::catalog::player_api_url;
use crate::types::ContentKind;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    #[serde(default = "default_kinds")]
    pub kinds: Vec<ContentKind>,
    pub catalog: CatalogConfig,
    pub telegram: TelegramConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub api_url: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default = "default_parse_mode")]
    pub parse_mode: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_kinds() -> Vec<ContentKind> { ContentKind::ALL.to_vec() }
fn default_timeout_secs() -> u64 { 30 }
fn default_parse_mode() -> String { "HTML".to_string() }

impl Config {
    /// Reads and validates the config. Path precedence: explicit, `VODWATCH_CONFIG`, platform config dir.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => match std::env::var_os("VODWATCH_CONFIG") {
                Some(p) if !p.is_empty() => PathBuf::from(p),
                _ => default_config_path()?,
            },
        };
        let raw = std::fs::read_to_string(&path).with_context(|| format!("reading config: {}", path.display()))?;
        let mut cfg = Self::from_toml(&raw).with_context(|| format!("invalid config: {}", path.display()))?;
        if let Some(dir) = std::env::var_os("VODWATCH_STATE_DIR").filter(|d| !d.is_empty()) {
            cfg.state_dir = Some(PathBuf::from(dir));
        }
        Ok(cfg)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let mut cfg: Config = toml::from_str(raw)?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    fn normalize(&mut self) {
        dedup(&mut self.kinds);
        let mut channels: Vec<String> = self.telegram.channels.iter().map(|c| c.trim().to_string()).filter(|c| !c.is_empty()).collect();
        dedup(&mut channels);
        self.telegram.channels = channels;
    }

    fn validate(&self) -> Result<()> {
        if self.kinds.is_empty() { bail!("`kinds` must name at least one of vod, series"); }
        player_api_url(&self.catalog.api_url).with_context(|| format!("catalog.api_url `{}`", self.catalog.api_url))?;
        if self.telegram.channels.is_empty() {
            tracing::warn!("no telegram channels configured; new items will be recorded without being announced");
        }
        Ok(())
    }

    /// Configured state directory, or the platform data dir.
    pub fn state_dir(&self) -> Result<PathBuf> {
        match &self.state_dir {
            Some(d) => Ok(d.clone()),
            None => Ok(project_dirs()?.data_dir().to_path_buf()),
        }
    }
}

fn dedup<T: PartialEq>(items: &mut Vec<T>) {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items.drain(..) {
        if !out.contains(&item) { out.push(item); }
    }
    *items = out;
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "vodwatch", "vodwatch").context("unable to determine platform directories")
}

fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("vodwatch.toml"))
}
