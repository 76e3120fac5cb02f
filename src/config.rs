use std::path::PathBuf;

use anyhow::Result;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::core::library::Library;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub mirror: MirrorConfig,
}

/// 사이트 저장소 위치. 나머지 경로는 루트에서 파생된다.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SiteConfig {
    pub root: Option<PathBuf>,
}

impl SiteConfig {
    pub fn root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.root().join("data").join("songs.json")
    }

    pub fn cookie_path(&self) -> PathBuf {
        self.root().join("admin").join("cookie.txt")
    }

    pub fn library(&self) -> Library {
        Library::new(self.root())
    }
}

/// Tencent COS 미러 설정.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MirrorConfig {
    #[serde(default)]
    pub enabled: bool,
    pub secret_id: Option<String>,
    pub secret_key: Option<String>,
    pub region: Option<String>,
    pub bucket: Option<String>,
    pub cdn_domain: Option<String>,
}

impl MirrorConfig {
    pub fn is_configured(&self) -> bool {
        [&self.secret_id, &self.secret_key, &self.region, &self.bucket]
            .iter()
            .all(|v| v.as_ref().is_some_and(|s| !s.is_empty()))
    }
}

fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".config")
        .join("dailysong")
        .join("config.toml")
}

pub fn load_config() -> Config {
    let path = config_path();
    if !path.exists() {
        return Config::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            warn!("ignoring invalid config {}: {}", path.display(), e);
            Config::default()
        }),
        Err(_) => Config::default(),
    }
}

pub fn save_config(config: &Config) -> Result<()> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content)?;
    Ok(())
}
