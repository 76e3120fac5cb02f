use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::TrackMetadata;

/// `data/songs.json` 전체. 모르는 최상위 키는 그대로 보존한다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub songs: Vec<CatalogEntry>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// 하루에 한 곡씩 보여주는 사이트의 곡 항목.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album: String,
    pub cover_image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    pub audio_file: String,
    #[serde(default)]
    pub recommendation: String,
    pub date: String,
}

impl CatalogEntry {
    pub fn from_track(track: &TrackMetadata, audio_file: &str, date: &str, recommendation: &str) -> Self {
        Self {
            id: track.id.to_string(),
            title: track.title.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
            cover_image: track.cover_url.clone(),
            background_image: None,
            audio_file: audio_file.to_string(),
            recommendation: recommendation.to_string(),
            date: date.to_string(),
        }
    }
}

impl Catalog {
    /// 같은 날짜의 항목이 있으면 교체하고, 없으면 추가한다.
    pub fn upsert(&mut self, entry: CatalogEntry) {
        match self.songs.iter_mut().find(|s| s.date == entry.date) {
            Some(existing) => *existing = entry,
            None => self.songs.push(entry),
        }
    }

    pub fn sorted_by_date_desc(&self) -> Vec<&CatalogEntry> {
        let mut songs: Vec<_> = self.songs.iter().collect();
        songs.sort_by(|a, b| b.date.cmp(&a.date));
        songs
    }
}

pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Catalog> {
        if !self.path.exists() {
            return Ok(Catalog::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("카탈로그를 읽을 수 없습니다: {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("카탈로그 형식이 올바르지 않습니다: {}", self.path.display()))
    }

    pub fn save(&self, catalog: &Catalog) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(catalog)?;
        std::fs::write(&self.path, content + "\n")
            .with_context(|| format!("카탈로그를 저장할 수 없습니다: {}", self.path.display()))?;
        Ok(())
    }
}
