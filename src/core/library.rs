use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::renamer;

/// 사이트 루트 기준 오디오 디렉토리.
pub const AUDIO_DIR: &str = "assets/audio";

/// 사이트 루트 아래 로컬 오디오 파일을 관리한다.
pub struct Library {
    root: PathBuf,
}

impl Library {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.root.join(AUDIO_DIR)
    }

    /// 파일명을 카탈로그에 기록할 사이트 상대 경로로 바꾼다.
    pub fn audio_path(filename: &str) -> String {
        format!("{}/{}", AUDIO_DIR, filename)
    }

    pub fn local_file(&self, filename: &str) -> PathBuf {
        self.audio_dir().join(filename)
    }

    /// 운영자가 직접 준비한 파일을 오디오 디렉토리에 복사한다.
    pub fn import_file(&self, src: &Path, filename: &str) -> Result<PathBuf> {
        if !src.is_file() {
            bail!("파일을 찾을 수 없습니다: {}", src.display());
        }
        let filename = renamer::sanitize_filename(filename);
        if filename.is_empty() || filename == "." || filename == ".." {
            bail!("올바른 파일명이 아닙니다: {:?}", filename);
        }

        let dest = self.local_file(&filename);
        std::fs::create_dir_all(self.audio_dir())?;
        if is_same_file(src, &dest) {
            // 이미 제자리에 있는 파일. 자기 자신에 복사하면 내용이 지워진다.
            return Ok(dest);
        }
        std::fs::copy(src, &dest)
            .with_context(|| format!("파일을 복사할 수 없습니다: {}", src.display()))?;
        Ok(dest)
    }

    /// `assets/audio/` 아래의 파일만 삭제한다.
    pub fn delete_file(&self, relative: &str) -> Result<()> {
        let rel = Path::new(relative);
        let inside = relative.starts_with(&format!("{}/", AUDIO_DIR))
            && rel.components().all(|c| matches!(c, Component::Normal(_)));
        if !inside {
            bail!("삭제할 수 없는 경로입니다: {}", relative);
        }

        let full = self.root.join(rel);
        if !full.is_file() {
            bail!("파일을 찾을 수 없습니다: {}", relative);
        }
        std::fs::remove_file(&full)
            .with_context(|| format!("파일을 삭제할 수 없습니다: {}", full.display()))?;
        Ok(())
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
