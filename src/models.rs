use std::fmt;

use crate::core::renamer;

/// 숫자로만 이루어진 곡 ID. `core::query::normalize`로만 만들어진다.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackId(String);

impl TrackId {
    pub(crate) fn from_digits(digits: &str) -> Self {
        debug_assert!(!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()));
        Self(digits.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 곡 상세 API에서 해석한 메타데이터.
/// 한 번 만들어지면 바뀌지 않으며, 파일명은 생성 시점에 결정된다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub cover_url: String,
    pub filename: String,
}

impl TrackMetadata {
    pub fn new(id: TrackId, title: String, artist: String, album: String, cover_url: String) -> Self {
        let filename = renamer::build_filename(&artist, &title);
        Self {
            id,
            title,
            artist,
            album,
            cover_url,
            filename,
        }
    }

    pub fn summary(&self) -> String {
        format!("{} - {} [{}]", self.artist, self.title, self.album)
    }
}

/// 재생 URL이 어느 경로로 얻어졌는지. 로그/출력용이며 이후 처리는 동일하다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    HighBitrate,
    Fallback,
}

impl fmt::Display for UrlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlKind::HighBitrate => f.write_str("고음질 (인증)"),
            UrlKind::Fallback => f.write_str("외부 링크 (비인증)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioUrl {
    pub url: String,
    pub kind: UrlKind,
}
