use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;

use crate::error::{self, Error};
use crate::models::{TrackId, TrackMetadata, UrlKind};
use crate::session::Session;
use crate::sources::{http_client, MetadataSource, PlayerResolver, UrlStrategy};

/// 고음질 요청에 쓰는 비트레이트 값.
const HIGH_BITRATE: &str = "320000";

/// NetEase 비공식 API 주소들. 테스트에서는 로컬 서버 주소로 바꿔 끼운다.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub detail: String,
    pub player_url: String,
    /// `{id}` 자리에 곡 ID가 들어가는 직접 재생 URL 템플릿.
    pub outer_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            detail: "http://music.163.com/api/song/detail/".to_string(),
            player_url: "https://music.163.com/api/song/enhance/player/url".to_string(),
            outer_url: "http://music.163.com/song/media/outer/url?id={id}.mp3".to_string(),
        }
    }
}

/// NetEase Cloud Music 클라이언트.
pub struct NeteaseClient {
    client: reqwest::blocking::Client,
    endpoints: Endpoints,
}

#[derive(Deserialize)]
struct DetailResponse {
    #[serde(default)]
    songs: Option<Vec<serde_json::Value>>,
}

#[derive(Deserialize)]
struct NeteaseSong {
    name: String,
    artists: Vec<NeteaseArtist>,
    album: NeteaseAlbum,
}

#[derive(Deserialize)]
struct NeteaseArtist {
    name: String,
}

#[derive(Deserialize)]
struct NeteaseAlbum {
    name: String,
    #[serde(rename = "picUrl")]
    pic_url: String,
}

#[derive(Deserialize)]
struct PlayerUrlResponse {
    #[serde(default)]
    data: Option<Vec<PlayerUrlEntry>>,
}

#[derive(Deserialize)]
struct PlayerUrlEntry {
    #[serde(default)]
    url: Option<String>,
}

impl NeteaseClient {
    pub fn new() -> Result<Self> {
        Ok(Self::with_endpoints(http_client()?, Endpoints::default()))
    }

    pub fn with_endpoints(client: reqwest::blocking::Client, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }

    /// 인증 경로를 먼저, 직접 재생 URL을 마지막에 시도하는 resolver.
    pub fn player_resolver(&self) -> PlayerResolver {
        PlayerResolver::new(vec![
            Box::new(EnhancedPlayer {
                client: self.client.clone(),
                endpoint: self.endpoints.player_url.clone(),
            }),
            Box::new(OuterUrl::new(&self.endpoints.outer_url)),
        ])
    }

    /// 상세 API 응답 본문을 메타데이터로 변환한다.
    /// 곡 목록이 없거나 비어 있으면 NotFound, 필드가 빠져 있으면 MalformedResponse.
    fn parse_detail(id: &TrackId, body: &str) -> error::Result<TrackMetadata> {
        let resp: DetailResponse = serde_json::from_str(body)
            .map_err(|e| Error::MalformedResponse(format!("곡 상세 응답: {}", e)))?;

        let first = resp
            .songs
            .into_iter()
            .flatten()
            .next()
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        let song: NeteaseSong = serde_json::from_value(first)
            .map_err(|e| Error::MalformedResponse(format!("곡 정보: {}", e)))?;

        // 첫 번째 아티스트만 사용한다
        let artist = song
            .artists
            .into_iter()
            .next()
            .ok_or_else(|| Error::MalformedResponse("아티스트 목록이 비어 있습니다".to_string()))?;

        Ok(TrackMetadata::new(
            id.clone(),
            song.name,
            artist.name,
            song.album.name,
            song.album.pic_url,
        ))
    }
}

impl MetadataSource for NeteaseClient {
    fn name(&self) -> &str {
        "NetEase"
    }

    fn lookup(&self, id: &TrackId, session: &Session) -> error::Result<TrackMetadata> {
        let ids = format!("[{}]", id);
        let body = self
            .client
            .get(&self.endpoints.detail)
            .headers(session.headers())
            .query(&[("id", id.as_str()), ("ids", ids.as_str())])
            .send()?
            .text()?;

        Self::parse_detail(id, &body)
    }
}

/// 쿠키의 csrf 토큰을 실어 고음질 URL을 요청하는 경로.
pub struct EnhancedPlayer {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl EnhancedPlayer {
    fn request(&self, id: &TrackId, session: &Session) -> Result<Option<String>> {
        let ids = format!("[{}]", id);
        let csrf_token = session.csrf_token().unwrap_or_default();

        let resp: PlayerUrlResponse = self
            .client
            .get(&self.endpoint)
            .headers(session.headers())
            .query(&[
                ("ids", ids.as_str()),
                ("br", HIGH_BITRATE),
                ("csrf_token", csrf_token),
            ])
            .send()
            .context("재생 URL 요청에 실패했습니다")?
            .json()
            .context("재생 URL 응답 파싱에 실패했습니다")?;

        let url = resp
            .data
            .into_iter()
            .flatten()
            .next()
            .and_then(|entry| entry.url)
            .filter(|url| !url.is_empty());

        Ok(url)
    }
}

impl UrlStrategy for EnhancedPlayer {
    fn kind(&self) -> UrlKind {
        UrlKind::HighBitrate
    }

    fn try_resolve(&self, id: &TrackId, session: &Session) -> Option<String> {
        match self.request(id, session) {
            Ok(url) => url,
            Err(e) => {
                debug!("enhanced player url failed for {}: {:#}", id, e);
                None
            }
        }
    }
}

/// 인증 없이 쓰는 직접 재생 URL. 문자열 치환이라 항상 성공한다.
pub struct OuterUrl {
    template: String,
}

impl OuterUrl {
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    pub fn url_for(&self, id: &TrackId) -> String {
        self.template.replace("{id}", id.as_str())
    }
}

impl UrlStrategy for OuterUrl {
    fn kind(&self) -> UrlKind {
        UrlKind::Fallback
    }

    fn try_resolve(&self, id: &TrackId, _session: &Session) -> Option<String> {
        Some(self.url_for(id))
    }
}
