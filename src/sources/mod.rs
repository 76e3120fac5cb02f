pub mod netease;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::error;
use crate::models::{AudioUrl, TrackId, TrackMetadata, UrlKind};
use crate::session::Session;

/// 곡 메타데이터 소스 트레이트.
/// 실제 서비스와 테스트용 가짜 구현을 같은 파이프라인에 꽂을 수 있게 한다.
pub trait MetadataSource {
    fn name(&self) -> &str;
    /// 곡 ID로 메타데이터를 조회한다. 일부만 채워진 결과는 돌려주지 않는다.
    fn lookup(&self, id: &TrackId, session: &Session) -> error::Result<TrackMetadata>;
}

/// 재생 URL을 얻는 한 가지 방법. 실패는 모두 `None`으로 삼킨다.
pub trait UrlStrategy {
    fn kind(&self) -> UrlKind;
    fn try_resolve(&self, id: &TrackId, session: &Session) -> Option<String>;
}

/// 등록된 순서대로 전략을 시도하고, 처음 나온 비어 있지 않은 URL을 쓴다.
pub struct PlayerResolver {
    strategies: Vec<Box<dyn UrlStrategy>>,
}

impl PlayerResolver {
    pub fn new(strategies: Vec<Box<dyn UrlStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn resolve(&self, id: &TrackId, session: &Session) -> Option<AudioUrl> {
        for strategy in &self.strategies {
            match strategy.try_resolve(id, session) {
                Some(url) if !url.is_empty() => {
                    info!("resolved {} via {:?}", id, strategy.kind());
                    return Some(AudioUrl {
                        url,
                        kind: strategy.kind(),
                    });
                }
                _ => debug!("{:?} gave no url for {}", strategy.kind(), id),
            }
        }
        None
    }
}

pub fn http_client() -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .build()
        .context("HTTP 클라이언트 생성에 실패했습니다")
}
