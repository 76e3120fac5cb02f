use std::path::Path;

use log::{debug, info};

use crate::core::fetcher::MediaFetcher;
use crate::core::query;
use crate::error::{Error, Result};
use crate::models::{AudioUrl, TrackMetadata};
use crate::session::{CredentialProvider, Session};
use crate::sources::{MetadataSource, PlayerResolver};

/// 한 곡의 해석 결과.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub metadata: TrackMetadata,
    pub audio: AudioUrl,
}

/// 쿼리 → ID → 메타데이터 → 재생 URL → 로컬 파일 순서의 처리 흐름.
/// 모든 외부 의존성은 주입받으며, 요청마다 쿠키를 다시 읽는다.
pub struct Pipeline<'a> {
    source: &'a dyn MetadataSource,
    resolver: &'a PlayerResolver,
    fetcher: &'a MediaFetcher,
    credentials: &'a dyn CredentialProvider,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        source: &'a dyn MetadataSource,
        resolver: &'a PlayerResolver,
        fetcher: &'a MediaFetcher,
        credentials: &'a dyn CredentialProvider,
    ) -> Self {
        Self {
            source,
            resolver,
            fetcher,
            credentials,
        }
    }

    pub fn session(&self) -> Session {
        Session::load(self.credentials)
    }

    pub fn resolve(&self, query: &str) -> Result<Resolved> {
        let id = query::normalize(query)?;
        let session = self.session();
        debug!("resolving {} (authenticated: {})", id, session.is_authenticated());

        let metadata = self.source.lookup(&id, &session)?;
        info!("{} {}: {}", self.source.name(), id, metadata.summary());

        let audio = self
            .resolver
            .resolve(&id, &session)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        Ok(Resolved { metadata, audio })
    }

    pub fn download(&self, audio: &AudioUrl, dest: &Path) -> Result<u64> {
        let session = self.session();
        let written = self.fetcher.fetch(&audio.url, &session, dest)?;
        info!("saved {} bytes ({}) to {}", written, audio.kind, dest.display());
        Ok(written)
    }
}
