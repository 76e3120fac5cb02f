use std::path::PathBuf;

use anyhow::{Context, Result};
use log::warn;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, REFERER, USER_AGENT};

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.114 Safari/537.36";
pub const SERVICE_REFERER: &str = "https://music.163.com/";

const CSRF_MARKER: &str = "csrf_token=";

/// 세션 쿠키를 공급하는 저장소.
/// 요청마다 다시 읽어서 운영자가 바꾼 값이 바로 반영되도록 한다.
pub trait CredentialProvider {
    fn credential(&self) -> Option<String>;
}

/// 한 줄짜리 텍스트 파일에 저장된 쿠키 문자열.
pub struct CookieFile {
    path: PathBuf,
}

impl CookieFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn read(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let cookie = content.trim();
        if cookie.is_empty() {
            None
        } else {
            Some(cookie.to_string())
        }
    }

    /// 줄바꿈을 제거하고 저장한다. 기존 값은 덮어쓴다.
    pub fn write(&self, cookie: &str) -> Result<()> {
        let cleaned = cookie.replace(['\n', '\r'], "");
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, cleaned.trim())
            .with_context(|| format!("쿠키 파일을 쓸 수 없습니다: {}", self.path.display()))?;
        Ok(())
    }
}

impl CredentialProvider for CookieFile {
    fn credential(&self) -> Option<String> {
        self.read()
    }
}

/// 요청 한 번 동안 사용하는 세션. 쿠키가 없으면 비인증 모드로 동작한다.
#[derive(Debug, Clone, Default)]
pub struct Session {
    credential: Option<String>,
}

impl Session {
    pub fn load(provider: &dyn CredentialProvider) -> Self {
        Self {
            credential: provider.credential(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.credential.as_deref().and_then(extract_csrf_token)
    }

    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(REFERER, HeaderValue::from_static(SERVICE_REFERER));

        if let Some(cookie) = &self.credential {
            match HeaderValue::from_str(cookie) {
                Ok(value) => {
                    headers.insert(COOKIE, value);
                }
                Err(_) => warn!("cookie contains characters not allowed in a header, sending without it"),
            }
        }

        headers
    }
}

/// 쿠키 문자열에서 `csrf_token=` 값을 꺼낸다 (다음 `;` 전까지).
pub fn extract_csrf_token(cookie: &str) -> Option<&str> {
    let (_, rest) = cookie.split_once(CSRF_MARKER)?;
    let token = rest.split(';').next().unwrap_or_default();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
pub(crate) struct FixedCredential(pub Option<&'static str>);

#[cfg(test)]
impl CredentialProvider for FixedCredential {
    fn credential(&self) -> Option<String> {
        self.0.map(str::to_string)
    }
}
