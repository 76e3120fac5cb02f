use std::fs::File;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use hmac::{Hmac, Mac};
use log::{info, warn};
use reqwest::header::AUTHORIZATION;
use sha1::{Digest, Sha1};
use url::Url;

use crate::config::MirrorConfig;

type HmacSha1 = Hmac<Sha1>;

/// 서명 유효 시간 (초).
const SIGN_VALID_SECS: u64 = 600;

/// 완성된 로컬 파일을 Tencent COS 버킷에 올리는 선택적 미러.
/// 설정이 빠져 있으면 아무 일도 하지 않는다.
pub struct CosMirror {
    bucket: Option<CosBucket>,
}

struct CosBucket {
    client: reqwest::blocking::Client,
    secret_id: String,
    secret_key: String,
    region: String,
    bucket: String,
    cdn_domain: Option<String>,
    endpoint: String,
}

impl CosMirror {
    pub fn from_config(config: &MirrorConfig, client: reqwest::blocking::Client) -> Self {
        if !config.enabled {
            return Self { bucket: None };
        }
        if !config.is_configured() {
            warn!("COS config incomplete, mirror disabled");
            return Self { bucket: None };
        }

        let field = |v: &Option<String>| v.clone().unwrap_or_default();
        let region = field(&config.region);
        let bucket = field(&config.bucket);
        let endpoint = format!("https://{}.cos.{}.myqcloud.com", bucket, region);

        Self {
            bucket: Some(CosBucket {
                client,
                secret_id: field(&config.secret_id),
                secret_key: field(&config.secret_key),
                region,
                bucket,
                cdn_domain: config.cdn_domain.clone().filter(|d| !d.is_empty()),
                endpoint,
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.bucket.is_some()
    }

    /// 업로드에 성공하면 공개 URL을, 그 밖의 모든 경우에는 None을 돌려준다.
    pub fn upload(&self, local: &Path, key: &str) -> Option<String> {
        let bucket = self.bucket.as_ref()?;
        match bucket.put_object(local, key) {
            Ok(()) => {
                let url = bucket.public_url(key);
                info!("uploaded {} to COS: {}", local.display(), url);
                Some(url)
            }
            Err(e) => {
                warn!("COS upload of {} failed: {:#}", local.display(), e);
                None
            }
        }
    }

    #[cfg(test)]
    fn with_endpoint(mut self, endpoint: &str) -> Self {
        if let Some(bucket) = self.bucket.as_mut() {
            bucket.endpoint = endpoint.trim_end_matches('/').to_string();
        }
        self
    }
}

impl CosBucket {
    fn public_url(&self, key: &str) -> String {
        match &self.cdn_domain {
            Some(domain) => format!("https://{}/{}", domain, key),
            None => format!(
                "https://{}.cos.{}.myqcloud.com/{}",
                self.bucket, self.region, key
            ),
        }
    }

    fn put_object(&self, local: &Path, key: &str) -> Result<()> {
        let file = File::open(local)
            .with_context(|| format!("파일을 열 수 없습니다: {}", local.display()))?;

        let mut url = Url::parse(&self.endpoint).context("COS 엔드포인트가 올바르지 않습니다")?;
        url.set_path(key);
        let host = match (url.host_str(), url.port()) {
            (Some(h), Some(p)) => format!("{}:{}", h, p),
            (Some(h), None) => h.to_string(),
            (None, _) => anyhow::bail!("COS 엔드포인트에 호스트가 없습니다"),
        };

        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let auth = self.authorization("put", &format!("/{}", key), &host, now)?;

        self.client
            .put(url)
            .header(AUTHORIZATION, auth)
            .body(file)
            .send()
            .context("COS 연결에 실패했습니다")?
            .error_for_status()
            .context("COS 업로드 요청이 거부되었습니다")?;
        Ok(())
    }

    /// COS 요청 서명 (q-sign-algorithm=sha1). host 헤더만 서명한다.
    fn authorization(&self, method: &str, path: &str, host: &str, now: u64) -> Result<String> {
        let key_time = format!("{};{}", now, now + SIGN_VALID_SECS);
        let sign_key = hmac_hex(self.secret_key.as_bytes(), &key_time)?;

        let host_value: String = url::form_urlencoded::byte_serialize(host.as_bytes()).collect();
        let http_string = format!("{}\n{}\n\nhost={}\n", method, path, host_value);
        let string_to_sign = format!(
            "sha1\n{}\n{}\n",
            key_time,
            hex::encode(Sha1::digest(http_string.as_bytes()))
        );
        let signature = hmac_hex(sign_key.as_bytes(), &string_to_sign)?;

        Ok(format!(
            "q-sign-algorithm=sha1&q-ak={}&q-sign-time={kt}&q-key-time={kt}&q-header-list=host&q-url-param-list=&q-signature={}",
            self.secret_id,
            signature,
            kt = key_time,
        ))
    }
}

fn hmac_hex(key: &[u8], message: &str) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(key).context("HMAC 키가 올바르지 않습니다")?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::{self, Canned, TestServer};
    use tempfile::TempDir;

    fn full_config() -> MirrorConfig {
        MirrorConfig {
            enabled: true,
            secret_id: Some("AKIDexample".to_string()),
            secret_key: Some("secret".to_string()),
            region: Some("ap-shanghai".to_string()),
            bucket: Some("songs-1250000000".to_string()),
            cdn_domain: None,
        }
    }

    fn temp_file(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("Artist - Song.mp3");
        std::fs::write(&path, b"ID3 audio bytes").unwrap();
        path
    }

    #[test]
    fn test_missing_secret_key_disables_upload() {
        let dir = TempDir::new().unwrap();
        let config = MirrorConfig {
            secret_key: None,
            ..full_config()
        };
        let mirror = CosMirror::from_config(&config, test_server::client());

        assert!(!mirror.is_enabled());
        assert_eq!(mirror.upload(&temp_file(&dir), "audio/a.mp3"), None);
    }

    #[test]
    fn test_disabled_flag_disables_upload() {
        let dir = TempDir::new().unwrap();
        let config = MirrorConfig {
            enabled: false,
            ..full_config()
        };
        let mirror = CosMirror::from_config(&config, test_server::client());
        assert!(!mirror.is_enabled());
        assert_eq!(mirror.upload(&temp_file(&dir), "audio/a.mp3"), None);
    }

    #[test]
    fn test_public_url_prefers_cdn() {
        let plain = CosMirror::from_config(&full_config(), test_server::client());
        assert_eq!(
            plain.bucket.as_ref().unwrap().public_url("audio/a.mp3"),
            "https://songs-1250000000.cos.ap-shanghai.myqcloud.com/audio/a.mp3"
        );

        let config = MirrorConfig {
            cdn_domain: Some("cdn.example.com".to_string()),
            ..full_config()
        };
        let cdn = CosMirror::from_config(&config, test_server::client());
        assert_eq!(
            cdn.bucket.as_ref().unwrap().public_url("audio/a.mp3"),
            "https://cdn.example.com/audio/a.mp3"
        );
    }

    #[test]
    fn test_authorization_shape() {
        let mirror = CosMirror::from_config(&full_config(), test_server::client());
        let bucket = mirror.bucket.as_ref().unwrap();
        let host = "songs-1250000000.cos.ap-shanghai.myqcloud.com";

        let auth = bucket.authorization("put", "/audio/a.mp3", host, 1_700_000_000).unwrap();
        assert!(auth.starts_with("q-sign-algorithm=sha1&q-ak=AKIDexample&"));
        assert!(auth.contains("q-sign-time=1700000000;1700000600"));
        assert!(auth.contains("q-header-list=host"));

        let signature = auth.rsplit("q-signature=").next().unwrap();
        assert_eq!(signature.len(), 40);
        assert!(signature.bytes().all(|b| b.is_ascii_hexdigit()));

        let again = bucket.authorization("put", "/audio/a.mp3", host, 1_700_000_000).unwrap();
        assert_eq!(auth, again);
        let other = bucket.authorization("put", "/audio/b.mp3", host, 1_700_000_000).unwrap();
        assert_ne!(auth, other);
    }

    #[test]
    fn test_hmac_hex_known_vector() {
        // RFC 2202 HMAC-SHA1 test case 2
        assert_eq!(
            hmac_hex(b"Jefe", "what do ya want for nothing?").unwrap(),
            "effcdf6ae5eb2fa2d27416d5f184df9c259a7c79"
        );
    }

    #[test]
    fn test_upload_success_returns_public_url() {
        let dir = TempDir::new().unwrap();
        let mut server = TestServer::start(vec![Canned {
            status: 200,
            content_type: "application/xml",
            body: Vec::new(),
        }]);
        let config = MirrorConfig {
            cdn_domain: Some("cdn.example.com".to_string()),
            ..full_config()
        };
        let mirror =
            CosMirror::from_config(&config, test_server::client()).with_endpoint(&server.url("/"));

        let url = mirror.upload(&temp_file(&dir), "audio/Artist - Song.mp3");
        assert_eq!(
            url.as_deref(),
            Some("https://cdn.example.com/audio/Artist - Song.mp3")
        );

        let requests = server.requests();
        assert!(requests[0].starts_with("PUT /audio/Artist%20-%20Song.mp3 "));
        assert!(requests[0].to_lowercase().contains("authorization: q-sign-algorithm=sha1"));
    }

    #[test]
    fn test_upload_error_is_swallowed() {
        let dir = TempDir::new().unwrap();
        let server = TestServer::start(vec![Canned {
            status: 403,
            content_type: "application/xml",
            body: b"<Error><Code>AccessDenied</Code></Error>".to_vec(),
        }]);
        let mirror = CosMirror::from_config(&full_config(), test_server::client())
            .with_endpoint(&server.url("/"));

        assert_eq!(mirror.upload(&temp_file(&dir), "audio/a.mp3"), None);
    }

    #[test]
    fn test_upload_missing_local_file_is_swallowed() {
        let dir = TempDir::new().unwrap();
        let mirror = CosMirror::from_config(&full_config(), test_server::client())
            .with_endpoint(&test_server::refused_url());
        assert_eq!(mirror.upload(&dir.path().join("nope.mp3"), "audio/a.mp3"), None);
    }
}
