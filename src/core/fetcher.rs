use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use log::{debug, warn};
use reqwest::header::CONTENT_TYPE;

use crate::error::{Error, Result};
use crate::session::Session;

const CHUNK_SIZE: usize = 8192;

/// 재생 URL의 오디오를 로컬 파일로 내려받는다.
pub struct MediaFetcher {
    client: reqwest::blocking::Client,
}

impl MediaFetcher {
    pub fn new(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }

    /// `url`을 `dest`에 저장하고 기록한 바이트 수를 돌려준다.
    ///
    /// 상태 코드가 2xx가 아니면 `Http`, 2xx인데 HTML 문서면 `RestrictedContent`.
    /// 두 경우 모두 파일을 만들지 않는다.
    pub fn fetch(&self, url: &str, session: &Session, dest: &Path) -> Result<u64> {
        let resp = self.client.get(url).headers(session.headers()).send()?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        debug!("GET {} -> {} ({})", url, status, content_type);

        check_response(status, &content_type)?;
        write_stream(resp, dest)
    }
}

/// 서비스는 제한된 곡에 대해 200과 함께 HTML 페이지를 돌려준다.
/// 판정은 Content-Type만 본다.
pub fn check_response(status: u16, content_type: &str) -> Result<()> {
    if !(200..300).contains(&status) {
        return Err(Error::Http(status));
    }
    if is_markup(content_type) {
        return Err(Error::RestrictedContent);
    }
    Ok(())
}

fn is_markup(content_type: &str) -> bool {
    content_type.contains("text/html")
}

/// 본문을 고정 크기 청크로 `dest`에 쓴다. 상위 디렉토리는 필요하면 만든다.
/// 중간에 실패하면 쓰다 만 파일을 지우고 오류를 돌려준다.
pub fn write_stream(mut body: impl Read, dest: &Path) -> Result<u64> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = File::create(dest)?;
    let result = copy_chunks(&mut body, &mut file);
    drop(file);

    match result {
        Ok(written) => Ok(written),
        Err(e) => {
            if let Err(rm) = std::fs::remove_file(dest) {
                warn!("could not remove partial file {}: {}", dest.display(), rm);
            }
            Err(Error::Io(e))
        }
    }
}

fn copy_chunks(body: &mut impl Read, file: &mut File) -> std::io::Result<u64> {
    let mut buf = [0u8; CHUNK_SIZE];
    let mut written = 0u64;
    loop {
        let n = match body.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        file.write_all(&buf[..n])?;
        written += n as u64;
    }
    file.flush()?;
    Ok(written)
}
