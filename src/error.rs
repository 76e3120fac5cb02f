use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// 곡 해석/다운로드 파이프라인의 실패 종류.
/// 각 변형은 운영자에게 그대로 보여줄 수 있는 메시지를 가진다.
#[derive(Debug, Error)]
pub enum Error {
    #[error("올바른 곡 ID가 아닙니다: {0:?}")]
    InvalidQuery(String),

    #[error("곡을 찾을 수 없습니다 (ID {0})")]
    NotFound(String),

    #[error("응답 형식이 올바르지 않습니다: {0}")]
    MalformedResponse(String),

    #[error("네트워크 요청에 실패했습니다: {0}")]
    Network(#[from] reqwest::Error),

    #[error("다운로드 요청이 실패했습니다 (HTTP {0})")]
    Http(u16),

    #[error("다운로드가 제한된 곡입니다 (VIP/저작권 제한). 파일을 직접 업로드하세요.")]
    RestrictedContent,

    #[error("파일 입출력 오류: {0}")]
    Io(#[from] std::io::Error),

    #[error("원격 미러를 사용할 수 없습니다. 로컬 경로를 사용합니다.")]
    MirrorUnavailable,
}
