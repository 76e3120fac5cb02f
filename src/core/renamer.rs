/// 파일명에 사용할 수 없는 문자를 `_`로 치환한다.
pub fn sanitize_filename(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c == '/' || c == '\0' {
                return '_';
            }
            if cfg!(target_os = "windows") {
                if matches!(c, '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') {
                    return '_';
                }
                if c.is_ascii_control() {
                    return '_';
                }
            }
            if cfg!(target_os = "macos") && c == ':' {
                return '_';
            }
            c
        })
        .collect()
}

/// `"{artist} - {title}.mp3"` 형식의 평평한 파일명을 만든다.
/// 같은 입력에는 항상 같은 결과를 돌려준다.
pub fn build_filename(artist: &str, title: &str) -> String {
    format!(
        "{} - {}.mp3",
        sanitize_filename(artist),
        sanitize_filename(title)
    )
}
