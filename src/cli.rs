use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use dialoguer::{Confirm, Input};

use crate::config::{self, Config, MirrorConfig};
use crate::core::catalog::{CatalogEntry, CatalogStore};
use crate::core::fetcher::MediaFetcher;
use crate::core::library::Library;
use crate::core::publish;
use crate::error::Error;
use crate::mirror::CosMirror;
use crate::pipeline::{Pipeline, Resolved};
use crate::session::CookieFile;
use crate::sources::netease::NeteaseClient;
use crate::sources::{http_client, PlayerResolver};

#[derive(Parser)]
#[command(name = "dailysong", about = "오늘의 곡 사이트 관리 도구 (NetEase Cloud Music)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 곡 ID 또는 URL에서 메타데이터와 재생 URL 확인
    Parse {
        /// 곡 ID 또는 `id=` 가 들어간 URL
        query: String,
    },
    /// 곡을 assets/audio/ 에 다운로드
    Download {
        query: String,
    },
    /// 곡을 받아서 카탈로그(data/songs.json)에 등록
    Add {
        query: String,
        /// 게시 날짜 (YYYY-MM-DD, 기본값: 오늘)
        #[arg(long)]
        date: Option<String>,
        /// 추천 문구
        #[arg(long, default_value = "")]
        recommendation: String,
        /// 다운로드 대신 사용할 로컬 파일 (제한된 곡용)
        #[arg(long)]
        file: Option<PathBuf>,
        /// COS 미러에도 업로드
        #[arg(long)]
        mirror: bool,
    },
    /// 로컬 오디오 파일을 직접 가져오기
    Import {
        file: PathBuf,
        /// 저장할 파일명 (예: "Artist - Title.mp3")
        filename: String,
    },
    /// assets/audio/ 아래 파일 삭제
    Delete {
        /// 사이트 기준 경로 (예: assets/audio/Artist - Title.mp3)
        path: String,
    },
    /// 카탈로그 목록 표시 (최신순)
    Songs,
    /// NetEase 쿠키 표시 또는 변경
    Cookie {
        /// 새 쿠키 문자열
        value: Option<String>,
    },
    /// 변경 사항을 커밋하고 origin으로 push
    Push,
    /// 사이트 경로와 COS 미러 설정
    Config,
}

/// 명령 실행에 필요한 클라이언트 묶음.
struct App {
    config: Config,
    netease: NeteaseClient,
    resolver: PlayerResolver,
    fetcher: MediaFetcher,
    cookies: CookieFile,
}

impl App {
    fn new() -> Result<Self> {
        let config = config::load_config();
        let netease = NeteaseClient::new()?;
        let resolver = netease.player_resolver();
        let fetcher = MediaFetcher::new(http_client()?);
        let cookies = CookieFile::new(config.site.cookie_path());
        Ok(Self {
            config,
            netease,
            resolver,
            fetcher,
            cookies,
        })
    }

    fn pipeline(&self) -> Pipeline<'_> {
        Pipeline::new(&self.netease, &self.resolver, &self.fetcher, &self.cookies)
    }

    fn library(&self) -> Library {
        self.config.site.library()
    }
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Parse { query } => cmd_parse(&query),
        Commands::Download { query } => cmd_download(&query),
        Commands::Add {
            query,
            date,
            recommendation,
            file,
            mirror,
        } => cmd_add(&query, date, &recommendation, file.as_deref(), mirror),
        Commands::Import { file, filename } => cmd_import(&file, &filename),
        Commands::Delete { path } => cmd_delete(&path),
        Commands::Songs => cmd_songs(),
        Commands::Cookie { value } => cmd_cookie(value),
        Commands::Push => cmd_push(),
        Commands::Config => cmd_config(),
    }
}

fn print_resolved(resolved: &Resolved) {
    let meta = &resolved.metadata;
    println!("ID:       {}", meta.id);
    println!("제목:     {}", meta.title);
    println!("아티스트: {}", meta.artist);
    println!("앨범:     {}", meta.album);
    println!("커버:     {}", meta.cover_url);
    println!("파일명:   {}", meta.filename);
    println!("오디오:   {} [{}]", resolved.audio.url, resolved.audio.kind);
}

fn cmd_parse(query: &str) -> Result<()> {
    let app = App::new()?;
    let resolved = app.pipeline().resolve(query)?;
    print_resolved(&resolved);
    Ok(())
}

/// 재생 URL을 내려받는다. 제한된 곡이면 직접 업로드 방법을 안내한다.
fn download_track(app: &App, resolved: &Resolved, query: &str) -> Result<PathBuf> {
    let pipeline = app.pipeline();
    let dest = app.library().local_file(&resolved.metadata.filename);

    match pipeline.download(&resolved.audio, &dest) {
        Ok(written) => println!("다운로드 완료: {} ({} bytes)", dest.display(), written),
        Err(Error::RestrictedContent) => {
            println!("{}", Error::RestrictedContent);
            println!("  dailysong add \"{}\" --file <로컬 파일 경로>", query);
            return Err(Error::RestrictedContent.into());
        }
        Err(e) => return Err(e.into()),
    }

    Ok(dest)
}

fn cmd_download(query: &str) -> Result<()> {
    let app = App::new()?;
    let resolved = app.pipeline().resolve(query)?;
    println!("{} [{}]", resolved.metadata.summary(), resolved.audio.kind);

    download_track(&app, &resolved, query)?;
    Ok(())
}

fn cmd_add(
    query: &str,
    date: Option<String>,
    recommendation: &str,
    file: Option<&Path>,
    mirror: bool,
) -> Result<()> {
    let date = catalog_date(date.as_deref())?;
    let app = App::new()?;
    let resolved = app.pipeline().resolve(query)?;
    let filename = &resolved.metadata.filename;
    println!("{}", resolved.metadata.summary());

    let local = match file {
        Some(src) => {
            let dest = app.library().import_file(src, filename)?;
            println!("파일을 가져왔습니다: {}", dest.display());
            dest
        }
        None => download_track(&app, &resolved, query)?,
    };

    let mut audio_file = Library::audio_path(filename);
    if mirror {
        let cos = CosMirror::from_config(&app.config.mirror, http_client()?);
        if !cos.is_enabled() {
            println!("COS 미러가 설정되지 않았습니다 ('dailysong config'로 설정).");
        }
        match cos.upload(&local, &format!("audio/{}", filename)) {
            Some(url) => {
                println!("COS 업로드 완료: {}", url);
                audio_file = url;
            }
            None => println!("{}", Error::MirrorUnavailable),
        }
    }

    let store = CatalogStore::new(app.config.site.catalog_path());
    let mut catalog = store.load()?;
    catalog.upsert(CatalogEntry::from_track(
        &resolved.metadata,
        &audio_file,
        &date,
        recommendation,
    ));
    store.save(&catalog)?;

    println!("{} 에 등록했습니다: {}", date, store.path().display());
    Ok(())
}

/// 게시 날짜를 YYYY-MM-DD로 확인한다. 없으면 오늘 날짜.
fn catalog_date(date: Option<&str>) -> Result<String> {
    let date = match date {
        Some(d) => chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .with_context(|| format!("날짜 형식이 올바르지 않습니다 (YYYY-MM-DD): {}", d))?,
        None => chrono::Local::now().date_naive(),
    };
    Ok(date.format("%Y-%m-%d").to_string())
}

fn cmd_import(file: &Path, filename: &str) -> Result<()> {
    let cfg = config::load_config();
    let dest = cfg.site.library().import_file(file, filename)?;
    println!("파일을 가져왔습니다: {}", dest.display());
    Ok(())
}

fn cmd_delete(path: &str) -> Result<()> {
    let cfg = config::load_config();
    cfg.site.library().delete_file(path)?;
    println!("삭제했습니다: {}", path);
    Ok(())
}

fn cmd_songs() -> Result<()> {
    let cfg = config::load_config();
    let catalog = CatalogStore::new(cfg.site.catalog_path()).load()?;

    if catalog.songs.is_empty() {
        println!("등록된 곡이 없습니다.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["날짜", "제목", "아티스트", "앨범", "오디오"]);
    for song in catalog.sorted_by_date_desc() {
        table.add_row(vec![
            Cell::new(&song.date),
            Cell::new(&song.title),
            Cell::new(&song.artist),
            Cell::new(&song.album),
            Cell::new(&song.audio_file),
        ]);
    }

    println!("{table}");
    println!("\n총 {} 곡", catalog.songs.len());
    Ok(())
}

fn cmd_cookie(value: Option<String>) -> Result<()> {
    let cfg = config::load_config();
    let store = CookieFile::new(cfg.site.cookie_path());

    match value {
        Some(cookie) => {
            store.write(&cookie)?;
            println!("쿠키가 저장되었습니다.");
        }
        None => match store.read() {
            Some(cookie) => println!("{}", cookie),
            None => println!("저장된 쿠키가 없습니다 (비인증 모드)."),
        },
    }
    Ok(())
}

fn cmd_push() -> Result<()> {
    let cfg = config::load_config();
    let root = cfg.site.root();
    let message = format!(
        "Update songs via Admin Panel {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M")
    );

    match publish::commit_all(&root, &message)? {
        Some(oid) => {
            println!("커밋했습니다: {}", oid);
            publish::push(&root)?;
            println!("origin으로 push했습니다.");
        }
        None => println!("커밋할 변경 사항이 없습니다."),
    }
    Ok(())
}

fn cmd_config() -> Result<()> {
    let mut cfg = config::load_config();

    println!("사이트 설정");
    let current_root = cfg.site.root().display().to_string();
    let root: String = Input::new()
        .with_prompt("사이트 저장소 경로")
        .with_initial_text(current_root)
        .interact_text()?;
    cfg.site.root = Some(PathBuf::from(root));

    println!("\nTencent COS 미러 설정");
    let enabled = Confirm::new()
        .with_prompt("COS 업로드를 사용할까요?")
        .default(cfg.mirror.enabled)
        .interact()?;

    if enabled {
        let prompt = |label: &str, current: &Option<String>| -> Result<String> {
            Input::new()
                .with_prompt(label)
                .with_initial_text(current.clone().unwrap_or_default())
                .allow_empty(true)
                .interact_text()
                .context("입력을 읽을 수 없습니다")
        };
        let optional = |s: String| if s.is_empty() { None } else { Some(s) };

        cfg.mirror = MirrorConfig {
            enabled,
            secret_id: optional(prompt("Secret ID", &cfg.mirror.secret_id)?),
            secret_key: optional(prompt("Secret Key", &cfg.mirror.secret_key)?),
            region: optional(prompt("Region (예: ap-shanghai)", &cfg.mirror.region)?),
            bucket: optional(prompt("Bucket", &cfg.mirror.bucket)?),
            cdn_domain: optional(prompt("CDN 도메인 (선택)", &cfg.mirror.cdn_domain)?),
        };

        if !cfg.mirror.is_configured() {
            println!("필수 항목이 비어 있어 업로드가 비활성화됩니다.");
        }
    } else {
        cfg.mirror.enabled = false;
    }

    config::save_config(&cfg)?;
    println!("\n설정이 저장되었습니다!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_date_accepts_iso_date() {
        assert_eq!(catalog_date(Some("2024-03-09")).unwrap(), "2024-03-09");
    }

    #[test]
    fn test_catalog_date_rejects_free_text() {
        assert!(catalog_date(Some("tomorrow")).is_err());
        assert!(catalog_date(Some("2024-13-01")).is_err());
        assert!(catalog_date(Some("")).is_err());
    }

    #[test]
    fn test_catalog_date_defaults_to_today() {
        let date = catalog_date(None).unwrap();
        assert!(chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_ok());
    }
}
