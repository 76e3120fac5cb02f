use std::path::Path;

use anyhow::{Context, Result};
use git2::{
    Cred, CredentialType, IndexAddOption, Oid, PushOptions, RemoteCallbacks, Repository,
    StatusOptions,
};
use log::info;

/// 변경된 파일(삭제, 추적되지 않은 파일 포함)을 모두 스테이징하고 커밋한다.
/// 바뀐 것이 없으면 None.
pub fn commit_all(root: &Path, message: &str) -> Result<Option<Oid>> {
    let repo = Repository::open(root)
        .with_context(|| format!("git 저장소를 열 수 없습니다: {}", root.display()))?;

    let mut opts = StatusOptions::new();
    opts.include_untracked(true).recurse_untracked_dirs(true);
    if repo.statuses(Some(&mut opts))?.is_empty() {
        return Ok(None);
    }

    let mut index = repo.index()?;
    index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
    index.update_all(["*"], None)?;
    index.write()?;

    let tree = repo.find_tree(index.write_tree()?)?;
    let sig = repo
        .signature()
        .context("git user.name / user.email이 설정되지 않았습니다")?;
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<_> = parent.iter().collect();

    let oid = repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;
    info!("committed {}", oid);
    Ok(Some(oid))
}

/// 현재 브랜치를 origin으로 push한다. SSH 에이전트나 git credential helper로 인증한다.
pub fn push(root: &Path) -> Result<()> {
    let repo = Repository::open(root)?;
    let head = repo.head().context("HEAD를 찾을 수 없습니다")?;
    let refname = head
        .name()
        .context("현재 브랜치 이름을 읽을 수 없습니다")?
        .to_string();

    let config = repo.config()?;
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |url, username, allowed| {
        if allowed.contains(CredentialType::SSH_KEY) {
            Cred::ssh_key_from_agent(username.unwrap_or("git"))
        } else if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
            Cred::credential_helper(&config, url, username)
        } else {
            Cred::default()
        }
    });

    let mut push_opts = PushOptions::new();
    push_opts.remote_callbacks(callbacks);

    let mut remote = repo
        .find_remote("origin")
        .context("origin 원격 저장소가 없습니다")?;
    remote
        .push(&[format!("{0}:{0}", refname)], Some(&mut push_opts))
        .context("push에 실패했습니다")?;
    info!("pushed {} to origin", refname);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init_repo(dir: &Path) -> Repository {
        let repo = Repository::init(dir).unwrap();
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Operator").unwrap();
        config.set_str("user.email", "operator@example.com").unwrap();
        repo
    }

    #[test]
    fn test_commit_all_and_nothing_to_commit() {
        let dir = TempDir::new().unwrap();
        let repo = init_repo(dir.path());
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data").join("songs.json"), "{}").unwrap();

        let first = commit_all(dir.path(), "Update songs").unwrap();
        assert!(first.is_some());
        assert_eq!(
            repo.head().unwrap().peel_to_commit().unwrap().message(),
            Some("Update songs")
        );

        assert_eq!(commit_all(dir.path(), "again").unwrap(), None);
    }

    #[test]
    fn test_commit_all_records_deletion() {
        let dir = TempDir::new().unwrap();
        let repo = init_repo(dir.path());
        let file = dir.path().join("a.mp3");
        std::fs::write(&file, b"x").unwrap();
        commit_all(dir.path(), "add").unwrap();

        std::fs::remove_file(&file).unwrap();
        commit_all(dir.path(), "remove").unwrap().unwrap();

        let tree = repo.head().unwrap().peel_to_tree().unwrap();
        assert!(tree.get_name("a.mp3").is_none());
    }

    #[test]
    fn test_commit_outside_repo_fails() {
        let dir = TempDir::new().unwrap();
        assert!(commit_all(&dir.path().join("missing"), "x").is_err());
    }
}
