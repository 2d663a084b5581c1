use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::spawn_blocking;
use tracing::debug;

use crate::batch::{self, BatchKind};
use crate::cache::Caches;
use crate::git;
use crate::github;
use crate::messages::Message;
use crate::models::BranchDetail;

/// How long a transient status notice stays on screen.
pub const STATUS_CLEAR_DELAY: Duration = Duration::from_secs(3);

/// A deferred unit of work emitted by `App::update`. Each command runs
/// on its own task, may block on external tools, and resolves to at
/// most one `Message`. Commands never touch `App` state — the caches
/// are the only thing they share.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    DiscoverRepos { paths: Vec<PathBuf>, max_depth: usize },
    LoadSummary(PathBuf),
    LoadPr { path: PathBuf, branch: String, upstream: String },
    LoadPrCount { path: PathBuf, upstream: String },
    LoadWorkflow(PathBuf),
    LoadDetail(PathBuf),
    LoadBranchDetail { path: PathBuf, branch: String },
    LoadPrDetail { path: PathBuf, number: u64 },
    /// Same fetch as `LoadPrDetail`, but the result is dropped after
    /// warming the cache. Never produces a message.
    PrefetchPrDetail { path: PathBuf, number: u64 },
    ClearCaches,
    ClearStatusAfterDelay,
    CopyToClipboard(String),
    OpenUrl(String),
    OpenOrCreatePr { path: PathBuf, branch: String },
    RunBatch { kind: BatchKind, paths: Vec<PathBuf> },
}

impl Command {
    pub async fn run(self, caches: Arc<Caches>) -> Option<Message> {
        match self {
            Command::DiscoverRepos { paths, max_depth } => {
                let paths = spawn_blocking(move || {
                    crate::discovery::discover_repos(&paths, max_depth)
                })
                .await
                .ok()?;
                Some(Message::ReposDiscovered(paths))
            }

            Command::LoadSummary(path) => {
                let p = path.clone();
                let result = spawn_blocking(move || git::repo_summary(&p)).await.ok()?;
                Some(Message::SummaryLoaded {
                    path,
                    result: result.map_err(|e| e.to_string()),
                })
            }

            Command::LoadPr { path, branch, upstream } => {
                let p = path.clone();
                let pr = spawn_blocking(move || {
                    github::pr_for_branch(&caches, &p, &branch, &upstream)
                })
                .await
                .ok()?
                .unwrap_or(None);
                Some(Message::PrLoaded { path, pr })
            }

            Command::LoadPrCount { path, upstream } => {
                let p = path.clone();
                let count = spawn_blocking(move || github::pr_count(&caches, &p, &upstream))
                    .await
                    .ok()?
                    .unwrap_or(0);
                Some(Message::PrCountLoaded { path, count })
            }

            Command::LoadWorkflow(path) => {
                let p = path.clone();
                let workflow = spawn_blocking(move || {
                    let sha = git::commit_log(&p, 1)
                        .ok()
                        .and_then(|commits| commits.first().map(|c| c.hash.clone()))
                        .unwrap_or_default();
                    github::workflow_runs_for_commit(&caches, &p, &sha)
                })
                .await
                .ok()?
                .unwrap_or(None);
                Some(Message::WorkflowLoaded { path, workflow })
            }

            Command::LoadDetail(path) => {
                let p = path.clone();
                let (branches, stashes, worktrees, prs) = spawn_blocking(move || {
                    let key = p.display().to_string();
                    let branches = match caches.branches.get(&key) {
                        Some(cached) => cached,
                        None => {
                            let fresh = git::branch_list(&p).unwrap_or_default();
                            caches.branches.set(&key, fresh.clone());
                            fresh
                        }
                    };
                    let stashes = git::stash_list(&p).unwrap_or_default();
                    let worktrees = git::worktree_list(&p).unwrap_or_default();

                    let upstream = git::current_branch(&p)
                        .and_then(|branch| git::upstream(&p, &branch))
                        .unwrap_or_default();
                    let prs = github::pr_list(&caches, &p, &upstream).unwrap_or_default();

                    (branches, stashes, worktrees, prs)
                })
                .await
                .ok()?;
                Some(Message::DetailLoaded {
                    path,
                    branches,
                    stashes,
                    worktrees,
                    prs,
                })
            }

            Command::LoadBranchDetail { path, branch } => {
                let p = path.clone();
                let detail = spawn_blocking(move || load_branch_detail(&caches, &p, &branch))
                    .await
                    .ok()?;
                Some(Message::BranchDetailLoaded { path, detail })
            }

            Command::LoadPrDetail { path, number } => {
                let p = path.clone();
                let result = spawn_blocking(move || github::pr_detail(&caches, &p, number))
                    .await
                    .ok()?;
                Some(Message::PrDetailLoaded {
                    path,
                    number,
                    result: result.map_err(|e| e.to_string()),
                })
            }

            Command::PrefetchPrDetail { path, number } => {
                // Fetch purely to warm the shared cache; whatever comes
                // back (or fails) stays out of the dispatcher.
                let outcome = spawn_blocking(move || {
                    github::pr_detail(&caches, &path, number).map(|_| ())
                })
                .await;
                if let Ok(Err(e)) = outcome {
                    debug!("prefetch pr #{number} failed: {e}");
                }
                None
            }

            Command::ClearCaches => {
                caches.clear_all();
                Some(Message::RefreshComplete)
            }

            Command::ClearStatusAfterDelay => {
                tokio::time::sleep(STATUS_CLEAR_DELAY).await;
                Some(Message::ClearStatus)
            }

            Command::CopyToClipboard(text) => {
                let result = spawn_blocking(move || {
                    let mut clipboard = arboard::Clipboard::new()?;
                    clipboard.set_text(text.clone())?;
                    Ok::<String, anyhow::Error>(text)
                })
                .await
                .ok()?;
                match result {
                    Ok(text) => Some(Message::Status(format!("Copied to clipboard: {text}"))),
                    Err(e) => Some(Message::Status(format!("Failed to copy: {e}"))),
                }
            }

            Command::OpenUrl(url) => match open::that(&url) {
                Ok(()) => Some(Message::Status(format!("Opened in browser: {url}"))),
                Err(e) => Some(Message::Status(format!("Failed to open URL: {e}"))),
            },

            Command::OpenOrCreatePr { path, branch } => {
                let result =
                    spawn_blocking(move || github::open_or_create_pr(&path, &branch)).await.ok()?;
                match result {
                    Ok(()) => None,
                    Err(e) => Some(Message::Status(format!("Failed to open PR: {e}"))),
                }
            }

            Command::RunBatch { kind, paths } => {
                let results = spawn_blocking(move || batch::run_task(kind, &paths))
                    .await
                    .ok()?;
                Some(Message::BatchComplete { results })
            }
        }
    }
}

fn load_branch_detail(caches: &Caches, path: &std::path::Path, branch: &str) -> BranchDetail {
    let branches = git::branch_list(path).unwrap_or_default();
    let branch_info = branches
        .into_iter()
        .find(|b| b.name == branch)
        .unwrap_or_default();

    let commit_key = format!("{}:{}", path.display(), branch);
    let commits = match caches.commits.get(&commit_key) {
        Some(cached) => cached,
        None => {
            let fresh = git::commit_log(path, 20).unwrap_or_default();
            caches.commits.set(&commit_key, fresh.clone());
            fresh
        }
    };

    let counts = git::status_counts(path).unwrap_or_default();

    let upstream = git::upstream(path, branch).unwrap_or_default();
    let pr_info = if upstream.is_empty() {
        None
    } else {
        github::pr_for_branch(caches, path, branch, &upstream).unwrap_or(None)
    };

    let head_sha = commits.first().map(|c| c.hash.clone()).unwrap_or_default();
    let workflow_info = github::workflow_runs_for_commit(caches, path, &head_sha).unwrap_or(None);

    BranchDetail {
        branch: branch_info,
        commits,
        staged: counts.staged,
        unstaged: counts.unstaged,
        untracked: counts.untracked,
        conflicted: counts.conflicted,
        pr_info,
        workflow_info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Prefetch must stay silent for any identity, loadable or not. The
    // path below has no repository behind it, so the underlying fetch
    // fails; the command still resolves to no message.
    #[tokio::test]
    async fn prefetch_never_produces_a_message() {
        let caches = Arc::new(Caches::default());
        let cmd = Command::PrefetchPrDetail {
            path: PathBuf::from("/definitely/not/a/repo"),
            number: 123,
        };
        assert!(cmd.run(caches).await.is_none());
    }

    #[tokio::test]
    async fn clear_caches_reports_refresh_complete() {
        let caches = Arc::new(Caches::default());
        caches.pr_detail.set("k", crate::models::PrDetail::default());

        let msg = Command::ClearCaches.run(caches.clone()).await;
        assert!(matches!(msg, Some(Message::RefreshComplete)));
        assert!(caches.pr_detail.get("k").is_none());
    }

    #[tokio::test]
    async fn load_pr_detail_reports_error_with_identity() {
        let caches = Arc::new(Caches::default());
        let cmd = Command::LoadPrDetail {
            path: PathBuf::from("/definitely/not/a/repo"),
            number: 7,
        };
        match cmd.run(caches).await {
            Some(Message::PrDetailLoaded { path, number, result }) => {
                assert_eq!(path, PathBuf::from("/definitely/not/a/repo"));
                assert_eq!(number, 7);
                assert!(result.is_err());
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn batch_over_bad_repos_completes_with_rows() {
        let caches = Arc::new(Caches::default());
        let tmp = tempfile::tempdir().unwrap();
        let cmd = Command::RunBatch {
            kind: BatchKind::FetchAll,
            paths: vec![tmp.path().join("nope")],
        };
        match cmd.run(caches).await {
            Some(Message::BatchComplete { results }) => {
                assert_eq!(results.len(), 1);
                assert!(!results[0].success);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
