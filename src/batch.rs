use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::git;
use crate::models::repo_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    FetchAll,
    PruneRemote,
    CleanupMerged,
}

impl BatchKind {
    pub fn label(&self) -> &'static str {
        match self {
            BatchKind::FetchAll => "Fetch All",
            BatchKind::PruneRemote => "Prune Remote",
            BatchKind::CleanupMerged => "Cleanup Merged",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskResult {
    pub path: PathBuf,
    pub repo_name: String,
    pub success: bool,
    pub message: String,
    pub duration_ms: u128,
}

fn run_one(kind: BatchKind, repo: &Path) -> anyhow::Result<String> {
    match kind {
        BatchKind::FetchAll => git::fetch_all(repo),
        BatchKind::PruneRemote => git::prune_remote(repo),
        BatchKind::CleanupMerged => git::cleanup_merged(repo),
    }
}

/// Run one maintenance task over every path, sequentially, collecting a
/// result row per repo. Failures become rows, not errors — a bad repo
/// must not stop the sweep.
pub fn run_task(kind: BatchKind, paths: &[PathBuf]) -> Vec<TaskResult> {
    let mut results = vec![];

    for path in paths {
        let start = Instant::now();
        let (success, message) = match run_one(kind, path) {
            Ok(msg) => (true, msg),
            Err(e) => (false, e.to_string()),
        };
        results.push(TaskResult {
            path: path.clone(),
            repo_name: repo_name(path),
            success,
            message,
            duration_ms: start.elapsed().as_millis(),
        });
    }

    results
}
