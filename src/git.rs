use std::{path::{Path, PathBuf}, process::Command};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, TimeZone};

use crate::models::{BranchInfo, CommitInfo, RepoSummary, StashInfo, WorktreeInfo};

pub fn is_repo(path: &Path) -> bool {
    path.join(".git").exists() || path.join(".jj").exists()
}

/// Walk upward from `start` to the nearest enclosing repository root.
pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if is_repo(&current) {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

fn run_git(repo: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(args)
        .output()?;
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        Err(anyhow!(
            "git {}: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        ))
    }
}

fn unix_time(ts: i64) -> Option<DateTime<Local>> {
    if ts <= 0 {
        return None;
    }
    Local.timestamp_opt(ts, 0).single()
}

pub fn repo_summary(repo: &Path) -> Result<RepoSummary> {
    let mut summary = RepoSummary {
        path: repo.to_path_buf(),
        ..RepoSummary::default()
    };

    summary.branch = current_branch(repo)?;
    summary.upstream = upstream(repo, &summary.branch).unwrap_or_default();

    if !summary.upstream.is_empty() {
        if let Ok((ahead, behind)) = ahead_behind(repo, &summary.branch, &summary.upstream) {
            summary.ahead = ahead;
            summary.behind = behind;
        }
    }

    let counts = status_counts(repo).unwrap_or_default();
    summary.staged = counts.staged;
    summary.unstaged = counts.unstaged;
    summary.untracked = counts.untracked;
    summary.conflicted = counts.conflicted;

    summary.stash_count = stash_count(repo).unwrap_or(0);
    summary.last_modified = last_modified(repo).unwrap_or(None);

    Ok(summary)
}

pub fn current_branch(repo: &Path) -> Result<String> {
    let out = run_git(repo, &["rev-parse", "--abbrev-ref", "HEAD"])?;
    if out == "HEAD" {
        // Detached head: show the short hash instead.
        match run_git(repo, &["rev-parse", "--short", "HEAD"]) {
            Ok(hash) => Ok(format!("({hash})")),
            Err(_) => Ok("HEAD".to_string()),
        }
    } else {
        Ok(out)
    }
}

pub fn upstream(repo: &Path, branch: &str) -> Result<String> {
    run_git(repo, &["rev-parse", "--abbrev-ref", &format!("{branch}@{{upstream}}")])
}

pub fn ahead_behind(repo: &Path, branch: &str, upstream: &str) -> Result<(usize, usize)> {
    let out = run_git(
        repo,
        &["rev-list", "--left-right", "--count", &format!("{branch}...{upstream}")],
    )?;
    let mut parts = out.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(a), Some(b)) => Ok((a.parse().unwrap_or(0), b.parse().unwrap_or(0))),
        _ => Err(anyhow!("unexpected rev-list output: {out}")),
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub staged: usize,
    pub unstaged: usize,
    pub untracked: usize,
    pub conflicted: usize,
}

pub fn status_counts(repo: &Path) -> Result<StatusCounts> {
    let out = run_git(repo, &["status", "--porcelain", "-z"])?;
    Ok(parse_status_counts(&out))
}

fn parse_status_counts(porcelain: &str) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for entry in porcelain.split('\0') {
        let mut chars = entry.chars();
        let (Some(x), Some(y)) = (chars.next(), chars.next()) else {
            continue;
        };
        if x == 'U' || y == 'U' || (x == 'D' && y == 'D') || (x == 'A' && y == 'A') {
            counts.conflicted += 1;
        } else if x == '?' {
            counts.untracked += 1;
        } else {
            if x != ' ' && x != '?' {
                counts.staged += 1;
            }
            if y != ' ' && y != '?' {
                counts.unstaged += 1;
            }
        }
    }
    counts
}

pub fn stash_count(repo: &Path) -> Result<usize> {
    let out = run_git(repo, &["stash", "list"])?;
    if out.is_empty() {
        Ok(0)
    } else {
        Ok(out.lines().count())
    }
}

pub fn branch_list(repo: &Path) -> Result<Vec<BranchInfo>> {
    let format = "%(refname:short)\t%(upstream:short)\t%(upstream:track)\t%(committerdate:unix)\t%(HEAD)";
    let out = run_git(
        repo,
        &["for-each-ref", &format!("--format={format}"), "refs/heads/"],
    )?;
    Ok(out.lines().filter_map(parse_branch_line).collect())
}

fn parse_branch_line(line: &str) -> Option<BranchInfo> {
    let parts: Vec<&str> = line.split('\t').collect();
    if parts.len() < 5 {
        return None;
    }
    let (ahead, behind) = parse_track(parts[2]);
    Some(BranchInfo {
        name: parts[0].to_string(),
        upstream: parts[1].to_string(),
        ahead,
        behind,
        last_commit: unix_time(parts[3].parse().unwrap_or(0)),
        is_current: parts[4] == "*",
    })
}

/// Parse a `%(upstream:track)` decoration like `[ahead 2, behind 1]`,
/// `[ahead 3]` or `[behind 4]`.
fn parse_track(track: &str) -> (usize, usize) {
    let inner = track.trim_start_matches('[').trim_end_matches(']');
    let mut ahead = 0;
    let mut behind = 0;
    for part in inner.split(',') {
        let part = part.trim();
        if let Some(n) = part.strip_prefix("ahead ") {
            ahead = n.parse().unwrap_or(0);
        } else if let Some(n) = part.strip_prefix("behind ") {
            behind = n.parse().unwrap_or(0);
        }
    }
    (ahead, behind)
}

pub fn stash_list(repo: &Path) -> Result<Vec<StashInfo>> {
    let out = run_git(repo, &["stash", "list", "--format=%gd%x09%gs%x09%ct"])?;
    Ok(out.lines().filter_map(parse_stash_line).collect())
}

fn parse_stash_line(line: &str) -> Option<StashInfo> {
    let parts: Vec<&str> = line.split('\t').collect();
    if parts.len() < 3 {
        return None;
    }
    // `%gd` renders as `stash@{N}`.
    let index = parts[0]
        .trim_start_matches("stash@{")
        .trim_end_matches('}')
        .parse()
        .unwrap_or(0);
    Some(StashInfo {
        index,
        message: parts[1].to_string(),
        date: unix_time(parts[2].parse().unwrap_or(0)),
    })
}

pub fn worktree_list(repo: &Path) -> Result<Vec<WorktreeInfo>> {
    let out = run_git(repo, &["worktree", "list", "--porcelain"])?;
    Ok(parse_worktrees(&out))
}

fn parse_worktrees(out: &str) -> Vec<WorktreeInfo> {
    let mut worktrees = vec![];
    let mut current: Option<WorktreeInfo> = None;
    for line in out.lines() {
        if let Some(path) = line.strip_prefix("worktree ") {
            if let Some(wt) = current.take() {
                worktrees.push(wt);
            }
            current = Some(WorktreeInfo {
                path: PathBuf::from(path),
                ..WorktreeInfo::default()
            });
        } else if let Some(wt) = current.as_mut() {
            if let Some(branch) = line.strip_prefix("branch ") {
                wt.branch = branch.trim_start_matches("refs/heads/").to_string();
            } else if line == "bare" {
                wt.is_bare = true;
            } else if line == "locked" {
                wt.is_locked = true;
            }
        }
    }
    if let Some(wt) = current {
        worktrees.push(wt);
    }
    worktrees
}

pub fn commit_log(repo: &Path, count: usize) -> Result<Vec<CommitInfo>> {
    let out = run_git(
        repo,
        &["log", &format!("-n{count}"), "--format=%H\t%h\t%s\t%an\t%ct"],
    )?;
    Ok(out.lines().filter_map(parse_commit_line).collect())
}

fn parse_commit_line(line: &str) -> Option<CommitInfo> {
    let parts: Vec<&str> = line.splitn(5, '\t').collect();
    if parts.len() < 5 {
        return None;
    }
    Some(CommitInfo {
        hash: parts[0].to_string(),
        short_hash: parts[1].to_string(),
        subject: parts[2].to_string(),
        author: parts[3].to_string(),
        date: unix_time(parts[4].parse().unwrap_or(0)),
    })
}

pub fn last_modified(repo: &Path) -> Result<Option<DateTime<Local>>> {
    let out = run_git(repo, &["log", "-1", "--format=%ct"])?;
    Ok(unix_time(out.parse().unwrap_or(0)))
}

pub fn fetch_all(repo: &Path) -> Result<String> {
    run_git(repo, &["fetch", "--all", "--prune"])?;
    Ok("Fetched from all remotes".to_string())
}

pub fn prune_remote(repo: &Path) -> Result<String> {
    run_git(repo, &["remote", "prune", "origin"])?;
    Ok("Pruned stale remote branches".to_string())
}

pub fn cleanup_merged(repo: &Path) -> Result<String> {
    let main_branch = if run_git(repo, &["rev-parse", "--verify", "main"]).is_ok() {
        "main"
    } else if run_git(repo, &["rev-parse", "--verify", "master"]).is_ok() {
        "master"
    } else {
        return Err(anyhow!("Could not find main or master branch"));
    };

    let out = run_git(repo, &["branch", "--merged", main_branch])?;
    let mut deleted = vec![];
    for line in out.lines() {
        let branch = line.trim().trim_start_matches("* ").trim();
        if branch.is_empty() || branch == "main" || branch == "master" {
            continue;
        }
        if run_git(repo, &["branch", "-d", branch]).is_ok() {
            deleted.push(branch.to_string());
        }
    }

    if deleted.is_empty() {
        Ok("No merged branches to delete".to_string())
    } else {
        Ok(format!(
            "Deleted {} branches: {}",
            deleted.len(),
            deleted.join(", ")
        ))
    }
}
