use std::{path::Path, process::Command};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local};
use serde::Deserialize;

use crate::cache::Caches;
use crate::models::{ChecksStatus, PrDetail, PrInfo, WorkflowRun, WorkflowSummary};

fn run_gh(repo: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("gh").args(args).current_dir(repo).output()?;
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        Err(anyhow!(
            "gh {}: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        ))
    }
}

fn parse_time(s: &str) -> Option<DateTime<Local>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Local))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusCheck {
    #[serde(default)]
    state: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    conclusion: String,
}

fn parse_checks(checks: &[StatusCheck]) -> ChecksStatus {
    let mut status = ChecksStatus {
        total: checks.len(),
        ..ChecksStatus::default()
    };

    for c in checks {
        let state = c.state.to_lowercase();
        let conclusion = c.conclusion.to_lowercase();
        if state == "pending" || c.status == "IN_PROGRESS" || c.status == "QUEUED" {
            status.pending += 1;
        } else if conclusion == "success" || state == "success" {
            status.passing += 1;
        } else if conclusion == "failure"
            || conclusion == "error"
            || state == "failure"
            || state == "error"
        {
            status.failing += 1;
        } else if conclusion == "skipped" || conclusion == "neutral" {
            status.skipped += 1;
        } else {
            status.pending += 1;
        }
    }

    status
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrViewResponse {
    number: u64,
    title: String,
    state: String,
    url: String,
    #[serde(default)]
    is_draft: bool,
    #[serde(default)]
    merge_state_status: String,
    head_ref_name: String,
    base_ref_name: String,
    #[serde(default)]
    status_check_rollup: Vec<StatusCheck>,
}

/// PR attached to `branch`, or `None` when the branch has no open PR.
/// Both outcomes are cached under `"<upstream>:<branch>"` so repeated
/// summary loads don't shell out again.
pub fn pr_for_branch(
    caches: &Caches,
    repo: &Path,
    branch: &str,
    upstream: &str,
) -> Result<Option<PrInfo>> {
    let cache_key = format!("{upstream}:{branch}");
    if let Some(cached) = caches.pr.get(&cache_key) {
        return Ok(cached);
    }

    let out = match run_gh(
        repo,
        &[
            "pr", "view", branch, "--json",
            "number,title,state,url,isDraft,mergeStateStatus,headRefName,baseRefName,statusCheckRollup",
        ],
    ) {
        Ok(out) => out,
        Err(_) => {
            // `gh pr view` exits non-zero when the branch has no PR;
            // remember that so every refresh doesn't pay for it again.
            caches.pr.set(&cache_key, None);
            return Ok(None);
        }
    };

    let resp: PrViewResponse = serde_json::from_str(&out)?;
    let pr = PrInfo {
        number: resp.number,
        title: resp.title,
        state: resp.state,
        url: resp.url,
        is_draft: resp.is_draft,
        mergeable: resp.merge_state_status,
        head_ref: resp.head_ref_name,
        base_ref: resp.base_ref_name,
        checks: parse_checks(&resp.status_check_rollup),
        review_decision: String::new(),
    };

    caches.pr.set(&cache_key, Some(pr.clone()));
    Ok(Some(pr))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrListItem {
    number: u64,
    title: String,
    state: String,
    url: String,
    #[serde(default)]
    is_draft: bool,
    head_ref_name: String,
    base_ref_name: String,
    #[serde(default)]
    review_decision: String,
}

/// Open PRs for the repo's upstream, newest first (gh's default order).
pub fn pr_list(caches: &Caches, repo: &Path, upstream: &str) -> Result<Vec<PrInfo>> {
    if upstream.is_empty() {
        return Ok(vec![]);
    }

    let cache_key = format!("{upstream}:all_prs");
    if let Some(cached) = caches.pr_list.get(&cache_key) {
        return Ok(cached);
    }

    let out = match run_gh(
        repo,
        &[
            "pr", "list", "--json",
            "number,title,state,url,isDraft,headRefName,baseRefName,reviewDecision",
            "--limit", "100",
        ],
    ) {
        Ok(out) => out,
        Err(e) => {
            caches.pr_list.set(&cache_key, vec![]);
            return Err(e);
        }
    };

    let items: Vec<PrListItem> = serde_json::from_str(&out)?;
    let prs: Vec<PrInfo> = items
        .into_iter()
        .map(|item| PrInfo {
            number: item.number,
            title: item.title,
            state: item.state,
            url: item.url,
            is_draft: item.is_draft,
            head_ref: item.head_ref_name,
            base_ref: item.base_ref_name,
            review_decision: item.review_decision,
            ..PrInfo::default()
        })
        .collect();

    caches.pr_list.set(&cache_key, prs.clone());
    Ok(prs)
}

pub fn pr_count(caches: &Caches, repo: &Path, upstream: &str) -> Result<usize> {
    Ok(pr_list(caches, repo, upstream)?.len())
}

#[derive(Debug, Default, Deserialize)]
struct Login {
    #[serde(default)]
    login: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrDetailResponse {
    number: u64,
    title: String,
    state: String,
    url: String,
    #[serde(default)]
    is_draft: bool,
    #[serde(default)]
    merge_state_status: String,
    head_ref_name: String,
    base_ref_name: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    author: Login,
    #[serde(default)]
    assignees: Vec<Login>,
    #[serde(default)]
    review_requests: Vec<Login>,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    updated_at: String,
    #[serde(default)]
    additions: usize,
    #[serde(default)]
    deletions: usize,
    #[serde(default)]
    comments: usize,
    #[serde(default)]
    review_decision: String,
}

/// The expensive PR fetch. Cached under `"<repo>:pr:<number>"`; this is
/// the cache the prefetch scheduler warms.
pub fn pr_detail(caches: &Caches, repo: &Path, number: u64) -> Result<PrDetail> {
    let cache_key = format!("{}:pr:{}", repo.display(), number);
    if let Some(cached) = caches.pr_detail.get(&cache_key) {
        return Ok(cached);
    }

    let out = run_gh(
        repo,
        &[
            "pr", "view", &number.to_string(), "--json",
            "number,title,state,url,isDraft,mergeStateStatus,headRefName,baseRefName,body,author,assignees,reviewRequests,createdAt,updatedAt,additions,deletions,comments,reviewDecision",
        ],
    )?;

    let detail = parse_pr_detail(&out)?;
    caches.pr_detail.set(&cache_key, detail.clone());
    Ok(detail)
}

fn parse_pr_detail(json: &str) -> Result<PrDetail> {
    let resp: PrDetailResponse = serde_json::from_str(json)?;
    Ok(PrDetail {
        info: PrInfo {
            number: resp.number,
            title: resp.title,
            state: resp.state,
            url: resp.url,
            is_draft: resp.is_draft,
            mergeable: resp.merge_state_status,
            head_ref: resp.head_ref_name,
            base_ref: resp.base_ref_name,
            checks: ChecksStatus::default(),
            review_decision: resp.review_decision,
        },
        body: resp.body,
        author: resp.author.login,
        assignees: resp.assignees.into_iter().map(|a| a.login).collect(),
        reviewers: resp.review_requests.into_iter().map(|r| r.login).collect(),
        created_at: parse_time(&resp.created_at),
        updated_at: parse_time(&resp.updated_at),
        additions: resp.additions,
        deletions: resp.deletions,
        comments: resp.comments,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunListItem {
    #[serde(default)]
    database_id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    conclusion: String,
    #[serde(default)]
    url: String,
}

/// Workflow runs for one commit, cached per `"<repo>:<sha>"`. A failed
/// lookup caches `None` — repos without Actions shouldn't be retried on
/// every summary pass.
pub fn workflow_runs_for_commit(
    caches: &Caches,
    repo: &Path,
    commit_sha: &str,
) -> Result<Option<WorkflowSummary>> {
    if commit_sha.is_empty() {
        return Ok(None);
    }

    let cache_key = format!("{}:{}", repo.display(), commit_sha);
    if let Some(cached) = caches.workflow.get(&cache_key) {
        return Ok(cached);
    }

    let out = match run_gh(
        repo,
        &[
            "run", "list", "--commit", commit_sha, "--json",
            "databaseId,name,status,conclusion,url",
            "--limit", "10",
        ],
    ) {
        Ok(out) => out,
        Err(_) => {
            caches.workflow.set(&cache_key, None);
            return Ok(None);
        }
    };

    let summary = parse_workflow_runs(&out)?;
    caches.workflow.set(&cache_key, Some(summary.clone()));
    Ok(Some(summary))
}

fn parse_workflow_runs(json: &str) -> Result<WorkflowSummary> {
    let items: Vec<RunListItem> = serde_json::from_str(json)?;
    let mut summary = WorkflowSummary {
        total: items.len(),
        ..WorkflowSummary::default()
    };

    for item in items {
        if item.status == "in_progress" || item.status == "queued" {
            summary.in_progress += 1;
        } else if item.conclusion == "success" {
            summary.passing += 1;
        } else if item.conclusion == "failure" {
            summary.failing += 1;
        }
        summary.runs.push(WorkflowRun {
            id: item.database_id,
            name: item.name,
            status: item.status,
            conclusion: item.conclusion,
            url: item.url,
        });
    }

    Ok(summary)
}

/// Open the branch's PR in the browser, creating one when none exists.
pub fn open_or_create_pr(repo: &Path, branch: &str) -> Result<()> {
    if run_gh(repo, &["pr", "view", branch, "--web"]).is_ok() {
        return Ok(());
    }
    run_gh(repo, &["pr", "create", "--web", "--head", branch])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checks_rollup_classification() {
        let checks = vec![
            StatusCheck {
                conclusion: "SUCCESS".to_string(),
                ..StatusCheck::default()
            },
            StatusCheck {
                conclusion: "FAILURE".to_string(),
                ..StatusCheck::default()
            },
            StatusCheck {
                status: "IN_PROGRESS".to_string(),
                ..StatusCheck::default()
            },
            StatusCheck {
                conclusion: "SKIPPED".to_string(),
                ..StatusCheck::default()
            },
            StatusCheck::default(),
        ];
        let status = parse_checks(&checks);
        assert_eq!(status.total, 5);
        assert_eq!(status.passing, 1);
        assert_eq!(status.failing, 1);
        assert_eq!(status.skipped, 1);
        // Unknown entries count as pending alongside the in-progress one.
        assert_eq!(status.pending, 2);
    }

    #[test]
    fn empty_rollup_is_all_zero() {
        assert_eq!(parse_checks(&[]), ChecksStatus::default());
    }

    #[test]
    fn pr_detail_json_decodes() {
        let json = r#"{
            "number": 456,
            "title": "Feature PR",
            "state": "OPEN",
            "url": "https://github.com/o/r/pull/456",
            "isDraft": false,
            "mergeStateStatus": "CLEAN",
            "headRefName": "feature/x",
            "baseRefName": "main",
            "body": "Adds the thing.",
            "author": {"login": "octocat"},
            "assignees": [{"login": "a"}, {"login": "b"}],
            "reviewRequests": [{"login": "c"}],
            "createdAt": "2025-01-02T03:04:05Z",
            "updatedAt": "2025-01-03T03:04:05Z",
            "additions": 10,
            "deletions": 2,
            "comments": 4,
            "reviewDecision": "APPROVED"
        }"#;
        let detail = parse_pr_detail(json).unwrap();
        assert_eq!(detail.info.number, 456);
        assert_eq!(detail.author, "octocat");
        assert_eq!(detail.assignees, vec!["a", "b"]);
        assert_eq!(detail.reviewers, vec!["c"]);
        assert!(detail.created_at.is_some());
        assert_eq!(detail.additions, 10);
        assert!(detail.is_fully_loaded());
    }

    #[test]
    fn pr_detail_tolerates_missing_optionals() {
        let json = r#"{
            "number": 1,
            "title": "t",
            "state": "OPEN",
            "url": "u",
            "headRefName": "h",
            "baseRefName": "b"
        }"#;
        let detail = parse_pr_detail(json).unwrap();
        assert!(!detail.is_fully_loaded());
        assert!(detail.created_at.is_none());
    }

    #[test]
    fn workflow_runs_summarized() {
        let json = r#"[
            {"databaseId": 1, "name": "ci", "status": "completed", "conclusion": "success", "url": "u1"},
            {"databaseId": 2, "name": "ci", "status": "in_progress", "conclusion": "", "url": "u2"},
            {"databaseId": 3, "name": "ci", "status": "completed", "conclusion": "failure", "url": "u3"}
        ]"#;
        let summary = parse_workflow_runs(json).unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passing, 1);
        assert_eq!(summary.in_progress, 1);
        assert_eq!(summary.failing, 1);
        assert_eq!(summary.status_display(), "failing");
    }
}
