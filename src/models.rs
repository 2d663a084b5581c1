use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

/// Summary row for one repository, as shown in the top-level list.
/// `pr_info` and `workflow_info` stay `None` until their background
/// lookups land.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepoSummary {
    pub path: PathBuf,
    pub branch: String,
    pub upstream: String,
    pub ahead: usize,
    pub behind: usize,
    pub staged: usize,
    pub unstaged: usize,
    pub untracked: usize,
    pub conflicted: usize,
    pub stash_count: usize,
    pub last_modified: Option<DateTime<Local>>,
    pub pr_info: Option<PrInfo>,
    pub workflow_info: Option<WorkflowSummary>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoStatus {
    Clean,
    Dirty,
    Ahead,
    Behind,
    Diverged,
}

impl RepoSummary {
    pub fn name(&self) -> String {
        repo_name(&self.path)
    }

    pub fn uncommitted_count(&self) -> usize {
        self.staged + self.unstaged + self.untracked + self.conflicted
    }

    pub fn is_dirty(&self) -> bool {
        self.uncommitted_count() > 0 || self.ahead > 0
    }

    pub fn status(&self) -> RepoStatus {
        if self.ahead > 0 && self.behind > 0 {
            RepoStatus::Diverged
        } else if self.ahead > 0 {
            RepoStatus::Ahead
        } else if self.behind > 0 {
            RepoStatus::Behind
        } else if self.uncommitted_count() > 0 {
            RepoStatus::Dirty
        } else {
            RepoStatus::Clean
        }
    }

    /// Compact working-tree summary like `+2 ~1 ?3 ↑1`, or `✓` when clean.
    pub fn status_summary(&self) -> String {
        let mut parts = vec![];
        if self.staged > 0 {
            parts.push(format!("+{}", self.staged));
        }
        if self.unstaged > 0 {
            parts.push(format!("~{}", self.unstaged));
        }
        if self.untracked > 0 {
            parts.push(format!("?{}", self.untracked));
        }
        if self.conflicted > 0 {
            parts.push(format!("!{}", self.conflicted));
        }
        if self.ahead > 0 {
            parts.push(format!("↑{}", self.ahead));
        }
        if self.behind > 0 {
            parts.push(format!("↓{}", self.behind));
        }
        if parts.is_empty() {
            "✓".to_string()
        } else {
            parts.join(" ")
        }
    }

    pub fn relative_modified(&self) -> String {
        match self.last_modified {
            Some(t) => relative_time(t),
            None => "—".to_string(),
        }
    }
}

pub fn repo_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Pull request fields available from the list endpoint. Cheap to have
/// around; the expensive remainder lives in `PrDetail`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrInfo {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub url: String,
    pub is_draft: bool,
    pub mergeable: String,
    pub head_ref: String,
    pub base_ref: String,
    pub checks: ChecksStatus,
    pub review_decision: String,
}

impl PrInfo {
    pub fn status_display(&self) -> &str {
        if self.is_draft { "DRAFT" } else { &self.state }
    }

    pub fn review_status(&self) -> &str {
        match self.review_decision.as_str() {
            "APPROVED" => "approved",
            "CHANGES_REQUESTED" => "changes requested",
            "REVIEW_REQUIRED" => "review required",
            _ => "—",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChecksStatus {
    pub total: usize,
    pub passing: usize,
    pub failing: usize,
    pub pending: usize,
    pub skipped: usize,
}

impl ChecksStatus {
    pub fn summary(&self) -> &'static str {
        if self.total == 0 {
            "—"
        } else if self.failing > 0 {
            "failing"
        } else if self.pending > 0 {
            "pending"
        } else if self.passing == self.total {
            "passing"
        } else {
            "mixed"
        }
    }
}

/// Full PR entity. Constructed partially from a `PrInfo` when the user
/// enters the detail view; an empty `author` means the expensive fetch
/// has not landed yet (a loaded PR always carries an author login).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrDetail {
    pub info: PrInfo,
    pub body: String,
    pub author: String,
    pub assignees: Vec<String>,
    pub reviewers: Vec<String>,
    pub created_at: Option<DateTime<Local>>,
    pub updated_at: Option<DateTime<Local>>,
    pub additions: usize,
    pub deletions: usize,
    pub comments: usize,
}

impl PrDetail {
    /// Partial entity from list data; detail-only fields stay empty.
    pub fn from_info(info: PrInfo) -> Self {
        PrDetail {
            info,
            ..PrDetail::default()
        }
    }

    pub fn is_fully_loaded(&self) -> bool {
        !self.author.is_empty()
    }

    pub fn relative_created(&self) -> String {
        self.created_at.map(relative_time).unwrap_or_else(|| "—".into())
    }

    pub fn relative_updated(&self) -> String {
        self.updated_at.map(relative_time).unwrap_or_else(|| "—".into())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchInfo {
    pub name: String,
    pub upstream: String,
    pub ahead: usize,
    pub behind: usize,
    pub last_commit: Option<DateTime<Local>>,
    pub is_current: bool,
}

impl BranchInfo {
    pub fn relative_last_commit(&self) -> String {
        self.last_commit.map(relative_time).unwrap_or_else(|| "—".into())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchDetail {
    pub branch: BranchInfo,
    pub commits: Vec<CommitInfo>,
    pub staged: usize,
    pub unstaged: usize,
    pub untracked: usize,
    pub conflicted: usize,
    pub pr_info: Option<PrInfo>,
    pub workflow_info: Option<WorkflowSummary>,
}

impl BranchDetail {
    pub fn uncommitted_count(&self) -> usize {
        self.staged + self.unstaged + self.untracked + self.conflicted
    }

    pub fn file_changes_summary(&self) -> String {
        let mut parts = vec![];
        if self.staged > 0 {
            parts.push(format!("{} staged", self.staged));
        }
        if self.unstaged > 0 {
            parts.push(format!("{} unstaged", self.unstaged));
        }
        if self.untracked > 0 {
            parts.push(format!("{} untracked", self.untracked));
        }
        if self.conflicted > 0 {
            parts.push(format!("{} conflicted", self.conflicted));
        }
        if parts.is_empty() {
            "No uncommitted changes".to_string()
        } else {
            parts.join(", ")
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitInfo {
    pub hash: String,
    pub short_hash: String,
    pub subject: String,
    pub author: String,
    pub date: Option<DateTime<Local>>,
}

impl CommitInfo {
    pub fn relative_date(&self) -> String {
        self.date.map(relative_time).unwrap_or_else(|| "—".into())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StashInfo {
    pub index: usize,
    pub message: String,
    pub date: Option<DateTime<Local>>,
}

impl StashInfo {
    pub fn relative_date(&self) -> String {
        self.date.map(relative_time).unwrap_or_else(|| "—".into())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorktreeInfo {
    pub path: PathBuf,
    pub branch: String,
    pub is_bare: bool,
    pub is_locked: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowRun {
    pub id: u64,
    pub name: String,
    pub status: String,
    pub conclusion: String,
    pub url: String,
}

impl WorkflowRun {
    pub fn status_display(&self) -> &str {
        if self.status == "completed" {
            &self.conclusion
        } else {
            &self.status
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowSummary {
    pub runs: Vec<WorkflowRun>,
    pub total: usize,
    pub passing: usize,
    pub failing: usize,
    pub in_progress: usize,
}

impl WorkflowSummary {
    pub fn status_display(&self) -> &'static str {
        if self.total == 0 {
            "—"
        } else if self.failing > 0 {
            "failing"
        } else if self.in_progress > 0 {
            "running"
        } else if self.passing == self.total {
            "passing"
        } else {
            "mixed"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    All,
    Ahead,
    Behind,
    Dirty,
    HasPr,
    HasStash,
}

impl FilterMode {
    pub fn label(&self) -> &'static str {
        match self {
            FilterMode::All => "ALL",
            FilterMode::Ahead => "AHEAD",
            FilterMode::Behind => "BEHIND",
            FilterMode::Dirty => "DIRTY",
            FilterMode::HasPr => "HAS_PR",
            FilterMode::HasStash => "HAS_STASH",
        }
    }

    pub fn short_key(&self) -> char {
        match self {
            FilterMode::All => 'a',
            FilterMode::Ahead => '>',
            FilterMode::Behind => '<',
            FilterMode::Dirty => 'd',
            FilterMode::HasPr => 'p',
            FilterMode::HasStash => 's',
        }
    }
}

pub fn all_filter_modes() -> Vec<FilterMode> {
    vec![
        FilterMode::All,
        FilterMode::Ahead,
        FilterMode::Behind,
        FilterMode::Dirty,
        FilterMode::HasPr,
        FilterMode::HasStash,
    ]
}

/// Filter modes the user can toggle in the filter editor (everything
/// except the implicit `All`).
pub fn selectable_filter_modes() -> Vec<FilterMode> {
    all_filter_modes()
        .into_iter()
        .filter(|m| *m != FilterMode::All)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveFilter {
    pub mode: FilterMode,
    pub enabled: bool,
    pub inverted: bool,
}

impl ActiveFilter {
    pub fn new(mode: FilterMode) -> Self {
        ActiveFilter {
            mode,
            enabled: mode == FilterMode::All,
            inverted: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    Name,
    Modified,
    Status,
    Branch,
}

impl SortMode {
    pub fn label(&self) -> &'static str {
        match self {
            SortMode::Name => "NAME",
            SortMode::Modified => "MODIFIED",
            SortMode::Status => "STATUS",
            SortMode::Branch => "BRANCH",
        }
    }

    pub fn short_key(&self) -> char {
        match self {
            SortMode::Name => 'n',
            SortMode::Modified => 'm',
            SortMode::Status => 't',
            SortMode::Branch => 'b',
        }
    }
}

pub fn all_sort_modes() -> Vec<SortMode> {
    vec![
        SortMode::Name,
        SortMode::Modified,
        SortMode::Status,
        SortMode::Branch,
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveSort {
    pub mode: SortMode,
    pub enabled: bool,
    pub priority: usize,
    pub direction: SortDirection,
}

impl ActiveSort {
    pub fn new(mode: SortMode, priority: usize) -> Self {
        ActiveSort {
            mode,
            enabled: false,
            priority,
            direction: SortDirection::Asc,
        }
    }
}

/// "3 mins ago"-style formatting used everywhere a timestamp is shown.
pub fn relative_time(t: DateTime<Local>) -> String {
    let diff = Local::now().signed_duration_since(t);

    let plural = |n: i64, unit: &str| {
        if n == 1 {
            format!("1 {unit} ago")
        } else {
            format!("{n} {unit}s ago")
        }
    };

    if diff.num_seconds() < 60 {
        "just now".to_string()
    } else if diff.num_minutes() < 60 {
        plural(diff.num_minutes(), "min")
    } else if diff.num_hours() < 24 {
        plural(diff.num_hours(), "hour")
    } else if diff.num_days() < 7 {
        plural(diff.num_days(), "day")
    } else if diff.num_days() < 30 {
        plural(diff.num_days() / 7, "week")
    } else if diff.num_days() < 365 {
        plural(diff.num_days() / 30, "month")
    } else {
        plural(diff.num_days() / 365, "year")
    }
}
