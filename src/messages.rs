use std::path::PathBuf;

use crossterm::event::KeyEvent;

use crate::batch::TaskResult;
use crate::models::{
    BranchDetail, BranchInfo, PrDetail, PrInfo, RepoSummary, StashInfo, WorkflowSummary,
    WorktreeInfo,
};

/// Everything the control loop consumes: key presses, resize events and
/// command completions. Each value is applied exactly once by
/// `App::update`; command results carry the identity they were fetched
/// for so stale ones can be recognized and dropped.
#[derive(Debug)]
pub enum Message {
    Key(KeyEvent),
    Resize(u16, u16),

    ReposDiscovered(Vec<PathBuf>),
    SummaryLoaded {
        path: PathBuf,
        result: Result<RepoSummary, String>,
    },
    PrLoaded {
        path: PathBuf,
        pr: Option<PrInfo>,
    },
    PrCountLoaded {
        path: PathBuf,
        count: usize,
    },
    WorkflowLoaded {
        path: PathBuf,
        workflow: Option<WorkflowSummary>,
    },

    DetailLoaded {
        path: PathBuf,
        branches: Vec<BranchInfo>,
        stashes: Vec<StashInfo>,
        worktrees: Vec<WorktreeInfo>,
        prs: Vec<PrInfo>,
    },
    BranchDetailLoaded {
        path: PathBuf,
        detail: BranchDetail,
    },
    PrDetailLoaded {
        path: PathBuf,
        number: u64,
        result: Result<PrDetail, String>,
    },

    RefreshComplete,
    Status(String),
    ClearStatus,

    BatchComplete {
        results: Vec<TaskResult>,
    },
}
