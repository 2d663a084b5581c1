use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::config::CacheTtls;
use crate::models::{BranchInfo, CommitInfo, PrDetail, PrInfo, WorkflowSummary};

struct Entry<T> {
    value: T,
    expires_at: Instant,
}

/// Time-to-live cache shared between the control loop and background
/// commands. Expired entries read as misses but are only evicted by the
/// next `set` for the same key or by `clear`. Reads take the shared
/// lock; fetch results dominate the write traffic.
pub struct TtlCache<T> {
    entries: RwLock<HashMap<String, Entry<T>>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        TtlCache {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get(key)?;
        if Instant::now() > entry.expires_at {
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn set(&self, key: &str, value: T) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    pub fn delete(&self, key: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }
}

/// One named cache per resource kind, each with its own staleness
/// tolerance. Constructed once at startup and handed to command
/// executors as `Arc<Caches>`; tests build their own isolated instance.
pub struct Caches {
    /// Current-branch PR per `"<upstream>:<branch>"`. `None` is cached
    /// too, so a branch without a PR is not re-queried every summary load.
    pub pr: TtlCache<Option<PrInfo>>,
    /// Open PR list per `"<upstream>:all_prs"`.
    pub pr_list: TtlCache<Vec<PrInfo>>,
    /// Full PR detail per `"<repo>:pr:<number>"`.
    pub pr_detail: TtlCache<PrDetail>,
    /// Local branch list per repo path.
    pub branches: TtlCache<Vec<BranchInfo>>,
    /// Recent commit log per repo path.
    pub commits: TtlCache<Vec<CommitInfo>>,
    /// Workflow status per `"<repo>:<sha>"`. Shorter TTL: CI status is
    /// the most volatile thing on the board.
    pub workflow: TtlCache<Option<WorkflowSummary>>,
}

impl Caches {
    pub fn new(ttls: &CacheTtls) -> Self {
        Caches {
            pr: TtlCache::new(Duration::from_secs(ttls.pr_secs)),
            pr_list: TtlCache::new(Duration::from_secs(ttls.pr_secs)),
            pr_detail: TtlCache::new(Duration::from_secs(ttls.pr_secs)),
            branches: TtlCache::new(Duration::from_secs(ttls.vcs_secs)),
            commits: TtlCache::new(Duration::from_secs(ttls.vcs_secs)),
            workflow: TtlCache::new(Duration::from_secs(ttls.workflow_secs)),
        }
    }

    pub fn clear_all(&self) {
        self.pr.clear();
        self.pr_list.clear();
        self.pr_detail.clear();
        self.branches.clear();
        self.commits.clear();
        self.workflow.clear();
    }
}

impl Default for Caches {
    fn default() -> Self {
        Caches::new(&CacheTtls::default())
    }
}
