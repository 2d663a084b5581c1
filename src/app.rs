use std::collections::HashMap;
use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent};

use crate::batch::{BatchKind, TaskResult};
use crate::commands::Command;
use crate::filters;
use crate::input::KeyMap;
use crate::messages::Message;
use crate::models::{
    all_filter_modes, all_sort_modes, selectable_filter_modes, ActiveFilter, ActiveSort,
    BranchDetail, BranchInfo, FilterMode, PrDetail, PrInfo, RepoSummary, SortDirection, SortMode,
    StashInfo, WorktreeInfo,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    RepoList,
    RepoDetail,
    BranchDetail,
    PrDetail,
    Help,
    Filter,
    Sort,
    BatchProgress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailTab {
    Branches,
    Stashes,
    Worktrees,
    Prs,
}

impl DetailTab {
    const ORDER: [DetailTab; 4] = [
        DetailTab::Branches,
        DetailTab::Stashes,
        DetailTab::Worktrees,
        DetailTab::Prs,
    ];

    pub fn index(&self) -> usize {
        Self::ORDER.iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn next(&self) -> DetailTab {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn prev(&self) -> DetailTab {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn title(&self) -> &'static str {
        match self {
            DetailTab::Branches => "Branches",
            DetailTab::Stashes => "Stashes",
            DetailTab::Worktrees => "Worktrees",
            DetailTab::Prs => "Pull Requests",
        }
    }
}

/// How many PR details to warm right after a repo's PR list arrives.
const PREFETCH_COUNT: usize = 3;

/// All mutable state, owned by the control loop. `update` is the only
/// mutation path: it folds one message in and hands back the follow-up
/// commands; it never performs I/O itself.
pub struct App {
    pub scan_paths: Vec<PathBuf>,
    pub max_depth: usize,

    pub repo_paths: Vec<PathBuf>,
    pub summaries: HashMap<PathBuf, RepoSummary>,
    pub pr_counts: HashMap<PathBuf, usize>,

    pub filtered_paths: Vec<PathBuf>,
    pub cursor: usize,

    pub active_filters: Vec<ActiveFilter>,
    pub active_sorts: Vec<ActiveSort>,
    pub search_text: String,
    pub searching: bool,
    pub search_input: String,

    pub view_mode: ViewMode,
    pub selected_repo: Option<PathBuf>,
    pub width: u16,
    pub height: u16,
    pub loading: bool,
    pub loading_count: usize,
    pub loaded_count: usize,

    pub detail_tab: DetailTab,
    pub detail_cursor: usize,
    pub detail_loading: bool,
    pub branches: Vec<BranchInfo>,
    pub stashes: Vec<StashInfo>,
    pub worktrees: Vec<WorktreeInfo>,
    pub prs: Vec<PrInfo>,

    pub selected_branch: BranchInfo,
    pub branch_detail: BranchDetail,
    pub selected_pr: PrInfo,
    pub pr_detail: PrDetail,

    pub filter_cursor: usize,
    pub sort_cursor: usize,

    pub batch_running: bool,
    pub batch_task: &'static str,
    pub batch_results: Vec<TaskResult>,
    pub batch_total: usize,

    pub status_message: String,
    pub should_quit: bool,

    pub keys: KeyMap,
}

impl App {
    pub fn new(scan_paths: Vec<PathBuf>, max_depth: usize) -> Self {
        let active_filters = all_filter_modes().into_iter().map(ActiveFilter::new).collect();
        let mut active_sorts: Vec<ActiveSort> = all_sort_modes()
            .into_iter()
            .enumerate()
            .map(|(i, mode)| ActiveSort::new(mode, i))
            .collect();
        if let Some(name_sort) = active_sorts.iter_mut().find(|s| s.mode == SortMode::Name) {
            name_sort.enabled = true;
        }

        App {
            scan_paths,
            max_depth,
            repo_paths: vec![],
            summaries: HashMap::new(),
            pr_counts: HashMap::new(),
            filtered_paths: vec![],
            cursor: 0,
            active_filters,
            active_sorts,
            search_text: String::new(),
            searching: false,
            search_input: String::new(),
            view_mode: ViewMode::RepoList,
            selected_repo: None,
            width: 0,
            height: 0,
            loading: true,
            loading_count: 0,
            loaded_count: 0,
            detail_tab: DetailTab::Branches,
            detail_cursor: 0,
            detail_loading: false,
            branches: vec![],
            stashes: vec![],
            worktrees: vec![],
            prs: vec![],
            selected_branch: BranchInfo::default(),
            branch_detail: BranchDetail::default(),
            selected_pr: PrInfo::default(),
            pr_detail: PrDetail::default(),
            filter_cursor: 0,
            sort_cursor: 0,
            batch_running: false,
            batch_task: "",
            batch_results: vec![],
            batch_total: 0,
            status_message: String::new(),
            should_quit: false,
            keys: KeyMap::default(),
        }
    }

    /// The command to kick everything off at startup.
    pub fn init_command(&self) -> Command {
        Command::DiscoverRepos {
            paths: self.scan_paths.clone(),
            max_depth: self.max_depth,
        }
    }

    pub fn update(&mut self, msg: Message) -> Vec<Command> {
        match msg {
            Message::Key(key) => self.handle_key(key),
            Message::Resize(width, height) => {
                self.width = width;
                self.height = height;
                vec![]
            }

            Message::ReposDiscovered(paths) => {
                self.loading_count = paths.len();
                self.loaded_count = 0;
                if paths.is_empty() {
                    self.loading = false;
                }
                self.repo_paths = paths;
                self.update_filtered_paths();

                self.repo_paths
                    .iter()
                    .map(|p| Command::LoadSummary(p.clone()))
                    .collect()
            }

            Message::SummaryLoaded { path, result } => {
                self.loaded_count += 1;

                let mut cmds = vec![];
                match result {
                    Ok(summary) => {
                        if !summary.upstream.is_empty() {
                            cmds.push(Command::LoadPr {
                                path: path.clone(),
                                branch: summary.branch.clone(),
                                upstream: summary.upstream.clone(),
                            });
                            cmds.push(Command::LoadPrCount {
                                path: path.clone(),
                                upstream: summary.upstream.clone(),
                            });
                        }
                        self.summaries.insert(path, summary);
                    }
                    Err(e) => {
                        // Keep the row visible with its failure attached.
                        self.summaries.insert(
                            path.clone(),
                            RepoSummary {
                                path,
                                error: Some(e),
                                ..RepoSummary::default()
                            },
                        );
                    }
                }

                if self.loaded_count >= self.loading_count {
                    self.loading = false;
                    self.update_filtered_paths();
                }
                cmds
            }

            Message::PrLoaded { path, pr } => {
                let has_pr = pr.is_some();
                if let Some(summary) = self.summaries.get_mut(&path) {
                    summary.pr_info = pr;
                }
                if has_pr {
                    vec![Command::LoadWorkflow(path)]
                } else {
                    vec![]
                }
            }

            Message::WorkflowLoaded { path, workflow } => {
                if let Some(summary) = self.summaries.get_mut(&path) {
                    summary.workflow_info = workflow;
                }
                vec![]
            }

            Message::PrCountLoaded { path, count } => {
                self.pr_counts.insert(path, count);
                vec![]
            }

            Message::DetailLoaded {
                path,
                branches,
                stashes,
                worktrees,
                prs,
            } => {
                if self.selected_repo.as_deref() != Some(path.as_path()) {
                    return vec![];
                }
                self.detail_loading = false;
                self.branches = branches;
                self.stashes = stashes;
                self.worktrees = worktrees;
                self.prs = prs;

                // Warm the cache for the PRs the user is most likely to
                // open first.
                self.prs
                    .iter()
                    .take(PREFETCH_COUNT)
                    .map(|pr| Command::PrefetchPrDetail {
                        path: path.clone(),
                        number: pr.number,
                    })
                    .collect()
            }

            Message::BranchDetailLoaded { path, detail } => {
                if self.selected_repo.as_deref() == Some(path.as_path()) {
                    self.branch_detail = detail;
                }
                vec![]
            }

            Message::PrDetailLoaded { path, number, result } => {
                // Sole staleness guard: results for anything but the
                // current selection are dropped, success or not.
                if self.selected_repo.as_deref() != Some(path.as_path())
                    || self.selected_pr.number != number
                {
                    return vec![];
                }
                match result {
                    Ok(detail) => {
                        self.pr_detail = detail;
                        vec![]
                    }
                    Err(e) => {
                        // Keep whatever partial data is on screen.
                        self.status_message = format!("Failed to load PR details: {e}");
                        vec![Command::ClearStatusAfterDelay]
                    }
                }
            }

            Message::RefreshComplete => {
                self.status_message = "Data refreshed".to_string();
                vec![Command::ClearStatusAfterDelay]
            }

            Message::Status(text) => {
                self.status_message = text;
                vec![Command::ClearStatusAfterDelay]
            }

            Message::ClearStatus => {
                self.status_message.clear();
                vec![]
            }

            Message::BatchComplete { results } => {
                self.batch_running = false;
                self.batch_results.extend(results);
                vec![]
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if self.searching {
            return self.handle_search_key(key);
        }
        match self.view_mode {
            ViewMode::RepoList => self.handle_list_key(key),
            ViewMode::RepoDetail => self.handle_detail_key(key),
            ViewMode::BranchDetail => self.handle_branch_detail_key(key),
            ViewMode::PrDetail => self.handle_pr_detail_key(key),
            ViewMode::Help => self.handle_help_key(key),
            ViewMode::Filter => self.handle_filter_key(key),
            ViewMode::Sort => self.handle_sort_key(key),
            ViewMode::BatchProgress => self.handle_batch_key(key),
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if self.keys.quit.matches(&key) {
            self.should_quit = true;
        } else if self.keys.help.matches(&key) {
            self.view_mode = ViewMode::Help;
        } else if self.keys.up.matches(&key) {
            if self.cursor > 0 {
                self.cursor -= 1;
            }
        } else if self.keys.down.matches(&key) {
            if self.cursor + 1 < self.filtered_paths.len() {
                self.cursor += 1;
            }
        } else if self.keys.top.matches(&key) {
            self.cursor = 0;
        } else if self.keys.bottom.matches(&key) {
            if !self.filtered_paths.is_empty() {
                self.cursor = self.filtered_paths.len() - 1;
            }
        } else if self.keys.enter.matches(&key) {
            if let Some(path) = self.filtered_paths.get(self.cursor).cloned() {
                self.selected_repo = Some(path.clone());
                self.view_mode = ViewMode::RepoDetail;
                self.detail_tab = DetailTab::Branches;
                self.detail_cursor = 0;
                self.detail_loading = true;
                self.branches.clear();
                self.stashes.clear();
                self.worktrees.clear();
                self.prs.clear();
                return vec![Command::LoadDetail(path)];
            }
        } else if self.keys.refresh.matches(&key) {
            return self.handle_refresh();
        } else if self.keys.filter.matches(&key) {
            self.view_mode = ViewMode::Filter;
            self.filter_cursor = 0;
        } else if self.keys.sort.matches(&key) {
            self.view_mode = ViewMode::Sort;
            self.sort_cursor = 0;
        } else if self.keys.search.matches(&key) {
            self.searching = true;
            self.search_input = self.search_text.clone();
        } else if self.keys.fetch_all.matches(&key) {
            return self.start_batch(BatchKind::FetchAll);
        } else if self.keys.prune_remote.matches(&key) {
            return self.start_batch(BatchKind::PruneRemote);
        } else if self.keys.cleanup_merged.matches(&key) {
            return self.start_batch(BatchKind::CleanupMerged);
        }
        vec![]
    }

    fn handle_detail_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if self.keys.quit.matches(&key) {
            self.should_quit = true;
        } else if self.keys.back.matches(&key) {
            self.view_mode = ViewMode::RepoList;
        } else if self.keys.refresh.matches(&key) {
            return self.handle_refresh();
        } else if self.keys.tab.matches(&key) || self.keys.right.matches(&key) {
            self.detail_tab = self.detail_tab.next();
            self.detail_cursor = 0;
            return self.prefetch_first_pr();
        } else if self.keys.left.matches(&key) {
            self.detail_tab = self.detail_tab.prev();
            self.detail_cursor = 0;
            return self.prefetch_first_pr();
        } else if self.keys.up.matches(&key) {
            if self.detail_cursor > 0 {
                self.detail_cursor -= 1;
                return self.prefetch_pr_under_cursor();
            }
        } else if self.keys.down.matches(&key) {
            if self.detail_cursor + 1 < self.detail_list_len() {
                self.detail_cursor += 1;
                return self.prefetch_pr_under_cursor();
            }
        } else if self.keys.top.matches(&key) {
            self.detail_cursor = 0;
        } else if self.keys.bottom.matches(&key) {
            let len = self.detail_list_len();
            if len > 0 {
                self.detail_cursor = len - 1;
            }
        } else if self.keys.enter.matches(&key) {
            return self.enter_detail_item();
        } else if self.keys.help.matches(&key) {
            self.view_mode = ViewMode::Help;
        }
        vec![]
    }

    fn enter_detail_item(&mut self) -> Vec<Command> {
        let Some(path) = self.selected_repo.clone() else {
            return vec![];
        };
        match self.detail_tab {
            DetailTab::Branches => {
                if let Some(branch) = self.branches.get(self.detail_cursor).cloned() {
                    self.selected_branch = branch;
                    self.branch_detail = BranchDetail::default();
                    self.view_mode = ViewMode::BranchDetail;
                    return vec![Command::LoadBranchDetail {
                        path,
                        branch: self.selected_branch.name.clone(),
                    }];
                }
            }
            DetailTab::Prs => {
                if let Some(pr) = self.prs.get(self.detail_cursor).cloned() {
                    self.selected_pr = pr.clone();
                    // Progressive loading: show the list row's fields now,
                    // let the expensive fetch fill in the rest.
                    self.pr_detail = PrDetail::from_info(pr);
                    self.view_mode = ViewMode::PrDetail;
                    return vec![Command::LoadPrDetail {
                        path,
                        number: self.selected_pr.number,
                    }];
                }
            }
            DetailTab::Stashes | DetailTab::Worktrees => {}
        }
        vec![]
    }

    fn prefetch_first_pr(&self) -> Vec<Command> {
        if self.detail_tab != DetailTab::Prs {
            return vec![];
        }
        match (&self.selected_repo, self.prs.first()) {
            (Some(path), Some(pr)) => vec![Command::PrefetchPrDetail {
                path: path.clone(),
                number: pr.number,
            }],
            _ => vec![],
        }
    }

    fn prefetch_pr_under_cursor(&self) -> Vec<Command> {
        if self.detail_tab != DetailTab::Prs {
            return vec![];
        }
        match (&self.selected_repo, self.prs.get(self.detail_cursor)) {
            (Some(path), Some(pr)) => vec![Command::PrefetchPrDetail {
                path: path.clone(),
                number: pr.number,
            }],
            _ => vec![],
        }
    }

    fn handle_branch_detail_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if self.keys.quit.matches(&key) {
            self.should_quit = true;
        } else if self.keys.back.matches(&key) {
            self.view_mode = ViewMode::RepoDetail;
        } else if self.keys.refresh.matches(&key) {
            return self.handle_refresh();
        } else if self.keys.open_pr.matches(&key) {
            if let Some(path) = self.selected_repo.clone() {
                return vec![Command::OpenOrCreatePr {
                    path,
                    branch: self.branch_detail.branch.name.clone(),
                }];
            }
        } else if self.keys.copy_branch.matches(&key) {
            return vec![Command::CopyToClipboard(
                self.branch_detail.branch.name.clone(),
            )];
        } else if self.keys.open_url.matches(&key) {
            if let Some(pr) = &self.branch_detail.pr_info {
                if !pr.url.is_empty() {
                    return vec![Command::OpenUrl(pr.url.clone())];
                }
            }
        } else if self.keys.help.matches(&key) {
            self.view_mode = ViewMode::Help;
        }
        vec![]
    }

    fn handle_pr_detail_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if self.keys.quit.matches(&key) {
            self.should_quit = true;
        } else if self.keys.back.matches(&key) {
            self.view_mode = ViewMode::RepoDetail;
        } else if self.keys.refresh.matches(&key) {
            return self.handle_refresh();
        } else if self.keys.up.matches(&key) || self.keys.down.matches(&key) {
            return self.navigate_adjacent_pr(self.keys.down.matches(&key));
        } else if self.keys.open_url.matches(&key) {
            if !self.pr_detail.info.url.is_empty() {
                return vec![Command::OpenUrl(self.pr_detail.info.url.clone())];
            }
        } else if self.keys.copy_url.matches(&key) {
            if !self.pr_detail.info.url.is_empty() {
                return vec![Command::CopyToClipboard(self.pr_detail.info.url.clone())];
            }
        } else if self.keys.copy_pr_number.matches(&key) {
            return vec![Command::CopyToClipboard(format!(
                "#{}",
                self.pr_detail.info.number
            ))];
        } else if self.keys.copy_branch.matches(&key) {
            if !self.pr_detail.info.head_ref.is_empty() {
                return vec![Command::CopyToClipboard(
                    self.pr_detail.info.head_ref.clone(),
                )];
            }
        } else if self.keys.help.matches(&key) {
            self.view_mode = ViewMode::Help;
        }
        vec![]
    }

    /// Up/down inside the PR detail view walks the PR list, snapshots
    /// the new row as the partial entity, loads it, and warms the next
    /// one in the travel direction. Boundary moves dispatch nothing.
    fn navigate_adjacent_pr(&mut self, down: bool) -> Vec<Command> {
        let Some(path) = self.selected_repo.clone() else {
            return vec![];
        };
        let Some(current) = self
            .prs
            .iter()
            .position(|pr| pr.number == self.selected_pr.number)
        else {
            return vec![];
        };

        let new_idx = if down {
            if current + 1 >= self.prs.len() {
                return vec![];
            }
            current + 1
        } else {
            if current == 0 {
                return vec![];
            }
            current - 1
        };

        self.selected_pr = self.prs[new_idx].clone();
        self.pr_detail = PrDetail::from_info(self.selected_pr.clone());

        let mut cmds = vec![Command::LoadPrDetail {
            path: path.clone(),
            number: self.selected_pr.number,
        }];

        let ahead = if down {
            self.prs.get(new_idx + 1)
        } else {
            new_idx.checked_sub(1).and_then(|i| self.prs.get(i))
        };
        if let Some(next) = ahead {
            cmds.push(Command::PrefetchPrDetail {
                path,
                number: next.number,
            });
        }
        cmds
    }

    fn handle_help_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if self.keys.quit.matches(&key) {
            self.should_quit = true;
        } else if self.keys.back.matches(&key) || self.keys.help.matches(&key) {
            self.view_mode = ViewMode::RepoList;
        }
        vec![]
    }

    fn handle_filter_key(&mut self, key: KeyEvent) -> Vec<Command> {
        let modes = selectable_filter_modes();

        if self.keys.quit.matches(&key) {
            self.should_quit = true;
        } else if self.keys.back.matches(&key) {
            self.view_mode = ViewMode::RepoList;
        } else if self.keys.up.matches(&key) {
            if self.filter_cursor > 0 {
                self.filter_cursor -= 1;
            }
        } else if self.keys.down.matches(&key) {
            if self.filter_cursor + 1 < modes.len() {
                self.filter_cursor += 1;
            }
        } else if self.keys.enter.matches(&key) {
            if let Some(mode) = modes.get(self.filter_cursor) {
                self.cycle_filter_state(*mode);
                self.update_filtered_paths();
                self.cursor = 0;
            }
        } else if key.code == KeyCode::Char('*') {
            self.reset_filters();
            self.update_filtered_paths();
            self.cursor = 0;
        } else if let KeyCode::Char(c) = key.code {
            if let Some(mode) = modes.iter().find(|m| m.short_key() == c) {
                self.cycle_filter_state(*mode);
                self.update_filtered_paths();
                self.cursor = 0;
            }
        }
        vec![]
    }

    fn handle_sort_key(&mut self, key: KeyEvent) -> Vec<Command> {
        let modes = all_sort_modes();

        if self.keys.quit.matches(&key) {
            self.should_quit = true;
        } else if self.keys.back.matches(&key) {
            self.view_mode = ViewMode::RepoList;
        } else if self.keys.up.matches(&key) {
            if self.sort_cursor > 0 {
                self.sort_cursor -= 1;
            }
        } else if self.keys.down.matches(&key) {
            if self.sort_cursor + 1 < modes.len() {
                self.sort_cursor += 1;
            }
        } else if self.keys.enter.matches(&key) {
            if let Some(mode) = modes.get(self.sort_cursor) {
                self.cycle_sort_state(*mode);
                self.update_filtered_paths();
            }
        } else if key.code == KeyCode::Char('[') {
            self.move_sort_priority(true);
            self.update_filtered_paths();
        } else if key.code == KeyCode::Char(']') {
            self.move_sort_priority(false);
            self.update_filtered_paths();
        } else if key.code == KeyCode::Char('*') {
            self.reset_sorts();
            self.update_filtered_paths();
        } else if let KeyCode::Char(c) = key.code {
            if let Some(mode) = modes.iter().find(|m| m.short_key() == c) {
                self.cycle_sort_state(*mode);
                self.update_filtered_paths();
            }
        }
        vec![]
    }

    fn handle_batch_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if self.keys.quit.matches(&key) {
            if !self.batch_running {
                self.should_quit = true;
            }
        } else if self.keys.back.matches(&key) && !self.batch_running {
            self.view_mode = ViewMode::RepoList;
        }
        vec![]
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Vec<Command> {
        match key.code {
            KeyCode::Esc => {
                self.searching = false;
            }
            KeyCode::Enter => {
                self.searching = false;
                self.search_text = self.search_input.clone();
                self.update_filtered_paths();
                self.cursor = 0;
            }
            KeyCode::Backspace => {
                self.search_input.pop();
                self.search_text = self.search_input.clone();
                self.update_filtered_paths();
                self.cursor = 0;
            }
            KeyCode::Char('c') if self.keys.quit.matches(&key) => {
                self.should_quit = true;
            }
            KeyCode::Char(c) => {
                self.search_input.push(c);
                self.search_text = self.search_input.clone();
                self.update_filtered_paths();
                self.cursor = 0;
            }
            _ => {}
        }
        vec![]
    }

    /// The refresh cascade: the shared caches always go first, then the
    /// state under the current view is invalidated and reloaded. The
    /// view itself and the selection survive.
    fn handle_refresh(&mut self) -> Vec<Command> {
        let mut cmds = vec![Command::ClearCaches];

        match self.view_mode {
            ViewMode::RepoList => {
                self.loading = true;
                self.summaries.clear();
                self.pr_counts.clear();
                self.branches.clear();
                self.stashes.clear();
                self.worktrees.clear();
                self.prs.clear();
                self.branch_detail = BranchDetail::default();
                self.pr_detail = PrDetail::default();
                cmds.push(Command::DiscoverRepos {
                    paths: self.scan_paths.clone(),
                    max_depth: self.max_depth,
                });
            }
            ViewMode::RepoDetail => {
                self.branches.clear();
                self.stashes.clear();
                self.worktrees.clear();
                self.prs.clear();
                self.branch_detail = BranchDetail::default();
                self.pr_detail = PrDetail::default();

                if let Some(path) = self.selected_repo.clone() {
                    self.detail_loading = true;
                    cmds.push(Command::LoadDetail(path.clone()));
                    if let Some(summary) = self.summaries.get(&path) {
                        if !summary.upstream.is_empty() {
                            cmds.push(Command::LoadPrCount {
                                path,
                                upstream: summary.upstream.clone(),
                            });
                        }
                    }
                }
            }
            ViewMode::BranchDetail => {
                self.branch_detail = BranchDetail::default();
                if let Some(path) = self.selected_repo.clone() {
                    if !self.selected_branch.name.is_empty() {
                        cmds.push(Command::LoadBranchDetail {
                            path,
                            branch: self.selected_branch.name.clone(),
                        });
                    }
                }
            }
            ViewMode::PrDetail => {
                self.pr_detail = PrDetail::default();
                if let Some(path) = self.selected_repo.clone() {
                    if self.selected_pr.number > 0 {
                        cmds.push(Command::LoadPrDetail {
                            path,
                            number: self.selected_pr.number,
                        });
                    }
                }
            }
            ViewMode::Help | ViewMode::Filter | ViewMode::Sort | ViewMode::BatchProgress => {}
        }

        cmds
    }

    fn start_batch(&mut self, kind: BatchKind) -> Vec<Command> {
        if self.filtered_paths.is_empty() {
            return vec![];
        }
        self.view_mode = ViewMode::BatchProgress;
        self.batch_running = true;
        self.batch_task = kind.label();
        self.batch_results.clear();
        self.batch_total = self.filtered_paths.len();

        vec![Command::RunBatch {
            kind,
            paths: self.filtered_paths.clone(),
        }]
    }

    pub fn detail_list_len(&self) -> usize {
        match self.detail_tab {
            DetailTab::Branches => self.branches.len(),
            DetailTab::Stashes => self.stashes.len(),
            DetailTab::Worktrees => self.worktrees.len(),
            DetailTab::Prs => self.prs.len(),
        }
    }

    pub fn update_filtered_paths(&mut self) {
        self.filtered_paths = filters::filter_and_sort(
            &self.repo_paths,
            &self.summaries,
            &self.active_filters,
            &self.active_sorts,
            &self.search_text,
        );

        if self.cursor >= self.filtered_paths.len() {
            self.cursor = self.filtered_paths.len().saturating_sub(1);
        }
    }

    /// Cycle one filter: off → on → inverted → off.
    pub fn cycle_filter_state(&mut self, mode: FilterMode) {
        if mode == FilterMode::All {
            return;
        }
        for f in &mut self.active_filters {
            if f.mode == mode {
                if !f.enabled {
                    f.enabled = true;
                    f.inverted = false;
                } else if !f.inverted {
                    f.inverted = true;
                } else {
                    f.enabled = false;
                    f.inverted = false;
                }
            }
        }
    }

    pub fn reset_filters(&mut self) {
        for f in &mut self.active_filters {
            f.enabled = f.mode == FilterMode::All;
            f.inverted = false;
        }
    }

    /// Cycle one sort: off → ascending (lowest priority) → descending → off.
    pub fn cycle_sort_state(&mut self, mode: SortMode) {
        let next_priority = self
            .active_sorts
            .iter()
            .filter(|s| s.enabled)
            .map(|s| s.priority + 1)
            .max()
            .unwrap_or(0);

        for s in &mut self.active_sorts {
            if s.mode == mode {
                if !s.enabled {
                    s.enabled = true;
                    s.direction = SortDirection::Asc;
                    s.priority = next_priority;
                } else if s.direction == SortDirection::Asc {
                    s.direction = SortDirection::Desc;
                } else {
                    s.enabled = false;
                    s.direction = SortDirection::Asc;
                }
            }
        }
    }

    /// Move the sort under the editor cursor one step up or down in
    /// priority by swapping with its neighbor.
    fn move_sort_priority(&mut self, up: bool) {
        let modes = all_sort_modes();
        let Some(mode) = modes.get(self.sort_cursor) else {
            return;
        };
        let Some(current) = self.active_sorts.iter().position(|s| s.mode == *mode) else {
            return;
        };
        let current_priority = self.active_sorts[current].priority;

        let neighbor = self
            .active_sorts
            .iter()
            .enumerate()
            .filter(|(i, s)| {
                *i != current
                    && if up {
                        s.priority < current_priority
                    } else {
                        s.priority > current_priority
                    }
            })
            .min_by_key(|(_, s)| current_priority.abs_diff(s.priority))
            .map(|(i, _)| i);

        if let Some(other) = neighbor {
            let other_priority = self.active_sorts[other].priority;
            self.active_sorts[current].priority = other_priority;
            self.active_sorts[other].priority = current_priority;
        }
    }

    pub fn reset_sorts(&mut self) {
        for (i, s) in self.active_sorts.iter_mut().enumerate() {
            s.enabled = s.mode == SortMode::Name;
            s.priority = i;
            s.direction = SortDirection::Asc;
        }
    }

    pub fn dirty_count(&self) -> usize {
        self.summaries.values().filter(|s| s.is_dirty()).count()
    }

    pub fn pr_count(&self) -> usize {
        self.summaries
            .values()
            .filter(|s| s.pr_info.is_some())
            .count()
    }

    pub fn selected_summary(&self) -> Option<&RepoSummary> {
        self.filtered_paths
            .get(self.cursor)
            .and_then(|path| self.summaries.get(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(code: KeyCode) -> Message {
        Message::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn make_pr(number: u64, title: &str) -> PrInfo {
        PrInfo {
            number,
            title: title.to_string(),
            state: "OPEN".to_string(),
            head_ref: format!("feature/{number}"),
            ..PrInfo::default()
        }
    }

    fn repo() -> PathBuf {
        PathBuf::from("/test/repo")
    }

    fn app_in_detail(prs: Vec<PrInfo>) -> App {
        let mut app = App::new(vec![], 1);
        app.view_mode = ViewMode::RepoDetail;
        app.detail_tab = DetailTab::Prs;
        app.selected_repo = Some(repo());
        app.prs = prs;
        app.detail_cursor = 0;
        app
    }

    // --- Prefetch triggers ---

    #[test]
    fn cursor_movement_on_pr_tab_prefetches() {
        let mut app = app_in_detail(vec![
            make_pr(1, "PR 1"),
            make_pr(2, "PR 2"),
            make_pr(3, "PR 3"),
        ]);

        let cmds = app.update(press(KeyCode::Down));
        assert_eq!(app.detail_cursor, 1);
        assert_eq!(
            cmds,
            vec![Command::PrefetchPrDetail {
                path: repo(),
                number: 2
            }]
        );

        let cmds = app.update(press(KeyCode::Up));
        assert_eq!(app.detail_cursor, 0);
        assert_eq!(
            cmds,
            vec![Command::PrefetchPrDetail {
                path: repo(),
                number: 1
            }]
        );
    }

    #[test]
    fn tab_switch_to_prs_prefetches_first() {
        let mut app = app_in_detail(vec![make_pr(10, "First"), make_pr(20, "Second")]);
        app.detail_tab = DetailTab::Branches;

        // Branches -> Stashes -> Worktrees: no prefetch yet.
        assert!(app.update(press(KeyCode::Tab)).is_empty());
        assert!(app.update(press(KeyCode::Tab)).is_empty());

        let cmds = app.update(press(KeyCode::Tab));
        assert_eq!(app.detail_tab, DetailTab::Prs);
        assert_eq!(
            cmds,
            vec![Command::PrefetchPrDetail {
                path: repo(),
                number: 10
            }]
        );
    }

    #[test]
    fn detail_load_prefetches_first_three() {
        let mut app = App::new(vec![], 1);
        app.selected_repo = Some(repo());

        let cmds = app.update(Message::DetailLoaded {
            path: repo(),
            branches: vec![],
            stashes: vec![],
            worktrees: vec![],
            prs: (1..=5).map(|n| make_pr(n, "pr")).collect(),
        });

        assert_eq!(app.prs.len(), 5);
        let numbers: Vec<u64> = cmds
            .iter()
            .map(|c| match c {
                Command::PrefetchPrDetail { number, .. } => *number,
                other => panic!("unexpected command: {other:?}"),
            })
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn detail_load_for_other_repo_is_dropped() {
        let mut app = App::new(vec![], 1);
        app.selected_repo = Some(repo());

        let cmds = app.update(Message::DetailLoaded {
            path: PathBuf::from("/somewhere/else"),
            branches: vec![BranchInfo::default()],
            stashes: vec![],
            worktrees: vec![],
            prs: vec![make_pr(1, "pr")],
        });
        assert!(cmds.is_empty());
        assert!(app.prs.is_empty());
        assert!(app.branches.is_empty());
    }

    #[test]
    fn cursor_movement_on_branch_tab_does_not_prefetch() {
        let mut app = app_in_detail(vec![]);
        app.detail_tab = DetailTab::Branches;
        app.branches = vec![
            BranchInfo {
                name: "main".to_string(),
                ..BranchInfo::default()
            },
            BranchInfo {
                name: "feature".to_string(),
                ..BranchInfo::default()
            },
        ];

        let cmds = app.update(press(KeyCode::Down));
        assert_eq!(app.detail_cursor, 1);
        assert!(cmds.is_empty());
    }

    // --- Progressive loading ---

    #[test]
    fn entering_a_pr_snapshots_the_row_and_loads() {
        let mut app = app_in_detail(vec![make_pr(456, "Feature PR")]);

        let cmds = app.update(press(KeyCode::Enter));
        assert_eq!(app.view_mode, ViewMode::PrDetail);
        assert_eq!(app.pr_detail.info.number, 456);
        assert_eq!(app.pr_detail.info.title, "Feature PR");
        assert!(app.pr_detail.author.is_empty());
        assert_eq!(
            cmds,
            vec![Command::LoadPrDetail {
                path: repo(),
                number: 456
            }]
        );
    }

    #[test]
    fn failed_detail_fetch_preserves_partial_fields() {
        let mut app = app_in_detail(vec![make_pr(456, "Feature PR")]);
        app.update(press(KeyCode::Enter));

        let cmds = app.update(Message::PrDetailLoaded {
            path: repo(),
            number: 456,
            result: Err("gh exploded".to_string()),
        });

        assert_eq!(app.pr_detail.info.number, 456);
        assert_eq!(app.pr_detail.info.title, "Feature PR");
        assert!(!app.status_message.is_empty());
        assert_eq!(cmds, vec![Command::ClearStatusAfterDelay]);
    }

    #[test]
    fn successful_fetch_replaces_wholesale() {
        let mut app = app_in_detail(vec![make_pr(456, "Feature PR")]);
        app.update(press(KeyCode::Enter));

        let full = PrDetail {
            info: make_pr(456, "Feature PR"),
            author: "octocat".to_string(),
            additions: 12,
            ..PrDetail::default()
        };
        app.update(Message::PrDetailLoaded {
            path: repo(),
            number: 456,
            result: Ok(full.clone()),
        });

        assert_eq!(app.pr_detail, full);
        assert!(app.pr_detail.is_fully_loaded());
    }

    #[test]
    fn stale_result_for_other_pr_is_discarded() {
        let mut app = app_in_detail(vec![make_pr(1, "A"), make_pr(2, "B")]);
        app.update(press(KeyCode::Enter)); // selects PR 1

        let before = app.pr_detail.clone();
        let cmds = app.update(Message::PrDetailLoaded {
            path: repo(),
            number: 2,
            result: Ok(PrDetail {
                info: make_pr(2, "B"),
                author: "someone".to_string(),
                ..PrDetail::default()
            }),
        });

        assert!(cmds.is_empty());
        assert_eq!(app.pr_detail, before);
    }

    #[test]
    fn stale_result_for_other_repo_is_discarded() {
        let mut app = app_in_detail(vec![make_pr(1, "A")]);
        app.update(press(KeyCode::Enter));

        let before = app.pr_detail.clone();
        app.update(Message::PrDetailLoaded {
            path: PathBuf::from("/another/repo"),
            number: 1,
            result: Ok(PrDetail {
                info: make_pr(1, "A"),
                author: "someone".to_string(),
                ..PrDetail::default()
            }),
        });
        assert_eq!(app.pr_detail, before);
    }

    // --- Adjacent PR navigation ---

    #[test]
    fn adjacent_navigation_loads_and_prefetches_ahead() {
        let mut app = app_in_detail(vec![
            make_pr(1, "First"),
            make_pr(2, "Second"),
            make_pr(3, "Third"),
        ]);
        app.update(press(KeyCode::Enter)); // PR 1
        app.update(Message::PrDetailLoaded {
            path: repo(),
            number: 1,
            result: Ok(PrDetail {
                info: make_pr(1, "First"),
                author: "user1".to_string(),
                ..PrDetail::default()
            }),
        });

        let cmds = app.update(press(KeyCode::Down));
        assert_eq!(app.selected_pr.number, 2);
        // The new row's cheap fields show instantly, author resets.
        assert_eq!(app.pr_detail.info.title, "Second");
        assert!(app.pr_detail.author.is_empty());
        assert_eq!(
            cmds,
            vec![
                Command::LoadPrDetail {
                    path: repo(),
                    number: 2
                },
                Command::PrefetchPrDetail {
                    path: repo(),
                    number: 3
                },
            ]
        );

        let cmds = app.update(press(KeyCode::Up));
        assert_eq!(app.selected_pr.number, 1);
        assert_eq!(
            cmds,
            vec![Command::LoadPrDetail {
                path: repo(),
                number: 1
            }]
        );
    }

    #[test]
    fn adjacent_navigation_stops_at_boundaries() {
        let mut app = app_in_detail(vec![make_pr(1, "Only PR")]);
        app.update(press(KeyCode::Enter));

        assert!(app.update(press(KeyCode::Down)).is_empty());
        assert_eq!(app.selected_pr.number, 1);

        assert!(app.update(press(KeyCode::Up)).is_empty());
        assert_eq!(app.selected_pr.number, 1);
    }

    // --- Refresh cascade ---

    fn populated_app(view: ViewMode) -> App {
        let mut app = App::new(vec![PathBuf::from("/scan")], 1);
        app.view_mode = view;
        app.selected_repo = Some(repo());
        app.summaries.insert(
            repo(),
            RepoSummary {
                path: repo(),
                ..RepoSummary::default()
            },
        );
        app.pr_counts.insert(repo(), 5);
        app.branches = vec![BranchInfo {
            name: "main".to_string(),
            ..BranchInfo::default()
        }];
        app.stashes = vec![StashInfo::default()];
        app.worktrees = vec![WorktreeInfo::default()];
        app.prs = vec![make_pr(1, "pr")];
        app.selected_branch = BranchInfo {
            name: "feature".to_string(),
            ..BranchInfo::default()
        };
        app.branch_detail = BranchDetail {
            branch: BranchInfo {
                name: "feature".to_string(),
                ..BranchInfo::default()
            },
            ..BranchDetail::default()
        };
        app.selected_pr = make_pr(123, "Test PR");
        app.pr_detail = PrDetail {
            info: make_pr(123, "Test PR"),
            author: "testuser".to_string(),
            ..PrDetail::default()
        };
        app
    }

    #[test]
    fn refresh_always_clears_caches_first() {
        for view in [
            ViewMode::RepoList,
            ViewMode::RepoDetail,
            ViewMode::BranchDetail,
            ViewMode::PrDetail,
        ] {
            let mut app = populated_app(view);
            let cmds = app.update(press(KeyCode::Char('r')));
            assert_eq!(cmds.first(), Some(&Command::ClearCaches), "view {view:?}");
        }
    }

    #[test]
    fn refresh_preserves_view_mode_and_selection() {
        for view in [
            ViewMode::RepoList,
            ViewMode::RepoDetail,
            ViewMode::BranchDetail,
            ViewMode::PrDetail,
        ] {
            let mut app = populated_app(view);
            app.update(press(KeyCode::Char('r')));
            assert_eq!(app.view_mode, view);
            assert_eq!(app.selected_repo, Some(repo()));
        }
    }

    #[test]
    fn refresh_from_repo_list_clears_everything_and_rediscovers() {
        let mut app = populated_app(ViewMode::RepoList);
        let cmds = app.update(press(KeyCode::Char('r')));

        assert!(app.loading);
        assert!(app.summaries.is_empty());
        assert!(app.pr_counts.is_empty());
        assert!(app.branches.is_empty());
        assert!(app.stashes.is_empty());
        assert!(app.worktrees.is_empty());
        assert!(app.prs.is_empty());
        assert_eq!(app.branch_detail, BranchDetail::default());
        assert_eq!(app.pr_detail, PrDetail::default());
        assert_eq!(
            cmds,
            vec![
                Command::ClearCaches,
                Command::DiscoverRepos {
                    paths: vec![PathBuf::from("/scan")],
                    max_depth: 1
                },
            ]
        );
    }

    #[test]
    fn refresh_from_repo_detail_clears_collections_and_reloads_them() {
        let mut app = populated_app(ViewMode::RepoDetail);
        let cmds = app.update(press(KeyCode::Char('r')));

        assert!(app.branches.is_empty());
        assert!(app.prs.is_empty());
        assert_eq!(app.branch_detail, BranchDetail::default());
        assert_eq!(app.pr_detail, PrDetail::default());
        // Summary has no upstream, so the repo's collections are the one reload.
        assert_eq!(
            cmds,
            vec![Command::ClearCaches, Command::LoadDetail(repo())]
        );
    }

    #[test]
    fn refresh_from_branch_detail_reloads_that_branch() {
        let mut app = populated_app(ViewMode::BranchDetail);
        let cmds = app.update(press(KeyCode::Char('r')));

        assert_eq!(app.branch_detail, BranchDetail::default());
        assert_eq!(
            cmds,
            vec![
                Command::ClearCaches,
                Command::LoadBranchDetail {
                    path: repo(),
                    branch: "feature".to_string()
                },
            ]
        );
    }

    #[test]
    fn refresh_from_pr_detail_reloads_that_pr() {
        let mut app = populated_app(ViewMode::PrDetail);
        let cmds = app.update(press(KeyCode::Char('r')));

        assert_eq!(app.pr_detail, PrDetail::default());
        assert_eq!(
            cmds,
            vec![
                Command::ClearCaches,
                Command::LoadPrDetail {
                    path: repo(),
                    number: 123
                },
            ]
        );
    }

    #[test]
    fn refresh_complete_sets_transient_notice() {
        let mut app = App::new(vec![], 1);
        let cmds = app.update(Message::RefreshComplete);
        assert_eq!(app.status_message, "Data refreshed");
        assert_eq!(cmds, vec![Command::ClearStatusAfterDelay]);

        app.update(Message::ClearStatus);
        assert!(app.status_message.is_empty());
    }

    // --- Startup / summary flow ---

    #[test]
    fn discovery_fans_out_summary_loads() {
        let mut app = App::new(vec![], 1);
        let paths = vec![PathBuf::from("/a"), PathBuf::from("/b")];
        let cmds = app.update(Message::ReposDiscovered(paths.clone()));

        assert_eq!(app.loading_count, 2);
        assert!(app.loading);
        assert_eq!(
            cmds,
            vec![
                Command::LoadSummary(PathBuf::from("/a")),
                Command::LoadSummary(PathBuf::from("/b")),
            ]
        );
    }

    #[test]
    fn empty_discovery_finishes_loading() {
        let mut app = App::new(vec![], 1);
        let cmds = app.update(Message::ReposDiscovered(vec![]));
        assert!(!app.loading);
        assert!(cmds.is_empty());
    }

    #[test]
    fn summary_with_upstream_chains_pr_lookups() {
        let mut app = App::new(vec![], 1);
        app.update(Message::ReposDiscovered(vec![repo()]));

        let summary = RepoSummary {
            path: repo(),
            branch: "main".to_string(),
            upstream: "origin/main".to_string(),
            ..RepoSummary::default()
        };
        let cmds = app.update(Message::SummaryLoaded {
            path: repo(),
            result: Ok(summary),
        });

        assert!(!app.loading);
        assert_eq!(
            cmds,
            vec![
                Command::LoadPr {
                    path: repo(),
                    branch: "main".to_string(),
                    upstream: "origin/main".to_string()
                },
                Command::LoadPrCount {
                    path: repo(),
                    upstream: "origin/main".to_string()
                },
            ]
        );
    }

    #[test]
    fn failed_summary_keeps_the_row() {
        let mut app = App::new(vec![], 1);
        app.update(Message::ReposDiscovered(vec![repo()]));
        let cmds = app.update(Message::SummaryLoaded {
            path: repo(),
            result: Err("not a git repo".to_string()),
        });

        assert!(cmds.is_empty());
        let row = app.summaries.get(&repo()).unwrap();
        assert_eq!(row.error.as_deref(), Some("not a git repo"));
    }

    #[test]
    fn pr_loaded_triggers_workflow_lookup() {
        let mut app = App::new(vec![], 1);
        app.summaries.insert(repo(), RepoSummary::default());

        let cmds = app.update(Message::PrLoaded {
            path: repo(),
            pr: Some(make_pr(1, "pr")),
        });
        assert_eq!(cmds, vec![Command::LoadWorkflow(repo())]);

        let cmds = app.update(Message::PrLoaded {
            path: repo(),
            pr: None,
        });
        assert!(cmds.is_empty());
    }

    // --- End-to-end scenario ---

    #[test]
    fn progressive_pr_browsing_scenario() {
        let mut app = App::new(vec![], 1);
        app.view_mode = ViewMode::RepoDetail;
        app.selected_repo = Some(repo());
        app.detail_tab = DetailTab::Prs;

        // PR list of five lands: cache warmed for the first three only.
        let cmds = app.update(Message::DetailLoaded {
            path: repo(),
            branches: vec![],
            stashes: vec![],
            worktrees: vec![],
            prs: (1..=5).map(|n| make_pr(n, &format!("PR {n}"))).collect(),
        });
        let prefetched: Vec<u64> = cmds
            .iter()
            .filter_map(|c| match c {
                Command::PrefetchPrDetail { number, .. } => Some(*number),
                _ => None,
            })
            .collect();
        assert_eq!(prefetched, vec![1, 2, 3]);

        // Select PR 1: list-sourced fields visible instantly.
        let cmds = app.update(press(KeyCode::Enter));
        assert_eq!(app.pr_detail.info.title, "PR 1");
        assert_eq!(app.pr_detail.info.head_ref, "feature/1");
        assert!(app.pr_detail.author.is_empty());
        assert_eq!(
            cmds,
            vec![Command::LoadPrDetail {
                path: repo(),
                number: 1
            }]
        );

        // Full detail arrives.
        app.update(Message::PrDetailLoaded {
            path: repo(),
            number: 1,
            result: Ok(PrDetail {
                info: make_pr(1, "PR 1"),
                author: "octocat".to_string(),
                ..PrDetail::default()
            }),
        });
        assert_eq!(app.pr_detail.author, "octocat");

        // Down to PR 2: partial again, load 2, prefetch 3.
        let cmds = app.update(press(KeyCode::Down));
        assert_eq!(app.pr_detail.info.title, "PR 2");
        assert!(app.pr_detail.author.is_empty());
        assert_eq!(
            cmds,
            vec![
                Command::LoadPrDetail {
                    path: repo(),
                    number: 2
                },
                Command::PrefetchPrDetail {
                    path: repo(),
                    number: 3
                },
            ]
        );
    }

    // --- Batch ---

    #[test]
    fn batch_runs_over_filtered_set() {
        let mut app = App::new(vec![], 1);
        app.repo_paths = vec![PathBuf::from("/a"), PathBuf::from("/b")];
        app.update_filtered_paths();

        let cmds = app.update(press(KeyCode::Char('F')));
        assert_eq!(app.view_mode, ViewMode::BatchProgress);
        assert!(app.batch_running);
        assert_eq!(app.batch_task, "Fetch All");
        assert_eq!(app.batch_total, 2);
        assert_eq!(
            cmds,
            vec![Command::RunBatch {
                kind: BatchKind::FetchAll,
                paths: vec![PathBuf::from("/a"), PathBuf::from("/b")],
            }]
        );
    }

    #[test]
    fn batch_with_no_repos_is_a_noop() {
        let mut app = App::new(vec![], 1);
        let cmds = app.update(press(KeyCode::Char('F')));
        assert!(cmds.is_empty());
        assert_eq!(app.view_mode, ViewMode::RepoList);
    }

    #[test]
    fn batch_view_locks_until_complete() {
        let mut app = App::new(vec![], 1);
        app.repo_paths = vec![PathBuf::from("/a")];
        app.update_filtered_paths();
        app.update(press(KeyCode::Char('P')));

        app.update(press(KeyCode::Esc));
        assert_eq!(app.view_mode, ViewMode::BatchProgress);

        app.update(Message::BatchComplete {
            results: vec![TaskResult {
                path: PathBuf::from("/a"),
                repo_name: "a".to_string(),
                success: true,
                message: "ok".to_string(),
                duration_ms: 1,
            }],
        });
        assert!(!app.batch_running);
        assert_eq!(app.batch_results.len(), 1);

        app.update(press(KeyCode::Esc));
        assert_eq!(app.view_mode, ViewMode::RepoList);
    }

    // --- Navigation odds and ends ---

    #[test]
    fn list_cursor_stays_in_bounds() {
        let mut app = App::new(vec![], 1);
        app.repo_paths = vec![PathBuf::from("/a"), PathBuf::from("/b")];
        app.update_filtered_paths();

        app.update(press(KeyCode::Up));
        assert_eq!(app.cursor, 0);
        app.update(press(KeyCode::Down));
        assert_eq!(app.cursor, 1);
        app.update(press(KeyCode::Down));
        assert_eq!(app.cursor, 1);
        app.update(press(KeyCode::Char('g')));
        assert_eq!(app.cursor, 0);
        app.update(press(KeyCode::Char('G')));
        assert_eq!(app.cursor, 1);
    }

    #[test]
    fn entering_a_repo_loads_its_collections() {
        let mut app = App::new(vec![], 1);
        app.repo_paths = vec![repo()];
        app.update_filtered_paths();

        let cmds = app.update(press(KeyCode::Enter));
        assert_eq!(app.view_mode, ViewMode::RepoDetail);
        assert_eq!(app.selected_repo, Some(repo()));
        assert_eq!(app.detail_tab, DetailTab::Branches);
        assert_eq!(cmds, vec![Command::LoadDetail(repo())]);
    }

    #[test]
    fn entering_a_branch_clears_previous_detail() {
        let mut app = app_in_detail(vec![]);
        app.detail_tab = DetailTab::Branches;
        app.branches = vec![BranchInfo {
            name: "feature".to_string(),
            ..BranchInfo::default()
        }];
        app.branch_detail = BranchDetail {
            staged: 9,
            ..BranchDetail::default()
        };

        let cmds = app.update(press(KeyCode::Enter));
        assert_eq!(app.view_mode, ViewMode::BranchDetail);
        assert_eq!(app.branch_detail, BranchDetail::default());
        assert_eq!(
            cmds,
            vec![Command::LoadBranchDetail {
                path: repo(),
                branch: "feature".to_string()
            }]
        );
    }

    #[test]
    fn detail_loading_clears_when_collections_arrive() {
        let mut app = App::new(vec![], 1);
        app.repo_paths = vec![repo()];
        app.update_filtered_paths();

        app.update(press(KeyCode::Enter));
        assert!(app.detail_loading);

        app.update(Message::DetailLoaded {
            path: repo(),
            branches: vec![],
            stashes: vec![],
            worktrees: vec![],
            prs: vec![],
        });
        assert!(!app.detail_loading);
    }

    #[test]
    fn quit_from_any_view() {
        let mut app = App::new(vec![], 1);
        app.update(press(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn search_narrows_live_and_commits_on_enter() {
        let mut app = App::new(vec![], 1);
        app.repo_paths = vec![PathBuf::from("/r/alpha"), PathBuf::from("/r/beta")];
        app.update_filtered_paths();

        app.update(press(KeyCode::Char('/')));
        assert!(app.searching);
        app.update(press(KeyCode::Char('a')));
        app.update(press(KeyCode::Char('l')));
        assert_eq!(app.filtered_paths, vec![PathBuf::from("/r/alpha")]);

        app.update(press(KeyCode::Enter));
        assert!(!app.searching);
        assert_eq!(app.search_text, "al");
    }

    #[test]
    fn filter_editor_cycles_and_resets() {
        let mut app = App::new(vec![], 1);
        app.update(press(KeyCode::Char('f')));
        assert_eq!(app.view_mode, ViewMode::Filter);

        // 'd' cycles the dirty filter: on -> inverted -> off.
        app.update(press(KeyCode::Char('d')));
        let dirty = |app: &App| {
            *app.active_filters
                .iter()
                .find(|f| f.mode == FilterMode::Dirty)
                .unwrap()
        };
        assert!(dirty(&app).enabled && !dirty(&app).inverted);
        app.update(press(KeyCode::Char('d')));
        assert!(dirty(&app).enabled && dirty(&app).inverted);
        app.update(press(KeyCode::Char('d')));
        assert!(!dirty(&app).enabled);

        app.update(press(KeyCode::Char('d')));
        app.update(press(KeyCode::Char('*')));
        assert!(!dirty(&app).enabled);
    }

    #[test]
    fn sort_editor_cycles_direction_then_off() {
        let mut app = App::new(vec![], 1);
        app.update(press(KeyCode::Char('s')));
        assert_eq!(app.view_mode, ViewMode::Sort);

        let modified = |app: &App| {
            *app.active_sorts
                .iter()
                .find(|s| s.mode == SortMode::Modified)
                .unwrap()
        };
        app.update(press(KeyCode::Char('m')));
        assert!(modified(&app).enabled);
        assert_eq!(modified(&app).direction, SortDirection::Asc);
        app.update(press(KeyCode::Char('m')));
        assert_eq!(modified(&app).direction, SortDirection::Desc);
        app.update(press(KeyCode::Char('m')));
        assert!(!modified(&app).enabled);
    }

    #[test]
    fn help_toggles_back_to_list() {
        let mut app = App::new(vec![], 1);
        app.update(press(KeyCode::Char('?')));
        assert_eq!(app.view_mode, ViewMode::Help);
        app.update(press(KeyCode::Char('?')));
        assert_eq!(app.view_mode, ViewMode::RepoList);
    }
}
