use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::models::{
    repo_name, ActiveFilter, ActiveSort, FilterMode, RepoSummary, SortDirection, SortMode,
};

/// Apply the enabled filters, the search text, and the enabled sorts to
/// the discovered paths, in that order. Paths without a loaded summary
/// survive only when no filter is active (they're still loading).
pub fn filter_and_sort(
    paths: &[PathBuf],
    summaries: &HashMap<PathBuf, RepoSummary>,
    active_filters: &[ActiveFilter],
    active_sorts: &[ActiveSort],
    search_text: &str,
) -> Vec<PathBuf> {
    let filtered = filter_repos(paths, summaries, active_filters);
    let searched = search_repos(&filtered, search_text);
    sort_paths(&searched, summaries, active_sorts)
}

fn passes_filter(summary: &RepoSummary, mode: FilterMode) -> bool {
    match mode {
        FilterMode::All => true,
        FilterMode::Ahead => summary.ahead > 0,
        FilterMode::Behind => summary.behind > 0,
        FilterMode::Dirty => summary.is_dirty(),
        FilterMode::HasPr => summary.pr_info.is_some(),
        FilterMode::HasStash => summary.stash_count > 0,
    }
}

pub fn filter_repos(
    paths: &[PathBuf],
    summaries: &HashMap<PathBuf, RepoSummary>,
    active_filters: &[ActiveFilter],
) -> Vec<PathBuf> {
    let enabled: Vec<&ActiveFilter> = active_filters
        .iter()
        .filter(|f| f.enabled && f.mode != FilterMode::All)
        .collect();

    if enabled.is_empty() {
        return paths.to_vec();
    }

    paths
        .iter()
        .filter(|path| {
            let Some(summary) = summaries.get(*path) else {
                return false;
            };
            enabled.iter().all(|f| {
                let passes = passes_filter(summary, f.mode);
                if f.inverted { !passes } else { passes }
            })
        })
        .cloned()
        .collect()
}

/// Substring matches on the repo name win outright; only when none
/// exist does the subsequence fallback run over the rest.
pub fn search_repos(paths: &[PathBuf], search_text: &str) -> Vec<PathBuf> {
    if search_text.is_empty() {
        return paths.to_vec();
    }

    let needle = search_text.to_lowercase();
    let substring: Vec<PathBuf> = paths
        .iter()
        .filter(|p| repo_name(p).to_lowercase().contains(&needle))
        .cloned()
        .collect();

    if !substring.is_empty() {
        return substring;
    }

    paths
        .iter()
        .filter(|p| is_subsequence(&needle, &repo_name(p).to_lowercase()))
        .cloned()
        .collect()
}

fn is_subsequence(pattern: &str, text: &str) -> bool {
    let mut chars = text.chars();
    pattern
        .chars()
        .all(|p| chars.by_ref().any(|t| t == p))
}

fn compare(a: &RepoSummary, b: &RepoSummary, mode: SortMode) -> Ordering {
    match mode {
        SortMode::Name => compare_by_name(a, b),
        SortMode::Modified => {
            // Most recently touched first.
            b.last_modified
                .cmp(&a.last_modified)
                .then_with(|| compare_by_name(a, b))
        }
        SortMode::Status => b
            .is_dirty()
            .cmp(&a.is_dirty())
            .then_with(|| b.uncommitted_count().cmp(&a.uncommitted_count()))
            .then_with(|| compare_by_name(a, b)),
        SortMode::Branch => a
            .branch
            .to_lowercase()
            .cmp(&b.branch.to_lowercase())
            .then_with(|| compare_by_name(a, b)),
    }
}

fn compare_by_name(a: &RepoSummary, b: &RepoSummary) -> Ordering {
    a.name().to_lowercase().cmp(&b.name().to_lowercase())
}

pub fn sort_paths(
    paths: &[PathBuf],
    summaries: &HashMap<PathBuf, RepoSummary>,
    active_sorts: &[ActiveSort],
) -> Vec<PathBuf> {
    let mut enabled: Vec<&ActiveSort> = active_sorts.iter().filter(|s| s.enabled).collect();
    if paths.is_empty() || enabled.is_empty() {
        return paths.to_vec();
    }
    enabled.sort_by_key(|s| s.priority);

    let mut sorted = paths.to_vec();
    sorted.sort_by(|a, b| {
        let sa = summaries.get(a).cloned().unwrap_or_default();
        let sb = summaries.get(b).cloned().unwrap_or_default();
        for active in &enabled {
            let mut ord = compare(&sa, &sb, active.mode);
            if active.direction == SortDirection::Desc {
                ord = ord.reverse();
            }
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Local};

    fn summary(name: &str) -> RepoSummary {
        RepoSummary {
            path: PathBuf::from(format!("/repos/{name}")),
            branch: "main".to_string(),
            ..RepoSummary::default()
        }
    }

    fn setup(summaries: Vec<RepoSummary>) -> (Vec<PathBuf>, HashMap<PathBuf, RepoSummary>) {
        let paths = summaries.iter().map(|s| s.path.clone()).collect();
        let map = summaries.into_iter().map(|s| (s.path.clone(), s)).collect();
        (paths, map)
    }

    fn filters_with(mode: FilterMode, inverted: bool) -> Vec<ActiveFilter> {
        vec![ActiveFilter {
            mode,
            enabled: true,
            inverted,
        }]
    }

    #[test]
    fn no_enabled_filters_keeps_everything() {
        let (paths, map) = setup(vec![summary("a"), summary("b")]);
        let filters = vec![ActiveFilter::new(FilterMode::All)];
        assert_eq!(filter_repos(&paths, &map, &filters), paths);
    }

    #[test]
    fn dirty_filter_keeps_dirty_repos() {
        let mut dirty = summary("dirty");
        dirty.unstaged = 2;
        let (paths, map) = setup(vec![dirty.clone(), summary("clean")]);

        let kept = filter_repos(&paths, &map, &filters_with(FilterMode::Dirty, false));
        assert_eq!(kept, vec![dirty.path]);
    }

    #[test]
    fn inverted_filter_flips_the_set() {
        let mut dirty = summary("dirty");
        dirty.unstaged = 2;
        let clean = summary("clean");
        let (paths, map) = setup(vec![dirty, clean.clone()]);

        let kept = filter_repos(&paths, &map, &filters_with(FilterMode::Dirty, true));
        assert_eq!(kept, vec![clean.path]);
    }

    #[test]
    fn has_pr_filter() {
        let mut with_pr = summary("with-pr");
        with_pr.pr_info = Some(crate::models::PrInfo::default());
        let (paths, map) = setup(vec![with_pr.clone(), summary("without")]);

        let kept = filter_repos(&paths, &map, &filters_with(FilterMode::HasPr, false));
        assert_eq!(kept, vec![with_pr.path]);
    }

    #[test]
    fn multiple_filters_are_anded() {
        let mut both = summary("both");
        both.ahead = 1;
        both.stash_count = 1;
        let mut ahead_only = summary("ahead-only");
        ahead_only.ahead = 1;
        let (paths, map) = setup(vec![both.clone(), ahead_only]);

        let filters = vec![
            ActiveFilter {
                mode: FilterMode::Ahead,
                enabled: true,
                inverted: false,
            },
            ActiveFilter {
                mode: FilterMode::HasStash,
                enabled: true,
                inverted: false,
            },
        ];
        assert_eq!(filter_repos(&paths, &map, &filters), vec![both.path]);
    }

    #[test]
    fn substring_search_beats_fuzzy() {
        let (paths, _) = setup(vec![summary("dashboard"), summary("dshbrd")]);
        let found = search_repos(&paths, "dash");
        assert_eq!(found, vec![PathBuf::from("/repos/dashboard")]);
    }

    #[test]
    fn fuzzy_fallback_matches_subsequence() {
        let (paths, _) = setup(vec![summary("dshbrd"), summary("other")]);
        let found = search_repos(&paths, "dbd");
        assert_eq!(found, vec![PathBuf::from("/repos/dshbrd")]);
    }

    #[test]
    fn empty_search_is_identity() {
        let (paths, _) = setup(vec![summary("a"), summary("b")]);
        assert_eq!(search_repos(&paths, ""), paths);
    }

    #[test]
    fn sort_by_name_is_case_insensitive() {
        let (paths, map) = setup(vec![summary("Zeta"), summary("alpha")]);
        let sorts = vec![ActiveSort {
            mode: SortMode::Name,
            enabled: true,
            priority: 0,
            direction: SortDirection::Asc,
        }];
        let sorted = sort_paths(&paths, &map, &sorts);
        assert_eq!(
            sorted,
            vec![PathBuf::from("/repos/alpha"), PathBuf::from("/repos/Zeta")]
        );
    }

    #[test]
    fn sort_by_modified_newest_first() {
        let now = Local::now();
        let mut old = summary("old");
        old.last_modified = Some(now - Duration::days(2));
        let mut fresh = summary("fresh");
        fresh.last_modified = Some(now);
        let (paths, map) = setup(vec![old, fresh.clone()]);

        let sorts = vec![ActiveSort {
            mode: SortMode::Modified,
            enabled: true,
            priority: 0,
            direction: SortDirection::Asc,
        }];
        let sorted = sort_paths(&paths, &map, &sorts);
        assert_eq!(sorted[0], fresh.path);
    }

    #[test]
    fn sort_priorities_chain() {
        let mut a = summary("aaa");
        a.branch = "main".to_string();
        let mut b = summary("bbb");
        b.branch = "main".to_string();
        let mut c = summary("ccc");
        c.branch = "develop".to_string();
        let (paths, map) = setup(vec![b.clone(), a.clone(), c.clone()]);

        let sorts = vec![
            ActiveSort {
                mode: SortMode::Branch,
                enabled: true,
                priority: 0,
                direction: SortDirection::Asc,
            },
            ActiveSort {
                mode: SortMode::Name,
                enabled: true,
                priority: 1,
                direction: SortDirection::Asc,
            },
        ];
        let sorted = sort_paths(&paths, &map, &sorts);
        assert_eq!(sorted, vec![c.path, a.path, b.path]);
    }

    #[test]
    fn descending_direction_reverses() {
        let (paths, map) = setup(vec![summary("alpha"), summary("beta")]);
        let sorts = vec![ActiveSort {
            mode: SortMode::Name,
            enabled: true,
            priority: 0,
            direction: SortDirection::Desc,
        }];
        let sorted = sort_paths(&paths, &map, &sorts);
        assert_eq!(
            sorted,
            vec![PathBuf::from("/repos/beta"), PathBuf::from("/repos/alpha")]
        );
    }

    #[test]
    fn no_enabled_sorts_preserves_order() {
        let (paths, map) = setup(vec![summary("zeta"), summary("alpha")]);
        let sorts = vec![ActiveSort::new(SortMode::Name, 0)];
        assert_eq!(sort_paths(&paths, &map, &sorts), paths);
    }
}
