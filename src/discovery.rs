use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::git::is_repo;

/// Collect repository roots under the given base paths, deduplicated,
/// descending at most `max_depth` directory levels. A base path that is
/// itself a repository is returned as-is without scanning inside it.
pub fn discover_repos(base_paths: &[PathBuf], max_depth: usize) -> Vec<PathBuf> {
    let mut repos = vec![];
    let mut seen = HashSet::new();

    for base in base_paths {
        for repo in discover_in_path(base, max_depth) {
            if seen.insert(repo.clone()) {
                repos.push(repo);
            }
        }
    }

    repos
}

fn discover_in_path(base: &Path, max_depth: usize) -> Vec<PathBuf> {
    if is_repo(base) {
        return vec![base.to_path_buf()];
    }
    let mut repos = vec![];
    scan_dir(base, 0, max_depth, &mut repos);
    repos
}

fn scan_dir(dir: &Path, depth: usize, max_depth: usize, repos: &mut Vec<PathBuf>) {
    if depth > max_depth {
        return;
    }

    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    paths.sort();

    for path in paths {
        let name = path.file_name().map(|n| n.to_string_lossy().to_string());
        if name.is_none_or(|n| n.starts_with('.')) {
            continue;
        }
        if is_repo(&path) {
            repos.push(path);
        } else {
            scan_dir(&path, depth + 1, max_depth, repos);
        }
    }
}
