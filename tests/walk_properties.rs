//! Property tests for the walker over randomly generated project trees.

mod common;

use std::path::PathBuf;

use proptest::prelude::*;
use tempfile::TempDir;

use depclean::scanner::walker::{DependencyScanner, ScanConfig, WalkDecision, relative_depth};

const SEGMENTS: &[&str] = &[
    "app", "lib", "src", "node_modules", "target", "vendor", "venv", ".cache", "build", "bin",
    "__pycache__", "Pods",
];
const INDICATORS: &[&str] = &[
    "package.json",
    "Cargo.toml",
    "pom.xml",
    "go.mod",
    "composer.json",
    "requirements.txt",
    "Podfile",
];

fn tree_strategy() -> impl Strategy<Value = (Vec<Vec<usize>>, Vec<(Vec<usize>, usize)>)> {
    let dirs = prop::collection::vec(prop::collection::vec(0..SEGMENTS.len(), 1..8), 1..24);
    let files = prop::collection::vec(
        (
            prop::collection::vec(0..SEGMENTS.len(), 0..4),
            0..INDICATORS.len(),
        ),
        0..12,
    );
    (dirs, files)
}

fn build_tree(dirs: &[Vec<usize>], files: &[(Vec<usize>, usize)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for dir in dirs {
        let rel: PathBuf = dir.iter().map(|&i| SEGMENTS[i]).collect();
        common::mkdirs(tmp.path(), rel.to_str().unwrap());
    }
    for (dir, indicator) in files {
        let rel: PathBuf = dir
            .iter()
            .map(|&i| SEGMENTS[i])
            .chain(std::iter::once(INDICATORS[*indicator]))
            .collect();
        common::write_file(tmp.path(), rel.to_str().unwrap(), 1);
    }
    common::age_tree(tmp.path(), 90);
    tmp
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn terminal_decisions_are_never_entered((dirs, files) in tree_strategy(), max_depth in 0usize..7) {
        let tmp = build_tree(&dirs, &files);
        let config = ScanConfig::new(tmp.path()).with_max_depth(max_depth);
        let mut visits: Vec<(PathBuf, WalkDecision)> = Vec::new();
        let outcome = DependencyScanner::default()
            .scan_with(&config, |v| visits.push((v.path.to_path_buf(), v.decision)));

        for (stop, decision) in &visits {
            if decision.descends() {
                continue;
            }
            for (path, _) in &visits {
                prop_assert!(path == stop || !path.starts_with(stop));
            }
        }
        for dep in &outcome.found {
            prop_assert!(relative_depth(tmp.path(), &dep.dependency_path) <= max_depth);
            prop_assert_eq!(dep.dependency_path.parent(), Some(dep.project_path.as_path()));
        }
        for (i, a) in outcome.found.iter().enumerate() {
            for b in &outcome.found[i + 1..] {
                prop_assert!(!b.dependency_path.starts_with(&a.dependency_path));
                prop_assert!(!a.dependency_path.starts_with(&b.dependency_path));
            }
        }
    }

    #[test]
    fn scans_are_deterministic((dirs, files) in tree_strategy()) {
        let tmp = build_tree(&dirs, &files);
        let config = ScanConfig::new(tmp.path());
        let scanner = DependencyScanner::default();
        prop_assert_eq!(scanner.scan(&config), scanner.scan(&config));
    }

    #[test]
    fn raising_min_size_only_removes_matches((dirs, files) in tree_strategy(), min in 0u64..4096) {
        let tmp = build_tree(&dirs, &files);
        let scanner = DependencyScanner::default();
        let base = ScanConfig::new(tmp.path());
        let all = scanner.scan(&base).found;
        let filtered = scanner.scan(&base.clone().with_min_size(min)).found;
        let expected: Vec<_> = all.into_iter().filter(|f| f.size_bytes >= min).collect();
        prop_assert_eq!(filtered, expected);
    }
}
