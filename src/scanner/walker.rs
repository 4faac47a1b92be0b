//! Depth-first dependency-directory walker.
//!
//! Each visited directory gets exactly one [`WalkDecision`]. Only `Descend`
//! lets the walk continue into children; every match or prune is terminal for
//! its subtree. The walker is single-threaded and never fails: unreadable
//! entries are skipped and the walk carries on with their siblings.
//!
//! Decision order per directory (first hit wins):
//! 1. depth beyond `max_depth` -> `PruneDepth`
//! 2. dot-prefixed name not on the hidden allow-list -> `PruneSilent(Hidden)`
//! 3. rule table match -> filters -> `MatchAccepted` / `MatchRejected`
//! 4. name on the always-skip list -> `PruneSilent(SkipListed)`
//! 5. otherwise -> `Descend`

#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::core::signals::CancellationToken;
use crate::scanner::filter::{
    FilterPipeline, FilterVerdict, RejectReason, days_between, recency_cutoff,
};
use crate::scanner::rules::{EcosystemRule, EcosystemRuleTable};

/// Default recursion limit.
pub const DEFAULT_MAX_DEPTH: usize = 5;
/// Default recency threshold in days.
pub const DEFAULT_RECENCY_DAYS: u64 = 30;

/// Directory names never descended into, even when unclassified.
pub const DEFAULT_SKIP_DIRS: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    "node_modules",
    "vendor",
    ".gradle",
    "build",
    "venv",
    ".venv",
];

/// Dot-prefixed names that are still walked (they are cache targets themselves).
pub const DEFAULT_HIDDEN_ALLOW: &[&str] = &[".gradle", ".venv", ".env", ".bundle"];

/// Per-scan parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Absolute root of the walk.
    pub root: PathBuf,
    pub max_depth: usize,
    /// Matches whose newest modification is after this instant are rejected.
    pub cutoff: SystemTime,
    /// Matches smaller than this are rejected.
    pub min_size_bytes: u64,
    /// "Now" used for `days_since`; fixed per scan so reruns are comparable.
    pub reference_time: SystemTime,
}

impl ScanConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_depth: DEFAULT_MAX_DEPTH,
            cutoff: recency_cutoff(DEFAULT_RECENCY_DAYS),
            min_size_bytes: 0,
            reference_time: SystemTime::now(),
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Only report directories untouched for at least `days` days.
    #[must_use]
    pub fn with_recency_days(mut self, days: u64) -> Self {
        self.cutoff = recency_cutoff(days);
        self
    }

    #[must_use]
    pub fn with_cutoff(mut self, cutoff: SystemTime) -> Self {
        self.cutoff = cutoff;
        self
    }

    #[must_use]
    pub fn with_min_size(mut self, min_size_bytes: u64) -> Self {
        self.min_size_bytes = min_size_bytes;
        self
    }

    #[must_use]
    pub fn with_reference_time(mut self, now: SystemTime) -> Self {
        self.reference_time = now;
        self
    }

    pub fn filter(&self) -> FilterPipeline {
        FilterPipeline::new(self.cutoff, self.min_size_bytes)
    }
}

/// Name-based prune lists, passed explicitly into the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkPolicy {
    skip_dirs: Vec<String>,
    hidden_allow: Vec<String>,
}

impl Default for WalkPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_SKIP_DIRS.iter().map(|s| (*s).to_string()).collect(),
            DEFAULT_HIDDEN_ALLOW
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        )
    }
}

impl WalkPolicy {
    pub fn new(skip_dirs: Vec<String>, hidden_allow: Vec<String>) -> Self {
        Self {
            skip_dirs,
            hidden_allow,
        }
    }

    pub fn skip_dirs(&self) -> &[String] {
        &self.skip_dirs
    }

    pub fn hidden_allow(&self) -> &[String] {
        &self.hidden_allow
    }

    fn is_skip_listed(&self, name: &str) -> bool {
        self.skip_dirs.iter().any(|s| s == name)
    }

    fn is_pruned_hidden(&self, name: &str) -> bool {
        name.starts_with('.') && !self.hidden_allow.iter().any(|s| s == name)
    }
}

/// One reported cleanup candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundDependency {
    /// Parent of the matched directory.
    pub project_path: PathBuf,
    pub dependency_path: PathBuf,
    pub ecosystem: String,
    pub size_bytes: u64,
    pub last_modified: SystemTime,
    pub days_since: u64,
}

/// Why a subtree was pruned without being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneReason {
    Hidden,
    SkipListed,
}

/// Per-directory verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkDecision {
    PruneSilent(PruneReason),
    PruneDepth,
    MatchAccepted,
    MatchRejected(RejectReason),
    Descend,
}

impl WalkDecision {
    /// Whether the walker continues into this directory's children.
    #[must_use]
    pub const fn descends(self) -> bool {
        matches!(self, Self::Descend)
    }
}

/// What the observer sees for each visited directory.
#[derive(Debug, Clone, Copy)]
pub struct VisitRecord<'a> {
    pub path: &'a Path,
    pub depth: usize,
    pub decision: WalkDecision,
    /// Ecosystem of the matching rule, for `Match*` decisions.
    pub ecosystem: Option<&'a str>,
}

/// Walk counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub directories_visited: usize,
    pub matches_accepted: usize,
    pub rejected_too_recent: usize,
    pub rejected_below_min_size: usize,
    pub pruned_silent: usize,
    pub pruned_depth: usize,
    pub unreadable_directories: usize,
}

impl ScanStats {
    fn record(&mut self, decision: WalkDecision) {
        self.directories_visited += 1;
        match decision {
            WalkDecision::PruneSilent(_) => self.pruned_silent += 1,
            WalkDecision::PruneDepth => self.pruned_depth += 1,
            WalkDecision::MatchAccepted => self.matches_accepted += 1,
            WalkDecision::MatchRejected(RejectReason::TooRecent) => {
                self.rejected_too_recent += 1;
            }
            WalkDecision::MatchRejected(RejectReason::BelowMinSize) => {
                self.rejected_below_min_size += 1;
            }
            WalkDecision::Descend => {}
        }
    }
}

/// Result of one scan, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    pub found: Vec<FoundDependency>,
    pub stats: ScanStats,
    /// The walk stopped early on a cancellation request.
    pub cancelled: bool,
}

impl ScanOutcome {
    pub fn total_bytes(&self) -> u64 {
        self.found.iter().map(|f| f.size_bytes).sum()
    }
}

struct Verdict<'r> {
    decision: WalkDecision,
    rule: Option<&'r EcosystemRule>,
    found: Option<FoundDependency>,
}

impl Verdict<'_> {
    const fn bare(decision: WalkDecision) -> Self {
        Self {
            decision,
            rule: None,
            found: None,
        }
    }
}

/// The dependency-directory scanner.
#[derive(Debug, Clone, Default)]
pub struct DependencyScanner {
    rules: EcosystemRuleTable,
    policy: WalkPolicy,
    cancel: Option<CancellationToken>,
}

impl DependencyScanner {
    pub fn new(rules: EcosystemRuleTable, policy: WalkPolicy) -> Self {
        Self {
            rules,
            policy,
            cancel: None,
        }
    }

    /// Stop at the next directory boundary once `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn rules(&self) -> &EcosystemRuleTable {
        &self.rules
    }

    pub fn policy(&self) -> &WalkPolicy {
        &self.policy
    }

    /// Walk `config.root` and collect accepted matches.
    pub fn scan(&self, config: &ScanConfig) -> ScanOutcome {
        self.scan_with(config, |_| {})
    }

    /// Like [`scan`](Self::scan), reporting every visited directory to `observer`.
    pub fn scan_with<F>(&self, config: &ScanConfig, mut observer: F) -> ScanOutcome
    where
        F: FnMut(&VisitRecord<'_>),
    {
        let mut outcome = ScanOutcome::default();
        match fs::metadata(&config.root) {
            Ok(meta) if meta.is_dir() => {}
            _ => return outcome,
        }

        let filter = config.filter();
        let mut stack = vec![config.root.clone()];

        while let Some(dir) = stack.pop() {
            if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                outcome.cancelled = true;
                break;
            }

            let depth = relative_depth(&config.root, &dir);
            let verdict = self.decide(&dir, depth, config, &filter);
            outcome.stats.record(verdict.decision);
            observer(&VisitRecord {
                path: &dir,
                depth,
                decision: verdict.decision,
                ecosystem: verdict.rule.map(|r| r.name.as_str()),
            });

            if let Some(found) = verdict.found {
                outcome.found.push(found);
            }
            if !verdict.decision.descends() {
                continue;
            }

            match child_directories(&dir) {
                // Reverse so the lexically first child is popped first.
                Ok(children) => stack.extend(children.into_iter().rev()),
                Err(_) => outcome.stats.unreadable_directories += 1,
            }
        }

        outcome
    }

    fn decide(
        &self,
        dir: &Path,
        depth: usize,
        config: &ScanConfig,
        filter: &FilterPipeline,
    ) -> Verdict<'_> {
        if depth > config.max_depth {
            return Verdict::bare(WalkDecision::PruneDepth);
        }

        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        // The root is walked even when its own name is dot-prefixed.
        if dir != config.root && self.policy.is_pruned_hidden(&name) {
            return Verdict::bare(WalkDecision::PruneSilent(PruneReason::Hidden));
        }

        if let Some(matched) = self.rules.classify(&name, dir) {
            let rule = Some(matched.rule);
            return match filter.evaluate(dir) {
                FilterVerdict::Reject(reason) => Verdict {
                    decision: WalkDecision::MatchRejected(reason),
                    rule,
                    found: None,
                },
                FilterVerdict::Accept {
                    size_bytes,
                    last_modified,
                } => Verdict {
                    decision: WalkDecision::MatchAccepted,
                    rule,
                    found: Some(FoundDependency {
                        project_path: matched.project_root,
                        dependency_path: dir.to_path_buf(),
                        ecosystem: matched.rule.name.clone(),
                        size_bytes,
                        last_modified,
                        days_since: days_between(last_modified, config.reference_time),
                    }),
                },
            };
        }

        if self.policy.is_skip_listed(&name) {
            return Verdict::bare(WalkDecision::PruneSilent(PruneReason::SkipListed));
        }

        Verdict::bare(WalkDecision::Descend)
    }
}

/// Number of separators in the root-relative path: the root and its direct
/// children are both depth 0.
pub fn relative_depth(root: &Path, path: &Path) -> usize {
    path.strip_prefix(root)
        .map_or(0, |rel| rel.components().count().saturating_sub(1))
}

/// Child directories of `dir`, sorted by name. Symlinks are not followed.
fn child_directories(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut children: Vec<PathBuf> = fs::read_dir(dir)?
        .flatten()
        .filter(|entry| entry.file_type().is_ok_and(|ft| ft.is_dir()))
        .map(|entry| entry.path())
        .collect();
    children.sort();
    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{FileTime, set_file_mtime};
    use std::time::Duration;
    use tempfile::TempDir;

    fn age_tree(path: &Path, days: u64) {
        let when =
            FileTime::from_system_time(SystemTime::now() - Duration::from_secs(days * 86_400));
        let mut stack = vec![path.to_path_buf()];
        while let Some(p) = stack.pop() {
            if p.is_dir() {
                for entry in fs::read_dir(&p).unwrap().flatten() {
                    stack.push(entry.path());
                }
            }
            set_file_mtime(&p, when).unwrap();
        }
    }

    fn trace(scanner: &DependencyScanner, config: &ScanConfig) -> Vec<(PathBuf, WalkDecision)> {
        let mut visits = Vec::new();
        scanner.scan_with(config, |v| visits.push((v.path.to_path_buf(), v.decision)));
        visits
    }

    fn decision_for(visits: &[(PathBuf, WalkDecision)], path: &Path) -> Option<WalkDecision> {
        visits.iter().find(|(p, _)| p == path).map(|(_, d)| *d)
    }

    #[test]
    fn relative_depth_counts_separators() {
        let root = Path::new("/r");
        assert_eq!(relative_depth(root, Path::new("/r")), 0);
        assert_eq!(relative_depth(root, Path::new("/r/a")), 0);
        assert_eq!(relative_depth(root, Path::new("/r/a/b")), 1);
        assert_eq!(relative_depth(root, Path::new("/r/a/b/c/d")), 3);
    }

    #[test]
    fn reports_old_node_modules() {
        let tmp = TempDir::new().unwrap();
        let project = tmp.path().join("app");
        fs::create_dir_all(project.join("node_modules").join("lodash")).unwrap();
        fs::write(project.join("package.json"), "{}").unwrap();
        fs::write(
            project.join("node_modules").join("lodash").join("index.js"),
            vec![0u8; 512],
        )
        .unwrap();
        age_tree(&project.join("node_modules"), 45);

        let outcome = DependencyScanner::default().scan(&ScanConfig::new(tmp.path()));
        assert_eq!(outcome.found.len(), 1);
        let dep = &outcome.found[0];
        assert_eq!(dep.ecosystem, "Node.js");
        assert_eq!(dep.project_path, project);
        assert_eq!(dep.dependency_path, project.join("node_modules"));
        assert_eq!(dep.size_bytes, 512);
        assert!((44..=45).contains(&dep.days_since));
        assert_eq!(outcome.total_bytes(), 512);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_sibling_does_not_abort_the_walk() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let project = tmp.path().join("app");
        fs::create_dir_all(project.join("node_modules").join("pkg")).unwrap();
        fs::write(project.join("package.json"), "{}").unwrap();
        fs::write(project.join("node_modules").join("pkg").join("i.js"), vec![0u8; 128]).unwrap();
        let locked = tmp.path().join("locked");
        fs::create_dir_all(locked.join("inner")).unwrap();
        age_tree(tmp.path(), 60);

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        // Running as root: permissions are not enforced.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let outcome = DependencyScanner::default().scan(&ScanConfig::new(tmp.path()));
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(outcome.found.len(), 1);
        assert_eq!(outcome.found[0].dependency_path, project.join("node_modules"));
        assert_eq!(outcome.found[0].size_bytes, 128);
        assert_eq!(outcome.stats.unreadable_directories, 1);
        assert!(!outcome.cancelled);
    }

    #[test]
    fn hidden_directories_are_pruned_unless_allowed() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(".cache").join("app").join("node_modules")).unwrap();
        fs::create_dir_all(tmp.path().join(".venv")).unwrap();
        age_tree(tmp.path(), 60);

        let scanner = DependencyScanner::default();
        let visits = trace(&scanner, &ScanConfig::new(tmp.path()));

        assert_eq!(
            decision_for(&visits, &tmp.path().join(".cache")),
            Some(WalkDecision::PruneSilent(PruneReason::Hidden))
        );
        assert!(
            !visits
                .iter()
                .any(|(p, _)| p.starts_with(tmp.path().join(".cache").join("app")))
        );
        // .venv is allowed past the hidden rule; no requirements.txt, so it
        // falls through to the skip list.
        assert_eq!(
            decision_for(&visits, &tmp.path().join(".venv")),
            Some(WalkDecision::PruneSilent(PruneReason::SkipListed))
        );
    }

    #[test]
    fn hidden_root_is_still_walked() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join(".projects");
        fs::create_dir_all(root.join("app").join("node_modules")).unwrap();
        age_tree(&root, 60);

        let outcome = DependencyScanner::default().scan(&ScanConfig::new(&root));
        assert_eq!(outcome.found.len(), 1);
    }

    #[test]
    fn depth_limit_prunes_deep_directories() {
        let tmp = TempDir::new().unwrap();
        // depth of a/b/node_modules is 2
        fs::create_dir_all(tmp.path().join("a").join("b").join("node_modules")).unwrap();
        age_tree(tmp.path(), 60);

        let shallow = ScanConfig::new(tmp.path()).with_max_depth(1);
        let scanner = DependencyScanner::default();
        let visits = trace(&scanner, &shallow);
        assert_eq!(
            decision_for(&visits, &tmp.path().join("a").join("b").join("node_modules")),
            Some(WalkDecision::PruneDepth)
        );
        assert!(scanner.scan(&shallow).found.is_empty());

        let deep = ScanConfig::new(tmp.path()).with_max_depth(2);
        assert_eq!(scanner.scan(&deep).found.len(), 1);
    }

    #[test]
    fn max_depth_zero_still_sees_direct_children() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("node_modules")).unwrap();
        fs::create_dir_all(tmp.path().join("app").join("node_modules")).unwrap();
        age_tree(tmp.path(), 60);

        let config = ScanConfig::new(tmp.path()).with_max_depth(0);
        let outcome = DependencyScanner::default().scan(&config);
        let paths: Vec<_> = outcome.found.iter().map(|f| f.dependency_path.clone()).collect();
        assert_eq!(paths, vec![tmp.path().join("node_modules")]);
    }

    #[test]
    fn rejected_match_prunes_subtree() {
        let tmp = TempDir::new().unwrap();
        let nm = tmp.path().join("app").join("node_modules");
        let nested = nm.join("pkg").join("node_modules");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nm.join("pkg").join("index.js"), b"x").unwrap();
        // Outer tree is fresh: rejected by recency.
        let scanner = DependencyScanner::default();
        let visits = trace(&scanner, &ScanConfig::new(tmp.path()));

        assert_eq!(
            decision_for(&visits, &nm),
            Some(WalkDecision::MatchRejected(RejectReason::TooRecent))
        );
        assert!(!visits.iter().any(|(p, _)| p.starts_with(&nm) && p != &nm));
    }

    #[test]
    fn skip_listed_names_are_not_descended() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(".git").join("objects")).unwrap();
        fs::create_dir_all(tmp.path().join("vendor").join("lib").join("node_modules")).unwrap();
        age_tree(tmp.path(), 60);

        let scanner = DependencyScanner::default();
        let visits = trace(&scanner, &ScanConfig::new(tmp.path()));
        assert_eq!(
            decision_for(&visits, &tmp.path().join("vendor")),
            Some(WalkDecision::PruneSilent(PruneReason::SkipListed))
        );
        assert!(scanner.scan(&ScanConfig::new(tmp.path())).found.is_empty());
    }

    #[test]
    fn custom_policy_controls_pruning() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("vendor").join("lib").join("node_modules")).unwrap();
        age_tree(tmp.path(), 60);

        let scanner =
            DependencyScanner::new(EcosystemRuleTable::builtin(), WalkPolicy::new(vec![], vec![]));
        let outcome = scanner.scan(&ScanConfig::new(tmp.path()));
        assert_eq!(outcome.found.len(), 1);
        assert_eq!(
            outcome.found[0].dependency_path,
            tmp.path().join("vendor").join("lib").join("node_modules")
        );
    }

    #[test]
    fn results_follow_lexical_discovery_order() {
        let tmp = TempDir::new().unwrap();
        for name in ["zeta", "alpha", "mid"] {
            fs::create_dir_all(tmp.path().join(name).join("node_modules")).unwrap();
        }
        age_tree(tmp.path(), 60);

        let outcome = DependencyScanner::default().scan(&ScanConfig::new(tmp.path()));
        let projects: Vec<_> = outcome
            .found
            .iter()
            .map(|f| f.project_path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(projects, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn missing_root_yields_empty_outcome() {
        let outcome = DependencyScanner::default()
            .scan(&ScanConfig::new("/definitely/does/not/exist/dc"));
        assert!(outcome.found.is_empty());
        assert_eq!(outcome.stats.directories_visited, 0);
    }

    #[test]
    fn cancelled_token_stops_before_first_visit() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("app").join("node_modules")).unwrap();
        age_tree(tmp.path(), 60);

        let token = CancellationToken::new();
        token.cancel();
        let outcome = DependencyScanner::default()
            .with_cancellation(token)
            .scan(&ScanConfig::new(tmp.path()));
        assert!(outcome.cancelled);
        assert!(outcome.found.is_empty());
        assert_eq!(outcome.stats.directories_visited, 0);
    }

    #[test]
    fn cancellation_mid_walk_keeps_earlier_results() {
        let tmp = TempDir::new().unwrap();
        for name in ["a", "b", "c"] {
            fs::create_dir_all(tmp.path().join(name).join("node_modules")).unwrap();
        }
        age_tree(tmp.path(), 60);

        let token = CancellationToken::new();
        let scanner = DependencyScanner::default().with_cancellation(token.clone());
        let outcome = scanner.scan_with(&ScanConfig::new(tmp.path()), |v| {
            if v.decision == WalkDecision::MatchAccepted {
                token.cancel();
            }
        });
        assert!(outcome.cancelled);
        assert_eq!(outcome.found.len(), 1);
        assert_eq!(outcome.found[0].project_path, tmp.path().join("a"));
    }

    #[test]
    fn stats_count_decisions() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("old").join("node_modules")).unwrap();
        fs::create_dir_all(tmp.path().join(".hidden")).unwrap();
        age_tree(tmp.path(), 60);
        fs::create_dir_all(tmp.path().join("fresh").join("node_modules")).unwrap();

        let outcome = DependencyScanner::default().scan(&ScanConfig::new(tmp.path()));
        assert_eq!(outcome.stats.matches_accepted, 1);
        assert_eq!(outcome.stats.rejected_too_recent, 1);
        assert_eq!(outcome.stats.pruned_silent, 1);
        // root, .hidden, fresh, fresh/node_modules, old, old/node_modules
        assert_eq!(outcome.stats.directories_visited, 6);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_followed() {
        let tmp = TempDir::new().unwrap();
        let real = tmp.path().join("real");
        let root = tmp.path().join("root");
        fs::create_dir_all(real.join("node_modules")).unwrap();
        fs::create_dir_all(&root).unwrap();
        std::os::unix::fs::symlink(&real, root.join("link")).unwrap();
        age_tree(&real, 60);

        let outcome = DependencyScanner::default().scan(&ScanConfig::new(&root));
        assert!(outcome.found.is_empty());
    }
}
