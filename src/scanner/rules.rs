//! Ecosystem rule table: ordered folder-name classification with indicator-file
//! disambiguation.
//!
//! The table is an ordered sequence on purpose. Folder names such as `vendor`
//! (Go, PHP) and `target` (Maven, Rust) belong to several ecosystems, and the
//! first rule whose indicator file is present in the parent directory wins.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One classification entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcosystemRule {
    /// Ecosystem label shown in reports (e.g. `Node.js`).
    pub name: String,
    /// Folder names to look for, in priority order. Entries containing `/`
    /// are compound relative paths matched against the trailing components.
    pub candidate_names: Vec<String>,
    /// File expected in the project root. Empty or wildcard means "no check".
    #[serde(default)]
    pub indicator_file: String,
    #[serde(default)]
    pub description: String,
}

impl EcosystemRule {
    pub fn new(
        name: &str,
        candidate_names: &[&str],
        indicator_file: &str,
        description: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            candidate_names: candidate_names.iter().map(|s| (*s).to_string()).collect(),
            indicator_file: indicator_file.to_string(),
            description: description.to_string(),
        }
    }

    /// Whether the indicator file has to be checked at all.
    #[must_use]
    pub fn requires_indicator(&self) -> bool {
        !self.indicator_file.is_empty() && !self.indicator_file.contains('*')
    }

    /// First candidate name matching this directory, if any.
    fn matching_candidate(&self, dir_name: &str, dir_path: &Path) -> Option<&str> {
        self.candidate_names
            .iter()
            .map(String::as_str)
            .find(|candidate| candidate_matches(candidate, dir_name, dir_path))
    }
}

fn candidate_matches(candidate: &str, dir_name: &str, dir_path: &Path) -> bool {
    if candidate == dir_name {
        return true;
    }
    candidate.contains('/') && dir_path.ends_with(Path::new(candidate))
}

/// A successful classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch<'a> {
    pub rule: &'a EcosystemRule,
    /// The candidate name that matched.
    pub candidate: &'a str,
    /// Immediate parent of the matched directory. For compound candidates
    /// such as `vendor/bundle` this is `vendor`, not the project above it.
    pub project_root: PathBuf,
}

/// Ordered, immutable rule table plus the indicator-exempt allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcosystemRuleTable {
    rules: Vec<EcosystemRule>,
    indicator_exempt: Vec<String>,
}

impl Default for EcosystemRuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl EcosystemRuleTable {
    /// Build a table from explicit rules and exempt names.
    pub fn new(rules: Vec<EcosystemRule>, indicator_exempt: Vec<String>) -> Self {
        Self {
            rules,
            indicator_exempt,
        }
    }

    /// The built-in ecosystems in priority order.
    pub fn builtin() -> Self {
        Self::new(
            builtin_rules(),
            DEFAULT_INDICATOR_EXEMPT
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        )
    }

    /// Append extra rules after the existing ones (lower priority).
    #[must_use]
    pub fn with_custom(mut self, extra: Vec<EcosystemRule>) -> Self {
        self.rules.extend(extra);
        self
    }

    /// Replace the indicator-exempt allow-list.
    #[must_use]
    pub fn with_indicator_exempt(mut self, names: Vec<String>) -> Self {
        self.indicator_exempt = names;
        self
    }

    pub fn rules(&self) -> &[EcosystemRule] {
        &self.rules
    }

    pub fn indicator_exempt(&self) -> &[String] {
        &self.indicator_exempt
    }

    fn is_indicator_exempt(&self, candidate: &str) -> bool {
        self.indicator_exempt.iter().any(|n| n == candidate)
    }

    /// Classify one directory.
    ///
    /// Rules are tried in table order. A rule whose candidate matches but whose
    /// indicator is absent (and the candidate is not exempt) is rejected, and
    /// the search moves on to the next rule, not to the next candidate name.
    ///
    /// Compound candidates (`vendor/bundle`) match whole trailing path
    /// components, so `myvendor/bundle` is not a match. This is stricter than
    /// a raw string-suffix test and is intentional.
    pub fn classify(&self, dir_name: &str, dir_path: &Path) -> Option<RuleMatch<'_>> {
        for rule in &self.rules {
            let Some(candidate) = rule.matching_candidate(dir_name, dir_path) else {
                continue;
            };
            let project_root = dir_path
                .parent()
                .map_or_else(|| dir_path.to_path_buf(), Path::to_path_buf);

            if rule.requires_indicator()
                && !self.is_indicator_exempt(candidate)
                && !indicator_present(&project_root, &rule.indicator_file)
            {
                continue;
            }

            return Some(RuleMatch {
                rule,
                candidate,
                project_root,
            });
        }
        None
    }
}

/// An indicator counts as present unless the lookup reports `NotFound`.
///
/// Other stat failures (permission denied, for instance) keep the rule.
fn indicator_present(project_root: &Path, indicator: &str) -> bool {
    match std::fs::metadata(project_root.join(indicator)) {
        Ok(_) => true,
        Err(err) => err.kind() != std::io::ErrorKind::NotFound,
    }
}

/// Candidate names accepted without their ecosystem's indicator file.
pub const DEFAULT_INDICATOR_EXEMPT: &[&str] = &["node_modules", "__pycache__"];

fn builtin_rules() -> Vec<EcosystemRule> {
    vec![
        EcosystemRule::new(
            "Node.js",
            &["node_modules"],
            "package.json",
            "npm/yarn/pnpm packages",
        ),
        EcosystemRule::new(
            "Python venv",
            &["venv", ".venv", "env", ".env", "__pycache__"],
            "requirements.txt",
            "Python virtual environments and byte-code caches",
        ),
        EcosystemRule::new("Go", &["vendor"], "go.mod", "Go vendored modules"),
        EcosystemRule::new(
            "Gradle",
            &[".gradle", "build"],
            "build.gradle",
            "Gradle caches and build outputs",
        ),
        EcosystemRule::new("Maven", &["target"], "pom.xml", "Maven build outputs"),
        EcosystemRule::new("Rust", &["target"], "Cargo.toml", "Cargo build outputs"),
        EcosystemRule::new(
            "Ruby",
            &["vendor/bundle", ".bundle"],
            "Gemfile",
            "Bundler packages",
        ),
        EcosystemRule::new("PHP", &["vendor"], "composer.json", "Composer packages"),
        EcosystemRule::new(
            ".NET",
            &["bin", "obj", "packages"],
            "*.csproj",
            ".NET build outputs and packages",
        ),
        EcosystemRule::new(
            "iOS/macOS",
            &["Pods", "DerivedData"],
            "Podfile",
            "CocoaPods and Xcode build data",
        ),
    ]
}
