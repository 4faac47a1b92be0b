//! Configuration system: optional TOML file, env var overrides, built-in defaults.
//!
//! Precedence, highest first: command-line flags (applied by the CLI),
//! `DEPCLEAN_*` environment variables, the config file, defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{DcError, Result};
use crate::core::paths::home_dir;
use crate::core::units::parse_size;
use crate::scanner::rules::{DEFAULT_INDICATOR_EXEMPT, EcosystemRule, EcosystemRuleTable};
use crate::scanner::walker::{
    DEFAULT_HIDDEN_ALLOW, DEFAULT_MAX_DEPTH, DEFAULT_RECENCY_DAYS, DEFAULT_SKIP_DIRS, WalkPolicy,
};

/// Full depclean configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub scan: ScanSection,
    pub walk: WalkSection,
    /// Extra rules, tried after every built-in rule.
    pub rules: Vec<EcosystemRule>,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScanSection {
    pub root: PathBuf,
    pub max_depth: usize,
    pub days: u64,
    /// Human size string such as `100MB`; parsed permissively.
    pub min_size: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WalkSection {
    pub skip_dirs: Vec<String>,
    pub hidden_allow: Vec<String>,
    pub indicator_exempt: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub activity_log: Option<PathBuf>,
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            max_depth: DEFAULT_MAX_DEPTH,
            days: DEFAULT_RECENCY_DAYS,
            min_size: "0".to_string(),
        }
    }
}

impl Default for WalkSection {
    fn default() -> Self {
        Self {
            skip_dirs: owned(DEFAULT_SKIP_DIRS),
            hidden_allow: owned(DEFAULT_HIDDEN_ALLOW),
            indicator_exempt: owned(DEFAULT_INDICATOR_EXEMPT),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let base = home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            config_file: base.join(".config").join("depclean").join("config.toml"),
            activity_log: None,
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// A missing file at the default path yields defaults; a missing explicit
    /// path is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, env_var)
    }

    /// [`load`](Self::load) with an injectable environment lookup.
    pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|e| DcError::io(&path_buf, e))?;
            toml::from_str::<Self>(&raw)?
        } else if path.is_some() {
            return Err(DcError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(lookup)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("DEPCLEAN_ROOT") {
            self.scan.root = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("DEPCLEAN_MAX_DEPTH") {
            self.scan.max_depth = parse_env("DEPCLEAN_MAX_DEPTH", &raw)?;
        }
        if let Some(raw) = lookup("DEPCLEAN_DAYS") {
            self.scan.days = parse_env("DEPCLEAN_DAYS", &raw)?;
        }
        if let Some(raw) = lookup("DEPCLEAN_MIN_SIZE") {
            self.scan.min_size = raw;
        }
        if let Some(raw) = lookup("DEPCLEAN_ACTIVITY_LOG") {
            self.paths.activity_log = Some(PathBuf::from(raw));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for (i, rule) in self.rules.iter().enumerate() {
            if rule.name.trim().is_empty() {
                return Err(invalid(format!("rules[{i}].name must not be empty")));
            }
            if rule.candidate_names.is_empty() {
                return Err(invalid(format!(
                    "rules[{i}] ({}) needs at least one candidate name",
                    rule.name
                )));
            }
            for candidate in &rule.candidate_names {
                validate_candidate(&rule.name, candidate)?;
            }
        }

        for (section, names) in [
            ("walk.skip_dirs", &self.walk.skip_dirs),
            ("walk.hidden_allow", &self.walk.hidden_allow),
            ("walk.indicator_exempt", &self.walk.indicator_exempt),
        ] {
            if names.iter().any(|n| n.trim().is_empty()) {
                return Err(invalid(format!("{section} contains an empty name")));
            }
        }
        Ok(())
    }

    /// Built-in rules followed by the configured extras.
    pub fn rule_table(&self) -> EcosystemRuleTable {
        EcosystemRuleTable::builtin()
            .with_custom(self.rules.clone())
            .with_indicator_exempt(self.walk.indicator_exempt.clone())
    }

    pub fn walk_policy(&self) -> WalkPolicy {
        WalkPolicy::new(self.walk.skip_dirs.clone(), self.walk.hidden_allow.clone())
    }

    pub fn min_size_bytes(&self) -> u64 {
        parse_size(&self.scan.min_size)
    }
}

fn validate_candidate(rule: &str, candidate: &str) -> Result<()> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return Err(invalid(format!("rule {rule}: empty candidate name")));
    }
    if trimmed.starts_with('/') {
        return Err(invalid(format!(
            "rule {rule}: candidate {candidate:?} must be relative"
        )));
    }
    if trimmed.split('/').any(|seg| seg == "..") {
        return Err(invalid(format!(
            "rule {rule}: candidate {candidate:?} must not contain '..'"
        )));
    }
    Ok(())
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

fn invalid(details: String) -> DcError {
    DcError::InvalidConfig { details }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|error| DcError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}
