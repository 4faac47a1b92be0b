//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use depclean::core::config::Config;
use depclean::core::errors::DcError;
use depclean::core::paths::{expand_home, home_dir, resolve_absolute_path};
use depclean::core::signals::CancellationToken;
use depclean::core::units::{format_bytes, is_well_formed_size, parse_size};
use depclean::logger::activity::{ActivityEvent, ActivityLogger};
use depclean::scanner::deletion::{
    AutoConfirm, Confirm, DeletionConfig, DeletionExecutor, DeletionReport, PromptConfirm,
};
use depclean::scanner::report::{DELETED_PATH_WIDTH, ReportFormatter};
use depclean::scanner::rules::EcosystemRuleTable;
use depclean::scanner::walker::{DependencyScanner, ScanConfig, ScanOutcome};

/// depclean: find and remove stale project dependency directories.
#[derive(Debug, Parser)]
#[command(
    name = "depclean",
    author,
    version,
    about = "Find and remove stale project dependency directories",
    long_about = None
)]
pub struct Cli {
    /// Directory to scan (default: current directory).
    #[arg(long, value_name = "PATH")]
    path: Option<String>,
    /// Maximum walk depth.
    #[arg(long, value_name = "N")]
    depth: Option<usize>,
    /// Only report directories untouched for at least N days.
    #[arg(long, value_name = "N")]
    days: Option<u64>,
    /// Minimum size filter, e.g. 100MB or 1.5GB.
    #[arg(long, value_name = "SIZE")]
    min_size: Option<String>,
    /// Analyze only; never delete.
    #[arg(long)]
    dry_run: bool,
    /// Delete without asking for confirmation.
    #[arg(short, long)]
    yes: bool,
    /// Force JSON output mode.
    #[arg(long)]
    json: bool,
    /// Disable colored output.
    #[arg(long)]
    no_color: bool,
    /// Override config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Append JSONL activity records to this file.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
    /// Print the effective ecosystem rule table and exit.
    #[arg(long)]
    list_rules: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input or configuration.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Some deletions failed.
    #[error("{0}")]
    Partial(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Json(_) => 3,
            Self::Partial(_) => 4,
        }
    }
}

impl From<DcError> for CliError {
    fn from(err: DcError) -> Self {
        match err {
            DcError::InvalidConfig { .. }
            | DcError::MissingConfig { .. }
            | DcError::ConfigParse { .. }
            | DcError::InvalidRoot { .. } => Self::User(err.to_string()),
            _ => Self::Runtime(err.to_string()),
        }
    }
}

/// Effective scan parameters after CLI > env > file > default resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    root: PathBuf,
    max_depth: usize,
    days: u64,
    min_size: String,
    activity_log: Option<PathBuf>,
}

impl Settings {
    fn resolve(cli: &Cli, config: &Config) -> Self {
        let raw_root = cli
            .path
            .clone()
            .unwrap_or_else(|| config.scan.root.to_string_lossy().into_owned());
        Self {
            root: resolve_absolute_path(&expand_home(&raw_root)),
            max_depth: cli.depth.unwrap_or(config.scan.max_depth),
            days: cli.days.unwrap_or(config.scan.days),
            min_size: cli
                .min_size
                .clone()
                .unwrap_or_else(|| config.scan.min_size.clone()),
            activity_log: cli
                .log_file
                .clone()
                .or_else(|| config.paths.activity_log.clone()),
        }
    }

    fn min_size_bytes(&self) -> u64 {
        parse_size(&self.min_size)
    }

    fn validate_root(&self) -> Result<(), CliError> {
        match std::fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(DcError::InvalidRoot {
                path: self.root.clone(),
                reason: "not a directory".to_string(),
            }
            .into()),
            Err(e) => Err(DcError::InvalidRoot {
                path: self.root.clone(),
                reason: e.to_string(),
            }
            .into()),
        }
    }
}

/// Run one depclean invocation.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    let config = Config::load(cli.config.as_deref())?;
    let mode = output_mode(cli);

    if cli.list_rules {
        return list_rules(&config.rule_table(), mode);
    }

    let settings = Settings::resolve(cli, &config);
    settings.validate_root()?;
    if !is_well_formed_size(&settings.min_size) {
        eprintln!(
            "{}",
            format!(
                "warning: --min-size {:?} is not a valid size; using {}",
                settings.min_size,
                format_bytes(settings.min_size_bytes())
            )
            .yellow()
        );
    }

    let logger = settings
        .activity_log
        .as_deref()
        .map_or_else(ActivityLogger::disabled, ActivityLogger::open);

    let token = CancellationToken::new();
    token.register_interrupts();
    let scanner = DependencyScanner::new(config.rule_table(), config.walk_policy())
        .with_cancellation(token.clone());
    let scan_config = ScanConfig::new(&settings.root)
        .with_max_depth(settings.max_depth)
        .with_recency_days(settings.days)
        .with_min_size(settings.min_size_bytes());

    if mode == OutputMode::Human {
        print_banner(cli, &settings);
    }

    let outcome = run_scan(&scanner, &scan_config, &settings, &logger);
    // The walk was the only cooperative phase: Ctrl-C from here on (prompt,
    // deletion) ends the process.
    token.terminate_on_interrupt();
    let result = match mode {
        OutputMode::Human => report_human(cli, &settings, &outcome, &logger, &token),
        OutputMode::Json => report_json(cli, &settings, &outcome, &logger, &token),
    };
    logger.flush();
    result
}

fn run_scan(
    scanner: &DependencyScanner,
    scan_config: &ScanConfig,
    settings: &Settings,
    logger: &ActivityLogger,
) -> ScanOutcome {
    logger.log(&ActivityEvent::ScanStarted {
        root: settings.root.display().to_string(),
        max_depth: settings.max_depth,
        days: settings.days,
        min_size_bytes: scan_config.min_size_bytes,
    });

    let start = Instant::now();
    let outcome = scanner.scan(scan_config);

    for dep in &outcome.found {
        logger.log(&ActivityEvent::DependencyFound {
            path: dep.dependency_path.display().to_string(),
            project: dep.project_path.display().to_string(),
            ecosystem: dep.ecosystem.clone(),
            size_bytes: dep.size_bytes,
            days_since: dep.days_since,
        });
    }

    if outcome.cancelled {
        logger.log(&ActivityEvent::ScanCancelled {
            found: outcome.found.len(),
            directories_visited: outcome.stats.directories_visited,
        });
    } else {
        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = start.elapsed().as_millis() as u64;
        logger.log(&ActivityEvent::ScanCompleted {
            found: outcome.found.len(),
            total_bytes: outcome.total_bytes(),
            directories_visited: outcome.stats.directories_visited,
            duration_ms,
        });
    }
    outcome
}

fn report_human(
    cli: &Cli,
    settings: &Settings,
    outcome: &ScanOutcome,
    logger: &ActivityLogger,
    token: &CancellationToken,
) -> Result<(), CliError> {
    if outcome.cancelled {
        warn("Scan interrupted; results are partial");
    }
    if outcome.found.is_empty() {
        if outcome.cancelled {
            return Err(interrupted());
        }
        success(&format!(
            "No dependencies untouched for {}+ days",
            settings.days
        ));
        return Ok(());
    }

    let formatter = ReportFormatter::new(home_dir());
    println!("Stale dependencies found:");
    print!("{}", formatter.render_table(&outcome.found));
    println!();

    if outcome.cancelled {
        return Err(interrupted());
    }
    if cli.dry_run {
        info("Remove --dry-run to actually delete them");
        return Ok(());
    }

    let mut confirm: Box<dyn Confirm> = if cli.yes {
        Box::new(AutoConfirm(true))
    } else {
        Box::new(PromptConfirm::stdio())
    };
    let executor =
        DeletionExecutor::new(DeletionConfig::default(), logger).with_cancellation(token.clone());
    let report = executor.execute(&outcome.found, confirm.as_mut());

    if !report.confirmed {
        info("Cancelled");
        return Ok(());
    }

    println!();
    for dep in &outcome.found {
        let shown = formatter.shorten(&dep.dependency_path, DELETED_PATH_WIDTH);
        if report.deleted.contains(&dep.dependency_path) {
            success(&format!(
                "Deleted: {shown} ({})",
                format_bytes(dep.size_bytes)
            ));
        } else if let Some(err) = report.errors.iter().find(|e| e.path == dep.dependency_path) {
            error(&format!(
                "Delete failed: {} - {}",
                dep.dependency_path.display(),
                err.error
            ));
        } else if !report.cancelled {
            info(&format!("Already gone: {shown}"));
        }
    }
    println!();
    success(&format!(
        "Done: {} deleted, {} freed",
        report.items_deleted,
        format_bytes(report.bytes_freed)
    ));

    if report.cancelled {
        return Err(deletion_interrupted(&report, outcome.found.len()));
    }
    partial_failure(&report, outcome.found.len())
}

fn report_json(
    cli: &Cli,
    settings: &Settings,
    outcome: &ScanOutcome,
    logger: &ActivityLogger,
    token: &CancellationToken,
) -> Result<(), CliError> {
    let formatter = ReportFormatter::new(home_dir());
    let scan = formatter.to_json(&settings.root, &outcome.found, outcome.cancelled);

    // JSON mode never prompts: deletion needs --yes.
    let deletion = if cli.dry_run || outcome.cancelled {
        None
    } else {
        let executor = DeletionExecutor::new(DeletionConfig::default(), logger)
            .with_cancellation(token.clone());
        Some(executor.execute(&outcome.found, &mut AutoConfirm(cli.yes)))
    };

    let payload = json!({
        "command": "scan",
        "dry_run": cli.dry_run,
        "days": settings.days,
        "max_depth": settings.max_depth,
        "min_size_bytes": settings.min_size_bytes(),
        "scan": scan,
        "stats": {
            "directories_visited": outcome.stats.directories_visited,
            "matches_accepted": outcome.stats.matches_accepted,
            "rejected_too_recent": outcome.stats.rejected_too_recent,
            "rejected_below_min_size": outcome.stats.rejected_below_min_size,
            "pruned_silent": outcome.stats.pruned_silent,
            "pruned_depth": outcome.stats.pruned_depth,
            "unreadable_directories": outcome.stats.unreadable_directories,
        },
        "deletion": deletion.as_ref().map(deletion_json),
    });
    write_json_line(&payload)?;

    if outcome.cancelled {
        return Err(interrupted());
    }
    match &deletion {
        Some(report) if report.cancelled => {
            Err(deletion_interrupted(report, outcome.found.len()))
        }
        Some(report) => partial_failure(report, outcome.found.len()),
        None => Ok(()),
    }
}

fn deletion_json(report: &DeletionReport) -> Value {
    json!({
        "confirmed": report.confirmed,
        "cancelled": report.cancelled,
        "deleted": report.items_deleted,
        "failed": report.items_failed,
        "skipped": report.items_skipped,
        "bytes_freed": report.bytes_freed,
        "errors": report
            .errors
            .iter()
            .map(|e| json!({ "path": e.path, "code": e.error_code, "error": e.error }))
            .collect::<Vec<_>>(),
    })
}

fn partial_failure(report: &DeletionReport, total: usize) -> Result<(), CliError> {
    if report.is_partial_failure() {
        return Err(CliError::Partial(format!(
            "{} of {total} deletions failed",
            report.items_failed
        )));
    }
    Ok(())
}

fn interrupted() -> CliError {
    CliError::Runtime("scan interrupted; nothing was deleted".to_string())
}

fn deletion_interrupted(report: &DeletionReport, total: usize) -> CliError {
    CliError::Runtime(format!(
        "deletion interrupted; {} of {total} deleted",
        report.items_deleted
    ))
}

fn list_rules(table: &EcosystemRuleTable, mode: OutputMode) -> Result<(), CliError> {
    match mode {
        OutputMode::Human => {
            header("Ecosystem rules (first match wins)");
            println!(
                "{:<3} {:<14} {:<36} {}",
                "#", "Ecosystem", "Folders", "Indicator"
            );
            println!("{}", "-".repeat(70));
            for (i, rule) in table.rules().iter().enumerate() {
                let indicator = if rule.indicator_file.is_empty() {
                    "-"
                } else {
                    rule.indicator_file.as_str()
                };
                println!(
                    "{:<3} {:<14} {:<36} {}",
                    i + 1,
                    rule.name,
                    rule.candidate_names.join(", "),
                    indicator
                );
            }
            println!();
            info(&format!(
                "Accepted without indicator: {}",
                table.indicator_exempt().join(", ")
            ));
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "list-rules",
                "rules": table.rules(),
                "indicator_exempt": table.indicator_exempt(),
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn print_banner(cli: &Cli, settings: &Settings) {
    header("depclean - stale project dependency cleanup");
    println!();
    info(&format!("Scan path: {}", settings.root.display()));
    info(&format!("Threshold: untouched for {}+ days", settings.days));
    let min = settings.min_size_bytes();
    if min > 0 {
        info(&format!("Minimum size: {}", format_bytes(min)));
    }
    println!();
    if cli.dry_run {
        info("Analysis mode (nothing will be deleted)");
        println!();
    }
}

fn header(msg: &str) {
    println!("{}", msg.bold());
}

fn success(msg: &str) {
    println!("{}", format!("✓ {msg}").green());
}

fn info(msg: &str) {
    println!("{}", format!("ℹ {msg}").cyan());
}

fn warn(msg: &str) {
    println!("{}", format!("! {msg}").yellow());
}

fn error(msg: &str) {
    println!("{}", format!("✗ {msg}").red());
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("DEPCLEAN_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
