#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use filetime::{FileTime, set_file_mtime};

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

/// Extra process setup for one CLI case.
#[derive(Default)]
pub struct CaseOptions<'a> {
    pub env: Vec<(&'a str, &'a str)>,
    pub stdin: Option<&'a str>,
    pub home: Option<&'a Path>,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_depclean") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) {
        "depclean.exe"
    } else {
        "depclean"
    };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve depclean binary path for integration test"),
    }
}

pub fn run_cli_case(case_name: &str, args: &[&str]) -> CmdResult {
    run_cli_case_with(case_name, args, &CaseOptions::default())
}

/// The depclean binary with a clean `DEPCLEAN_*` environment and the case's
/// overrides applied. All three standard streams are piped.
pub fn cli_command(args: &[&str], opts: &CaseOptions<'_>) -> Command {
    let mut cmd = Command::new(resolve_bin_path());
    cmd.args(args)
        .env("RUST_BACKTRACE", "1")
        .env_remove("DEPCLEAN_ROOT")
        .env_remove("DEPCLEAN_MAX_DEPTH")
        .env_remove("DEPCLEAN_DAYS")
        .env_remove("DEPCLEAN_MIN_SIZE")
        .env_remove("DEPCLEAN_ACTIVITY_LOG")
        .env_remove("DEPCLEAN_OUTPUT_FORMAT")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(home) = opts.home {
        cmd.env("HOME", home);
    }
    for (key, value) in &opts.env {
        cmd.env(key, value);
    }
    cmd
}

pub fn run_cli_case_with(case_name: &str, args: &[&str], opts: &CaseOptions<'_>) -> CmdResult {
    let root = std::env::temp_dir().join("depclean-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();
    let mut cmd = cli_command(args, opts);

    let mut child = cmd.spawn().expect("spawn depclean command");
    {
        let mut stdin = child.stdin.take().expect("child stdin");
        if let Some(input) = opts.stdin {
            stdin.write_all(input.as_bytes()).expect("write child stdin");
        }
    }
    let output = child.wait_with_output().expect("execute depclean command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

/// Create `rel` (and parents) under `root`, returning the full path.
pub fn mkdirs(root: &Path, rel: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(&path).expect("create fixture dir");
    path
}

/// Write a file of `bytes` zero bytes at `root/rel`.
pub fn write_file(root: &Path, rel: &str, bytes: usize) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture parent");
    }
    fs::write(&path, vec![0u8; bytes]).expect("write fixture file");
    path
}

/// Set the mtime of `path` and everything below it to `days` days ago.
pub fn age_tree(path: &Path, days: u64) {
    let when = FileTime::from_system_time(
        SystemTime::now() - Duration::from_secs(days * 86_400),
    );
    let mut stack = vec![path.to_path_buf()];
    while let Some(current) = stack.pop() {
        if current.is_dir() {
            for entry in fs::read_dir(&current).expect("read fixture dir").flatten() {
                stack.push(entry.path());
            }
        }
        set_file_mtime(&current, when).expect("set fixture mtime");
    }
}
