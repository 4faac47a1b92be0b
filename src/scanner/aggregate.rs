//! Recursive aggregates over a directory tree: total file size and most recent
//! modification time.
//!
//! Both are pure read-only sub-walks, independent of the outer traversal.
//! Entries are `lstat`ed and symlinks are never followed. A failed stat or an
//! unreadable directory skips that entry only; the aggregate always completes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Sum of the sizes of every regular file under `path`.
///
/// Directories contribute nothing directly. A regular file passed as `path`
/// yields its own size. A missing path yields 0.
pub fn size_of(path: &Path) -> u64 {
    let mut total = 0u64;
    for_each_entry(path, |meta| {
        if meta.is_file() {
            total = total.saturating_add(meta.len());
        }
    });
    total
}

/// Latest modification time of `path` and everything beneath it.
///
/// Starts from `path`'s own mtime. If `path` itself cannot be stat'ed the
/// current time is returned, so an unreadable tree is never treated as stale.
pub fn most_recent_modification(path: &Path) -> SystemTime {
    let Ok(root_meta) = fs::metadata(path) else {
        return SystemTime::now();
    };
    let Ok(mut newest) = root_meta.modified() else {
        return SystemTime::now();
    };

    for_each_entry(path, |meta| {
        if let Ok(modified) = meta.modified()
            && modified > newest
        {
            newest = modified;
        }
    });
    newest
}

/// Visit the metadata of `root` and every entry below it, depth-first.
fn for_each_entry<F>(root: &Path, mut visit: F)
where
    F: FnMut(&fs::Metadata),
{
    let mut stack: Vec<PathBuf> = vec![root.to_path_buf()];

    while let Some(current) = stack.pop() {
        let Ok(meta) = fs::symlink_metadata(&current) else {
            continue;
        };
        visit(&meta);

        if !meta.is_dir() {
            continue;
        }
        let Ok(entries) = fs::read_dir(&current) else {
            continue;
        };
        for entry in entries.flatten() {
            stack.push(entry.path());
        }
    }
}
