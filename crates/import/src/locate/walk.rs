use crate::locate::error::{ErrorKind, Result};
use exn::ResultExt;
use relidx_model::is_archive_name;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs::{self, DirEntry};

enum WalkEntry {
    Archive(SystemTime, PathBuf),
    Descend(PathBuf),
    Skip,
}

/// Recursively find archives below `root` with their modification times,
/// oldest first.
///
/// With an `age`, archives modified before `now - age` are left out. Errors
/// below the root are logged and the walk carries on; only an unreadable
/// root is an error.
#[tracing::instrument(level = "debug", skip(root), fields(root = %root.as_ref().display()))]
pub(crate) async fn find_archives(root: impl AsRef<Path>, age: Option<Duration>) -> Result<Vec<(SystemTime, PathBuf)>> {
    let root = root.as_ref();
    let cutoff = age.and_then(|age| SystemTime::now().checked_sub(age));
    let mut found = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(current) = stack.pop() {
        let mut entries = match fs::read_dir(&current).await {
            Ok(entries) => entries,
            Err(e) if current == root => return Err(e).or_raise(|| ErrorKind::Io(current.clone())),
            Err(e) => {
                tracing::warn!(path = %current.display(), error = %e, "Skipping unreadable directory");
                continue;
            },
        };
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(path = %current.display(), error = %e, "Could not read directory entry");
                    break;
                },
            };
            match process_entry(entry, cutoff).await {
                WalkEntry::Archive(modified, path) => found.push((modified, path)),
                WalkEntry::Descend(path) => stack.push(path),
                WalkEntry::Skip => {},
            }
        }
    }
    found.sort();
    tracing::debug!(archives = found.len(), "Directory walk complete");
    Ok(found)
}

async fn process_entry(entry: DirEntry, cutoff: Option<SystemTime>) -> WalkEntry {
    let path = entry.path();
    // Follow symlinks: mirrors are often assembled from linked trees.
    let metadata = match fs::metadata(&path).await {
        Ok(metadata) => metadata,
        Err(e) => {
            // Most likely a broken symlink.
            tracing::debug!(path = %path.display(), error = %e, "Skipping entry");
            return WalkEntry::Skip;
        },
    };
    if metadata.is_dir() {
        return WalkEntry::Descend(path);
    }
    if !metadata.is_file() || !path.file_name().is_some_and(|name| is_archive_name(name.to_string_lossy())) {
        return WalkEntry::Skip;
    }
    let modified = modified(&metadata);
    if cutoff.is_some_and(|cutoff| modified < cutoff) {
        return WalkEntry::Skip;
    }
    WalkEntry::Archive(modified, path)
}

fn modified(metadata: &Metadata) -> SystemTime {
    metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH)
}
