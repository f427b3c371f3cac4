use crate::feeds::error::{ErrorKind, Result};
use crate::feeds::open;
use exn::ResultExt;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

static LISTED_ARCHIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|/)authors/id/[^/]/[^/]{2}/(.+)$").unwrap());

/// Read the `find-ls.gz` listing into a set of `AUTHOR/filename` keys.
///
/// Only the last whitespace-separated field of each line is looked at.
pub(crate) fn load(path: &Path) -> Result<HashSet<String>> {
    let mut keys = HashSet::new();
    for line in open(path)? {
        let line = line.or_raise(|| ErrorKind::Read(path.to_path_buf()))?;
        if let Some(key) = key(&line) {
            keys.insert(key.to_string());
        }
    }
    tracing::debug!(feed = %path.display(), archives = keys.len(), "Loaded backpan listing");
    Ok(keys)
}

fn key(line: &str) -> Option<&str> {
    let last = line.split_whitespace().next_back()?;
    LISTED_ARCHIVE.captures(last)?.get(1).map(|m| m.as_str())
}
