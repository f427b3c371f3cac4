//! Fixtures shared by the unit tests of this crate.

use relidx_compress::Compression;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Create an empty file at `path` (and its parents) last modified `age` ago.
pub(crate) fn touch(path: &Path, age: Duration) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = std::fs::File::create(path).unwrap();
    file.set_modified(SystemTime::now() - age).unwrap();
}

/// A module a fixture release provides: `(module, file)`.
pub(crate) type Provide<'a> = (&'a str, &'a str);

/// Write `<root>/authors/id/<pathname>` plus its `.meta` sidecar, returning
/// the archive path. `age` sets the archive mtime, which becomes the release
/// date.
pub(crate) fn release(root: &Path, pathname: &str, provides: &[Provide<'_>], age: Duration) -> PathBuf {
    let archive = root.join("authors").join("id").join(pathname);
    touch(&archive, age);
    let provides = provides
        .iter()
        .map(|(module, file)| (module.to_string(), json!({ "file": file, "version": "1.0" })))
        .collect::<serde_json::Map<_, _>>();
    let name = relidx_model::ArchiveIdentity::from_path(&archive).unwrap().name;
    let meta = json!({
        "name": name,
        "version": "1.0",
        "abstract": format!("{name} does things"),
        "provides": provides,
    });
    std::fs::write(archive.with_file_name(format!("{name}.meta")), meta.to_string()).unwrap();
    archive
}

/// Write a feed with a header block, a blank line and `rows`, compressed
/// with `compression`.
pub(crate) fn feed(path: &Path, compression: Compression, rows: &[&str]) {
    let mut body = String::from("File: feed\nLine-Count: 0\n\n");
    for row in rows {
        body.push_str(row);
        body.push('\n');
    }
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, compression.compress(body.as_bytes()).unwrap()).unwrap();
}
