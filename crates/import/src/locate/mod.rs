//! Archive discovery and acquisition.
//!
//! Turns the command line inputs (directories, files and URLs) into a flat
//! list of local archive paths. Files and URLs come first, in the order
//! given; URLs are fetched into the download cache through a [`Mirror`].
//! Directories are searched recursively and everything they hold follows,
//! oldest first across all of them. Inputs that can't be used are
//! reported in [`Discovery::rejected`] and never stop the run.

pub mod error;
mod mirror;
mod walk;

pub use self::mirror::{Fetched, HttpMirror, Mirror};
use crate::Context;
use crate::locate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use relidx_model::ArchiveIdentity;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

/// Paths containing this directory hold releases for another language.
const EXCLUDED_COMPONENT: &str = "Perl6";

/// An input that produced no archives.
#[derive(Debug)]
pub struct Rejected {
    pub input: String,
    pub error: Error,
}

/// Result of [`locate`].
#[derive(Debug, Default)]
pub struct Discovery {
    /// Local archive paths, in import order.
    pub archives: Vec<PathBuf>,
    pub rejected: Vec<Rejected>,
}

/// What a single input resolved to.
enum Located {
    /// A file or fetched URL, kept in input order.
    Archive(PathBuf),
    /// Archives found under a directory, with their modification times.
    Tree(Vec<(SystemTime, PathBuf)>),
}

/// Resolve `inputs` into local archive paths.
///
/// File and URL inputs keep their relative order and come first. The
/// archives of every directory input follow as one list sorted by
/// modification time, oldest first.
#[tracing::instrument(skip_all, fields(inputs = inputs.len()))]
pub async fn locate(inputs: &[String], ctx: &Context, mirror: &dyn Mirror) -> Discovery {
    let mut discovery = Discovery::default();
    let mut found = Vec::new();
    for input in inputs {
        match locate_one(input, ctx, mirror).await {
            Ok(Located::Archive(path)) => discovery.archives.push(path),
            Ok(Located::Tree(archives)) => found.extend(archives),
            Err(error) => {
                tracing::warn!(input = %input, error = %error, "Skipping input");
                discovery.rejected.push(Rejected { input: input.clone(), error });
            },
        }
    }
    // Stable, so archives sharing an mtime stay in walk order.
    found.sort_by_key(|(modified, _)| *modified);
    discovery.archives.extend(found.into_iter().map(|(_, path)| path));
    let before = discovery.archives.len();
    discovery.archives.retain(|path| !is_excluded(path));
    if discovery.archives.len() < before {
        tracing::debug!(excluded = before - discovery.archives.len(), "Excluded {EXCLUDED_COMPONENT} archives");
    }
    discovery
}

async fn locate_one(input: &str, ctx: &Context, mirror: &dyn Mirror) -> Result<Located> {
    if input.starts_with("http://") || input.starts_with("https://") {
        return fetch(input, ctx, mirror).await.map(Located::Archive);
    }
    let path = Path::new(input);
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => walk::find_archives(path, ctx.age).await.map(Located::Tree),
        Ok(metadata) if metadata.is_file() => Ok(Located::Archive(path.to_path_buf())),
        _ => exn::bail!(ErrorKind::Unrecognized(input.to_string())),
    }
}

async fn fetch(url: &str, ctx: &Context, mirror: &dyn Mirror) -> Result<PathBuf> {
    let identity = ArchiveIdentity::parse(url).or_raise(|| ErrorKind::InvalidUrl(url.to_string()))?;
    let target = ctx.cache_path(identity.pathname());
    let fetched = mirror.fetch(url, &target).await?;
    tracing::debug!(url, target = %target.display(), ?fetched, "Fetched archive");
    Ok(target)
}

fn is_excluded(path: &Path) -> bool {
    path.components().any(|component| matches!(component, Component::Normal(name) if name == EXCLUDED_COMPONENT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::touch;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Writes a placeholder file instead of downloading; fails for URLs
    /// containing `broken`.
    #[derive(Default)]
    struct FakeMirror {
        requests: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Mirror for FakeMirror {
        async fn fetch(&self, url: &str, target: &Path) -> Result<Fetched> {
            self.requests.lock().unwrap().push(url.to_string());
            if url.contains("broken") {
                exn::bail!(ErrorKind::HttpStatus(404));
            }
            std::fs::create_dir_all(target.parent().unwrap()).unwrap();
            std::fs::write(target, b"archive").unwrap();
            Ok(Fetched::Downloaded)
        }
    }

    fn context(cache: &Path) -> Context {
        Context { cache: cache.to_path_buf(), ..Context::default() }
    }

    fn names(discovery: &Discovery) -> Vec<&str> {
        discovery.archives.iter().map(|p| p.file_name().unwrap().to_str().unwrap()).collect()
    }

    #[tokio::test]
    async fn test_files_come_before_directory_archives() {
        let dir = tempfile::tempdir().unwrap();
        let tree = dir.path().join("tree");
        touch(&tree.join("A/AB/ABC/Second-1.0.tar.gz"), Duration::from_secs(10));
        touch(&tree.join("A/AB/ABC/First-1.0.tar.gz"), Duration::from_secs(100));
        let single = dir.path().join("Single-1.0.tar.gz");
        touch(&single, Duration::from_secs(1000));
        let other = dir.path().join("Other-1.0.tar.gz");
        touch(&other, Duration::ZERO);

        let inputs = [tree.display().to_string(), single.display().to_string(), other.display().to_string()];
        let discovery = locate(&inputs, &context(dir.path()), &FakeMirror::default()).await;
        assert_eq!(
            names(&discovery),
            ["Single-1.0.tar.gz", "Other-1.0.tar.gz", "First-1.0.tar.gz", "Second-1.0.tar.gz"]
        );
        assert!(discovery.rejected.is_empty());
    }

    #[tokio::test]
    async fn test_directories_are_sorted_together() {
        let dir = tempfile::tempdir().unwrap();
        let (a, b) = (dir.path().join("a"), dir.path().join("b"));
        touch(&a.join("New-1.0.tar.gz"), Duration::from_secs(10));
        touch(&b.join("Old-1.0.tar.gz"), Duration::from_secs(1000));
        touch(&a.join("Mid-1.0.tar.gz"), Duration::from_secs(500));

        let inputs = [a.display().to_string(), b.display().to_string()];
        let discovery = locate(&inputs, &context(dir.path()), &FakeMirror::default()).await;
        assert_eq!(names(&discovery), ["Old-1.0.tar.gz", "Mid-1.0.tar.gz", "New-1.0.tar.gz"]);
    }

    #[tokio::test]
    async fn test_perl6_paths_are_excluded() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("A/AB/ABC/Foo-1.0.tar.gz"), Duration::ZERO);
        touch(&dir.path().join("A/AB/ABC/Perl6/Foo-1.0.tar.gz"), Duration::ZERO);

        let inputs = [dir.path().display().to_string()];
        let discovery = locate(&inputs, &context(dir.path()), &FakeMirror::default()).await;
        assert_eq!(discovery.archives, [dir.path().join("A/AB/ABC/Foo-1.0.tar.gz")]);
    }

    #[tokio::test]
    async fn test_file_inputs_ignore_age() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("Old-1.0.tar.gz");
        touch(&old, Duration::from_secs(365 * 24 * 3600));
        let ctx = Context { age: Some(Duration::from_secs(3600)), ..context(dir.path()) };

        let discovery = locate(&[old.display().to_string()], &ctx, &FakeMirror::default()).await;
        assert_eq!(discovery.archives, [old]);
    }

    #[tokio::test]
    async fn test_urls_are_fetched_into_cache() {
        let dir = tempfile::tempdir().unwrap();
        let mirror = FakeMirror::default();
        let inputs = [
            "https://cpan.example/authors/id/A/AB/ABC/Foo-1.0.tar.gz".to_string(),
            "https://cpan.example/Foo-1.0.tar.gz".to_string(),
            "https://cpan.example/authors/id/A/AB/ABC/broken-1.0.tar.gz".to_string(),
        ];
        let discovery = locate(&inputs, &context(dir.path()), &mirror).await;

        assert_eq!(discovery.archives, [dir.path().join("authors/id/A/AB/ABC/Foo-1.0.tar.gz")]);
        assert_eq!(discovery.rejected.len(), 2);
        assert!(matches!(&*discovery.rejected[0].error, ErrorKind::InvalidUrl(_)));
        assert!(matches!(&*discovery.rejected[1].error, ErrorKind::HttpStatus(404)));
        // The URL without an author never reaches the mirror.
        assert_eq!(mirror.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unrecognized_input() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = ["ftp://cpan.example/x.tar.gz".to_string(), "/does/not/exist".to_string()];
        let discovery = locate(&inputs, &context(dir.path()), &FakeMirror::default()).await;
        assert!(discovery.archives.is_empty());
        assert!(discovery.rejected.iter().all(|r| matches!(&*r.error, ErrorKind::Unrecognized(_))));
    }
}
