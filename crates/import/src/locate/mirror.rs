use crate::locate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::StatusCode;
use reqwest::header::{IF_MODIFIED_SINCE, LAST_MODIFIED};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::io::AsyncWriteExt;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

const USER_AGENT: &str = concat!("relidx/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
/// IMF-fixdate, the only date format HTTP/1.1 senders may generate.
const HTTP_DATE: &[BorrowedFormatItem<'static>] =
    format_description!("[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT");

/// What a conditional fetch did to the local copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetched {
    /// A new copy was written.
    Downloaded,
    /// The local copy is current and was left alone.
    NotModified,
}

/// Conditional download of a remote archive into a local file.
#[async_trait]
pub trait Mirror: Send + Sync {
    /// Make `target` a current copy of `url`, downloading only if the remote
    /// file is newer than the local one.
    async fn fetch(&self, url: &str, target: &Path) -> Result<Fetched>;
}

/// [`Mirror`] over HTTP(S) using `If-Modified-Since`.
#[derive(Debug, Clone)]
pub struct HttpMirror {
    client: reqwest::Client,
}

impl HttpMirror {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .or_raise(|| ErrorKind::Fetch("HTTP client initialisation".to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Mirror for HttpMirror {
    #[tracing::instrument(skip(self, target), fields(target = %target.display()))]
    async fn fetch(&self, url: &str, target: &Path) -> Result<Fetched> {
        let mut request = self.client.get(url);
        if let Some(since) = local_modified(target).await {
            request = request.header(IF_MODIFIED_SINCE, since);
        }
        let response = request.send().await.or_raise(|| ErrorKind::Fetch(url.to_string()))?;
        match response.status() {
            StatusCode::NOT_MODIFIED => {
                tracing::debug!("Cached copy is current");
                return Ok(Fetched::NotModified);
            },
            status if !status.is_success() => exn::bail!(ErrorKind::HttpStatus(status.as_u16())),
            _ => {},
        }
        let modified = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_http_date);
        let temporary = temporary_path(target);
        let written = match download(response, url, &temporary, modified).await {
            Ok(written) => written,
            Err(e) => {
                _ = tokio::fs::remove_file(&temporary).await;
                return Err(e);
            },
        };
        tokio::fs::rename(&temporary, target).await.or_raise(|| ErrorKind::Io(target.to_path_buf()))?;
        tracing::info!(bytes = written, "Downloaded archive");
        Ok(Fetched::Downloaded)
    }
}

async fn local_modified(target: &Path) -> Option<String> {
    let modified = tokio::fs::metadata(target).await.ok()?.modified().ok()?;
    format_http_date(modified)
}

/// Stream the response body into `temporary`, a sibling of the target, so a
/// half-finished download never sits at the target path. Returns the number
/// of bytes written.
async fn download(
    mut response: reqwest::Response,
    url: &str,
    temporary: &Path,
    modified: Option<SystemTime>,
) -> Result<u64> {
    if let Some(parent) = temporary.parent() {
        tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Io(parent.to_path_buf()))?;
    }
    let io = || ErrorKind::Io(temporary.to_path_buf());
    let mut file = tokio::fs::File::create(temporary).await.or_raise(io)?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await.or_raise(|| ErrorKind::Fetch(url.to_string()))? {
        file.write_all(&chunk).await.or_raise(io)?;
        written += chunk.len() as u64;
    }
    file.flush().await.or_raise(io)?;
    if let Some(modified) = modified {
        // Keeps the next If-Modified-Since in step with the server's clock.
        file.into_std().await.set_modified(modified).or_raise(io)?;
    }
    Ok(written)
}

fn temporary_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    target.with_file_name(name)
}

fn format_http_date(time: SystemTime) -> Option<String> {
    OffsetDateTime::from(time).format(HTTP_DATE).ok()
}

fn parse_http_date(value: &str) -> Option<SystemTime> {
    PrimitiveDateTime::parse(value, HTTP_DATE).ok().map(|dt| dt.assume_utc().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_date_round_trip() {
        let value = "Sun, 06 Nov 1994 08:49:37 GMT";
        let parsed = parse_http_date(value).unwrap();
        assert_eq!(format_http_date(parsed).as_deref(), Some(value));
    }

    #[test]
    fn test_rejects_other_date_formats() {
        assert_eq!(parse_http_date("Sunday, 06-Nov-94 08:49:37 GMT"), None);
    }

    #[test]
    fn test_temporary_path() {
        assert_eq!(temporary_path(Path::new("/c/Foo-1.0.tar.gz")), PathBuf::from("/c/Foo-1.0.tar.gz.part"));
    }

    /// Answer one request with `response` and hand back the request head.
    async fn serve_once(response: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::AsyncReadExt;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/authors/id/A/AB/ABC/Foo-1.0.tar.gz", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buffer = [0; 4096];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let read = socket.read(&mut buffer).await.unwrap();
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buffer[..read]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8(request).unwrap().to_ascii_lowercase()
        });
        (url, handle)
    }

    #[tokio::test]
    async fn test_download_is_written_with_server_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("A/AB/ABC/Foo-1.0.tar.gz");
        let (url, server) = serve_once(
            "HTTP/1.1 200 OK\r\ncontent-length: 7\r\nlast-modified: Sun, 06 Nov 1994 08:49:37 GMT\r\nconnection: close\r\n\r\narchive",
        )
        .await;

        let fetched = HttpMirror::new().unwrap().fetch(&url, &target).await.unwrap();
        assert_eq!(fetched, Fetched::Downloaded);
        assert!(!server.await.unwrap().contains("if-modified-since"));
        assert_eq!(std::fs::read(&target).unwrap(), b"archive");
        assert!(!temporary_path(&target).exists());
        assert_eq!(local_modified(&target).await.as_deref(), Some("Sun, 06 Nov 1994 08:49:37 GMT"));
    }

    #[tokio::test]
    async fn test_not_modified_keeps_cached_copy() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("Foo-1.0.tar.gz");
        std::fs::write(&target, b"cached").unwrap();
        let (url, server) = serve_once("HTTP/1.1 304 Not Modified\r\nconnection: close\r\n\r\n").await;

        let fetched = HttpMirror::new().unwrap().fetch(&url, &target).await.unwrap();
        assert_eq!(fetched, Fetched::NotModified);
        assert!(server.await.unwrap().contains("if-modified-since:"));
        assert_eq!(std::fs::read(&target).unwrap(), b"cached");
    }

    #[tokio::test]
    async fn test_error_status_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("Foo-1.0.tar.gz");
        let (url, _server) =
            serve_once("HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n").await;

        let err = HttpMirror::new().unwrap().fetch(&url, &target).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::HttpStatus(404)));
        assert!(!target.exists());
        assert!(!temporary_path(&target).exists());
    }
}
