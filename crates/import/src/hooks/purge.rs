use crate::hooks::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use relidx_model::ArchiveIdentity;
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Invalidate cached pages for everything an import run touched.
#[async_trait]
pub trait CachePurge: Send + Sync {
    /// Returns the number of surrogate keys purged.
    async fn purge(&self, identities: &[ArchiveIdentity]) -> Result<usize>;
}

/// `author=<AUTHOR>` and `dist=<DIST>` for every identity, deduplicated and
/// sorted.
pub fn surrogate_keys(identities: &[ArchiveIdentity]) -> BTreeSet<String> {
    identities
        .iter()
        .flat_map(|identity| [format!("author={}", identity.author), format!("dist={}", identity.distribution)])
        .collect()
}

#[derive(Serialize)]
struct PurgeRequest<'a> {
    surrogate_keys: &'a BTreeSet<String>,
}

/// POSTs surrogate keys as JSON to a purge endpoint.
#[derive(Debug, Clone)]
pub struct SurrogatePurge {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl SurrogatePurge {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .or_raise(|| ErrorKind::Request(endpoint.clone()))?;
        Ok(Self { client, endpoint, token })
    }
}

#[async_trait]
impl CachePurge for SurrogatePurge {
    #[tracing::instrument(skip_all, fields(endpoint = %self.endpoint))]
    async fn purge(&self, identities: &[ArchiveIdentity]) -> Result<usize> {
        let keys = surrogate_keys(identities);
        if keys.is_empty() {
            return Ok(0);
        }
        let mut request = self.client.post(&self.endpoint).json(&PurgeRequest { surrogate_keys: &keys });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.or_raise(|| ErrorKind::Request(self.endpoint.clone()))?;
        if !response.status().is_success() {
            exn::bail!(ErrorKind::HttpStatus(response.status().as_u16()));
        }
        tracing::info!(keys = keys.len(), "Purged surrogate keys");
        Ok(keys.len())
    }
}

/// Logs what would be purged and purges nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPurge;

#[async_trait]
impl CachePurge for NoPurge {
    async fn purge(&self, identities: &[ArchiveIdentity]) -> Result<usize> {
        let keys = surrogate_keys(identities);
        tracing::debug!(?keys, "No purge endpoint configured");
        Ok(0)
    }
}
