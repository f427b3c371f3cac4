//! Configuration for relidx.
//!
//! Layered with [figment]: built-in defaults, then an optional configuration
//! file (TOML, YAML or JSON, chosen by extension), then environment variables
//! prefixed with `RELIDX_` (nested keys separated by `__`, so
//! `RELIDX_IMPORT__BULK_SIZE=50` sets `import.bulk_size`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::{BaseDirs, ProjectDirs};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "RELIDX_";
const DEFAULT_FILE_NAME: &str = "relidx.toml";
const DEFAULT_BULK_SIZE: usize = 10;
const DEFAULT_STATUS: &str = "cpan";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the local CPAN mirror holding `modules/` and `indices/`.
    pub cpan: PathBuf,
    /// Location of the SQLite search index.
    pub index: PathBuf,
    /// Root of the download cache for archives given as URLs.
    pub cache: PathBuf,
    pub import: ImportConfig,
    pub purge: Option<PurgeConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Number of queued file documents that triggers a bulk commit.
    pub bulk_size: usize,
    /// Status assigned to releases unless backpan detection says otherwise.
    pub status: String,
    pub detect_backpan: bool,
    /// Skip archives that already have a release document in the index.
    pub skip: bool,
    /// Recompute the "latest" status of each imported distribution.
    pub latest: bool,
    /// Only consider directory entries modified within this many hours.
    pub age: Option<u64>,
    /// Pause (milliseconds) after each imported archive.
    pub throttle_ms: Option<u64>,
}

/// Surrogate-key purge endpoint for the CDN sitting in front of the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeConfig {
    pub endpoint: String,
    pub token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let dirs = ProjectDirs::from("org", "relidx", "relidx");
        let home = BaseDirs::new().map(|b| b.home_dir().to_path_buf()).unwrap_or_default();
        Self {
            cpan: home.join("CPAN"),
            index: dirs.as_ref().map(|d| d.data_dir().to_path_buf()).unwrap_or_default().join("relidx.sqlite"),
            cache: dirs.as_ref().map(|d| d.cache_dir().to_path_buf()).unwrap_or_else(|| PathBuf::from(".cache")),
            import: ImportConfig::default(),
            purge: None,
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            bulk_size: DEFAULT_BULK_SIZE,
            status: DEFAULT_STATUS.to_string(),
            detect_backpan: false,
            skip: false,
            latest: false,
            age: None,
            throttle_ms: None,
        }
    }
}

impl Config {
    /// Load the configuration.
    ///
    /// When `file` is `None`, `relidx.toml` in the platform configuration
    /// directory is used if it exists. An explicitly given file must exist.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match file {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
                }
                figment = Self::merge_file(figment, path);
            },
            None => {
                if let Some(dirs) = ProjectDirs::from("org", "relidx", "relidx") {
                    // Figment silently ignores files that don't exist.
                    figment = figment.merge(Toml::file(dirs.config_dir().join(DEFAULT_FILE_NAME)));
                }
            },
        }
        Self::extract(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    fn merge_file(figment: Figment, path: &Path) -> Figment {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
            Some("json") => figment.merge(Json::file(path)),
            _ => figment.merge(Toml::file(path)),
        }
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Parse)?;
        config.validate()?;
        tracing::debug!(cpan = %config.cpan.display(), index = %config.index.display(), "Configuration loaded");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.import.bulk_size == 0 {
            exn::bail!(ErrorKind::Invalid("import.bulk_size"));
        }
        if self.import.status.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("import.status"));
        }
        if let Some(purge) = &self.purge
            && purge.endpoint.trim().is_empty()
        {
            exn::bail!(ErrorKind::Invalid("purge.endpoint"));
        }
        Ok(())
    }
}
