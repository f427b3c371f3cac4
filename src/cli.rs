use crate::error::{ErrorKind, Result};
use clap::{ArgAction, Parser};
use exn::ResultExt;
use relidx_config::Config;
use relidx_import::Context;
use relidx_model::Status;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt};

const SECONDS_PER_HOUR: u64 = 3600;

#[derive(Debug, Parser)]
#[command(name = "relidx", version, about = "Import CPAN release archives into a search index")]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON).
    #[arg(long, env = "RELIDX_CONFIG")]
    pub config: Option<PathBuf>,
    /// Skip archives that already have a release document.
    #[arg(long)]
    pub skip: bool,
    /// Only import archives found in directories modified within this many hours.
    #[arg(long, value_name = "HOURS")]
    pub age: Option<u64>,
    /// Status of imported releases: latest, cpan or backpan.
    #[arg(long)]
    pub status: Option<String>,
    /// Mark releases the mirror no longer lists as backpan.
    #[arg(long)]
    pub detect_backpan: bool,
    /// Recompute the latest release of each imported distribution.
    #[arg(long)]
    pub latest: bool,
    /// Number of file documents per bulk commit.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub bulk_size: Option<u64>,
    /// Read the index but write nothing, and purge nothing.
    #[arg(long)]
    pub dry_run: bool,
    /// Increase logging verbosity (use -vv for trace level).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
    /// Archive files, directories to search, or http(s) URLs.
    #[arg(value_name = "ARCHIVES", required = true)]
    pub archives: Vec<String>,
}

impl Cli {
    /// Settings for the run: the configuration, overridden by flags.
    pub fn context(&self, config: &Config) -> Result<Context> {
        let import = &config.import;
        let status = self.status.as_deref().unwrap_or(&import.status);
        let status = status.parse::<Status>().or_raise(|| ErrorKind::Config)?;
        let bulk_size = match self.bulk_size {
            Some(size) => usize::try_from(size).or_raise(|| ErrorKind::Config)?,
            None => import.bulk_size,
        };
        Ok(Context {
            cpan: config.cpan.clone(),
            cache: config.cache.clone(),
            status,
            detect_backpan: self.detect_backpan || import.detect_backpan,
            skip: self.skip || import.skip,
            latest: self.latest || import.latest,
            bulk_size,
            age: self.age.or(import.age).map(|hours| Duration::from_secs(hours.saturating_mul(SECONDS_PER_HOUR))),
            throttle: import.throttle_ms.map(Duration::from_millis),
        })
    }
}

pub fn init_tracing(verbosity: u8) {
    let default_directive = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let subscriber = fmt().with_env_filter(filter).with_target(true).finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("tracing subscriber already initialized");
    }
}
