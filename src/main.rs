mod cli;
mod error;

use crate::cli::Cli;
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use futures::StreamExt;
use relidx_config::Config;
use relidx_import::error as import;
use relidx_import::{HttpMirror, ImportEvent, Importer, SidecarModel, SurrogatePurge};
use relidx_index::IndexHandle;
use relidx_index::backend::ReadOnlyIndex;
use relidx_store::{Database, SqliteIndex};
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    cli::init_tracing(cli.verbose);
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "Import run failed");
            ExitCode::FAILURE
        },
    }
}

#[derive(Default)]
struct Tally {
    discovered: u64,
    imported: usize,
    skipped: usize,
    failed: usize,
    purged: usize,
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let ctx = cli.context(&config)?;
    let db = Database::connect(&config.index).await.or_raise(|| ErrorKind::Index)?;
    let store: IndexHandle = Arc::new(SqliteIndex::from(&db));
    let index: IndexHandle = if cli.dry_run {
        tracing::info!("Dry run: nothing will be written");
        Arc::new(ReadOnlyIndex::new(store))
    } else {
        store
    };

    let mirror = HttpMirror::new().or_raise(|| ErrorKind::Http)?;
    let mut importer = Importer::new(ctx, index, Arc::new(SidecarModel), Arc::new(mirror));
    if let Some(purge) = config.purge.as_ref().filter(|_| !cli.dry_run) {
        let purge = SurrogatePurge::new(&purge.endpoint, purge.token.clone()).or_raise(|| ErrorKind::Http)?;
        importer = importer.with_purge(Arc::new(purge));
    }

    let mut tally = Tally::default();
    let mut failure = None;
    let mut events = std::pin::pin!(importer.run(&cli.archives));
    while let Some(event) = events.next().await {
        match event {
            Ok(ImportEvent::Started) => tracing::debug!("Import started"),
            Ok(ImportEvent::DiscoveryComplete(count)) => {
                tally.discovered = count;
                tracing::info!(archives = count, "Discovery complete");
            },
            Ok(ImportEvent::Skipped(_)) => tally.skipped += 1,
            Ok(ImportEvent::Imported { release, .. }) => {
                tally.imported += 1;
                tracing::info!(release = %release.name, status = %release.status, first = release.first, "Imported");
            },
            // Already logged with its cause by the importer.
            Ok(ImportEvent::Failed { .. }) => tally.failed += 1,
            Ok(ImportEvent::Purged(keys)) => tally.purged = keys,
            Ok(ImportEvent::Complete) => tracing::info!(
                discovered = tally.discovered,
                imported = tally.imported,
                skipped = tally.skipped,
                failed = tally.failed,
                purged = tally.purged,
                "Import complete"
            ),
            // The index is already written; a stale CDN cache doesn't fail the run.
            Err(e) if *e == import::ErrorKind::Purge => tracing::warn!(error = ?e, "Cache purge failed"),
            Err(e) => {
                tracing::error!(error = ?e, "Import run error");
                failure = Some(e);
            },
        }
    }
    db.close().await;
    match failure {
        Some(e) => Err(e.raise(ErrorKind::Run)),
        None => Ok(()),
    }
}
