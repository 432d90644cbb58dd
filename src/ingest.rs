//! The ingestion run, from archive to database.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::Config;
use crate::download::{download_archive, ArchiveMonth};
use crate::errors::WsprDataErr;
use crate::reader::SpotReader;
use crate::spot::Spot;
use crate::store::SpotStore;

/// Records per transaction. A full batch commits as soon as it fills, so an
/// aborted run keeps everything up to the last full batch.
pub const SPOTS_PER_BATCH: usize = 1000;

/// Caller choices for one ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Download even when the remote archive is no longer than the local
    /// copy.
    pub force: bool,
    /// Ingest this local archive instead of synchronizing with the remote.
    pub filename: Option<PathBuf>,
    /// Month of the current year to synchronize. The month under way when
    /// unset.
    pub month: Option<u32>,
}

/// What one run accomplished.
#[derive(Debug, Clone)]
pub struct IngestSummary {
    /// Spots committed to the store.
    pub records: u64,
    /// Transactions committed.
    pub batches: u64,
    /// Wall clock time spent importing.
    pub elapsed: Duration,
}

/// Run one synchronize and ingest cycle.
///
/// Resolves the input archive first, either a caller supplied file or the
/// remote archive for the target month. When nothing new turns up that is a
/// success with zero records. Otherwise every record above the store's
/// watermark streams into batched transactions; rerunning after any outcome
/// imports each record exactly once.
pub fn run_ingest(config: &Config, options: &IngestOptions) -> Result<IngestSummary, WsprDataErr> {
    let archive = match resolve_archive(config, options)? {
        Some(path) => path,
        None => {
            warn!("nothing to import");
            return Ok(IngestSummary {
                records: 0,
                batches: 0,
                elapsed: Duration::default(),
            });
        }
    };

    let mut store = SpotStore::open(&config.db_path)?;
    store.ensure_schema()?;

    let start_id = store.max_spot_id()?;
    info!(
        "database {}, resuming after spot id {}",
        config.db_path.display(),
        start_id
    );

    info!("importing {}", archive.display());
    let started = Instant::now();

    let mut reader = SpotReader::open(&archive, start_id)?;
    let mut batch: Vec<Spot> = Vec::with_capacity(SPOTS_PER_BATCH);
    let mut records: u64 = 0;
    let mut batches: u64 = 0;

    loop {
        match reader.next() {
            Some(Ok(spot)) => {
                batch.push(spot);

                if batch.len() == SPOTS_PER_BATCH {
                    store.insert_batch(&batch)?;
                    records += batch.len() as u64;
                    batches += 1;
                    batch.clear();
                }
            }
            Some(Err(err)) => return Err(err),
            None => break,
        }
    }

    if !batch.is_empty() {
        store.insert_batch(&batch)?;
        records += batch.len() as u64;
        batches += 1;
    }

    let elapsed = started.elapsed();
    if records > 0 {
        let rate = records as f64 / elapsed.as_secs_f64();
        info!(
            "imported {} spots in {} ({:.0} spots per second)",
            records,
            format_elapsed(elapsed),
            rate
        );
    } else {
        info!("no spots above id {} in {}", start_id, archive.display());
    }
    info!("{}", reader.resolver_stats());

    Ok(IngestSummary {
        records,
        batches,
        elapsed,
    })
}

// The archive to ingest, or None when this run has nothing to do. A caller
// supplied file short circuits the remote synchronization.
fn resolve_archive(
    config: &Config,
    options: &IngestOptions,
) -> Result<Option<PathBuf>, WsprDataErr> {
    if let Some(path) = &options.filename {
        if path.exists() {
            return Ok(Some(path.clone()));
        }

        warn!("archive {} does not exist", path.display());
        return Ok(None);
    }

    let month = match options.month {
        Some(month) => ArchiveMonth::this_year(month)?,
        None => ArchiveMonth::current(),
    };

    download_archive(month, &config.work_dir, options.force)
}

// Wall clock formatting for the import log line.
fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = total % 3600 / 60;
    let seconds = total % 60;
    let millis = elapsed.subsec_millis();

    if hours > 0 {
        format!("{}h {}m {}.{:03}s", hours, minutes, seconds, millis)
    } else if minutes > 0 {
        format!("{}m {}.{:03}s", minutes, seconds, millis)
    } else {
        format!("{}.{:03}s", seconds, millis)
    }
}
