//! The fill job: walk records missing one URL field and scrape it from the other.
//!
//! Strictly sequential. Each record costs at most one GET and one point
//! update, with a fixed pause between fetches.

use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use artfill_extractor::ImageExtractor;
use artfill_shared::{ArtworkRecord, FillDirection, Result, UpdaterConfig};
use artfill_storage::Storage;

// ---------------------------------------------------------------------------
// Fill options & report
// ---------------------------------------------------------------------------

/// Configuration for a single [`fill`] run.
#[derive(Debug, Clone)]
pub struct FillOptions {
    /// Which field gets written.
    pub direction: FillDirection,
    /// Pause between consecutive page fetches.
    pub delay: Duration,
    /// Stop after this many records.
    pub limit: Option<usize>,
    /// Extract but never write.
    pub dry_run: bool,
}

impl FillOptions {
    pub fn new(direction: FillDirection, updater: &UpdaterConfig) -> Self {
        Self {
            direction,
            delay: Duration::from_millis(updater.delay_ms),
            limit: None,
            dry_run: false,
        }
    }
}

/// What happened to one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The target field was written.
    Updated(String),
    /// A value was found but `dry_run` kept it from being written.
    WouldUpdate(String),
    /// The page gave nothing usable.
    NoResult,
    /// The source field was missing, so nothing was fetched.
    SkippedNoSource,
    /// A value was found but the store rejected the write.
    WriteFailed(String),
}

/// Summary of a completed fill run.
#[derive(Debug, Clone)]
pub struct FillReport {
    pub direction: FillDirection,
    /// Records taken from the cursor.
    pub processed: usize,
    /// Records whose target field was written (or would be, on a dry run).
    pub updated: usize,
    pub no_result: usize,
    pub skipped: usize,
    pub write_failures: usize,
    pub elapsed: Duration,
}

impl FillReport {
    fn new(direction: FillDirection) -> Self {
        Self {
            direction,
            processed: 0,
            updated: 0,
            no_result: 0,
            skipped: 0,
            write_failures: 0,
            elapsed: Duration::ZERO,
        }
    }

    fn record(&mut self, outcome: &RecordOutcome) {
        self.processed += 1;
        match outcome {
            RecordOutcome::Updated(_) | RecordOutcome::WouldUpdate(_) => self.updated += 1,
            RecordOutcome::NoResult => self.no_result += 1,
            RecordOutcome::SkippedNoSource => self.skipped += 1,
            RecordOutcome::WriteFailed(_) => self.write_failures += 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting fill status.
pub trait FillProgress: Send + Sync {
    /// Called once with the number of records pending at start.
    fn started(&self, pending: u64);
    /// Called before a record is processed.
    fn record_started(&self, record: &ArtworkRecord, current: usize);
    /// Called after a record is processed.
    fn record_finished(&self, record: &ArtworkRecord, outcome: &RecordOutcome);
    /// Called when the run completes.
    fn done(&self, report: &FillReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl FillProgress for SilentProgress {
    fn started(&self, _pending: u64) {}
    fn record_started(&self, _record: &ArtworkRecord, _current: usize) {}
    fn record_finished(&self, _record: &ArtworkRecord, _outcome: &RecordOutcome) {}
    fn done(&self, _report: &FillReport) {}
}

// ---------------------------------------------------------------------------
// Fill loop
// ---------------------------------------------------------------------------

/// Run one pass over every record missing the target field.
///
/// 1. Cursor over records whose target field is NULL
/// 2. Fetch the source field's URL and extract an image URL
/// 3. Write a non-empty result back to the same record
/// 4. Pause before the next fetch
///
/// Per-record failures are logged and counted; only store read errors abort.
#[instrument(skip_all, fields(direction = %options.direction, dry_run = options.dry_run))]
pub async fn fill(
    storage: &Storage,
    extractor: &ImageExtractor,
    options: &FillOptions,
    progress: &dyn FillProgress,
) -> Result<FillReport> {
    let start = Instant::now();
    let target = options.direction.target();
    let mut report = FillReport::new(options.direction);

    let pending = storage.count_missing(target).await?;
    info!(pending, delay_ms = options.delay.as_millis() as u64, "starting fill");
    progress.started(pending);

    let mut cursor = storage.pending(target);
    let mut fetched_any = false;

    while let Some(record) = cursor.next().await? {
        if options.limit.is_some_and(|limit| report.processed >= limit) {
            info!(limit = report.processed, "record limit reached");
            break;
        }

        progress.record_started(&record, report.processed + 1);

        let outcome = match source_url(&record, options.direction) {
            Some(page_url) => {
                if fetched_any && !options.delay.is_zero() {
                    tokio::time::sleep(options.delay).await;
                }
                fetched_any = true;
                process_record(storage, extractor, &record, page_url, options).await
            }
            None => {
                warn!(
                    id = %record.id,
                    missing = %options.direction.source(),
                    "record has neither URL, skipping"
                );
                RecordOutcome::SkippedNoSource
            }
        };

        report.record(&outcome);
        progress.record_finished(&record, &outcome);
    }

    report.elapsed = start.elapsed();

    info!(
        processed = report.processed,
        updated = report.updated,
        no_result = report.no_result,
        skipped = report.skipped,
        write_failures = report.write_failures,
        duration_ms = report.elapsed.as_millis() as u64,
        "fill completed"
    );
    progress.done(&report);

    Ok(report)
}

/// The URL to fetch for `record`, if it has a usable one.
fn source_url(record: &ArtworkRecord, direction: FillDirection) -> Option<&str> {
    record
        .field(direction.source())
        .filter(|url| !url.trim().is_empty())
}

async fn process_record(
    storage: &Storage,
    extractor: &ImageExtractor,
    record: &ArtworkRecord,
    page_url: &str,
    options: &FillOptions,
) -> RecordOutcome {
    info!(id = %record.id, name = record.label(), url = page_url, "processing");

    let Some(found) = extractor
        .get_image_url(page_url)
        .await
        .filter(|url| !url.is_empty())
    else {
        return RecordOutcome::NoResult;
    };

    let target = options.direction.target();
    if options.dry_run {
        info!(id = %record.id, field = %target, value = %found, "dry run, not writing");
        return RecordOutcome::WouldUpdate(found);
    }

    match storage.set_url_field(&record.id, target, &found).await {
        Ok(true) => {
            info!(id = %record.id, field = %target, value = %found, "updated");
            RecordOutcome::Updated(found)
        }
        Ok(false) => {
            warn!(id = %record.id, "record disappeared before update");
            RecordOutcome::WriteFailed("record not found".into())
        }
        Err(e) => {
            warn!(id = %record.id, error = %e, "failed to write");
            RecordOutcome::WriteFailed(e.to_string())
        }
    }
}
