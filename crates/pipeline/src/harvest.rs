//! The harvest runner: sequential record stream, batched uploads.
//!
//! CSW pages arrive in small windows, so records are mapped one at a time
//! and uploaded in batches. Per-record failures (parse or map) are recorded
//! and skipped; a failed batch upload fails every record in the batch;
//! connection errors end the run. Cancelling the run's token stops the
//! stream, aborts an in-flight batch upload, and fails any records still
//! waiting in the batch.

use std::sync::Arc;
use std::time::Instant;

use csw::HarvestItem;
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::scheduler::SourceFailure;
use crate::sink::ArcSink;
use crate::stats::RunStats;

#[derive(Debug, Clone)]
pub struct HarvestOptions {
    pub rdi: String,
    /// Records per upload request.
    pub batch_size: usize,
    /// Cancelling this token stops the harvest.
    pub cancel: CancellationToken,
}

/// One mapped record waiting in the upload batch.
struct PendingArc {
    id: String,
    studies: u64,
    assays: u64,
    document: serde_json::Value,
}

pub async fn run_harvest<S>(
    records: S,
    sink: Arc<dyn ArcSink>,
    options: HarvestOptions,
) -> Result<RunStats, SourceFailure>
where
    S: Stream<Item = Result<HarvestItem, csw::CswError>>,
{
    let started = Instant::now();
    let mut stats = RunStats::default();
    let batch_size = options.batch_size.max(1);
    let mut batch: Vec<PendingArc> = Vec::with_capacity(batch_size);

    futures::pin_mut!(records);

    loop {
        let item = tokio::select! {
            biased;
            _ = options.cancel.cancelled() => {
                tracing::warn!("cancellation observed, stopping the harvest");
                break;
            }
            item = records.next() => match item {
                Some(item) => item,
                None => break,
            },
        };

        let item = match item {
            Ok(item) => item,
            Err(error) => {
                // Fatal: nothing more will be uploaded. Records already
                // batched but never sent count as failed.
                for arc in batch {
                    stats.record_failure(arc.id);
                }
                stats.duration_seconds = started.elapsed().as_secs_f64();
                return Err(SourceFailure {
                    source: error.into(),
                    stats,
                });
            }
        };
        stats.found_datasets += 1;

        match item {
            HarvestItem::Failed(failure) => {
                tracing::warn!(
                    record = failure.id.as_str(),
                    error = %failure.cause,
                    "skipping unprocessable record"
                );
                stats.record_failure(failure.id);
            }
            HarvestItem::Record(record) => {
                tracing::info!(record = record.identifier.as_str(), "processing record");
                match arc_mapper::map_inspire_record(&record) {
                    Ok(arc) => {
                        let studies = arc.investigation.studies.len() as u64;
                        let assays = arc
                            .investigation
                            .studies
                            .iter()
                            .map(|s| s.assays.len() as u64)
                            .sum();
                        batch.push(PendingArc {
                            id: record.identifier.clone(),
                            studies,
                            assays,
                            document: arc.to_rocrate_value(),
                        });
                    }
                    Err(error) => {
                        tracing::error!(
                            record = record.identifier.as_str(),
                            error = %error,
                            "failed to map record"
                        );
                        stats.record_failure(record.identifier.clone());
                    }
                }
            }
        }

        if batch.len() >= batch_size {
            flush(&*sink, &options.rdi, &mut batch, &mut stats, &options.cancel).await;
        }
    }

    if !batch.is_empty() {
        flush(&*sink, &options.rdi, &mut batch, &mut stats, &options.cancel).await;
    }

    stats.duration_seconds = started.elapsed().as_secs_f64();
    tracing::info!(
        found = stats.found_datasets,
        failed = stats.failed_datasets,
        "harvest complete"
    );
    Ok(stats)
}

/// Upload the pending batch. On success the batch's study/assay counts join
/// the totals; on failure every record in the batch is marked failed. The
/// run continues either way. No upload begins after cancellation is
/// observed, and an in-flight upload is aborted by it.
async fn flush(
    sink: &dyn ArcSink,
    rdi: &str,
    batch: &mut Vec<PendingArc>,
    stats: &mut RunStats,
    cancel: &CancellationToken,
) {
    let pending = std::mem::take(batch);
    if cancel.is_cancelled() {
        for arc in pending {
            stats.record_failure(arc.id);
        }
        return;
    }
    let documents: Vec<serde_json::Value> =
        pending.iter().map(|arc| arc.document.clone()).collect();

    tracing::info!(count = pending.len(), "uploading batch");
    let upload = sink.upload_arcs(rdi, documents);
    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            // Dropping the request future aborts the in-flight transfer.
            tracing::warn!(count = pending.len(), "batch upload aborted by cancellation");
            for arc in pending {
                stats.record_failure(arc.id);
            }
            return;
        }
        result = upload => result,
    };

    match result {
        Ok(response) => {
            for arc in &pending {
                stats.total_studies += arc.studies;
                stats.total_assays += arc.assays;
            }
            for result in &response.arcs {
                tracing::debug!(
                    arc = result.id.as_str(),
                    status = result.status.as_str(),
                    "uploaded"
                );
            }
        }
        Err(error) => {
            tracing::error!(error = %error, count = pending.len(), "batch upload failed");
            for arc in pending {
                stats.record_failure(arc.id);
            }
        }
    }
}
