//! The bounded-concurrency conversion scheduler.
//!
//! One driver task pulls datasets from the source and spawns a task per
//! record. Two mechanisms bound the work in flight: the task set is capped
//! at `max_concurrent_tasks` (the driver waits for a completion before
//! pulling again once full — this is the backpressure gate that keeps the
//! producer from outrunning the pool), and each task additionally holds a
//! semaphore ticket of the same budget while it is actively building or
//! uploading. Per-record failures are folded into the run statistics and
//! never abort the run; only source errors are fatal.
//!
//! Cancelling the run's token stops the producer, drops Building-phase
//! futures, and aborts in-flight uploads; no upload begins once
//! cancellation has been observed. Records already pulled when the token
//! fires are accounted as failed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::{Stream, StreamExt};
use sql_source::Dataset;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::serializer::SerializerWorker;
use crate::sink::ArcSink;
use crate::stats::RunStats;

/// The upstream source failed mid-run. Outstanding work has been drained;
/// the partial statistics ride along so a report can still be emitted.
#[derive(Debug, thiserror::Error)]
#[error("reading from the record source failed: {source}")]
pub struct SourceFailure {
    #[source]
    pub source: anyhow::Error,
    pub stats: RunStats,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// RDI namespace used for every upload.
    pub rdi: String,
    pub max_concurrent_tasks: usize,
    pub max_studies: usize,
    pub max_assays: usize,
    /// Wall-clock budget for one build, including pool queueing.
    pub build_timeout: Duration,
    /// Cancelling this token stops the run: the producer quits, builds are
    /// dropped and in-flight uploads aborted.
    pub cancel: CancellationToken,
}

struct TaskContext {
    rdi: String,
    max_studies: usize,
    max_assays: usize,
    build_timeout: Duration,
    serializer: Arc<dyn SerializerWorker>,
    sink: Arc<dyn ArcSink>,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
}

struct TaskOutcome {
    id: String,
    studies: u64,
    assays: u64,
    uploaded: bool,
}

/// Drive a full conversion run: pull every dataset from `source`, build and
/// upload each under the configured bounds, and return the run statistics
/// (including wall-clock duration).
pub async fn run_conversion<S, E>(
    source: S,
    serializer: Arc<dyn SerializerWorker>,
    sink: Arc<dyn ArcSink>,
    options: PipelineOptions,
) -> Result<RunStats, SourceFailure>
where
    S: Stream<Item = Result<Dataset, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let started = Instant::now();
    let mut stats = RunStats::default();
    let max_concurrent_tasks = options.max_concurrent_tasks.max(1);

    let context = Arc::new(TaskContext {
        rdi: options.rdi.clone(),
        max_studies: options.max_studies,
        max_assays: options.max_assays,
        build_timeout: options.build_timeout,
        serializer,
        sink,
        semaphore: Arc::new(Semaphore::new(max_concurrent_tasks)),
        cancel: options.cancel.clone(),
    });

    tracing::info!(max_concurrent_tasks, "starting streaming conversion");

    let mut tasks: JoinSet<TaskOutcome> = JoinSet::new();
    futures::pin_mut!(source);

    loop {
        let item = tokio::select! {
            biased;
            _ = options.cancel.cancelled() => {
                tracing::warn!("cancellation observed, stopping the producer");
                break;
            }
            item = source.next() => match item {
                Some(item) => item,
                None => break,
            },
        };

        let dataset = match item {
            Ok(dataset) => dataset,
            Err(error) => {
                // A cursor failure is fatal, but outstanding tasks get to
                // finish so the ledger stays exact.
                while !tasks.is_empty() {
                    fold_next(&mut tasks, &mut stats).await;
                }
                stats.duration_seconds = started.elapsed().as_secs_f64();
                return Err(SourceFailure {
                    source: error.into(),
                    stats,
                });
            }
        };
        stats.found_datasets += 1;

        // Backpressure gate: never hold more than the task budget in memory.
        while tasks.len() >= max_concurrent_tasks && !options.cancel.is_cancelled() {
            tokio::select! {
                biased;
                _ = options.cancel.cancelled() => {}
                _ = fold_next(&mut tasks, &mut stats) => {}
            }
        }

        // A record pulled but not started once cancellation is observed is
        // a failed record, not a silent drop.
        if options.cancel.is_cancelled() {
            stats.record_failure(dataset.investigation.id.to_string());
            break;
        }

        let context = context.clone();
        tasks.spawn(async move {
            let id = dataset.investigation.id.to_string();
            let studies = dataset.study_count() as u64;
            let assays = dataset.assay_count() as u64;

            let processed = futures::FutureExt::catch_unwind(std::panic::AssertUnwindSafe(
                process_dataset(&context, dataset, &id, studies, assays),
            ))
            .await;

            let uploaded = match processed {
                Ok(uploaded) => uploaded,
                Err(_) => {
                    tracing::error!(investigation = id.as_str(), "record task panicked");
                    false
                }
            };
            TaskOutcome {
                id,
                studies,
                assays,
                uploaded,
            }
        });
    }

    if !tasks.is_empty() {
        tracing::info!(remaining = tasks.len(), "waiting for remaining tasks");
    }
    while !tasks.is_empty() {
        fold_next(&mut tasks, &mut stats).await;
    }

    stats.duration_seconds = started.elapsed().as_secs_f64();
    Ok(stats)
}

async fn fold_next(tasks: &mut JoinSet<TaskOutcome>, stats: &mut RunStats) {
    match tasks.join_next().await {
        Some(Ok(outcome)) => {
            if outcome.uploaded {
                stats.total_studies += outcome.studies;
                stats.total_assays += outcome.assays;
            } else {
                stats.record_failure(outcome.id);
            }
        }
        Some(Err(join_error)) => {
            // The task wrapper catches panics, so this is a runtime-level
            // abort; there is no identifier left to attribute.
            tracing::error!(error = %join_error, "record task was aborted");
        }
        None => {}
    }
}

/// One record's journey: validate → build (with timeout) → upload. Returns
/// whether the upload completed. Every failure path logs its reason.
async fn process_dataset(
    context: &TaskContext,
    dataset: Dataset,
    id: &str,
    studies: u64,
    assays: u64,
) -> bool {
    // Tickets bound the records that are actively building or uploading.
    let _permit = tokio::select! {
        biased;
        _ = context.cancel.cancelled() => return false,
        permit = context.semaphore.clone().acquire_owned() => match permit {
            Ok(permit) => permit,
            Err(_) => return false,
        },
    };

    tracing::info!(
        investigation = id,
        studies,
        assays,
        "starting ARC build"
    );

    if studies > context.max_studies as u64 {
        tracing::warn!(
            investigation = id,
            studies,
            limit = context.max_studies,
            "skipping: study count exceeds limit"
        );
        return false;
    }
    if assays > context.max_assays as u64 {
        tracing::warn!(
            investigation = id,
            assays,
            limit = context.max_assays,
            "skipping: assay count exceeds limit"
        );
        return false;
    }

    // Dropping the timed build future on cancellation cancels the
    // worker-pool future with it.
    let build = tokio::time::timeout(context.build_timeout, context.serializer.build(dataset));
    let json = tokio::select! {
        biased;
        _ = context.cancel.cancelled() => {
            tracing::info!(investigation = id, "build cancelled");
            return false;
        }
        result = build => match result {
            Err(_) => {
                tracing::error!(
                    investigation = id,
                    timeout_secs = context.build_timeout.as_secs(),
                    "ARC generation timed out"
                );
                return false;
            }
            Ok(Err(error)) => {
                tracing::error!(investigation = id, error = %error, "ARC build failed");
                return false;
            }
            Ok(Ok(json)) => json,
        },
    };

    let document: serde_json::Value = match serde_json::from_str(&json) {
        Ok(document) => document,
        Err(error) => {
            tracing::error!(investigation = id, error = %error, "ARC rendering is not valid JSON");
            return false;
        }
    };

    // No upload may begin after cancellation is observed.
    if context.cancel.is_cancelled() {
        tracing::info!(investigation = id, "cancelled before upload");
        return false;
    }

    tracing::info!(
        investigation = id,
        payload_bytes = json.len(),
        "ARC build complete, uploading"
    );

    let upload = context.sink.upload_arc(&context.rdi, document);
    tokio::select! {
        biased;
        _ = context.cancel.cancelled() => {
            // Dropping the request future aborts the in-flight transfer.
            tracing::info!(investigation = id, "upload aborted by cancellation");
            false
        }
        result = upload => match result {
            Ok(status) => {
                tracing::info!(
                    investigation = id,
                    status = status.as_str(),
                    rdi = context.rdi.as_str(),
                    "ARC uploaded"
                );
                true
            }
            Err(error) => {
                tracing::error!(investigation = id, error = %error, "upload failed");
                false
            }
        },
    }
}
