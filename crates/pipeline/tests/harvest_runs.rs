mod support;

use std::sync::Arc;
use std::time::Duration;

use csw::{CswError, HarvestItem, RecordProcessingError};
use futures::stream;
use inspire::{InspireRecord, SemanticError};
use pipeline::{run_harvest, HarvestOptions};
use support::{MockSink, SinkMode};
use tokio_util::sync::CancellationToken;

fn record(id: &str) -> HarvestItem {
    HarvestItem::Record(Box::new(InspireRecord {
        identifier: id.into(),
        title: format!("Record {id}"),
        abstract_text: "An abstract".into(),
        ..InspireRecord::default()
    }))
}

fn broken(id: &str) -> HarvestItem {
    HarvestItem::Failed(RecordProcessingError {
        id: id.into(),
        cause: SemanticError::MissingTitle {
            identifier: id.into(),
        },
    })
}

fn options(batch_size: usize) -> HarvestOptions {
    HarvestOptions {
        rdi: "inspire-import".into(),
        batch_size,
        cancel: CancellationToken::new(),
    }
}

#[tokio::test]
async fn records_are_uploaded_in_batches_with_a_final_flush() {
    let sink = Arc::new(MockSink::new(SinkMode::Accept));
    let items: Vec<Result<HarvestItem, CswError>> =
        vec![Ok(record("a")), Ok(record("b")), Ok(record("c"))];

    let stats = run_harvest(stream::iter(items), sink.clone(), options(2))
        .await
        .unwrap();

    assert_eq!(stats.found_datasets, 3);
    assert_eq!(stats.failed_datasets, 0);
    // One study and one assay per INSPIRE record.
    assert_eq!(stats.total_studies, 3);
    assert_eq!(stats.total_assays, 3);
    // Two records in the first request, one in the final flush.
    assert_eq!(sink.calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    assert_eq!(sink.uploaded_identifiers(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn inline_failures_are_skipped_and_counted() {
    let sink = Arc::new(MockSink::new(SinkMode::Accept));
    let items: Vec<Result<HarvestItem, CswError>> =
        vec![Ok(record("a")), Ok(broken("bad")), Ok(record("c"))];

    let stats = run_harvest(stream::iter(items), sink.clone(), options(10))
        .await
        .unwrap();

    assert_eq!(stats.found_datasets, 3);
    assert_eq!(stats.failed_ids, vec!["bad"]);
    assert_eq!(sink.uploaded_identifiers(), vec!["a", "c"]);

    let report = stats.to_jsonld("Harvest Run", "Test", None);
    assert_eq!(report["status"], "schema:FailedActionStatus");
}

#[tokio::test]
async fn a_rejected_batch_fails_all_of_its_records() {
    let sink = Arc::new(MockSink::new(SinkMode::Forbidden));
    let items: Vec<Result<HarvestItem, CswError>> = vec![Ok(record("a")), Ok(record("b"))];

    let stats = run_harvest(stream::iter(items), sink.clone(), options(10))
        .await
        .unwrap();

    assert_eq!(stats.found_datasets, 2);
    assert_eq!(stats.failed_ids, vec!["a", "b"]);
    assert_eq!(stats.total_studies, 0);
}

#[tokio::test]
async fn a_connection_error_ends_the_run() {
    let sink = Arc::new(MockSink::new(SinkMode::Accept));
    let items: Vec<Result<HarvestItem, CswError>> = vec![
        Ok(record("a")),
        Err(CswError::ServiceException("backend gone".into())),
    ];

    let err = run_harvest(stream::iter(items), sink, options(10))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("CSW"));
    // The record that was batched but never sent is accounted as failed.
    assert_eq!(err.stats.failed_ids, vec!["a"]);
}

#[tokio::test]
async fn a_pre_cancelled_harvest_uploads_nothing() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let sink = Arc::new(MockSink::new(SinkMode::Accept));
    let items: Vec<Result<HarvestItem, CswError>> = vec![Ok(record("a")), Ok(record("b"))];

    let stats = run_harvest(
        stream::iter(items),
        sink.clone(),
        HarvestOptions {
            cancel,
            ..options(10)
        },
    )
    .await
    .unwrap();

    assert_eq!(stats.found_datasets, 0);
    assert_eq!(sink.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn slow_sink_still_processes_every_record() {
    let sink = Arc::new(MockSink::new(SinkMode::Slow(Duration::from_millis(5))));
    let items: Vec<Result<HarvestItem, CswError>> =
        (0..5).map(|i| Ok(record(&format!("r{i}")))).collect();

    let stats = run_harvest(stream::iter(items), sink.clone(), options(2))
        .await
        .unwrap();
    assert_eq!(stats.found_datasets, 5);
    assert_eq!(sink.uploaded_identifiers().len(), 5);
}
