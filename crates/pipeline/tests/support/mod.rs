#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use api_client::{
    ApiClientError, ArcUploadResult, ArcUploadStatus, CreateOrUpdateArcsResponse,
};
use async_trait::async_trait;
use pipeline::{ArcSink, BuildError, SerializerWorker};
use serde_json::Value;
use sql_source::{AssayRow, Dataset, InvestigationRow, StudyRow};

pub fn investigation(id: i64) -> InvestigationRow {
    InvestigationRow {
        id,
        title: Some(format!("Investigation {id}")),
        description: None,
        submission_time: None,
        release_time: None,
    }
}

pub fn study(id: i64, investigation_id: i64) -> StudyRow {
    StudyRow {
        id,
        investigation_id,
        title: None,
        description: None,
        submission_time: None,
        release_time: None,
    }
}

pub fn assay(id: i64, study_id: i64) -> AssayRow {
    AssayRow {
        id,
        study_id,
        measurement_type: None,
        technology_type: None,
    }
}

pub fn dataset(id: i64, studies: Vec<StudyRow>, assays: Vec<AssayRow>) -> Dataset {
    let mut assays_by_study: HashMap<i64, Vec<AssayRow>> = HashMap::new();
    for a in assays {
        assays_by_study.entry(a.study_id).or_default().push(a);
    }
    Dataset {
        investigation: investigation(id),
        studies,
        assays_by_study,
    }
}

pub fn empty_dataset(id: i64) -> Dataset {
    dataset(id, Vec::new(), Vec::new())
}

/// Identifier of the root data entity of an uploaded RO-Crate document.
pub fn root_identifier(document: &Value) -> String {
    document["@graph"]
        .as_array()
        .and_then(|graph| graph.iter().find(|node| node["@id"] == "./"))
        .and_then(|root| root["identifier"].as_str())
        .unwrap_or_default()
        .to_string()
}

#[derive(Clone, Copy)]
pub enum SinkMode {
    Accept,
    Forbidden,
    /// Panic when uploading the record with this root identifier.
    PanicOn(i64),
    /// Hold each upload for the given duration before accepting.
    Slow(Duration),
}

pub struct MockSink {
    mode: SinkMode,
    pub uploads: Mutex<Vec<(String, Value)>>,
    pub calls: AtomicUsize,
    current: AtomicUsize,
    pub peak_concurrency: AtomicUsize,
}

impl MockSink {
    pub fn new(mode: SinkMode) -> Self {
        Self {
            mode,
            uploads: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            current: AtomicUsize::new(0),
            peak_concurrency: AtomicUsize::new(0),
        }
    }

    pub fn uploaded_identifiers(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn uploaded_documents(&self) -> Vec<Value> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(_, doc)| doc.clone())
            .collect()
    }

    async fn track<T>(&self, work: impl std::future::Future<Output = T>) -> T {
        let live = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_concurrency.fetch_max(live, Ordering::SeqCst);
        let out = work.await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        out
    }

    fn accept(&self, rdi: &str, ids: Vec<String>, docs: Vec<Value>) -> CreateOrUpdateArcsResponse {
        let mut uploads = self.uploads.lock().unwrap();
        let arcs = ids
            .iter()
            .map(|id| ArcUploadResult {
                id: id.clone(),
                status: ArcUploadStatus::Created,
                timestamp: "2026-01-01T00:00:00Z".into(),
            })
            .collect();
        for (id, doc) in ids.into_iter().zip(docs) {
            uploads.push((id, doc));
        }
        CreateOrUpdateArcsResponse {
            client_id: "mock".into(),
            message: "ok".into(),
            rdi: rdi.into(),
            arcs,
        }
    }

    fn forbidden() -> ApiClientError {
        ApiClientError::Http {
            status: reqwest::StatusCode::FORBIDDEN,
            body_prefix: "Forbidden".into(),
        }
    }
}

#[async_trait]
impl ArcSink for MockSink {
    async fn upload_arc(&self, rdi: &str, arc: Value) -> Result<ArcUploadStatus, ApiClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let id = root_identifier(&arc);
        self.track(async {
            match self.mode {
                SinkMode::Accept => {}
                SinkMode::Forbidden => return Err(Self::forbidden()),
                SinkMode::PanicOn(panic_id) => {
                    if id == panic_id.to_string() {
                        panic!("sink exploded on {id}");
                    }
                }
                SinkMode::Slow(delay) => tokio::time::sleep(delay).await,
            }
            self.accept(rdi, vec![id.clone()], vec![arc]);
            Ok(ArcUploadStatus::Created)
        })
        .await
    }

    async fn upload_arcs(
        &self,
        rdi: &str,
        arcs: Vec<Value>,
    ) -> Result<CreateOrUpdateArcsResponse, ApiClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let ids: Vec<String> = arcs.iter().map(root_identifier).collect();
        self.track(async {
            match self.mode {
                SinkMode::Forbidden => Err(Self::forbidden()),
                SinkMode::Slow(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(self.accept(rdi, ids, arcs))
                }
                _ => Ok(self.accept(rdi, ids, arcs)),
            }
        })
        .await
    }
}

/// A serializer that takes a configurable amount of wall-clock time.
pub struct SlowSerializer(pub Duration);

#[async_trait]
impl SerializerWorker for SlowSerializer {
    async fn build(&self, dataset: Dataset) -> Result<String, BuildError> {
        tokio::time::sleep(self.0).await;
        pipeline::InProcessSerializer.build(dataset).await
    }
}
