//! The CPU-bound build step, behind a seam the scheduler can swap.
//!
//! Building an ARC tree and rendering its JSON-LD dominates CPU for large
//! investigations and must not run on the I/O loop. Only the rendered string
//! crosses back from a worker; the tree itself is dropped inside it.

use std::sync::Arc;

use arc_mapper::MapError;
use async_trait::async_trait;
use sql_source::Dataset;
use tokio::sync::Semaphore;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Map(#[from] MapError),

    #[error("serializer worker failed: {0}")]
    Worker(String),
}

/// Builds the ARC for one dataset and returns its JSON-LD rendering.
#[async_trait]
pub trait SerializerWorker: Send + Sync {
    async fn build(&self, dataset: Dataset) -> Result<String, BuildError>;
}

/// Builds on the calling task. Used in tests and for tiny runs where the
/// pool overhead is not worth it.
pub struct InProcessSerializer;

#[async_trait]
impl SerializerWorker for InProcessSerializer {
    async fn build(&self, dataset: Dataset) -> Result<String, BuildError> {
        let arc = arc_mapper::build_dataset_arc(&dataset)?;
        Ok(arc.to_rocrate_json_string())
    }
}

/// Offloads builds to the blocking thread pool, at most `workers` at a time.
///
/// A blocking job cannot be interrupted once started. The semaphore permit
/// travels into the job, so when a caller gives up (per-record timeout) the
/// pool slot is still released the moment the orphaned build finishes.
pub struct ThreadPoolSerializer {
    permits: Arc<Semaphore>,
}

impl ThreadPoolSerializer {
    pub fn new(workers: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(workers.max(1))),
        }
    }
}

#[async_trait]
impl SerializerWorker for ThreadPoolSerializer {
    async fn build(&self, dataset: Dataset) -> Result<String, BuildError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| BuildError::Worker("serializer pool is shut down".into()))?;

        let handle = tokio::task::spawn_blocking(move || {
            let result = arc_mapper::build_dataset_arc(&dataset)
                .map(|arc| arc.to_rocrate_json_string());
            drop(dataset);
            drop(permit);
            result
        });

        match handle.await {
            Ok(result) => Ok(result?),
            Err(join_error) => Err(BuildError::Worker(join_error.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sql_source::InvestigationRow;
    use std::collections::HashMap;

    fn dataset(id: i64) -> Dataset {
        Dataset {
            investigation: InvestigationRow {
                id,
                title: Some("t".into()),
                description: None,
                submission_time: None,
                release_time: None,
            },
            studies: Vec::new(),
            assays_by_study: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn in_process_and_pool_builds_agree() {
        let in_process = InProcessSerializer.build(dataset(7)).await.unwrap();
        let pooled = ThreadPoolSerializer::new(2)
            .build(dataset(7))
            .await
            .unwrap();
        assert_eq!(in_process, pooled);
        assert!(in_process.contains("\"identifier\":\"7\""));
    }

    #[tokio::test]
    async fn pool_bounds_concurrent_builds() {
        let serializer = ThreadPoolSerializer::new(1);
        // Two builds through a single slot still both complete.
        let a = serializer.build(dataset(1));
        let b = serializer.build(dataset(2));
        let (a, b) = tokio::join!(a, b);
        assert!(a.is_ok() && b.is_ok());
    }
}
