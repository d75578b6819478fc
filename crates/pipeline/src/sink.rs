//! Upload seam between the scheduler and the downstream API.

use api_client::{ApiClient, ApiClientError, ArcUploadStatus, CreateOrUpdateArcsResponse};
use async_trait::async_trait;
use serde_json::Value;

/// Destination for rendered ARC documents. Implementations must be safe for
/// concurrent use; every upload task shares one sink.
#[async_trait]
pub trait ArcSink: Send + Sync {
    /// Upload one ARC and report the observed status.
    async fn upload_arc(&self, rdi: &str, arc: Value) -> Result<ArcUploadStatus, ApiClientError>;

    /// Upload a batch in one request.
    async fn upload_arcs(
        &self,
        rdi: &str,
        arcs: Vec<Value>,
    ) -> Result<CreateOrUpdateArcsResponse, ApiClientError>;
}

#[async_trait]
impl ArcSink for ApiClient {
    async fn upload_arc(&self, rdi: &str, arc: Value) -> Result<ArcUploadStatus, ApiClientError> {
        let response = self.create_or_update_arc(rdi, arc).await?;
        Ok(response
            .arcs
            .first()
            .map(|result| result.status)
            .unwrap_or(ArcUploadStatus::Processed))
    }

    async fn upload_arcs(
        &self,
        rdi: &str,
        arcs: Vec<Value>,
    ) -> Result<CreateOrUpdateArcsResponse, ApiClientError> {
        self.create_or_update_arcs(rdi, arcs).await
    }
}
