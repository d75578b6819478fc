//! Wire types of the `/v1/arcs` endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body: a batch of ARC JSON-LD documents under one RDI namespace.
#[derive(Debug, Serialize)]
pub(crate) struct CreateOrUpdateArcsRequest<'a> {
    pub rdi: &'a str,
    pub arcs: &'a [Value],
}

/// What happened to one uploaded ARC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArcUploadStatus {
    Created,
    Updated,
    #[serde(other)]
    Processed,
}

impl ArcUploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArcUploadStatus::Created => "created",
            ArcUploadStatus::Updated => "updated",
            ArcUploadStatus::Processed => "processed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcUploadResult {
    pub id: String,
    pub status: ArcUploadStatus,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrUpdateArcsResponse {
    pub client_id: String,
    pub message: String,
    pub rdi: String,
    #[serde(default)]
    pub arcs: Vec<ArcUploadResult>,
}
