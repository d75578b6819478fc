//! Mutually-authenticated JSON client for the ARC ingest API.
//!
//! The client is constructed once from configuration and shared by all
//! upload tasks; `reqwest::Client` is internally reference-counted and safe
//! for concurrent use. Construction fails fast when a certificate file is
//! missing or unreadable, naming the offending file.

mod models;

pub use models::{ArcUploadResult, ArcUploadStatus, CreateOrUpdateArcsResponse};

use std::path::{Path, PathBuf};

use middleware_config::ApiClientConfig;
use serde_json::Value;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("{kind} not found: {path:?}")]
    MissingFile { kind: &'static str, path: PathBuf },

    #[error("failed to read {kind} at {path:?}")]
    ReadFile {
        kind: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{kind} at {path:?} contains no usable PEM data")]
    InvalidPem { kind: &'static str, path: PathBuf },

    #[error("invalid API URL '{0}'")]
    InvalidUrl(String),

    #[error("failed to build TLS client")]
    Tls(#[source] reqwest::Error),

    #[error("HTTP error {status}: {body_prefix}")]
    Http {
        status: reqwest::StatusCode,
        body_prefix: String,
    },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
}

const CLIENT_CERT: &str = "Client certificate";
const CLIENT_KEY: &str = "Client key";
const CA_CERT: &str = "CA certificate";

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    arcs_endpoint: Url,
}

impl ApiClient {
    pub fn new(config: &ApiClientConfig) -> Result<Self, ApiClientError> {
        let cert_pem = read_pem_file(CLIENT_CERT, &config.client_cert_path, PemKind::Certificate)?;
        let key_pem = read_pem_file(CLIENT_KEY, &config.client_key_path, PemKind::PrivateKey)?;

        // rustls takes the client certificate chain and key from one PEM
        // bundle.
        let mut identity_pem = cert_pem;
        identity_pem.extend_from_slice(&key_pem);
        let identity =
            reqwest::Identity::from_pem(&identity_pem).map_err(ApiClientError::Tls)?;

        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .identity(identity)
            .timeout(config.request_timeout());

        if let Some(ca_path) = &config.ca_cert_path {
            let ca_pem = read_pem_file(CA_CERT, ca_path, PemKind::Certificate)?;
            let ca = reqwest::Certificate::from_pem(&ca_pem).map_err(ApiClientError::Tls)?;
            builder = builder.add_root_certificate(ca);
        }

        let http = builder.build().map_err(ApiClientError::Tls)?;

        // Joining on the parsed URL would drop a path-carrying base's last
        // segment, so the endpoint is appended textually.
        let endpoint = format!("{}/v1/arcs", config.api_url.trim_end_matches('/'));
        let arcs_endpoint = Url::parse(&endpoint)
            .map_err(|_| ApiClientError::InvalidUrl(config.api_url.clone()))?;

        Ok(Self {
            http,
            arcs_endpoint,
        })
    }

    /// Upload one ARC document.
    pub async fn create_or_update_arc(
        &self,
        rdi: &str,
        arc: Value,
    ) -> Result<CreateOrUpdateArcsResponse, ApiClientError> {
        self.create_or_update_arcs(rdi, vec![arc]).await
    }

    /// Upload a batch of ARC documents in one request.
    #[tracing::instrument(skip(self, arcs), fields(count = arcs.len()))]
    pub async fn create_or_update_arcs(
        &self,
        rdi: &str,
        arcs: Vec<Value>,
    ) -> Result<CreateOrUpdateArcsResponse, ApiClientError> {
        let body = models::CreateOrUpdateArcsRequest { rdi, arcs: &arcs };

        let response = self
            .http
            .post(self.arcs_endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiClientError::Http {
                status,
                body_prefix: text.chars().take(500).collect(),
            });
        }

        let parsed: CreateOrUpdateArcsResponse = response.json().await?;
        tracing::debug!(
            rdi = parsed.rdi.as_str(),
            accepted = parsed.arcs.len(),
            "uploaded ARCs"
        );
        Ok(parsed)
    }
}

enum PemKind {
    Certificate,
    PrivateKey,
}

/// Read and sanity-check a PEM file: it must exist, be readable, and hold at
/// least one item of the expected kind.
fn read_pem_file(
    kind: &'static str,
    path: &Path,
    expected: PemKind,
) -> Result<Vec<u8>, ApiClientError> {
    if !path.is_file() {
        return Err(ApiClientError::MissingFile {
            kind,
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path).map_err(|source| ApiClientError::ReadFile {
        kind,
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = std::io::BufReader::new(bytes.as_slice());
    let found = rustls_pemfile::read_all(&mut reader)
        .filter_map(Result::ok)
        .any(|item| match (&expected, item) {
            (PemKind::Certificate, rustls_pemfile::Item::X509Certificate(_)) => true,
            (
                PemKind::PrivateKey,
                rustls_pemfile::Item::Pkcs1Key(_)
                | rustls_pemfile::Item::Pkcs8Key(_)
                | rustls_pemfile::Item::Sec1Key(_),
            ) => true,
            _ => false,
        });
    if !found {
        return Err(ApiClientError::InvalidPem {
            kind,
            path: path.to_path_buf(),
        });
    }

    Ok(bytes)
}
