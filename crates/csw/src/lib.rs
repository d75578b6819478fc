//! Client for harvesting INSPIRE records from an OGC Catalogue Service for
//! the Web (CSW 2.0.2) endpoint.
//!
//! The harvester pages GetRecords in small windows and yields a stream of
//! [`HarvestItem`]s: parsed records, or inline per-record failures that let
//! consumers skip and continue. Infrastructure failures (connection,
//! protocol, service exceptions) are errors of the stream itself.

mod client;
mod request;
mod response;

pub use client::{CswClient, MAX_PAGE_SIZE};
pub use request::{ElementSet, OutputSchema, PropertyFilter, RecordsRequest};
pub use response::{HarvestItem, PageMeta, RecordProcessingError};

#[derive(Debug, thiserror::Error)]
pub enum CswError {
    /// The endpoint could not be reached or the transfer failed.
    #[error("failed to reach CSW endpoint: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("CSW endpoint returned HTTP {status}: {body_prefix}")]
    Http {
        status: reqwest::StatusCode,
        body_prefix: String,
    },

    #[error("CSW service exception: {0}")]
    ServiceException(String),

    #[error("invalid CSW response: {0}")]
    InvalidResponse(String),
}
