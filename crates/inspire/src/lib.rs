//! Canonical representation of an INSPIRE metadata record and its extraction
//! from ISO 19139 XML.
//!
//! Extraction is deliberately forgiving: a missing element or attribute
//! leaves the field empty, a numeric value that fails to parse drops the
//! field. The only hard requirements are a title and an abstract — records
//! without them are rejected with a [`SemanticError`].

mod fields;
mod record;
mod xml;

pub use record::{
    CitationDate, ConformanceResult, Contact, ContactKind, DistributionFormat, InspireRecord,
    OnlineResource, ParseOutcome, ResourceIdentifier, SpatialResolution,
};

/// A record that violates the invariants every INSPIRE record must satisfy.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SemanticError {
    #[error("record '{identifier}' has no title")]
    MissingTitle { identifier: String },

    #[error("record '{identifier}' has no abstract")]
    MissingAbstract { identifier: String },
}

impl SemanticError {
    pub fn identifier(&self) -> &str {
        match self {
            SemanticError::MissingTitle { identifier }
            | SemanticError::MissingAbstract { identifier } => identifier,
        }
    }
}
