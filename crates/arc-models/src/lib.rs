//! In-memory model of an Annotated Research Context (ARC): one Investigation
//! owning Studies, each owning Assays, plus the typed collections hanging off
//! them (persons, publications, comments, annotation tables).
//!
//! The tree is built bottom-up: children are constructed first and then
//! registered into their parent, which is where identifier uniqueness is
//! enforced. Serialization renders the whole tree as a single RO-Crate
//! JSON-LD document.

mod entities;
mod rocrate;
mod table;

pub use entities::{
    ArcAssay, ArcContainer, ArcInvestigation, ArcStudy, Comment, OntologyAnnotation, Person,
    Publication,
};
pub use table::{ArcColumn, ArcTable, CompositeCell, CompositeHeader};

/// Error type for ARC tree construction.
#[derive(Debug, thiserror::Error)]
pub enum ArcError {
    #[error("identifier must not be empty")]
    EmptyIdentifier,

    #[error("duplicate {kind} identifier '{identifier}' within '{parent}'")]
    DuplicateIdentifier {
        kind: &'static str,
        identifier: String,
        parent: String,
    },
}
