//! Pure mapping from source records to ARC trees.
//!
//! Two front-ends share the target model: [`inspire_to_arc`] turns one
//! harvested INSPIRE record into an investigation/study/assay triple, and
//! [`sql`] maps database rows. Both are deterministic and do no I/O.

mod inspire_to_arc;
pub mod sql;

pub use inspire_to_arc::map_record as map_inspire_record;
pub use sql::build_dataset_arc;

use arc_models::ArcError;

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("record identifier is empty")]
    EmptyIdentifier,

    #[error(transparent)]
    Arc(#[from] ArcError),
}
