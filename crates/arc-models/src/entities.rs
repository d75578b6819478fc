use serde::{Deserialize, Serialize};

use crate::table::ArcTable;
use crate::ArcError;

/// A term annotation: a human-readable name plus optional accession and
/// source reference when the term comes from an ontology.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OntologyAnnotation {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_accession: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_source: Option<String>,
}

impl OntologyAnnotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            term_accession: None,
            term_source: None,
        }
    }

    pub fn with_accession(
        name: impl Into<String>,
        accession: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            term_accession: Some(accession.into()),
            term_source: Some(source.into()),
        }
    }
}

/// A named free-text annotation attached to an investigation, study or assay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Comment {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mid_initials: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<OntologyAnnotation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
}

impl Person {
    /// True if the person carries a role annotation with the given name,
    /// compared case-insensitively.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles
            .iter()
            .any(|r| r.name.eq_ignore_ascii_case(role))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Publication {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pub_med_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArcAssay {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_type: Option<OntologyAnnotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology_type: Option<OntologyAnnotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology_platform: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<ArcTable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
}

impl ArcAssay {
    pub fn new(identifier: impl Into<String>) -> Result<Self, ArcError> {
        let identifier = identifier.into();
        if identifier.trim().is_empty() {
            return Err(ArcError::EmptyIdentifier);
        }
        Ok(Self {
            identifier,
            ..Self::default()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArcStudy {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<ArcTable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assays: Vec<ArcAssay>,
}

impl ArcStudy {
    pub fn new(identifier: impl Into<String>) -> Result<Self, ArcError> {
        let identifier = identifier.into();
        if identifier.trim().is_empty() {
            return Err(ArcError::EmptyIdentifier);
        }
        Ok(Self {
            identifier,
            ..Self::default()
        })
    }

    /// Register an assay under this study. Each assay belongs to exactly one
    /// study and its identifier must be unique within it.
    pub fn add_registered_assay(&mut self, assay: ArcAssay) -> Result<(), ArcError> {
        if self.assays.iter().any(|a| a.identifier == assay.identifier) {
            return Err(ArcError::DuplicateIdentifier {
                kind: "assay",
                identifier: assay.identifier,
                parent: self.identifier.clone(),
            });
        }
        self.assays.push(assay);
        Ok(())
    }

    pub fn add_table(&mut self, table: ArcTable) {
        self.tables.push(table);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArcInvestigation {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contacts: Vec<Person>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub publications: Vec<Publication>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub studies: Vec<ArcStudy>,
}

impl ArcInvestigation {
    pub fn new(identifier: impl Into<String>) -> Result<Self, ArcError> {
        let identifier = identifier.into();
        if identifier.trim().is_empty() {
            return Err(ArcError::EmptyIdentifier);
        }
        Ok(Self {
            identifier,
            ..Self::default()
        })
    }

    /// Register a study under this investigation. Identifiers are unique
    /// within the investigation.
    pub fn add_registered_study(&mut self, study: ArcStudy) -> Result<(), ArcError> {
        if self.studies.iter().any(|s| s.identifier == study.identifier) {
            return Err(ArcError::DuplicateIdentifier {
                kind: "study",
                identifier: study.identifier,
                parent: self.identifier.clone(),
            });
        }
        self.studies.push(study);
        Ok(())
    }
}

/// The ARC container wrapping one investigation tree. Exists to own the
/// RO-Crate rendering entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcContainer {
    pub investigation: ArcInvestigation,
}

impl ArcContainer {
    pub fn from_investigation(investigation: ArcInvestigation) -> Self {
        Self { investigation }
    }

    /// Render the tree as an RO-Crate JSON-LD document.
    pub fn to_rocrate_value(&self) -> serde_json::Value {
        crate::rocrate::render(&self.investigation)
    }

    /// Render the tree as an RO-Crate JSON-LD string. Map keys are emitted
    /// in sorted order, so rendering the same tree twice yields identical
    /// bytes.
    pub fn to_rocrate_json_string(&self) -> String {
        self.to_rocrate_value().to_string()
    }
}
