use serde::{Deserialize, Serialize};

use crate::fields::{
    DistributionFields, IdentificationFields, MetadataFields, QualityFields, ReferenceFields,
};
use crate::{xml, SemanticError};

/// Whether a contact describes the metadata record or the resource itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    Metadata,
    Resource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub kind: ContactKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online_resource: Option<String>,
}

impl Contact {
    pub fn new(kind: ContactKind) -> Self {
        Self {
            kind,
            name: None,
            organization: None,
            position: None,
            email: None,
            phone: None,
            role: None,
            address: None,
            city: None,
            region: None,
            postcode: None,
            country: None,
            online_resource: None,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role
            .as_deref()
            .map(|r| r.eq_ignore_ascii_case(role))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationDate {
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_type: Option<String>,
}

/// Spatial resolution: either an equivalent-scale denominator or a ground
/// distance with its unit of measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpatialResolution {
    Scale(u64),
    Distance { value: f64, uom: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionFormat {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineResource {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConformanceResult {
    pub title: String,
    /// `None` when the result carries no pass/fail statement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Canonical, source-independent view of one INSPIRE dataset description.
///
/// Every collection preserves document order. Coordinates, when present, are
/// finite; otherwise the whole extent is absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InspireRecord {
    pub identifier: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_stamp: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topic_categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contacts: Vec<Contact>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub creators: Vec<Contact>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub publishers: Vec<Contact>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contributors: Vec<Contact>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_identifiers: Vec<ResourceIdentifier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citation_dates: Vec<CitationDate>,

    /// `[minx, miny, maxx, maxy]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial_extent: Option<[f64; 4]>,
    /// `(start, end)`; either bound may be open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal_extent: Option<(Option<String>, Option<String>)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spatial_resolutions: Vec<SpatialResolution>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access_constraints: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub use_constraints: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classification: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub other_constraints: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraint_urls: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub distribution_formats: Vec<DistributionFormat>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub online_resources: Vec<OnlineResource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conformance_results: Vec<ConformanceResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_systems: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supplemental_information: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub graphic_overviews: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hierarchy_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_set: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_standard_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_standard_version: Option<String>,
}

impl InspireRecord {
    /// The record's own `gmd:fileIdentifier`, if the document carries one.
    pub fn file_identifier(md: roxmltree::Node<'_, '_>) -> Option<String> {
        xml::char_string_of(md, "fileIdentifier")
    }

    /// Build a record from an `gmd:MD_Metadata` element.
    ///
    /// `identifier` is the authoritative identifier chosen by the caller
    /// (the harvester aligns Dublin Core and ISO identifiers before parsing).
    /// Fails only on the semantic invariants: title and abstract must exist.
    pub fn from_iso(
        md: roxmltree::Node<'_, '_>,
        identifier: String,
    ) -> Result<Self, SemanticError> {
        let metadata = MetadataFields::extract(md);
        let identification = IdentificationFields::extract(md);
        let distribution = DistributionFields::extract(md);
        let quality = QualityFields::extract(md);
        let reference = ReferenceFields::extract(md);

        let mut contacts = metadata.contacts;
        contacts.extend(identification.resource_contacts);

        let title = identification
            .title
            .ok_or_else(|| SemanticError::MissingTitle {
                identifier: identifier.clone(),
            })?;
        let abstract_text =
            identification
                .abstract_text
                .ok_or_else(|| SemanticError::MissingAbstract {
                    identifier: identifier.clone(),
                })?;

        Ok(Self {
            identifier,
            title,
            abstract_text,
            date_stamp: metadata.date_stamp,
            keywords: identification.keywords,
            topic_categories: identification.topic_categories,
            contacts,
            creators: identification.creators,
            publishers: identification.publishers,
            contributors: identification.contributors,
            resource_identifiers: identification.resource_identifiers,
            citation_dates: identification.citation_dates,
            spatial_extent: identification.spatial_extent,
            temporal_extent: identification.temporal_extent,
            spatial_resolutions: identification.spatial_resolutions,
            access_constraints: identification.access_constraints,
            use_constraints: identification.use_constraints,
            classification: identification.classification,
            other_constraints: identification.other_constraints,
            constraint_urls: identification.constraint_urls,
            distribution_formats: distribution.formats,
            online_resources: distribution.online_resources,
            conformance_results: quality.conformance_results,
            reference_systems: reference.reference_systems,
            supplemental_information: identification.supplemental_information,
            graphic_overviews: identification.graphic_overviews,
            lineage: quality.lineage,
            purpose: identification.purpose,
            parent_identifier: metadata.parent_identifier,
            hierarchy_level: metadata.hierarchy_level,
            dataset_uri: metadata.dataset_uri,
            language: metadata.language,
            character_set: metadata.character_set,
            edition: identification.edition,
            status: identification.status,
            metadata_standard_name: metadata.standard_name,
            metadata_standard_version: metadata.standard_version,
        })
    }

    /// Parse a standalone ISO 19139 document.
    pub fn from_iso_str(
        document: &str,
        fallback_identifier: Option<&str>,
    ) -> Result<Self, ParseOutcome> {
        let doc = roxmltree::Document::parse(document).map_err(ParseOutcome::Xml)?;
        let md = doc.root_element();
        let identifier = Self::file_identifier(md)
            .or_else(|| fallback_identifier.map(str::to_string))
            .unwrap_or_default();
        Self::from_iso(md, identifier).map_err(ParseOutcome::Semantic)
    }
}

/// Failure modes of [`InspireRecord::from_iso_str`].
#[derive(Debug, thiserror::Error)]
pub enum ParseOutcome {
    #[error("not well-formed XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error(transparent)]
    Semantic(SemanticError),
}
