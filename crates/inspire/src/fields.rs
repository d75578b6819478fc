//! Field-family extractors over an ISO 19139 `gmd:MD_Metadata` element.
//!
//! Each family groups the attributes that live under one branch of the
//! document and knows how to pull them defensively. The grouping replaces
//! scattered per-attribute probing with one declarative pass per branch.

use roxmltree::Node;

use crate::record::{
    CitationDate, ConformanceResult, Contact, ContactKind, DistributionFormat, OnlineResource,
    ResourceIdentifier, SpatialResolution,
};
use crate::xml;

/// Metadata-level fields: everything that describes the record rather than
/// the resource.
#[derive(Debug, Default)]
pub(crate) struct MetadataFields {
    pub date_stamp: Option<String>,
    pub language: Option<String>,
    pub character_set: Option<String>,
    pub parent_identifier: Option<String>,
    pub hierarchy_level: Option<String>,
    pub dataset_uri: Option<String>,
    pub standard_name: Option<String>,
    pub standard_version: Option<String>,
    pub contacts: Vec<Contact>,
}

impl MetadataFields {
    pub fn extract(md: Node<'_, '_>) -> Self {
        let language = xml::child(md, "language").and_then(|n| {
            xml::code_list_value(n, "LanguageCode").or_else(|| xml::char_string(n))
        });

        Self {
            date_stamp: xml::child(md, "dateStamp").and_then(xml::date_value),
            language,
            character_set: xml::child(md, "characterSet")
                .and_then(|n| xml::code_list_value(n, "MD_CharacterSetCode")),
            parent_identifier: xml::char_string_of(md, "parentIdentifier"),
            hierarchy_level: xml::child(md, "hierarchyLevel")
                .and_then(|n| xml::code_list_value(n, "MD_ScopeCode")),
            dataset_uri: xml::char_string_of(md, "dataSetURI"),
            standard_name: xml::char_string_of(md, "metadataStandardName"),
            standard_version: xml::char_string_of(md, "metadataStandardVersion"),
            contacts: xml::children(md, "contact")
                .filter_map(|n| parse_contact(n, ContactKind::Metadata))
                .collect(),
        }
    }
}

/// Fields under `gmd:identificationInfo`.
#[derive(Debug, Default)]
pub(crate) struct IdentificationFields {
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub purpose: Option<String>,
    pub edition: Option<String>,
    pub status: Option<String>,
    pub keywords: Vec<String>,
    pub topic_categories: Vec<String>,
    pub creators: Vec<Contact>,
    pub publishers: Vec<Contact>,
    pub contributors: Vec<Contact>,
    pub resource_contacts: Vec<Contact>,
    pub resource_identifiers: Vec<ResourceIdentifier>,
    pub citation_dates: Vec<CitationDate>,
    pub spatial_extent: Option<[f64; 4]>,
    pub temporal_extent: Option<(Option<String>, Option<String>)>,
    pub spatial_resolutions: Vec<SpatialResolution>,
    pub access_constraints: Vec<String>,
    pub use_constraints: Vec<String>,
    pub classification: Vec<String>,
    pub other_constraints: Vec<String>,
    pub constraint_urls: Vec<String>,
    pub supplemental_information: Vec<String>,
    pub graphic_overviews: Vec<String>,
}

impl IdentificationFields {
    pub fn extract(md: Node<'_, '_>) -> Self {
        let mut out = Self::default();

        // Both data and service identification share the citation layout.
        let Some(ident) = xml::child(md, "identificationInfo").and_then(|info| {
            xml::child(info, "MD_DataIdentification")
                .or_else(|| xml::child(info, "SV_ServiceIdentification"))
        }) else {
            return out;
        };

        if let Some(citation) = xml::descend(ident, &["citation", "CI_Citation"]) {
            out.title = xml::char_string_of(citation, "title");
            out.edition = xml::char_string_of(citation, "edition");
            out.citation_dates = xml::children(citation, "date")
                .filter_map(|wrapper| xml::child(wrapper, "CI_Date"))
                .filter_map(|ci_date| {
                    let date = xml::child(ci_date, "date").and_then(xml::date_value)?;
                    let date_type = xml::child(ci_date, "dateType")
                        .and_then(|n| xml::code_list_value(n, "CI_DateTypeCode"));
                    Some(CitationDate { date, date_type })
                })
                .collect();
            out.resource_identifiers = xml::children(citation, "identifier")
                .filter_map(|wrapper| {
                    xml::child(wrapper, "MD_Identifier")
                        .or_else(|| xml::child(wrapper, "RS_Identifier"))
                })
                .filter_map(parse_resource_identifier)
                .collect();
        }

        out.abstract_text = xml::char_string_of(ident, "abstract");
        out.purpose = xml::char_string_of(ident, "purpose");
        out.status =
            xml::child(ident, "status").and_then(|n| xml::code_list_value(n, "MD_ProgressCode"));

        out.keywords = xml::children(ident, "descriptiveKeywords")
            .filter_map(|n| xml::child(n, "MD_Keywords"))
            .flat_map(|kw| xml::children(kw, "keyword"))
            .filter_map(xml::char_string)
            .collect();

        out.topic_categories = xml::children(ident, "topicCategory")
            .filter_map(|n| {
                xml::char_string_of(n, "MD_TopicCategoryCode").or_else(|| xml::text(n))
            })
            .collect();

        for contact in xml::children(ident, "pointOfContact")
            .filter_map(|n| parse_contact(n, ContactKind::Resource))
        {
            // The role decides which set the party lands in, mirroring how
            // catalogues distinguish originators, publishers and authors.
            match contact.role.as_deref() {
                Some(r) if r.eq_ignore_ascii_case("originator") => out.creators.push(contact),
                Some(r) if r.eq_ignore_ascii_case("publisher") => out.publishers.push(contact),
                Some(r) if r.eq_ignore_ascii_case("author") => out.contributors.push(contact),
                _ => out.resource_contacts.push(contact),
            }
        }

        out.graphic_overviews = xml::children(ident, "graphicOverview")
            .filter_map(|n| xml::child(n, "MD_BrowseGraphic"))
            .filter_map(|n| xml::char_string_of(n, "fileName"))
            .collect();

        out.supplemental_information = xml::children(ident, "supplementalInformation")
            .filter_map(xml::char_string)
            .collect();

        for constraints in xml::children(ident, "resourceConstraints") {
            Self::extract_constraints(constraints, &mut out);
        }

        out.spatial_resolutions = xml::children(ident, "spatialResolution")
            .filter_map(|n| xml::child(n, "MD_Resolution"))
            .filter_map(parse_resolution)
            .collect();

        for extent in
            xml::children(ident, "extent").filter_map(|n| xml::child(n, "EX_Extent"))
        {
            if out.spatial_extent.is_none() {
                out.spatial_extent = parse_bounding_box(extent);
            }
            if out.temporal_extent.is_none() {
                out.temporal_extent = parse_temporal_extent(extent);
            }
        }

        out
    }

    fn extract_constraints(wrapper: Node<'_, '_>, out: &mut Self) {
        if let Some(legal) = xml::child(wrapper, "MD_LegalConstraints") {
            out.access_constraints.extend(
                xml::children(legal, "accessConstraints")
                    .filter_map(|n| xml::code_list_value(n, "MD_RestrictionCode")),
            );
            out.use_constraints.extend(
                xml::children(legal, "useConstraints")
                    .filter_map(|n| xml::code_list_value(n, "MD_RestrictionCode")),
            );
            for other in xml::children(legal, "otherConstraints") {
                if let Some(text) = xml::char_string(other) {
                    out.other_constraints.push(text);
                }
                if let Some(href) = xml::child(other, "Anchor")
                    .and_then(|a| a.attributes().find(|at| at.name() == "href"))
                {
                    out.constraint_urls.push(href.value().to_string());
                }
            }
        }
        if let Some(security) = xml::child(wrapper, "MD_SecurityConstraints") {
            out.classification.extend(
                xml::children(security, "classification")
                    .filter_map(|n| xml::code_list_value(n, "MD_ClassificationCode")),
            );
        }
    }
}

/// Fields under `gmd:distributionInfo`.
#[derive(Debug, Default)]
pub(crate) struct DistributionFields {
    pub formats: Vec<DistributionFormat>,
    pub online_resources: Vec<OnlineResource>,
}

impl DistributionFields {
    pub fn extract(md: Node<'_, '_>) -> Self {
        let mut out = Self::default();
        let Some(distribution) =
            xml::descend(md, &["distributionInfo", "MD_Distribution"])
        else {
            return out;
        };

        out.formats = xml::children(distribution, "distributionFormat")
            .filter_map(|n| xml::child(n, "MD_Format"))
            .filter_map(|format| {
                let name = xml::char_string_of(format, "name")?;
                let version = xml::char_string_of(format, "version");
                Some(DistributionFormat { name, version })
            })
            .collect();

        out.online_resources = xml::children(distribution, "transferOptions")
            .filter_map(|n| xml::child(n, "MD_DigitalTransferOptions"))
            .flat_map(|opts| xml::children(opts, "onLine"))
            .filter_map(|n| xml::child(n, "CI_OnlineResource"))
            .filter_map(|resource| {
                let url = xml::url_of(resource, "linkage")?;
                Some(OnlineResource {
                    url,
                    name: xml::char_string_of(resource, "name"),
                    description: xml::char_string_of(resource, "description"),
                    protocol: xml::char_string_of(resource, "protocol"),
                })
            })
            .collect();

        out
    }
}

/// Fields under `gmd:dataQualityInfo`.
#[derive(Debug, Default)]
pub(crate) struct QualityFields {
    pub lineage: Option<String>,
    pub conformance_results: Vec<ConformanceResult>,
}

impl QualityFields {
    pub fn extract(md: Node<'_, '_>) -> Self {
        let mut out = Self::default();
        for quality in
            xml::children(md, "dataQualityInfo").filter_map(|n| xml::child(n, "DQ_DataQuality"))
        {
            if out.lineage.is_none() {
                out.lineage = xml::descend(quality, &["lineage", "LI_Lineage"])
                    .and_then(|n| xml::char_string_of(n, "statement"));
            }

            // Reports nest the result under varying DQ_* element names, so
            // scan descendants for conformance results directly.
            for result in quality
                .descendants()
                .filter(|n| n.is_element() && n.tag_name().name() == "DQ_ConformanceResult")
            {
                let title = xml::descend(result, &["specification", "CI_Citation"])
                    .and_then(|n| xml::char_string_of(n, "title"));
                let Some(title) = title else { continue };
                out.conformance_results.push(ConformanceResult {
                    title,
                    degree: xml::child(result, "pass").and_then(xml::boolean),
                    explanation: xml::char_string_of(result, "explanation"),
                });
            }
        }
        out
    }
}

/// Reference-system fields.
#[derive(Debug, Default)]
pub(crate) struct ReferenceFields {
    pub reference_systems: Vec<String>,
}

impl ReferenceFields {
    pub fn extract(md: Node<'_, '_>) -> Self {
        Self {
            reference_systems: xml::children(md, "referenceSystemInfo")
                .filter_map(|n| xml::child(n, "MD_ReferenceSystem"))
                .filter_map(|n| {
                    xml::child(n, "referenceSystemIdentifier").and_then(|wrapper| {
                        xml::child(wrapper, "RS_Identifier")
                            .or_else(|| xml::child(wrapper, "MD_Identifier"))
                    })
                })
                .filter_map(|id| xml::char_string_of(id, "code"))
                .collect(),
        }
    }
}

fn parse_contact(wrapper: Node<'_, '_>, kind: ContactKind) -> Option<Contact> {
    let party = xml::child(wrapper, "CI_ResponsibleParty")?;
    let mut contact = Contact::new(kind);
    contact.name = xml::char_string_of(party, "individualName");
    contact.organization = xml::char_string_of(party, "organisationName");
    contact.position = xml::char_string_of(party, "positionName");
    contact.role =
        xml::child(party, "role").and_then(|n| xml::code_list_value(n, "CI_RoleCode"));

    if let Some(info) = xml::descend(party, &["contactInfo", "CI_Contact"]) {
        contact.phone = xml::descend(info, &["phone", "CI_Telephone"])
            .and_then(|n| xml::char_string_of(n, "voice"));
        if let Some(address) = xml::descend(info, &["address", "CI_Address"]) {
            contact.address = xml::char_string_of(address, "deliveryPoint");
            contact.city = xml::char_string_of(address, "city");
            contact.region = xml::char_string_of(address, "administrativeArea");
            contact.postcode = xml::char_string_of(address, "postalCode");
            contact.country = xml::char_string_of(address, "country");
            contact.email = xml::char_string_of(address, "electronicMailAddress");
        }
        contact.online_resource = xml::descend(info, &["onlineResource", "CI_OnlineResource"])
            .and_then(|n| xml::url_of(n, "linkage"));
    }

    let has_substance = contact.name.is_some()
        || contact.organization.is_some()
        || contact.email.is_some();
    has_substance.then_some(contact)
}

fn parse_resource_identifier(identifier: Node<'_, '_>) -> Option<ResourceIdentifier> {
    let code_node = xml::child(identifier, "code")?;
    let code = xml::char_string(code_node)?;
    let url = xml::child(code_node, "Anchor")
        .and_then(|a| a.attributes().find(|at| at.name() == "href"))
        .map(|at| at.value().to_string());
    Some(ResourceIdentifier {
        code,
        codespace: xml::char_string_of(identifier, "codeSpace"),
        url,
    })
}

fn parse_resolution(resolution: Node<'_, '_>) -> Option<SpatialResolution> {
    if let Some(scale) = xml::descend(
        resolution,
        &["equivalentScale", "MD_RepresentativeFraction", "denominator"],
    )
    .and_then(xml::integer)
    {
        return Some(SpatialResolution::Scale(scale));
    }
    let distance = xml::child(resolution, "distance")?;
    let value_node = xml::child(distance, "Distance")?;
    let value: f64 = xml::text(value_node)?.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    let uom = value_node.attribute("uom").map(str::to_string);
    Some(SpatialResolution::Distance { value, uom })
}

fn parse_bounding_box(extent: Node<'_, '_>) -> Option<[f64; 4]> {
    let bbox = xml::children(extent, "geographicElement")
        .filter_map(|n| xml::child(n, "EX_GeographicBoundingBox"))
        .next()?;
    let minx = xml::child(bbox, "westBoundLongitude").and_then(xml::decimal)?;
    let miny = xml::child(bbox, "southBoundLatitude").and_then(xml::decimal)?;
    let maxx = xml::child(bbox, "eastBoundLongitude").and_then(xml::decimal)?;
    let maxy = xml::child(bbox, "northBoundLatitude").and_then(xml::decimal)?;
    Some([minx, miny, maxx, maxy])
}

fn parse_temporal_extent(extent: Node<'_, '_>) -> Option<(Option<String>, Option<String>)> {
    let period = xml::children(extent, "temporalElement")
        .filter_map(|n| xml::child(n, "EX_TemporalExtent"))
        .filter_map(|n| xml::child(n, "extent"))
        .filter_map(|n| xml::child(n, "TimePeriod"))
        .next()?;
    let start = xml::child(period, "beginPosition").and_then(xml::text);
    let end = xml::child(period, "endPosition").and_then(xml::text);
    if start.is_none() && end.is_none() {
        return None;
    }
    Some((start, end))
}
