//! INSPIRE record → ARC tree.
//!
//! The investigation carries the citation-level metadata (contacts,
//! publications, record comments), the single study carries provenance and
//! three protocol tables derived from the spatial/temporal/quality branches,
//! and the single assay describes the acquisition itself.

use arc_models::{
    ArcAssay, ArcContainer, ArcInvestigation, ArcStudy, ArcTable, Comment, CompositeCell,
    CompositeHeader, OntologyAnnotation, Person, Publication,
};
use inspire::{Contact, InspireRecord, SpatialResolution};
use itertools::Itertools;

use crate::MapError;

const DEFAULT_MEASUREMENT_TERM: &str = "Spatial Data Acquisition";
const MEASUREMENT_ACCESSION: &str = "http://purl.obolibrary.org/obo/NCIT_C19026";
const MEASUREMENT_SOURCE: &str = "NCIT";
const FALLBACK_STUDY_DESCRIPTION: &str = "Imported from INSPIRE metadata";
const LINEAGE_EXCERPT_LIMIT: usize = 500;

/// Map one record into a complete ARC container.
pub fn map_record(record: &InspireRecord) -> Result<ArcContainer, MapError> {
    if record.identifier.trim().is_empty() {
        return Err(MapError::EmptyIdentifier);
    }

    let mut investigation = map_investigation(record)?;
    let mut study = map_study(record)?;
    study.add_registered_assay(map_assay(record)?)?;
    investigation.add_registered_study(study)?;

    Ok(ArcContainer::from_investigation(investigation))
}

pub fn map_investigation(record: &InspireRecord) -> Result<ArcInvestigation, MapError> {
    let mut investigation = ArcInvestigation::new(record.identifier.clone())?;
    investigation.title = Some(record.title.clone());
    investigation.description = Some(record.abstract_text.clone());
    investigation.submission_date = record.date_stamp.clone();

    let persons: Vec<Person> = all_contacts(record).map(map_person).collect();
    let authors = author_list(&persons);
    investigation.publications = map_publications(record, authors.as_deref());
    investigation.contacts = persons;
    investigation.comments = record_comments(record);

    Ok(investigation)
}

pub fn map_study(record: &InspireRecord) -> Result<ArcStudy, MapError> {
    let mut study = ArcStudy::new(format!("{}_study", record.identifier))?;
    study.title = Some(format!("Study for: {}", record.title));
    study.description = Some(study_description(record));
    study.submission_date = record.date_stamp.clone();

    for table in [
        spatial_sampling_protocol(record),
        data_acquisition_protocol(record),
        data_processing_protocol(record),
    ]
    .into_iter()
    .flatten()
    {
        study.add_table(table);
    }

    Ok(study)
}

pub fn map_assay(record: &InspireRecord) -> Result<ArcAssay, MapError> {
    let mut assay = ArcAssay::new(format!("{}_assay", record.identifier))?;

    assay.measurement_type = Some(match record.topic_categories.first() {
        Some(topic) => OntologyAnnotation::with_accession(
            topic.clone(),
            MEASUREMENT_ACCESSION,
            MEASUREMENT_SOURCE,
        ),
        None => OntologyAnnotation::with_accession(
            DEFAULT_MEASUREMENT_TERM,
            MEASUREMENT_ACCESSION,
            MEASUREMENT_SOURCE,
        ),
    });
    assay.technology_type = Some(OntologyAnnotation::new("Data Collection"));
    assay.technology_platform = record
        .reference_systems
        .iter()
        .find(|code| !code.trim().is_empty())
        .cloned();

    for url in &record.graphic_overviews {
        assay.comments.push(Comment::new("Graphic Overview", url));
    }
    for resource in &record.online_resources {
        assay
            .comments
            .push(Comment::new("Online Resource", &resource.url));
    }

    Ok(assay)
}

/// All responsible parties of the record in a stable order: record contacts
/// first, then creators, publishers and contributors.
fn all_contacts(record: &InspireRecord) -> impl Iterator<Item = &Contact> {
    record
        .contacts
        .iter()
        .chain(&record.creators)
        .chain(&record.publishers)
        .chain(&record.contributors)
}

pub fn map_person(contact: &Contact) -> Person {
    let mut person = Person::default();

    let name = contact.name.as_deref().unwrap_or("Unknown").trim();
    match name.rsplit_once(char::is_whitespace) {
        Some((first, last)) => {
            person.first_name = Some(first.trim().to_string());
            person.last_name = Some(last.to_string());
        }
        None => person.last_name = Some(name.to_string()),
    }

    person.email = contact.email.clone();
    person.phone = contact.phone.clone();
    person.affiliation = contact.organization.clone();

    let address = [
        &contact.address,
        &contact.city,
        &contact.region,
        &contact.postcode,
        &contact.country,
    ]
    .into_iter()
    .flatten()
    .join(", ");
    if !address.is_empty() {
        person.address = Some(address);
    }

    if let Some(role) = &contact.role {
        person.roles.push(OntologyAnnotation::new(role.clone()));
    }
    if let Some(position) = &contact.position {
        person.comments.push(Comment::new("Position", position));
    }
    if let Some(url) = &contact.online_resource {
        person.comments.push(Comment::new("Online Resource", url));
    }

    person
}

/// `"Last, F."` over all persons with an author role, joined by `"; "`.
fn author_list(persons: &[Person]) -> Option<String> {
    let authors = persons
        .iter()
        .filter(|p| p.has_role("author"))
        .map(|person| {
            let last = person.last_name.as_deref().unwrap_or_default();
            match person.first_name.as_deref().and_then(|f| f.chars().next()) {
                Some(initial) => format!("{last}, {initial}."),
                None => last.to_string(),
            }
        })
        .join("; ");
    (!authors.is_empty()).then_some(authors)
}

fn map_publications(record: &InspireRecord, authors: Option<&str>) -> Vec<Publication> {
    record
        .resource_identifiers
        .iter()
        .filter(|rid| {
            let code = rid.code.to_ascii_lowercase();
            let codespace = rid
                .codespace
                .as_deref()
                .map(str::to_ascii_lowercase)
                .unwrap_or_default();
            rid.code.starts_with("10.") || code.contains("doi") || codespace.contains("isbn")
        })
        .map(|rid| Publication {
            doi: Some(rid.code.clone()),
            pub_med_id: None,
            authors: authors.map(str::to_string),
            title: Some(record.title.clone()),
        })
        .collect()
}

/// The fixed comment set carried on the investigation for record-level
/// metadata. A comment is appended only when its source field is present.
fn record_comments(record: &InspireRecord) -> Vec<Comment> {
    let mut comments = Vec::new();
    let mut push = |name: &str, value: Option<String>| {
        if let Some(value) = value {
            comments.push(Comment::new(name, value));
        }
    };

    push("Parent Identifier", record.parent_identifier.clone());
    push("Hierarchy Level", record.hierarchy_level.clone());
    push("Dataset URI", record.dataset_uri.clone());
    push("Language", record.language.clone());
    push("Character Set", record.character_set.clone());
    push("Edition", record.edition.clone());
    push("Status", record.status.clone());
    push(
        "Metadata Standard",
        record.metadata_standard_name.as_ref().map(|name| {
            match &record.metadata_standard_version {
                Some(version) => format!("{name} v{version}"),
                None => name.clone(),
            }
        }),
    );
    push("Access Constraints", join_non_empty(&record.access_constraints, ", "));
    push("Use Constraints", join_non_empty(&record.use_constraints, ", "));
    push("Classification", join_non_empty(&record.classification, ", "));
    push(
        "Other Constraints",
        join_non_empty(
            &record.other_constraints[..record.other_constraints.len().min(3)],
            "; ",
        ),
    );

    comments
}

fn join_non_empty(values: &[String], separator: &str) -> Option<String> {
    (!values.is_empty()).then(|| values.join(separator))
}

/// `"Lineage: …"`, `"Purpose: …"` and `"Supplemental: …"` pipe-joined over
/// the fields that are present; a fixed fallback otherwise.
fn study_description(record: &InspireRecord) -> String {
    let mut parts = Vec::new();
    if let Some(lineage) = &record.lineage {
        parts.push(format!("Lineage: {lineage}"));
    }
    if let Some(purpose) = &record.purpose {
        parts.push(format!("Purpose: {purpose}"));
    }
    if !record.supplemental_information.is_empty() {
        parts.push(format!(
            "Supplemental: {}",
            record.supplemental_information.join("; ")
        ));
    }
    if parts.is_empty() {
        FALLBACK_STUDY_DESCRIPTION.to_string()
    } else {
        parts.join(" | ")
    }
}

fn spatial_sampling_protocol(record: &InspireRecord) -> Option<ArcTable> {
    let mut table = ArcTable::new("Spatial Sampling");

    if let Some([minx, miny, maxx, maxy]) = record.spatial_extent {
        table.add_column(
            CompositeHeader::parameter("Bounding Box"),
            vec![CompositeCell::term(format!(
                "[{minx:?}, {miny:?}, {maxx:?}, {maxy:?}]"
            ))],
        );
    }

    let scales = record
        .spatial_resolutions
        .iter()
        .filter_map(|r| match r {
            SpatialResolution::Scale(denominator) => Some(format!("1:{denominator}")),
            SpatialResolution::Distance { .. } => None,
        })
        .join(", ");
    if !scales.is_empty() {
        table.add_column(
            CompositeHeader::parameter("Spatial Resolution (Scale)"),
            vec![CompositeCell::term(scales)],
        );
    }

    let distances = record
        .spatial_resolutions
        .iter()
        .filter_map(|r| match r {
            SpatialResolution::Distance { value, uom } => Some(match uom {
                Some(uom) => format!("{value} {uom}"),
                None => value.to_string(),
            }),
            SpatialResolution::Scale(_) => None,
        })
        .join(", ");
    if !distances.is_empty() {
        table.add_column(
            CompositeHeader::parameter("Spatial Resolution (Distance)"),
            vec![CompositeCell::term(distances)],
        );
    }

    (!table.is_empty()).then_some(table)
}

fn data_acquisition_protocol(record: &InspireRecord) -> Option<ArcTable> {
    let mut table = ArcTable::new("Data Acquisition");

    if let Some((start, end)) = &record.temporal_extent {
        let start = start.as_deref().unwrap_or("unknown");
        let end = end.as_deref().unwrap_or("unknown");
        table.add_column(
            CompositeHeader::parameter("Temporal Extent"),
            vec![CompositeCell::term(format!("{start} to {end}"))],
        );
    }

    let creation_dates = dates_of_type(record, &["creation"]);
    if let Some(dates) = creation_dates {
        table.add_column(
            CompositeHeader::parameter("Acquisition Date"),
            vec![CompositeCell::term(dates)],
        );
    }

    (!table.is_empty()).then_some(table)
}

fn data_processing_protocol(record: &InspireRecord) -> Option<ArcTable> {
    let mut table = ArcTable::new("Data Processing");

    if let Some(lineage) = &record.lineage {
        let excerpt: String = lineage.chars().take(LINEAGE_EXCERPT_LIMIT).collect();
        table.add_column(
            CompositeHeader::parameter("Processing Description"),
            vec![CompositeCell::term(excerpt)],
        );
    }

    for result in &record.conformance_results {
        let degree = match result.degree {
            Some(true) => "PASS",
            Some(false) => "FAIL",
            None => "Unknown",
        };
        table.add_column(
            CompositeHeader::parameter("Conformance"),
            vec![CompositeCell::term(format!("{}: {degree}", result.title))],
        );
    }

    if !record.distribution_formats.is_empty() {
        let cells = record
            .distribution_formats
            .iter()
            .map(|format| {
                CompositeCell::term(match &format.version {
                    Some(version) => format!("{} v{version}", format.name),
                    None => format.name.clone(),
                })
            })
            .collect();
        table.add_column(CompositeHeader::parameter("Output Format"), cells);
    }

    if let Some(dates) = dates_of_type(record, &["publication", "revision"]) {
        table.add_column(
            CompositeHeader::parameter("Processing Date"),
            vec![CompositeCell::term(dates)],
        );
    }

    if table.is_empty() {
        // Nothing matched, but provenance data exists: leave a marker rather
        // than dropping the protocol silently.
        if record.lineage.is_some() || !record.citation_dates.is_empty() {
            table.add_column(
                CompositeHeader::parameter("Note"),
                vec![CompositeCell::term(
                    "See source metadata record for processing details",
                )],
            );
        }
    }

    (!table.is_empty()).then_some(table)
}

fn dates_of_type(record: &InspireRecord, types: &[&str]) -> Option<String> {
    let dates = record
        .citation_dates
        .iter()
        .filter(|d| {
            d.date_type
                .as_deref()
                .map(|t| types.iter().any(|wanted| t.eq_ignore_ascii_case(wanted)))
                .unwrap_or(false)
        })
        .map(|d| d.date.as_str())
        .join(", ");
    (!dates.is_empty()).then_some(dates)
}
