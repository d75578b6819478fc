use arc_mapper::{map_inspire_record, MapError};
use inspire::{
    CitationDate, ConformanceResult, Contact, ContactKind, DistributionFormat, InspireRecord,
    ResourceIdentifier, SpatialResolution,
};

fn author_contact(name: &str) -> Contact {
    let mut contact = Contact::new(ContactKind::Resource);
    contact.name = Some(name.into());
    contact.organization = Some("Test Org".into());
    contact.email = Some("jane@example.org".into());
    contact.role = Some("author".into());
    contact.address = Some("123 Test St".into());
    contact.city = Some("Test City".into());
    contact.country = Some("Test Country".into());
    contact
}

fn sample_record() -> InspireRecord {
    InspireRecord {
        identifier: "uuid-123".into(),
        title: "Test Dataset".into(),
        abstract_text: "A test dataset description".into(),
        date_stamp: Some("2023-10-27".into()),
        keywords: vec!["keyword1".into(), "keyword2".into()],
        topic_categories: vec!["biota".into()],
        contacts: vec![author_contact("Jane Doe")],
        resource_identifiers: vec![ResourceIdentifier {
            code: "10.1234/xyz".into(),
            codespace: Some("DOI".into()),
            url: Some("https://doi.org/10.1234/xyz".into()),
        }],
        citation_dates: vec![
            CitationDate {
                date: "2020-05-01".into(),
                date_type: Some("creation".into()),
            },
            CitationDate {
                date: "2021-01-15".into(),
                date_type: Some("publication".into()),
            },
        ],
        spatial_extent: Some([10.0, 48.0, 11.0, 49.0]),
        temporal_extent: Some((Some("2020-01-01".into()), Some("2020-12-31".into()))),
        spatial_resolutions: vec![
            SpatialResolution::Scale(25000),
            SpatialResolution::Distance {
                value: 10.0,
                uom: Some("m".into()),
            },
        ],
        access_constraints: vec!["otherRestrictions".into()],
        use_constraints: vec!["license".into()],
        other_constraints: vec![
            "c1".into(),
            "c2".into(),
            "c3".into(),
            "c4 is dropped".into(),
        ],
        distribution_formats: vec![DistributionFormat {
            name: "GeoTIFF".into(),
            version: Some("1.1".into()),
        }],
        conformance_results: vec![
            ConformanceResult {
                title: "INSPIRE Data Specification".into(),
                degree: Some(true),
                explanation: None,
            },
            ConformanceResult {
                title: "National profile".into(),
                degree: None,
                explanation: None,
            },
        ],
        reference_systems: vec!["".into(), "EPSG:25832".into()],
        graphic_overviews: vec!["https://img.example/preview.png".into()],
        online_resources: vec![inspire::OnlineResource {
            url: "https://download.example/uuid-123".into(),
            name: None,
            description: None,
            protocol: None,
        }],
        lineage: Some("Processed using algorithm X".into()),
        purpose: Some("Monitoring".into()),
        language: Some("eng".into()),
        metadata_standard_name: Some("ISO 19115".into()),
        metadata_standard_version: Some("2003/Cor.1:2006".into()),
        ..InspireRecord::default()
    }
}

#[test]
fn maps_the_investigation_head_fields() {
    let arc = map_inspire_record(&sample_record()).unwrap();
    let inv = &arc.investigation;

    assert_eq!(inv.identifier, "uuid-123");
    assert_eq!(inv.title.as_deref(), Some("Test Dataset"));
    assert_eq!(inv.description.as_deref(), Some("A test dataset description"));
    assert_eq!(inv.submission_date.as_deref(), Some("2023-10-27"));

    assert_eq!(inv.studies.len(), 1);
    assert_eq!(inv.studies[0].assays.len(), 1);
}

#[test]
fn splits_person_names_and_joins_addresses() {
    let arc = map_inspire_record(&sample_record()).unwrap();
    let contact = &arc.investigation.contacts[0];

    assert_eq!(contact.last_name.as_deref(), Some("Doe"));
    assert_eq!(contact.first_name.as_deref(), Some("Jane"));
    assert_eq!(contact.affiliation.as_deref(), Some("Test Org"));
    assert_eq!(
        contact.address.as_deref(),
        Some("123 Test St, Test City, Test Country")
    );
    assert_eq!(contact.roles[0].name, "author");
}

#[test]
fn multi_token_names_split_on_the_last_whitespace() {
    let mut record = sample_record();
    record.contacts = vec![author_contact("Juan Pablo de la Cruz")];
    let arc = map_inspire_record(&record).unwrap();
    let contact = &arc.investigation.contacts[0];
    assert_eq!(contact.first_name.as_deref(), Some("Juan Pablo de la"));
    assert_eq!(contact.last_name.as_deref(), Some("Cruz"));
}

#[test]
fn doi_identifiers_become_publications_with_author_strings() {
    let arc = map_inspire_record(&sample_record()).unwrap();
    let publications = &arc.investigation.publications;

    assert_eq!(publications.len(), 1);
    assert_eq!(publications[0].doi.as_deref(), Some("10.1234/xyz"));
    assert_eq!(publications[0].authors.as_deref(), Some("Doe, J."));
    assert_eq!(publications[0].title.as_deref(), Some("Test Dataset"));
}

#[test]
fn publication_detection_covers_doi_and_isbn_spellings() {
    let mut record = sample_record();
    record.resource_identifiers = vec![
        ResourceIdentifier {
            code: "urn:DOI:foo".into(),
            codespace: None,
            url: None,
        },
        ResourceIdentifier {
            code: "978-3-16-148410-0".into(),
            codespace: Some("ISBN-13".into()),
            url: None,
        },
        ResourceIdentifier {
            code: "local-id-1".into(),
            codespace: Some("registry".into()),
            url: None,
        },
    ];
    let arc = map_inspire_record(&record).unwrap();
    assert_eq!(arc.investigation.publications.len(), 2);
}

#[test]
fn record_comments_follow_the_fixed_set() {
    let arc = map_inspire_record(&sample_record()).unwrap();
    let comments: Vec<(&str, &str)> = arc
        .investigation
        .comments
        .iter()
        .map(|c| (c.name.as_str(), c.value.as_deref().unwrap_or_default()))
        .collect();

    assert!(comments.contains(&("Language", "eng")));
    assert!(comments.contains(&("Metadata Standard", "ISO 19115 v2003/Cor.1:2006")));
    assert!(comments.contains(&("Access Constraints", "otherRestrictions")));
    assert!(comments.contains(&("Use Constraints", "license")));
    // Only the first three other-constraints survive, semicolon-joined.
    assert!(comments.contains(&("Other Constraints", "c1; c2; c3")));
    // Absent fields leave no comment behind.
    assert!(!comments.iter().any(|(name, _)| *name == "Parent Identifier"));
}

#[test]
fn study_carries_provenance_description_and_protocols() {
    let arc = map_inspire_record(&sample_record()).unwrap();
    let study = &arc.investigation.studies[0];

    assert_eq!(study.identifier, "uuid-123_study");
    assert_eq!(study.title.as_deref(), Some("Study for: Test Dataset"));
    let description = study.description.as_deref().unwrap();
    assert!(description.contains("Lineage: Processed using algorithm X"));
    assert!(description.contains("Purpose: Monitoring"));

    let table_names: Vec<&str> = study.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        table_names,
        vec!["Spatial Sampling", "Data Acquisition", "Data Processing"]
    );
}

#[test]
fn study_description_falls_back_when_no_provenance_exists() {
    let mut record = sample_record();
    record.lineage = None;
    record.purpose = None;
    record.supplemental_information.clear();
    let arc = map_inspire_record(&record).unwrap();
    assert_eq!(
        arc.investigation.studies[0].description.as_deref(),
        Some("Imported from INSPIRE metadata")
    );
}

#[test]
fn spatial_sampling_protocol_columns() {
    let arc = map_inspire_record(&sample_record()).unwrap();
    let study = &arc.investigation.studies[0];
    let table = study.tables.iter().find(|t| t.name == "Spatial Sampling").unwrap();

    assert_eq!(
        table.column("Bounding Box").unwrap().cells[0].text(),
        "[10.0, 48.0, 11.0, 49.0]"
    );
    assert_eq!(
        table.column("Spatial Resolution (Scale)").unwrap().cells[0].text(),
        "1:25000"
    );
    assert_eq!(
        table.column("Spatial Resolution (Distance)").unwrap().cells[0].text(),
        "10 m"
    );
}

#[test]
fn data_acquisition_protocol_columns() {
    let arc = map_inspire_record(&sample_record()).unwrap();
    let study = &arc.investigation.studies[0];
    let table = study.tables.iter().find(|t| t.name == "Data Acquisition").unwrap();

    assert_eq!(
        table.column("Temporal Extent").unwrap().cells[0].text(),
        "2020-01-01 to 2020-12-31"
    );
    assert_eq!(
        table.column("Acquisition Date").unwrap().cells[0].text(),
        "2020-05-01"
    );
}

#[test]
fn open_temporal_bounds_render_as_unknown() {
    let mut record = sample_record();
    record.temporal_extent = Some((Some("2020-01-01".into()), None));
    let arc = map_inspire_record(&record).unwrap();
    let study = &arc.investigation.studies[0];
    let table = study.tables.iter().find(|t| t.name == "Data Acquisition").unwrap();
    assert_eq!(
        table.column("Temporal Extent").unwrap().cells[0].text(),
        "2020-01-01 to unknown"
    );
}

#[test]
fn data_processing_protocol_columns() {
    let arc = map_inspire_record(&sample_record()).unwrap();
    let study = &arc.investigation.studies[0];
    let table = study.tables.iter().find(|t| t.name == "Data Processing").unwrap();

    assert_eq!(
        table.column("Processing Description").unwrap().cells[0].text(),
        "Processed using algorithm X"
    );
    let conformance: Vec<&str> = table
        .columns
        .iter()
        .filter(|c| c.header.label() == "Conformance")
        .map(|c| c.cells[0].text())
        .collect();
    assert_eq!(
        conformance,
        vec![
            "INSPIRE Data Specification: PASS",
            "National profile: Unknown"
        ]
    );
    assert_eq!(
        table.column("Output Format").unwrap().cells[0].text(),
        "GeoTIFF v1.1"
    );
    assert_eq!(
        table.column("Processing Date").unwrap().cells[0].text(),
        "2021-01-15"
    );
}

#[test]
fn long_lineage_is_truncated_to_500_chars() {
    let mut record = sample_record();
    record.lineage = Some("x".repeat(800));
    let arc = map_inspire_record(&record).unwrap();
    let study = &arc.investigation.studies[0];
    let table = study.tables.iter().find(|t| t.name == "Data Processing").unwrap();
    assert_eq!(
        table.column("Processing Description").unwrap().cells[0]
            .text()
            .len(),
        500
    );
}

#[test]
fn empty_protocols_are_omitted_entirely() {
    let record = InspireRecord {
        identifier: "bare".into(),
        title: "Bare".into(),
        abstract_text: "Bare record".into(),
        ..InspireRecord::default()
    };
    let arc = map_inspire_record(&record).unwrap();
    assert!(arc.investigation.studies[0].tables.is_empty());
}

#[test]
fn assay_defaults_and_platform_selection() {
    let arc = map_inspire_record(&sample_record()).unwrap();
    let assay = &arc.investigation.studies[0].assays[0];

    assert_eq!(assay.identifier, "uuid-123_assay");
    assert_eq!(assay.measurement_type.as_ref().unwrap().name, "biota");
    assert_eq!(assay.technology_type.as_ref().unwrap().name, "Data Collection");
    // The empty reference-system code is skipped.
    assert_eq!(assay.technology_platform.as_deref(), Some("EPSG:25832"));

    let comment_values: Vec<&str> = assay
        .comments
        .iter()
        .filter_map(|c| c.value.as_deref())
        .collect();
    assert!(comment_values.contains(&"https://img.example/preview.png"));
    assert!(comment_values.contains(&"https://download.example/uuid-123"));
}

#[test]
fn assay_measurement_type_defaults_without_topics() {
    let mut record = sample_record();
    record.topic_categories.clear();
    let arc = map_inspire_record(&record).unwrap();
    let assay = &arc.investigation.studies[0].assays[0];
    assert_eq!(
        assay.measurement_type.as_ref().unwrap().name,
        "Spatial Data Acquisition"
    );
}

#[test]
fn mapping_is_deterministic() {
    let record = sample_record();
    let first = map_inspire_record(&record).unwrap().to_rocrate_json_string();
    let second = map_inspire_record(&record).unwrap().to_rocrate_json_string();
    assert_eq!(first, second);
}

#[test]
fn empty_identifier_is_rejected() {
    let mut record = sample_record();
    record.identifier = "  ".into();
    assert!(matches!(
        map_inspire_record(&record),
        Err(MapError::EmptyIdentifier)
    ));
}
