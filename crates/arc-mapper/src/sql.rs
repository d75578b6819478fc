//! Database rows → ARC tree.

use arc_models::{ArcAssay, ArcContainer, ArcInvestigation, ArcStudy, OntologyAnnotation};
use chrono::NaiveDateTime;
use sql_source::{AssayRow, Dataset, InvestigationRow, StudyRow};

use crate::MapError;

fn iso_date(value: Option<NaiveDateTime>) -> Option<String> {
    value.map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string())
}

pub fn map_investigation(row: &InvestigationRow) -> Result<ArcInvestigation, MapError> {
    let identifier = row.id.to_string();
    if identifier.trim().is_empty() {
        return Err(MapError::EmptyIdentifier);
    }

    let mut investigation = ArcInvestigation::new(identifier)?;
    investigation.title = Some(row.title.clone().unwrap_or_default());
    investigation.description = Some(row.description.clone().unwrap_or_default());
    investigation.submission_date = iso_date(row.submission_time);
    investigation.public_release_date = iso_date(row.release_time);
    Ok(investigation)
}

pub fn map_study(row: &StudyRow) -> Result<ArcStudy, MapError> {
    let mut study = ArcStudy::new(row.id.to_string())?;
    study.title = Some(row.title.clone().unwrap_or_default());
    study.description = Some(row.description.clone().unwrap_or_default());
    study.submission_date = iso_date(row.submission_time);
    study.public_release_date = iso_date(row.release_time);
    Ok(study)
}

/// Measurement and technology types stay stringly-typed: the upstream schema
/// carries no ontology accession for them yet.
pub fn map_assay(row: &AssayRow) -> Result<ArcAssay, MapError> {
    let mut assay = ArcAssay::new(row.id.to_string())?;
    assay.measurement_type = row
        .measurement_type
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(OntologyAnnotation::new);
    assay.technology_type = row
        .technology_type
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(OntologyAnnotation::new);
    Ok(assay)
}

/// Assemble the full tree for one dataset: every study is registered under
/// the investigation and every assay under its study.
pub fn build_dataset_arc(dataset: &Dataset) -> Result<ArcContainer, MapError> {
    let mut investigation = map_investigation(&dataset.investigation)?;

    for study_row in &dataset.studies {
        let mut study = map_study(study_row)?;
        if let Some(assay_rows) = dataset.assays_by_study.get(&study_row.id) {
            for assay_row in assay_rows {
                study.add_registered_assay(map_assay(assay_row)?)?;
            }
        }
        investigation.add_registered_study(study)?;
    }

    Ok(ArcContainer::from_investigation(investigation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn sample_investigation() -> InvestigationRow {
        InvestigationRow {
            id: 1,
            title: Some("Earthworm census".into()),
            description: None,
            submission_time: NaiveDate::from_ymd_opt(2021, 3, 14)
                .and_then(|d| d.and_hms_opt(9, 30, 0)),
            release_time: None,
        }
    }

    #[test]
    fn maps_investigation_with_iso_dates_and_empty_fallbacks() {
        let investigation = map_investigation(&sample_investigation()).unwrap();
        assert_eq!(investigation.identifier, "1");
        assert_eq!(investigation.title.as_deref(), Some("Earthworm census"));
        assert_eq!(investigation.description.as_deref(), Some(""));
        assert_eq!(
            investigation.submission_date.as_deref(),
            Some("2021-03-14T09:30:00")
        );
        assert_eq!(investigation.public_release_date, None);
    }

    #[test]
    fn study_identifier_is_the_stringified_row_id() {
        let study = map_study(&StudyRow {
            id: 10,
            investigation_id: 1,
            title: Some("Plot A".into()),
            description: Some("desc".into()),
            submission_time: None,
            release_time: None,
        })
        .unwrap();
        assert_eq!(study.identifier, "10");
    }

    #[test]
    fn assay_types_stay_stringly_typed() {
        let assay = map_assay(&AssayRow {
            id: 100,
            study_id: 10,
            measurement_type: Some("species count".into()),
            technology_type: Some("  ".into()),
        })
        .unwrap();
        assert_eq!(assay.identifier, "100");
        assert_eq!(assay.measurement_type.unwrap().name, "species count");
        assert_eq!(assay.technology_type, None);
    }

    #[test]
    fn builds_the_full_tree_for_a_dataset() {
        let studies = vec![
            StudyRow {
                id: 10,
                investigation_id: 1,
                title: None,
                description: None,
                submission_time: None,
                release_time: None,
            },
            StudyRow {
                id: 11,
                investigation_id: 1,
                title: None,
                description: None,
                submission_time: None,
                release_time: None,
            },
        ];
        let mut assays_by_study = HashMap::new();
        assays_by_study.insert(
            10,
            vec![
                AssayRow {
                    id: 100,
                    study_id: 10,
                    measurement_type: None,
                    technology_type: None,
                },
                AssayRow {
                    id: 101,
                    study_id: 10,
                    measurement_type: None,
                    technology_type: None,
                },
            ],
        );
        assays_by_study.insert(
            11,
            vec![AssayRow {
                id: 102,
                study_id: 11,
                measurement_type: None,
                technology_type: None,
            }],
        );

        let dataset = Dataset {
            investigation: sample_investigation(),
            studies,
            assays_by_study,
        };

        let arc = build_dataset_arc(&dataset).unwrap();
        assert_eq!(arc.investigation.identifier, "1");
        assert_eq!(arc.investigation.studies.len(), 2);
        assert_eq!(arc.investigation.studies[0].assays.len(), 2);
        assert_eq!(arc.investigation.studies[1].assays.len(), 1);

        // The rendered crate names the investigation in its root entity.
        let doc = arc.to_rocrate_value();
        let graph = doc["@graph"].as_array().unwrap();
        let root = graph.iter().find(|n| n["@id"] == "./").unwrap();
        assert_eq!(root["identifier"], "1");
    }

    #[test]
    fn duplicate_study_rows_surface_as_map_errors() {
        let dup = StudyRow {
            id: 10,
            investigation_id: 1,
            title: None,
            description: None,
            submission_time: None,
            release_time: None,
        };
        let dataset = Dataset {
            investigation: sample_investigation(),
            studies: vec![dup.clone(), dup],
            assays_by_study: HashMap::new(),
        };
        assert!(matches!(
            build_dataset_arc(&dataset),
            Err(MapError::Arc(_))
        ));
    }
}
