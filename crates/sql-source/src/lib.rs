//! Streaming producer over the upstream investigation database.
//!
//! Investigations are read in stable `id` order with keyset pagination;
//! studies and assays for a page are fetched in one batched query each and
//! bucketed onto their parents. At most one page of investigations plus its
//! children is resident at a time, regardless of how large the table is.

use std::collections::{HashMap, VecDeque};

use chrono::NaiveDateTime;
use futures::Stream;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct InvestigationRow {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub submission_time: Option<NaiveDateTime>,
    pub release_time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct StudyRow {
    pub id: i64,
    pub investigation_id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub submission_time: Option<NaiveDateTime>,
    pub release_time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct AssayRow {
    pub id: i64,
    pub study_id: i64,
    pub measurement_type: Option<String>,
    pub technology_type: Option<String>,
}

/// One investigation with its studies and the assays bucketed by study id.
/// Owned by exactly one pipeline task once yielded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub investigation: InvestigationRow,
    pub studies: Vec<StudyRow>,
    pub assays_by_study: HashMap<i64, Vec<AssayRow>>,
}

impl Dataset {
    pub fn study_count(&self) -> usize {
        self.studies.len()
    }

    pub fn assay_count(&self) -> usize {
        self.studies
            .iter()
            .map(|s| self.assays_by_study.get(&s.id).map_or(0, Vec::len))
            .sum()
    }
}

const SELECT_INVESTIGATIONS: &str = r#"
    SELECT id, title, description, submission_time, release_time
    FROM "ARC_Investigation"
    WHERE id > $1
    ORDER BY id
    LIMIT $2
"#;

const SELECT_STUDIES: &str = r#"
    SELECT id, investigation_id, title, description, submission_time, release_time
    FROM "ARC_Study"
    WHERE investigation_id = ANY($1)
    ORDER BY id
"#;

const SELECT_ASSAYS: &str = r#"
    SELECT id, study_id, measurement_type, technology_type
    FROM "ARC_Assay"
    WHERE study_id = ANY($1)
    ORDER BY id
"#;

struct PageCursor<'c> {
    conn: &'c mut PgConnection,
    batch_size: usize,
    last_id: i64,
    buffered: VecDeque<Dataset>,
    exhausted: bool,
}

/// Pull-based lazy stream of [`Dataset`]s. Finite, not restartable. Any
/// error while fetching a page or its children fails the whole page: no
/// partial page is yielded.
pub fn stream_datasets(
    conn: &mut PgConnection,
    batch_size: usize,
) -> impl Stream<Item = Result<Dataset, sqlx::Error>> + '_ {
    let cursor = PageCursor {
        conn,
        batch_size: batch_size.max(1),
        last_id: i64::MIN,
        buffered: VecDeque::new(),
        exhausted: false,
    };

    futures::stream::try_unfold(cursor, |mut cursor| async move {
        if let Some(dataset) = cursor.buffered.pop_front() {
            return Ok(Some((dataset, cursor)));
        }
        if cursor.exhausted {
            return Ok(None);
        }

        let investigations: Vec<InvestigationRow> = sqlx::query_as(SELECT_INVESTIGATIONS)
            .bind(cursor.last_id)
            .bind(cursor.batch_size as i64)
            .fetch_all(&mut *cursor.conn)
            .await?;

        let Some(last) = investigations.last() else {
            cursor.exhausted = true;
            return Ok(None);
        };
        cursor.last_id = last.id;
        if investigations.len() < cursor.batch_size {
            cursor.exhausted = true;
        }

        let investigation_ids: Vec<i64> = investigations.iter().map(|row| row.id).collect();
        let studies: Vec<StudyRow> = sqlx::query_as(SELECT_STUDIES)
            .bind(&investigation_ids)
            .fetch_all(&mut *cursor.conn)
            .await?;

        let study_ids: Vec<i64> = studies.iter().map(|row| row.id).collect();
        let assays: Vec<AssayRow> = if study_ids.is_empty() {
            Vec::new()
        } else {
            sqlx::query_as(SELECT_ASSAYS)
                .bind(&study_ids)
                .fetch_all(&mut *cursor.conn)
                .await?
        };

        tracing::debug!(
            investigations = investigations.len(),
            studies = studies.len(),
            assays = assays.len(),
            "fetched source page"
        );

        cursor.buffered = bucket_page(investigations, studies, assays);
        Ok(cursor.buffered.pop_front().map(|dataset| (dataset, cursor)))
    })
}

/// Group one page's child rows under their investigations, preserving the
/// original page order of investigations.
fn bucket_page(
    investigations: Vec<InvestigationRow>,
    studies: Vec<StudyRow>,
    assays: Vec<AssayRow>,
) -> VecDeque<Dataset> {
    let mut studies_by_investigation: HashMap<i64, Vec<StudyRow>> = HashMap::new();
    for study in studies {
        studies_by_investigation
            .entry(study.investigation_id)
            .or_default()
            .push(study);
    }

    let mut assays_by_study: HashMap<i64, Vec<AssayRow>> = HashMap::new();
    for assay in assays {
        assays_by_study
            .entry(assay.study_id)
            .or_default()
            .push(assay);
    }

    investigations
        .into_iter()
        .map(|investigation| {
            let studies = studies_by_investigation
                .remove(&investigation.id)
                .unwrap_or_default();
            let assays_by_study = studies
                .iter()
                .filter_map(|study| {
                    assays_by_study
                        .remove(&study.id)
                        .map(|assays| (study.id, assays))
                })
                .collect();
            Dataset {
                investigation,
                studies,
                assays_by_study,
            }
        })
        .collect()
}
