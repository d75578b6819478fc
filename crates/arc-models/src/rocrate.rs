//! RO-Crate JSON-LD rendering of an ARC tree.
//!
//! The whole tree becomes one flat `@graph`: a metadata descriptor node, the
//! root data entity (the investigation), one Dataset node per study and
//! assay, and contextual nodes for persons, publications, comments and
//! annotation tables. Node identifiers are derived from entity identifiers,
//! so rendering is deterministic.

use serde_json::{json, Map, Value};

use crate::entities::{ArcAssay, ArcInvestigation, ArcStudy, Comment, Person, Publication};
use crate::table::ArcTable;

const CRATE_CONTEXT: &str = "https://w3id.org/ro/crate/1.1/context";
const CRATE_SPEC: &str = "https://w3id.org/ro/crate/1.1";

pub fn render(investigation: &ArcInvestigation) -> Value {
    let mut graph: Vec<Value> = Vec::new();

    graph.push(json!({
        "@id": "ro-crate-metadata.json",
        "@type": "CreativeWork",
        "about": {"@id": "./"},
        "conformsTo": {"@id": CRATE_SPEC},
    }));

    let mut root = Map::new();
    root.insert("@id".into(), json!("./"));
    root.insert("@type".into(), json!(["Dataset", "Investigation"]));
    root.insert("identifier".into(), json!(investigation.identifier));
    if let Some(title) = &investigation.title {
        root.insert("name".into(), json!(title));
    }
    if let Some(description) = &investigation.description {
        root.insert("description".into(), json!(description));
    }
    if let Some(date) = &investigation.submission_date {
        root.insert("dateCreated".into(), json!(date));
    }
    if let Some(date) = &investigation.public_release_date {
        root.insert("datePublished".into(), json!(date));
    }

    if !investigation.contacts.is_empty() {
        let refs: Vec<Value> = investigation
            .contacts
            .iter()
            .enumerate()
            .map(|(i, p)| json!({"@id": person_id(p, i)}))
            .collect();
        root.insert("creator".into(), json!(refs));
        for (i, person) in investigation.contacts.iter().enumerate() {
            graph.push(render_person(person, i));
        }
    }

    if !investigation.publications.is_empty() {
        let refs: Vec<Value> = investigation
            .publications
            .iter()
            .enumerate()
            .map(|(i, p)| json!({"@id": publication_id(p, i)}))
            .collect();
        root.insert("citation".into(), json!(refs));
        for (i, publication) in investigation.publications.iter().enumerate() {
            graph.push(render_publication(publication, i));
        }
    }

    if !investigation.comments.is_empty() {
        let prefix = "inv";
        let refs: Vec<Value> = (0..investigation.comments.len())
            .map(|i| json!({"@id": comment_id(prefix, i)}))
            .collect();
        root.insert("comment".into(), json!(refs));
        for (i, comment) in investigation.comments.iter().enumerate() {
            graph.push(render_comment(comment, prefix, i));
        }
    }

    let study_refs: Vec<Value> = investigation
        .studies
        .iter()
        .map(|s| json!({"@id": study_id(s)}))
        .collect();
    root.insert("hasPart".into(), json!(study_refs));

    graph.push(Value::Object(root));

    for study in &investigation.studies {
        render_study(study, &mut graph);
    }

    json!({
        "@context": CRATE_CONTEXT,
        "@graph": graph,
    })
}

fn render_study(study: &ArcStudy, graph: &mut Vec<Value>) {
    let mut node = Map::new();
    node.insert("@id".into(), json!(study_id(study)));
    node.insert("@type".into(), json!(["Dataset", "Study"]));
    node.insert("identifier".into(), json!(study.identifier));
    if let Some(title) = &study.title {
        node.insert("name".into(), json!(title));
    }
    if let Some(description) = &study.description {
        node.insert("description".into(), json!(description));
    }
    if let Some(date) = &study.submission_date {
        node.insert("dateCreated".into(), json!(date));
    }

    let assay_refs: Vec<Value> = study
        .assays
        .iter()
        .map(|a| json!({"@id": assay_id(a)}))
        .collect();
    node.insert("hasPart".into(), json!(assay_refs));

    if !study.tables.is_empty() {
        let refs: Vec<Value> = study
            .tables
            .iter()
            .map(|t| json!({"@id": table_id(&study.identifier, t)}))
            .collect();
        node.insert("about".into(), json!(refs));
        for table in &study.tables {
            graph.push(render_table(&study.identifier, table));
        }
    }

    graph.push(Value::Object(node));

    for assay in &study.assays {
        graph.push(render_assay(assay));
    }
}

fn render_assay(assay: &ArcAssay) -> Value {
    let mut node = Map::new();
    node.insert("@id".into(), json!(assay_id(assay)));
    node.insert("@type".into(), json!(["Dataset", "Assay"]));
    node.insert("identifier".into(), json!(assay.identifier));
    if let Some(term) = &assay.measurement_type {
        node.insert("measurementMethod".into(), json!(term.name));
    }
    if let Some(term) = &assay.technology_type {
        node.insert("measurementTechnique".into(), json!(term.name));
    }
    if let Some(platform) = &assay.technology_platform {
        node.insert("instrument".into(), json!(platform));
    }
    if !assay.comments.is_empty() {
        let rendered: Vec<Value> = assay
            .comments
            .iter()
            .map(|c| {
                json!({
                    "@type": "Comment",
                    "name": c.name,
                    "text": c.value,
                })
            })
            .collect();
        node.insert("comment".into(), json!(rendered));
    }
    Value::Object(node)
}

fn render_person(person: &Person, index: usize) -> Value {
    let mut node = Map::new();
    node.insert("@id".into(), json!(person_id(person, index)));
    node.insert("@type".into(), json!("Person"));
    if let Some(name) = &person.last_name {
        node.insert("familyName".into(), json!(name));
    }
    if let Some(name) = &person.first_name {
        node.insert("givenName".into(), json!(name));
    }
    if let Some(email) = &person.email {
        node.insert("email".into(), json!(email));
    }
    if let Some(phone) = &person.phone {
        node.insert("telephone".into(), json!(phone));
    }
    if let Some(address) = &person.address {
        node.insert("address".into(), json!(address));
    }
    if let Some(affiliation) = &person.affiliation {
        node.insert(
            "affiliation".into(),
            json!({"@type": "Organization", "name": affiliation}),
        );
    }
    if !person.roles.is_empty() {
        let roles: Vec<Value> = person.roles.iter().map(|r| json!(r.name)).collect();
        node.insert("jobTitle".into(), json!(roles));
    }
    Value::Object(node)
}

fn render_publication(publication: &Publication, index: usize) -> Value {
    let mut node = Map::new();
    node.insert("@id".into(), json!(publication_id(publication, index)));
    node.insert("@type".into(), json!("ScholarlyArticle"));
    if let Some(doi) = &publication.doi {
        node.insert("identifier".into(), json!(doi));
    }
    if let Some(id) = &publication.pub_med_id {
        node.insert("sameAs".into(), json!(id));
    }
    if let Some(title) = &publication.title {
        node.insert("name".into(), json!(title));
    }
    if let Some(authors) = &publication.authors {
        node.insert("author".into(), json!(authors));
    }
    Value::Object(node)
}

fn render_comment(comment: &Comment, prefix: &str, index: usize) -> Value {
    json!({
        "@id": comment_id(prefix, index),
        "@type": "Comment",
        "name": comment.name,
        "text": comment.value,
    })
}

fn render_table(study_identifier: &str, table: &ArcTable) -> Value {
    let columns: Vec<Value> = table
        .columns
        .iter()
        .map(|column| {
            let values: Vec<Value> = column.cells.iter().map(|c| json!(c.text())).collect();
            json!({
                "@type": "PropertyValue",
                "name": column.header.label(),
                "value": values,
            })
        })
        .collect();
    json!({
        "@id": table_id(study_identifier, table),
        "@type": "LabProtocol",
        "name": table.name,
        "variableMeasured": columns,
    })
}

fn study_id(study: &ArcStudy) -> String {
    format!("studies/{}/", slug(&study.identifier))
}

fn assay_id(assay: &ArcAssay) -> String {
    format!("assays/{}/", slug(&assay.identifier))
}

fn person_id(person: &Person, index: usize) -> String {
    let last = person.last_name.as_deref().unwrap_or("unknown");
    format!("#person-{}-{}", slug(last), index)
}

fn publication_id(publication: &Publication, index: usize) -> String {
    match &publication.doi {
        Some(doi) => format!("#publication-{}", slug(doi)),
        None => format!("#publication-{index}"),
    }
}

fn comment_id(prefix: &str, index: usize) -> String {
    format!("#comment-{prefix}-{index}")
}

fn table_id(study_identifier: &str, table: &ArcTable) -> String {
    format!("#protocol-{}-{}", slug(study_identifier), slug(&table.name))
}

// Fragment identifiers must not contain whitespace or reserved URI
// characters; everything outside [A-Za-z0-9._-] collapses to '-'.
fn slug(input: &str) -> String {
    input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}
