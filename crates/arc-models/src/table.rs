use serde::{Deserialize, Serialize};

use crate::entities::OntologyAnnotation;

/// Column header of an annotation table. Parameter headers carry a term,
/// free-text headers a bare label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompositeHeader {
    Parameter(OntologyAnnotation),
    Characteristic(OntologyAnnotation),
    FreeText(String),
}

impl CompositeHeader {
    pub fn parameter(name: impl Into<String>) -> Self {
        CompositeHeader::Parameter(OntologyAnnotation::new(name))
    }

    pub fn label(&self) -> &str {
        match self {
            CompositeHeader::Parameter(t) | CompositeHeader::Characteristic(t) => &t.name,
            CompositeHeader::FreeText(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompositeCell {
    Term(OntologyAnnotation),
    FreeText(String),
}

impl CompositeCell {
    pub fn term(name: impl Into<String>) -> Self {
        CompositeCell::Term(OntologyAnnotation::new(name))
    }

    pub fn text(&self) -> &str {
        match self {
            CompositeCell::Term(t) => &t.name,
            CompositeCell::FreeText(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcColumn {
    pub header: CompositeHeader,
    pub cells: Vec<CompositeCell>,
}

/// A named protocol table: an ordered set of (header, cells) columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcTable {
    pub name: String,
    pub columns: Vec<ArcColumn>,
}

impl ArcTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn add_column(&mut self, header: CompositeHeader, cells: Vec<CompositeCell>) {
        self.columns.push(ArcColumn { header, cells });
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Look up a column by its header label.
    pub fn column(&self, label: &str) -> Option<&ArcColumn> {
        self.columns.iter().find(|c| c.header.label() == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_lookup_by_label() {
        let mut table = ArcTable::new("Spatial Sampling");
        table.add_column(
            CompositeHeader::parameter("Bounding Box"),
            vec![CompositeCell::term("[1.0, 2.0, 3.0, 4.0]")],
        );

        assert!(!table.is_empty());
        let col = table.column("Bounding Box").unwrap();
        assert_eq!(col.cells[0].text(), "[1.0, 2.0, 3.0, 4.0]");
        assert!(table.column("Temporal Extent").is_none());
    }
}
