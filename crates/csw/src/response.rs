//! GetRecords response parsing and DC/ISO identifier alignment.

use inspire::{InspireRecord, SemanticError};

use crate::CswError;

/// Paging attributes of a `csw:SearchResults` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageMeta {
    pub matches: u64,
    pub returned: u64,
}

/// One record slot of a harvested page: either a parsed record or an inline
/// failure that the consumer can skip without aborting the run.
#[derive(Debug, Clone)]
pub enum HarvestItem {
    Record(Box<InspireRecord>),
    Failed(RecordProcessingError),
}

impl HarvestItem {
    pub fn identifier(&self) -> &str {
        match self {
            HarvestItem::Record(record) => &record.identifier,
            HarvestItem::Failed(failure) => &failure.id,
        }
    }
}

/// A single record that could not be processed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("record '{id}' could not be processed: {cause}")]
pub struct RecordProcessingError {
    pub id: String,
    #[source]
    pub cause: SemanticError,
}

fn parse_document(body: &str) -> Result<roxmltree::Document<'_>, CswError> {
    let doc = roxmltree::Document::parse(body)
        .map_err(|e| CswError::InvalidResponse(format!("not well-formed XML: {e}")))?;

    let root = doc.root_element();
    if matches!(
        root.tag_name().name(),
        "ExceptionReport" | "ServiceExceptionReport"
    ) {
        let text: String = root
            .descendants()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect::<Vec<_>>()
            .join(" ");
        return Err(CswError::ServiceException(text.trim().to_string()));
    }
    Ok(doc)
}

fn search_results_meta(doc: &roxmltree::Document<'_>) -> Result<PageMeta, CswError> {
    let results = doc
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "SearchResults")
        .ok_or_else(|| CswError::InvalidResponse("response has no SearchResults".into()))?;

    let attr = |name: &str| {
        results
            .attribute(name)
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0)
    };
    Ok(PageMeta {
        matches: attr("numberOfRecordsMatched"),
        returned: attr("numberOfRecordsReturned"),
    })
}

/// Only the total-match count of a `resultType="hits"` response.
pub fn parse_matches(body: &str) -> Result<u64, CswError> {
    let doc = parse_document(body)?;
    Ok(search_results_meta(&doc)?.matches)
}

/// Identifiers of a Dublin Core page, in document order.
pub fn parse_dc_identifiers(body: &str) -> Result<(PageMeta, Vec<String>), CswError> {
    let doc = parse_document(body)?;
    let meta = search_results_meta(&doc)?;

    let results = doc
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "SearchResults")
        .ok_or_else(|| CswError::InvalidResponse("response has no SearchResults".into()))?;

    let identifiers = results
        .children()
        .filter(|n| {
            n.is_element()
                && matches!(
                    n.tag_name().name(),
                    "Record" | "BriefRecord" | "SummaryRecord"
                )
        })
        .map(|record| {
            record
                .children()
                .find(|n| n.is_element() && n.tag_name().name() == "identifier")
                .and_then(|n| n.text())
                .map(|t| t.trim().to_string())
                .unwrap_or_default()
        })
        .collect();

    Ok((meta, identifiers))
}

/// Parse an ISO page and align its records with the Dublin Core identifiers
/// of the same window.
///
/// Records pair with identifiers by index. When the ISO record carries its
/// own non-placeholder identifier that differs from the Dublin Core one, the
/// misalignment is logged and the ISO identifier wins. Per-record semantic
/// failures become [`HarvestItem::Failed`] instead of errors.
pub fn parse_iso_page(
    body: &str,
    dc_identifiers: &[String],
    window_start: u64,
) -> Result<(PageMeta, Vec<HarvestItem>), CswError> {
    let doc = parse_document(body)?;
    let meta = search_results_meta(&doc)?;

    let items = doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "MD_Metadata")
        .enumerate()
        .map(|(index, md)| {
            let dc_id = dc_identifiers
                .get(index)
                .map(String::as_str)
                .filter(|id| !id.is_empty());
            let own_id = InspireRecord::file_identifier(md).filter(|id| !id.trim().is_empty());

            let identifier = match (&own_id, dc_id) {
                (Some(own), Some(dc)) if own != dc => {
                    tracing::warn!(
                        index,
                        dc_identifier = dc,
                        iso_identifier = own.as_str(),
                        "identifier misalignment between DC and ISO pages; using ISO identifier"
                    );
                    own.clone()
                }
                (Some(own), _) => own.clone(),
                (None, Some(dc)) => dc.to_string(),
                (None, None) => format!("record-{}", window_start + index as u64),
            };

            match InspireRecord::from_iso(md, identifier.clone()) {
                Ok(record) => HarvestItem::Record(Box::new(record)),
                Err(cause) => HarvestItem::Failed(RecordProcessingError {
                    id: identifier,
                    cause,
                }),
            }
        })
        .collect();

    Ok((meta, items))
}
