//! GetRecords request bodies.
//!
//! CSW 2.0.2 requests are POSTed as XML. The builder covers the three
//! mutually exclusive shapes the harvester needs: a caller-supplied raw
//! document, a conjunction of property filters, or unfiltered pagination.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

pub const CSW_NS: &str = "http://www.opengis.net/cat/csw/2.0.2";
pub const OGC_NS: &str = "http://www.opengis.net/ogc";
pub const GMD_OUTPUT_SCHEMA: &str = "http://www.isotc211.org/2005/gmd";

/// Which record representation a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSchema {
    /// Dublin Core (`csw:Record`) — used to fetch stable identifiers.
    DublinCore,
    /// ISO 19139 (`gmd:MD_Metadata`) — the full element set.
    Iso19139,
}

impl OutputSchema {
    fn uri(self) -> &'static str {
        match self {
            OutputSchema::DublinCore => CSW_NS,
            OutputSchema::Iso19139 => GMD_OUTPUT_SCHEMA,
        }
    }

    fn type_names(self) -> &'static str {
        match self {
            OutputSchema::DublinCore => "csw:Record",
            OutputSchema::Iso19139 => "gmd:MD_Metadata",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementSet {
    Brief,
    Full,
}

impl ElementSet {
    fn name(self) -> &'static str {
        match self {
            ElementSet::Brief => "brief",
            ElementSet::Full => "full",
        }
    }
}

/// One `PropertyIs…` comparison; several are AND-ed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyFilter {
    pub property: String,
    pub value: String,
    /// `PropertyIsLike` with `%` wildcards instead of `PropertyIsEqualTo`.
    pub like: bool,
}

impl PropertyFilter {
    pub fn equals(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
            like: false,
        }
    }

    pub fn like(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
            like: true,
        }
    }
}

/// The request modes the harvester supports. Raw requests are issued as
/// given, so the server's own paging attributes apply and the harvester
/// will not paginate them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordsRequest {
    Raw(String),
    Constraints(Vec<PropertyFilter>),
    All,
}

impl RecordsRequest {
    pub fn constraints(&self) -> &[PropertyFilter] {
        match self {
            RecordsRequest::Constraints(filters) => filters,
            _ => &[],
        }
    }
}

pub struct GetRecordsBody {
    pub schema: OutputSchema,
    pub element_set: ElementSet,
    pub start_position: u64,
    pub max_records: usize,
    /// `resultType="hits"` requests, used by `count()`, return no records.
    pub hits_only: bool,
}

impl GetRecordsBody {
    /// Serialize the request. Infallible in practice: the writer targets an
    /// in-memory buffer.
    pub fn render(&self, filters: &[PropertyFilter]) -> String {
        let mut writer = Writer::new(Vec::new());
        // Writing to a Vec cannot fail; quick-xml still reports io::Result.
        let _ = self.write(&mut writer, filters);
        String::from_utf8_lossy(&writer.into_inner()).into_owned()
    }

    fn write(
        &self,
        writer: &mut Writer<Vec<u8>>,
        filters: &[PropertyFilter],
    ) -> quick_xml::Result<()> {
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root = BytesStart::new("csw:GetRecords");
        root.push_attribute(("xmlns:csw", CSW_NS));
        root.push_attribute(("xmlns:ogc", OGC_NS));
        root.push_attribute(("xmlns:gmd", GMD_OUTPUT_SCHEMA));
        root.push_attribute(("service", "CSW"));
        root.push_attribute(("version", "2.0.2"));
        root.push_attribute((
            "resultType",
            if self.hits_only { "hits" } else { "results" },
        ));
        root.push_attribute(("startPosition", self.start_position.to_string().as_str()));
        root.push_attribute(("maxRecords", self.max_records.to_string().as_str()));
        root.push_attribute(("outputSchema", self.schema.uri()));
        writer.write_event(Event::Start(root))?;

        let mut query = BytesStart::new("csw:Query");
        query.push_attribute(("typeNames", self.schema.type_names()));
        writer.write_event(Event::Start(query))?;

        writer.write_event(Event::Start(BytesStart::new("csw:ElementSetName")))?;
        writer.write_event(Event::Text(BytesText::new(self.element_set.name())))?;
        writer.write_event(Event::End(BytesEnd::new("csw:ElementSetName")))?;

        if !filters.is_empty() {
            let mut constraint = BytesStart::new("csw:Constraint");
            constraint.push_attribute(("version", "1.1.0"));
            writer.write_event(Event::Start(constraint))?;
            writer.write_event(Event::Start(BytesStart::new("ogc:Filter")))?;

            let conjunction = filters.len() > 1;
            if conjunction {
                writer.write_event(Event::Start(BytesStart::new("ogc:And")))?;
            }
            for filter in filters {
                write_comparison(writer, filter)?;
            }
            if conjunction {
                writer.write_event(Event::End(BytesEnd::new("ogc:And")))?;
            }

            writer.write_event(Event::End(BytesEnd::new("ogc:Filter")))?;
            writer.write_event(Event::End(BytesEnd::new("csw:Constraint")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("csw:Query")))?;
        writer.write_event(Event::End(BytesEnd::new("csw:GetRecords")))?;
        Ok(())
    }
}

fn write_comparison(
    writer: &mut Writer<Vec<u8>>,
    filter: &PropertyFilter,
) -> quick_xml::Result<()> {
    let element = if filter.like {
        "ogc:PropertyIsLike"
    } else {
        "ogc:PropertyIsEqualTo"
    };

    let mut start = BytesStart::new(element);
    if filter.like {
        start.push_attribute(("wildCard", "%"));
        start.push_attribute(("singleChar", "_"));
        start.push_attribute(("escapeChar", "\\"));
    }
    writer.write_event(Event::Start(start))?;

    writer.write_event(Event::Start(BytesStart::new("ogc:PropertyName")))?;
    writer.write_event(Event::Text(BytesText::new(&filter.property)))?;
    writer.write_event(Event::End(BytesEnd::new("ogc:PropertyName")))?;

    writer.write_event(Event::Start(BytesStart::new("ogc:Literal")))?;
    writer.write_event(Event::Text(BytesText::new(&filter.value)))?;
    writer.write_event(Event::End(BytesEnd::new("ogc:Literal")))?;

    writer.write_event(Event::End(BytesEnd::new(element)))?;
    Ok(())
}
