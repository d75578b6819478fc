//! HTTP client for a CSW 2.0.2 endpoint.

use std::time::Duration;

use futures::Stream;
use url::Url;

use crate::request::{ElementSet, GetRecordsBody, OutputSchema, RecordsRequest};
use crate::response::{self, HarvestItem};
use crate::CswError;

/// Servers commonly cap GetRecords pages; staying at or below ten keeps the
/// two-phase (DC then ISO) windows aligned everywhere.
pub const MAX_PAGE_SIZE: usize = 10;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct CswClient {
    http: reqwest::Client,
    endpoint: Url,
    page_size: usize,
}

impl CswClient {
    pub fn new(endpoint: Url) -> Result<Self, CswError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(CswError::Connection)?;
        Ok(Self {
            http,
            endpoint,
            page_size: MAX_PAGE_SIZE,
        })
    }

    /// Clamp the page size into `1..=MAX_PAGE_SIZE`.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    async fn post(&self, body: String) -> Result<String, CswError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/xml")
            .body(body)
            .send()
            .await
            .map_err(CswError::Connection)?;

        let status = response.status();
        let text = response.text().await.map_err(CswError::Connection)?;
        if !status.is_success() {
            return Err(CswError::Http {
                status,
                body_prefix: text.chars().take(200).collect(),
            });
        }
        Ok(text)
    }

    /// Total number of records matching the request, via a minimal
    /// `resultType="hits"` probe.
    pub async fn count(&self, request: &RecordsRequest) -> Result<u64, CswError> {
        let body = match request {
            RecordsRequest::Raw(xml) => xml.clone(),
            _ => GetRecordsBody {
                schema: OutputSchema::DublinCore,
                element_set: ElementSet::Brief,
                start_position: 1,
                max_records: 1,
                hits_only: true,
            }
            .render(request.constraints()),
        };
        let text = self.post(body).await?;
        response::parse_matches(&text)
    }

    /// Lazy stream over all matching records.
    ///
    /// Each page is fetched twice: once as Dublin Core for stable
    /// identifiers, once as full ISO 19139 for the metadata, and the two are
    /// aligned by index. Per-record problems surface as
    /// [`HarvestItem::Failed`]; only connection and protocol failures end
    /// the stream with an error.
    ///
    /// A raw request is posted exactly as given and yields a single window.
    pub fn harvest(
        &self,
        request: RecordsRequest,
    ) -> impl Stream<Item = Result<HarvestItem, CswError>> + '_ {
        struct Window {
            request: RecordsRequest,
            start_position: u64,
            buffered: std::collections::VecDeque<HarvestItem>,
            done: bool,
        }

        let window = Window {
            request,
            start_position: 1,
            buffered: Default::default(),
            done: false,
        };

        futures::stream::try_unfold(window, move |mut window| async move {
            loop {
                if let Some(item) = window.buffered.pop_front() {
                    return Ok(Some((item, window)));
                }
                if window.done {
                    return Ok(None);
                }

                let (meta, items) = match &window.request {
                    RecordsRequest::Raw(xml) => {
                        window.done = true;
                        let text = self.post(xml.clone()).await?;
                        response::parse_iso_page(&text, &[], window.start_position)?
                    }
                    _ => {
                        let page = self.fetch_window(&window.request, window.start_position);
                        let (meta, items) = page.await?;

                        let advanced = window.start_position + self.page_size as u64;
                        if items.is_empty() || advanced > meta.matches {
                            window.done = true;
                        }
                        window.start_position = advanced;
                        (meta, items)
                    }
                };

                tracing::debug!(
                    matches = meta.matches,
                    returned = items.len(),
                    next_start = window.start_position,
                    "harvested CSW window"
                );

                if items.is_empty() && window.done {
                    return Ok(None);
                }
                window.buffered.extend(items);
            }
        })
    }

    async fn fetch_window(
        &self,
        request: &RecordsRequest,
        start_position: u64,
    ) -> Result<(response::PageMeta, Vec<HarvestItem>), CswError> {
        let filters = request.constraints();

        let dc_body = GetRecordsBody {
            schema: OutputSchema::DublinCore,
            element_set: ElementSet::Brief,
            start_position,
            max_records: self.page_size,
            hits_only: false,
        }
        .render(filters);
        let dc_text = self.post(dc_body).await?;
        let (_, dc_identifiers) = response::parse_dc_identifiers(&dc_text)?;

        let iso_body = GetRecordsBody {
            schema: OutputSchema::Iso19139,
            element_set: ElementSet::Full,
            start_position,
            max_records: self.page_size,
            hits_only: false,
        }
        .render(filters);
        let iso_text = self.post(iso_body).await?;
        response::parse_iso_page(&iso_text, &dc_identifiers, start_position)
    }
}
