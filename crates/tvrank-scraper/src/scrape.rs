//! Fetch → extract → normalize for a single source page.

use tvrank_core::{RecordFragment, SourceDescriptor, SourceFragments, TableVariant};

use crate::error::ExtractionGap;
use crate::extract::extract_table;
use crate::normalize::normalize_row;
use crate::transport::{HttpRequest, Transport};

/// What one source contributed to a pass.
///
/// `gap` is set when the source contributed nothing; it is informational
/// and never aborts the group.
#[derive(Debug)]
pub struct SourceScrape {
    pub service: String,
    pub fragments: Vec<RecordFragment>,
    pub gap: Option<ExtractionGap>,
}

impl SourceScrape {
    fn gap(source: &SourceDescriptor, gap: ExtractionGap) -> Self {
        tracing::warn!(
            service = %source.service,
            url = %source.endpoint,
            reason = %gap,
            "source yielded no rows"
        );
        Self {
            service: source.service.clone(),
            fragments: Vec::new(),
            gap: Some(gap),
        }
    }

    #[must_use]
    pub fn into_fragments(self) -> SourceFragments {
        SourceFragments {
            service: self.service,
            fragments: self.fragments,
        }
    }
}

/// Scrapes one source page into fragments.
///
/// Transport failures, a missing results table, and a table without usable
/// rows are all absorbed into [`SourceScrape::gap`].
pub async fn scrape_source<T>(
    transport: &T,
    source: &SourceDescriptor,
    variant: TableVariant,
) -> SourceScrape
where
    T: Transport + ?Sized,
{
    let request = HttpRequest::get(source.endpoint.as_str())
        .header("Accept", "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8");

    let html = match transport.execute(request).await {
        Ok(response) => response.body,
        Err(err) => return SourceScrape::gap(source, ExtractionGap::Fetch(err)),
    };

    let Some(rows) = extract_table(&html, variant) else {
        return SourceScrape::gap(source, ExtractionGap::TableMissing);
    };
    if rows.is_empty() {
        return SourceScrape::gap(source, ExtractionGap::NoRows);
    }

    let fragments: Vec<RecordFragment> = rows
        .iter()
        .map(|row| normalize_row(row, &source.service))
        .collect();

    let unparseable = fragments
        .iter()
        .filter(|f| f.source_rank.is_none() || f.viewers.is_none())
        .count();
    tracing::info!(
        service = %source.service,
        rows = fragments.len(),
        unparseable,
        "scraped source"
    );

    SourceScrape {
        service: source.service.clone(),
        fragments,
        gap: None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use reqwest::Url;

    use super::*;
    use crate::error::TransportError;
    use crate::transport::HttpResponse;

    struct FakeTransport {
        pages: HashMap<String, Result<String, u16>>,
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            match self.pages.get(&request.url) {
                Some(Ok(body)) => Ok(HttpResponse {
                    status: 200,
                    body: body.clone(),
                }),
                Some(Err(status)) => Err(TransportError::Status {
                    status: *status,
                    url: request.url,
                    body: String::new(),
                }),
                None => Err(TransportError::Status {
                    status: 404,
                    url: request.url,
                    body: String::new(),
                }),
            }
        }
    }

    fn source(url: &str) -> SourceDescriptor {
        SourceDescriptor {
            service: "MTV Katsomo".to_string(),
            endpoint: Url::parse(url).unwrap(),
        }
    }

    const PAGE: &str = r#"<table class="totaltv">
<tr><th>#</th><th>Ohjelma</th><th>Jakso</th><th>Kanava</th><th>Kesto</th><th>Katsojat</th></tr>
<tr><td>#1</td><td>Uutiset</td><td></td><td>MTV3</td><td>0:20</td><td>12.345</td></tr>
<tr><td>#2</td><td>Sää</td><td></td><td>MTV3</td><td>0:05</td><td>ei tietoa</td></tr>
</table>"#;

    #[tokio::test]
    async fn scrapes_and_normalizes_rows() {
        let url = "https://example.com/mtv.html";
        let transport = FakeTransport {
            pages: HashMap::from([(url.to_string(), Ok(PAGE.to_string()))]),
        };

        let result = scrape_source(&transport, &source(url), TableVariant::Detailed).await;

        assert!(result.gap.is_none());
        assert_eq!(result.fragments.len(), 2);
        assert_eq!(result.fragments[0].viewers, Some(12_345));
        assert_eq!(result.fragments[0].service, "MTV Katsomo");
        assert_eq!(result.fragments[1].viewers, None);
    }

    #[tokio::test]
    async fn fetch_failure_becomes_gap() {
        let url = "https://example.com/down.html";
        let transport = FakeTransport {
            pages: HashMap::from([(url.to_string(), Err(503))]),
        };

        let result = scrape_source(&transport, &source(url), TableVariant::Detailed).await;

        assert!(result.fragments.is_empty());
        assert!(matches!(
            result.gap,
            Some(ExtractionGap::Fetch(TransportError::Status { status: 503, .. }))
        ));
    }

    #[tokio::test]
    async fn missing_table_becomes_gap() {
        let url = "https://example.com/empty.html";
        let transport = FakeTransport {
            pages: HashMap::from([(url.to_string(), Ok("<p>Ei tuloksia</p>".to_string()))]),
        };

        let result = scrape_source(&transport, &source(url), TableVariant::Detailed).await;

        assert!(matches!(result.gap, Some(ExtractionGap::TableMissing)));
    }

    #[tokio::test]
    async fn header_only_table_becomes_no_rows_gap() {
        let url = "https://example.com/header.html";
        let transport = FakeTransport {
            pages: HashMap::from([(
                url.to_string(),
                Ok("<table class=\"totaltv\"><tr><th>#</th></tr></table>".to_string()),
            )]),
        };

        let result = scrape_source(&transport, &source(url), TableVariant::Detailed).await;

        assert!(matches!(result.gap, Some(ExtractionGap::NoRows)));
        let fragments = result.into_fragments();
        assert_eq!(fragments.service, "MTV Katsomo");
        assert!(fragments.fragments.is_empty());
    }
}
