// Per-record enrichment from detail pages
use crate::model::{
    EnrichError, ExtractedTable, FieldLabel, FieldMap, LINK_FIELD, MarketError, RawRow,
    StockDetail,
};
use crate::parser::DetailPageParser;
use crate::scraper::Scraper;
use serde::Deserialize;
use tracing::{info, warn};

/// What to do when one record cannot be enriched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum BatchPolicy {
    /// The first failure aborts the whole batch.
    #[default]
    #[serde(rename = "abort")]
    AbortOnFirstError,
    /// Failed records are logged and left out.
    #[serde(rename = "skip_failed")]
    SkipFailed,
}

/// Fetches and parses the detail page behind a row's link.
#[async_trait::async_trait]
pub trait DetailSource: Send + Sync {
    async fn fetch_detail(&self, link: &str) -> Result<StockDetail, EnrichError>;
}

pub struct HttpDetailSource<S: Scraper> {
    scraper: S,
    parser: DetailPageParser,
    url_prefix: String,
}

impl<S: Scraper> HttpDetailSource<S> {
    pub fn new(scraper: S, url_prefix: &str) -> Result<Self, EnrichError> {
        Ok(Self {
            scraper,
            parser: DetailPageParser::new()?,
            url_prefix: url_prefix.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl<S: Scraper> DetailSource for HttpDetailSource<S> {
    async fn fetch_detail(&self, link: &str) -> Result<StockDetail, EnrichError> {
        let url = format!("{}{}", self.url_prefix, link);
        let html = self.scraper.fetch(&url).await?;
        Ok(self.parser.parse(&html)?)
    }
}

pub struct RecordEnricher<D: DetailSource> {
    source: D,
    policy: BatchPolicy,
}

impl<D: DetailSource> RecordEnricher<D> {
    pub fn new(source: D, policy: BatchPolicy) -> Self {
        Self { source, policy }
    }

    pub fn policy(&self) -> BatchPolicy {
        self.policy
    }

    /// Keys `row` by `header` and merges in the fields of its detail page.
    pub async fn enrich_row(
        &self,
        header: &[FieldLabel],
        row: &RawRow,
    ) -> Result<FieldMap, EnrichError> {
        let mut fields = FieldMap::from_row(header, row);
        let link = fields
            .get(LINK_FIELD)
            .ok_or(EnrichError::MissingLink)?
            .to_string();

        let detail = self.source.fetch_detail(&link).await?;
        for (label, value) in detail.fields() {
            fields.set(&label, Some(value));
        }
        Ok(fields)
    }

    /// Enriches every row in order, one fetch at a time.
    pub async fn enrich_all(&self, table: &ExtractedTable) -> Result<Vec<FieldMap>, MarketError> {
        let mut enriched = Vec::with_capacity(table.rows.len());

        for (i, row) in table.rows.iter().enumerate() {
            if row.len() > table.header.len() {
                warn!(
                    "Row {} has {} values for {} columns; extra values dropped",
                    i,
                    row.len(),
                    table.header.len()
                );
            }

            match self.enrich_row(&table.header, row).await {
                Ok(fields) => enriched.push(fields),
                Err(e) => match self.policy {
                    BatchPolicy::AbortOnFirstError => {
                        return Err(MarketError::Enrich { row: i, source: e });
                    }
                    BatchPolicy::SkipFailed => {
                        warn!("Skipping row {}: {}", i, e);
                    }
                },
            }
        }

        info!("Enriched {}/{} records", enriched.len(), table.rows.len());
        Ok(enriched)
    }
}
