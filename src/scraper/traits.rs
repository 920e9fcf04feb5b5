use crate::model::{PricePoint, ScraperError};
use chrono::NaiveDate;

#[async_trait::async_trait]
pub trait Scraper: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, ScraperError>;
}

/// Daily price history for one ticker, oldest first, one point per date.
#[async_trait::async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_history(
        &self,
        ticker: &str,
        start: NaiveDate,
    ) -> Result<Vec<PricePoint>, ScraperError>;
}
