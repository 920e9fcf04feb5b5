// Transport seams: markup pages and price history.

pub mod fetcher;
pub mod price_source;
pub mod traits;

pub use fetcher::ScraperImpl;
pub use price_source::YahooChartSource;
pub use traits::{PriceSource, Scraper};
