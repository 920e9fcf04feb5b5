// The two end-to-end flows: market snapshot and stock chart.
use crate::analyzer::{ChartData, IndicatorEngine};
use crate::config::ChartConfig;
use crate::enricher::{DetailSource, RecordEnricher};
use crate::model::{MarketError, MarketTable, ScraperError};
use crate::normalizer::normalize_all;
use crate::parser::{MarketTableParser, Parser};
use crate::scraper::{PriceSource, Scraper};
use tracing::info;

/// Fetches the index page, extracts its table, enriches every row and
/// returns the records ordered by `Change`.
pub async fn market_snapshot<S: Scraper, D: DetailSource>(
    scraper: &S,
    url: &str,
    parser: &MarketTableParser,
    enricher: &RecordEnricher<D>,
) -> Result<MarketTable, MarketError> {
    info!("Fetching market table from {}", url);
    let html = scraper.fetch(url).await?;
    let extracted = parser.parse(&html)?;
    let enriched = enricher.enrich_all(&extracted).await?;
    normalize_all(enriched)
}

/// Fetches price history for one configured stock and builds its chart data.
pub async fn stock_chart<P: PriceSource>(
    source: &P,
    chart: &ChartConfig,
) -> Result<ChartData, ScraperError> {
    info!("Fetching price history for {} since {}", chart.stock, chart.start_date);
    let prices = source.fetch_history(&chart.stock, chart.start_date).await?;
    let engine = IndicatorEngine::new(chart.small_window, chart.large_window)
        .with_date_window(chart.date_window);
    let (series, candles) = engine.run(&prices);
    Ok(ChartData::new(chart.title(), &series, candles))
}
