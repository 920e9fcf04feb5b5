use nse_market_data::config::{AppConfig, ChartConfig, MarketConfig, load_config};
use nse_market_data::enricher::{HttpDetailSource, RecordEnricher};
use nse_market_data::parser::MarketTableParser;
use nse_market_data::pipeline::{market_snapshot, stock_chart};
use nse_market_data::scraper::{ScraperImpl, YahooChartSource};
use nse_market_data::storage::ArtifactStore;
use futures::future::join_all;
use std::time::Duration;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config: AppConfig = match load_config("config.json") {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    let store = ArtifactStore::new(&config.output_dir);
    info!("Artifacts directory: {}", store.root().display());
    let timeout = Duration::from_secs(config.request_timeout_seconds);

    match &config.market {
        Some(market_cfg) => process_market(market_cfg, timeout, &store).await,
        None => info!("No market section configured, skipping snapshot."),
    }

    if config.charts.is_empty() {
        info!("No charts configured.");
        return;
    }

    let prices = match YahooChartSource::new(timeout) {
        Ok(source) => source,
        Err(e) => {
            error!("Failed to build price client: {}", e);
            return;
        }
    };

    info!("Charts to process: {}", config.charts.len());
    let tasks: Vec<_> = config
        .charts
        .iter()
        .map(|chart_cfg| process_chart(chart_cfg, &prices, &store))
        .collect();
    join_all(tasks).await;

    info!("Done.");
}

/// Builds the market snapshot and saves it. Any failure leaves no market artifact.
async fn process_market(market_cfg: &MarketConfig, timeout: Duration, store: &ArtifactStore) {
    info!("Processing market table: {}", market_cfg.url);

    let parser = match MarketTableParser::new(&market_cfg.table_selector, &market_cfg.detail_link_marker) {
        Ok(p) => p,
        Err(e) => {
            error!("Parser setup failed: {}", e);
            return;
        }
    };

    let index_scraper = match ScraperImpl::new(timeout) {
        Ok(s) => s,
        Err(e) => {
            error!("HTTP client setup failed: {}", e);
            return;
        }
    };
    // Detail pages share the connection pool
    let detail_scraper = ScraperImpl {
        client: index_scraper.client.clone(),
    };

    let details = match HttpDetailSource::new(detail_scraper, &market_cfg.detail_url_prefix) {
        Ok(d) => d,
        Err(e) => {
            error!("Detail source setup failed: {}", e);
            return;
        }
    };
    let enricher = RecordEnricher::new(details, market_cfg.batch_policy);
    info!("Enrichment policy: {:?}", enricher.policy());

    let table = match market_snapshot(&index_scraper, &market_cfg.url, &parser, &enricher).await {
        Ok(t) => t,
        Err(e) => {
            error!("Market snapshot aborted: {}", e);
            return;
        }
    };
    info!("Market snapshot: {} records", table.len());

    if let Err(e) = store.save_market_data(&table) {
        warn!("Saving market data failed: {}", e);
    }
}

async fn process_chart(chart_cfg: &ChartConfig, prices: &YahooChartSource, store: &ArtifactStore) {
    info!("Processing chart: {}", chart_cfg.title());

    let chart = match stock_chart(prices, chart_cfg).await {
        Ok(c) => c,
        Err(e) => {
            warn!("Price fetch failed for {}: {}", chart_cfg.stock, e);
            return;
        }
    };

    if chart.candles.is_empty() {
        warn!("No chart points for {} (insufficient history)", chart_cfg.stock);
    }

    if let Err(e) = store.save_chart(&chart) {
        warn!("Saving chart {} failed: {}", chart.title, e);
    }
}
