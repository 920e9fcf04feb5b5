use crate::model::{PricePoint, ScraperError};
use crate::scraper::fetcher::{USER_AGENT, map_reqwest_error};
use crate::scraper::traits::PriceSource;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const YAHOO_CHART_BASE: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    adjclose: Vec<Option<f64>>,
}

/// Daily history from the public Yahoo chart endpoint.
pub struct YahooChartSource {
    client: Client,
    base_url: String,
}

impl YahooChartSource {
    pub fn new(timeout: Duration) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ScraperError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: YAHOO_CHART_BASE.to_string(),
        })
    }

    fn build_url(&self, ticker: &str, start: NaiveDate) -> String {
        let period1 = start
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0);
        let period2 = Utc::now().timestamp();
        format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=history&includeAdjustedClose=true",
            self.base_url, ticker, period1, period2
        )
    }
}

/// Converts a chart response into daily points.
///
/// Days with any missing price are skipped. Output is sorted by date with
/// duplicate dates removed.
pub fn points_from_chart(response: ChartResponse) -> Result<Vec<PricePoint>, ScraperError> {
    if let Some(err) = response.chart.error {
        return Err(ScraperError::InvalidResponse(format!("{}: {}", err.code, err.description)));
    }
    let result = response
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
        .ok_or_else(|| ScraperError::InvalidResponse("chart result is empty".into()))?;

    let offset = result.meta.map(|m| m.gmtoffset).unwrap_or(0);
    let quote = result
        .indicators
        .quote
        .first()
        .ok_or_else(|| ScraperError::InvalidResponse("chart has no quote block".into()))?;
    let adj = result.indicators.adjclose.first().map(|a| &a.adjclose);

    let mut points = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let Some(date) = DateTime::from_timestamp(ts + offset, 0).map(|dt| dt.date_naive()) else {
            continue;
        };
        let at = |col: &Vec<Option<f64>>| col.get(i).copied().flatten();
        let close = at(&quote.close);
        // No adjusted column means no corporate actions to adjust for.
        let adj_close = match adj {
            Some(col) => at(col),
            None => close,
        };
        if let (Some(open), Some(high), Some(low), Some(close), Some(adj_close)) =
            (at(&quote.open), at(&quote.high), at(&quote.low), close, adj_close)
        {
            points.push(PricePoint { date, open, high, low, close, adj_close });
        }
    }

    points.sort_by_key(|p| p.date);
    points.dedup_by_key(|p| p.date);
    Ok(points)
}

#[async_trait::async_trait]
impl PriceSource for YahooChartSource {
    async fn fetch_history(
        &self,
        ticker: &str,
        start: NaiveDate,
    ) -> Result<Vec<PricePoint>, ScraperError> {
        let url = self.build_url(ticker, start);
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await.map_err(map_reqwest_error)?;
        if !response.status().is_success() {
            return Err(ScraperError::InvalidResponse(format!(
                "price history for {} returned {}",
                ticker,
                response.status()
            )));
        }
        let body: ChartResponse = response.json().await.map_err(map_reqwest_error)?;
        let points = points_from_chart(body)?;
        info!("Fetched {} daily points for {}", points.len(), ticker);
        Ok(points)
    }
}
