//! Stock Chart Pipeline Tests
//!
//! Feed synthetic price histories through the chart flow and check the
//! warm-up, the exponential recurrence and the display slice.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use nse_market_data::config::ChartConfig;
use nse_market_data::model::{PricePoint, ScraperError};
use nse_market_data::pipeline::stock_chart;
use nse_market_data::scraper::PriceSource;
use nse_market_data::utils::date_num;

struct FixedPrices(Vec<PricePoint>);

#[async_trait]
impl PriceSource for FixedPrices {
    async fn fetch_history(
        &self,
        _ticker: &str,
        start: NaiveDate,
    ) -> Result<Vec<PricePoint>, ScraperError> {
        Ok(self.0.iter().filter(|p| p.date >= start).cloned().collect())
    }
}

struct Offline;

#[async_trait]
impl PriceSource for Offline {
    async fn fetch_history(&self, _ticker: &str, _start: NaiveDate) -> Result<Vec<PricePoint>, ScraperError> {
        Err(ScraperError::Timeout)
    }
}

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2016, 1, 1).unwrap()
}

fn history(days: usize) -> Vec<PricePoint> {
    (0..days)
        .map(|i| {
            let c = 100.0 + (i % 7) as f64 * 1.5 - (i % 3) as f64;
            PricePoint {
                date: start() + Duration::days(i as i64),
                open: c - 0.5,
                high: c + 1.0,
                low: c - 1.0,
                close: c + 0.25,
                adj_close: c,
            }
        })
        .collect()
}

fn chart(date_window: Option<usize>) -> ChartConfig {
    ChartConfig {
        stock: "ADANIPORTS.NS".into(),
        start_date: start(),
        date_window,
        small_window: 3,
        large_window: 5,
    }
}

#[tokio::test]
async fn test_chart_without_window() {
    let prices = history(40);
    let data = stock_chart(&FixedPrices(prices.clone()), &chart(None)).await.unwrap();

    assert_eq!(data.title, "ADANIPORTS.NS_2016-01-01_3_5");
    assert_eq!(data.candles.len(), 40 - 5 + 1);
    assert_eq!(data.candles[0].date_num, date_num(prices[4].date));
    assert_eq!(data.candles[0].adj_close, prices[4].adj_close);

    let ma5 = data.overlay("MA_5").unwrap();
    let expected: f64 = prices[0..5].iter().map(|p| p.adj_close).sum::<f64>() / 5.0;
    assert!((ma5[0] - expected).abs() < 1e-9);

    let ema3 = data.overlay("EMA_3").unwrap();
    let ma3 = data.overlay("MA_3").unwrap();
    assert_eq!(ema3[0], ma3[0]);
    for i in 1..ema3.len() {
        let price = data.candles[i].adj_close;
        let want = (price - ema3[i - 1]) * 0.5 + price;
        assert!((ema3[i] - want).abs() < 1e-9, "EMA_3 at {}", i);
    }
}

#[tokio::test]
async fn test_chart_with_display_window() {
    let full = stock_chart(&FixedPrices(history(40)), &chart(None)).await.unwrap();
    let windowed = stock_chart(&FixedPrices(history(40)), &chart(Some(20))).await.unwrap();

    let l = full.candles.len();
    assert_eq!(windowed.candles.len(), 19);
    assert_eq!(windowed.candles[..], full.candles[l - 20..l - 1]);
    assert_eq!(windowed.overlay("EMA_5").unwrap().len(), 19);
}

#[tokio::test]
async fn test_short_history_gives_empty_chart() {
    let data = stock_chart(&FixedPrices(history(4)), &chart(Some(20))).await.unwrap();
    assert!(data.candles.is_empty());
    assert!(data.overlays.iter().all(|o| o.values.is_empty()));
}

#[tokio::test]
async fn test_price_source_error_propagates() {
    let err = stock_chart(&Offline, &chart(None)).await;
    assert!(matches!(err, Err(ScraperError::Timeout)));
}
