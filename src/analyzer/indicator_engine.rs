use crate::analyzer::chart::assemble;
use crate::analyzer::moving_average::{exponential_series, rolling_mean};
use crate::model::{ChartTuple, IndicatorPoint, IndicatorSeries, PricePoint};
use crate::utils::date_num;
use tracing::{debug, warn};

/// Moving averages over adjusted close for a small and a large window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorEngine {
    pub small_window: usize,
    pub large_window: usize,
    /// Trailing display slice; `None` or `Some(0)` keeps every point.
    pub date_window: Option<usize>,
}

impl IndicatorEngine {
    pub fn new(small_window: usize, large_window: usize) -> Self {
        Self {
            small_window,
            large_window,
            date_window: None,
        }
    }

    pub fn with_date_window(mut self, date_window: Option<usize>) -> Self {
        self.date_window = date_window;
        self
    }

    /// Builds the indicator series for a chronological price series.
    ///
    /// Only points where both averages are defined are kept, so a series
    /// shorter than the larger window yields an empty result.
    pub fn compute(&self, prices: &[PricePoint]) -> IndicatorSeries {
        let closes: Vec<f64> = prices.iter().map(|p| p.adj_close).collect();
        let ma_small = rolling_mean(&closes, self.small_window);
        let ma_large = rolling_mean(&closes, self.large_window);

        let warmed: Vec<(&PricePoint, f64, f64)> = prices
            .iter()
            .zip(ma_small)
            .zip(ma_large)
            .filter_map(|((p, s), l)| Some((p, s?, l?)))
            .collect();

        let Some(&(_, seed_small, seed_large)) = warmed.first() else {
            warn!(
                "Insufficient history: {} points for windows {}/{}",
                prices.len(),
                self.small_window,
                self.large_window
            );
            return self.series(Vec::new());
        };

        let retained: Vec<f64> = warmed.iter().map(|(p, _, _)| p.adj_close).collect();
        let ema_small = exponential_series(&retained, seed_small, self.small_window);
        let ema_large = exponential_series(&retained, seed_large, self.large_window);

        let points: Vec<IndicatorPoint> = warmed
            .iter()
            .zip(ema_small.iter().zip(ema_large.iter()))
            .map(|(&(p, ma_small, ma_large), (&ema_small, &ema_large))| IndicatorPoint {
                price: p.clone(),
                date_num: date_num(p.date),
                ma_small,
                ma_large,
                ema_small,
                ema_large,
            })
            .collect();

        let total = points.len();
        let points = display_window(points, self.date_window);
        debug!("Indicator series: {} warmed points, {} displayed", total, points.len());
        self.series(points)
    }

    /// The series plus its candlestick tuples.
    pub fn run(&self, prices: &[PricePoint]) -> (IndicatorSeries, Vec<ChartTuple>) {
        let series = self.compute(prices);
        let candles = assemble(&series);
        (series, candles)
    }

    fn series(&self, points: Vec<IndicatorPoint>) -> IndicatorSeries {
        IndicatorSeries {
            small_window: self.small_window,
            large_window: self.large_window,
            points,
        }
    }
}

/// Keeps indices `len - n ..= len - 2`. The newest point is left out.
// TODO: confirm with chart consumers whether the newest point should be shown.
pub fn display_window<T>(mut points: Vec<T>, window: Option<usize>) -> Vec<T> {
    let n = match window {
        None | Some(0) => return points,
        Some(n) => n,
    };
    let len = points.len();
    let start = len.saturating_sub(n);
    let end = len.saturating_sub(1);
    if start >= end {
        return Vec::new();
    }
    points.truncate(end);
    points.drain(..start);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn prices(closes: &[f64]) -> Vec<PricePoint> {
        let start = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PricePoint {
                date: start + Duration::days(i as i64),
                open: c - 1.0,
                high: c + 1.0,
                low: c - 2.0,
                close: c + 0.5,
                adj_close: c,
            })
            .collect()
    }

    #[test]
    fn test_series_starts_after_large_warmup() {
        let closes: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let series = IndicatorEngine::new(2, 4).compute(&prices(&closes));

        assert_eq!(series.len(), 10 - 4 + 1);
        let first = &series.points[0];
        assert_eq!(first.price.adj_close, 4.0);
        assert_eq!(first.ma_large, 2.5); // (1+2+3+4)/4
        assert_eq!(first.ma_small, 3.5); // (3+4)/2
        assert_eq!(first.ema_small, first.ma_small);
        assert_eq!(first.ema_large, first.ma_large);
    }

    #[test]
    fn test_ema_follows_recurrence_from_seed() {
        let series = IndicatorEngine::new(1, 2).compute(&prices(&[8.0, 10.0, 12.0, 14.0]));
        // Warm-up drops the first point; MA_2 seed = (8+10)/2 = 9.
        let ema: Vec<f64> = series.points.iter().map(|p| p.ema_large).collect();
        assert_eq!(ema[0], 9.0);
        assert!((ema[1] - ((12.0 - 9.0) * 2.0 / 3.0 + 12.0)).abs() < 1e-9);
        assert!((ema[2] - ((14.0 - ema[1]) * 2.0 / 3.0 + 14.0)).abs() < 1e-9);
    }

    #[test]
    fn test_short_history_is_empty_not_error() {
        let series = IndicatorEngine::new(3, 5).compute(&prices(&[1.0, 2.0, 3.0, 4.0]));
        assert!(series.is_empty());
        let (series, candles) = IndicatorEngine::new(3, 5).run(&[]);
        assert!(series.is_empty() && candles.is_empty());
    }

    #[test]
    fn test_date_window_excludes_last_point() {
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let full = IndicatorEngine::new(2, 5).compute(&prices(&closes));
        let windowed = IndicatorEngine::new(2, 5)
            .with_date_window(Some(10))
            .compute(&prices(&closes));

        let l = full.len();
        assert_eq!(windowed.len(), 9);
        assert_eq!(windowed.points[0], full.points[l - 10]);
        assert_eq!(windowed.points[8], full.points[l - 2]);
    }

    #[test]
    fn test_display_window_edges() {
        let v: Vec<u32> = (0..5).collect();
        assert_eq!(display_window(v.clone(), None), v);
        assert_eq!(display_window(v.clone(), Some(0)), v);
        assert_eq!(display_window(v.clone(), Some(3)), vec![2, 3]);
        assert_eq!(display_window(v.clone(), Some(1)), Vec::<u32>::new());
        assert_eq!(display_window(v.clone(), Some(50)), vec![0, 1, 2, 3]);
        assert_eq!(display_window(Vec::<u32>::new(), Some(3)), Vec::<u32>::new());
    }

    #[test]
    fn test_date_num_is_monotonic() {
        let closes: Vec<f64> = (1..=8).map(|x| x as f64).collect();
        let series = IndicatorEngine::new(2, 3).compute(&prices(&closes));
        assert!(series.points.windows(2).all(|w| w[1].date_num > w[0].date_num));
    }
}
