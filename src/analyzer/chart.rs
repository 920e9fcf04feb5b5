use crate::model::{ChartTuple, IndicatorSeries};
use serde::{Deserialize, Serialize};

/// Candlestick tuples for every retained point, in order.
pub fn assemble(series: &IndicatorSeries) -> Vec<ChartTuple> {
    series
        .points
        .iter()
        .map(|p| ChartTuple {
            date_num: p.date_num,
            open: p.price.open,
            high: p.price.high,
            low: p.price.low,
            adj_close: p.price.adj_close,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub label: String,
    pub values: Vec<f64>,
}

/// Everything a renderer needs: candles plus the MA/EMA lines by label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub title: String,
    pub small_window: usize,
    pub large_window: usize,
    pub candles: Vec<ChartTuple>,
    pub overlays: Vec<Overlay>,
}

impl ChartData {
    pub fn new(title: String, series: &IndicatorSeries, candles: Vec<ChartTuple>) -> Self {
        let overlays = series
            .labels()
            .into_iter()
            .filter_map(|label| {
                series
                    .overlay(&label)
                    .map(|values| Overlay { label, values })
            })
            .collect();

        Self {
            title,
            small_window: series.small_window,
            large_window: series.large_window,
            candles,
            overlays,
        }
    }

    pub fn overlay(&self, label: &str) -> Option<&[f64]> {
        self.overlays
            .iter()
            .find(|o| o.label == label)
            .map(|o| o.values.as_slice())
    }
}
