// Analyzer module: moving averages, the indicator pipeline, and chart assembly.

pub mod chart;
pub mod indicator_engine;
pub mod moving_average;

pub use chart::{ChartData, Overlay, assemble};
pub use indicator_engine::IndicatorEngine;
