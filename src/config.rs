use crate::enricher::BatchPolicy;
use crate::model::ConfigError;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;

fn default_table_selector() -> String {
    "table.tbldata14.bdrtpg".into()
}

fn default_link_marker() -> String {
    "stockpricequote".into()
}

fn default_detail_prefix() -> String {
    "http://www.moneycontrol.com".into()
}

fn default_small_window() -> usize {
    15
}

fn default_large_window() -> usize {
    50
}

fn default_output_dir() -> String {
    "output".into()
}

fn default_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    pub url: String,
    #[serde(default = "default_table_selector")]
    pub table_selector: String,
    #[serde(default = "default_link_marker")]
    pub detail_link_marker: String,
    #[serde(default = "default_detail_prefix")]
    pub detail_url_prefix: String,
    #[serde(default)]
    pub batch_policy: BatchPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartConfig {
    pub stock: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub date_window: Option<usize>,
    #[serde(default = "default_small_window")]
    pub small_window: usize,
    #[serde(default = "default_large_window")]
    pub large_window: usize,
}

impl ChartConfig {
    /// `<stock>_<start>_<small>_<large>`, used for chart titles and file names.
    pub fn title(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.stock, self.start_date, self.small_window, self.large_window
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub market: Option<MarketConfig>,
    #[serde(default)]
    pub charts: Vec<ChartConfig>,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(market) = &self.market {
            if market.url.trim().is_empty() {
                return Err(ConfigError::Invalid("market.url is empty".into()));
            }
        }
        for chart in &self.charts {
            if chart.stock.trim().is_empty() {
                return Err(ConfigError::Invalid("chart stock is empty".into()));
            }
            if chart.small_window == 0 || chart.small_window >= chart.large_window {
                return Err(ConfigError::Invalid(format!(
                    "{}: windows must satisfy 0 < small ({}) < large ({})",
                    chart.stock, chart.small_window, chart.large_window
                )));
            }
        }
        if self.request_timeout_seconds == 0 {
            return Err(ConfigError::Invalid("request_timeout_seconds must be positive".into()));
        }
        Ok(())
    }
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let cfg = parse_config(
            r#"{
                "market": { "url": "http://example.com/index" },
                "charts": [ { "stock": "ADANIPORTS.NS", "start_date": "2016-01-01", "date_window": 20 } ]
            }"#,
        )
        .unwrap();

        let market = cfg.market.unwrap();
        assert_eq!(market.table_selector, "table.tbldata14.bdrtpg");
        assert_eq!(market.detail_link_marker, "stockpricequote");
        assert_eq!(market.batch_policy, BatchPolicy::AbortOnFirstError);
        assert_eq!(cfg.output_dir, "output");
        assert_eq!(cfg.request_timeout_seconds, 10);

        let chart = &cfg.charts[0];
        assert_eq!((chart.small_window, chart.large_window), (15, 50));
        assert_eq!(chart.date_window, Some(20));
        assert_eq!(chart.title(), "ADANIPORTS.NS_2016-01-01_15_50");
    }

    #[test]
    fn test_skip_failed_policy_parses() {
        let cfg = parse_config(
            r#"{ "market": { "url": "http://x", "batch_policy": "skip_failed" } }"#,
        )
        .unwrap();
        assert_eq!(cfg.market.unwrap().batch_policy, BatchPolicy::SkipFailed);
    }

    #[test]
    fn test_rejects_inverted_windows() {
        let err = parse_config(
            r#"{ "charts": [ { "stock": "X", "start_date": "2020-01-01", "small_window": 50, "large_window": 15 } ] }"#,
        );
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_bad_date() {
        let err = parse_config(r#"{ "charts": [ { "stock": "X", "start_date": "01/01/2020" } ] }"#);
        assert!(matches!(err, Err(ConfigError::Json(_))));
    }
}
