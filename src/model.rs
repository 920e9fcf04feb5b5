// Core structs: extracted table rows, market records, price points, indicator series
use chrono::NaiveDate;
use serde::de::{Deserializer, Error as DeError, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Column name as found in the table header. Duplicates are kept positionally.
pub type FieldLabel = String;

/// One extracted table row; `None` marks an empty cell.
pub type RawRow = Vec<Option<String>>;

pub const COMPANY_FIELD: &str = "Company Name";
pub const CHANGE_FIELD: &str = "Change";
pub const LINK_FIELD: &str = "Link";

/// Header plus data rows pulled out of one markup table.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedTable {
    pub header: Vec<FieldLabel>,
    pub rows: Vec<RawRow>,
}

/// Scalar fields read from a per-stock detail page.
#[derive(Debug, Clone, PartialEq)]
pub struct StockDetail {
    pub current_price: String,
    pub days_low: String,
    pub days_high: String,
    pub week52_low: String,
    pub week52_high: String,
    pub symbol: String,
}

impl StockDetail {
    /// Fields in merge order, keyed by their output labels.
    pub fn fields(&self) -> Vec<(FieldLabel, String)> {
        vec![
            ("current_price".into(), self.current_price.clone()),
            ("days_low".into(), self.days_low.clone()),
            ("days_high".into(), self.days_high.clone()),
            ("52wk_low".into(), self.week52_low.clone()),
            ("52wk_high".into(), self.week52_high.clone()),
            ("symbol".into(), self.symbol.clone()),
        ]
    }
}

/// A row keyed by label after enrichment, before it is indexed by company.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(FieldLabel, Option<String>)>,
}

impl FieldMap {
    /// Pairs labels with row values by position. Missing cells become `None`.
    pub fn from_row(header: &[FieldLabel], row: &RawRow) -> Self {
        let entries = header
            .iter()
            .enumerate()
            .map(|(i, label)| (label.clone(), row.get(i).cloned().flatten()))
            .collect();
        Self { entries }
    }

    /// Overwrites the first entry with this label, or appends a new one.
    pub fn set(&mut self, label: &str, value: Option<String>) {
        match self.entries.iter_mut().find(|(l, _)| l == label) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((label.to_string(), value)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.iter().any(|(l, _)| l == label)
    }

    pub fn into_entries(self) -> Vec<(FieldLabel, Option<String>)> {
        self.entries
    }
}

/// Enriched row indexed by company name, with `Change` as a number.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketRecord {
    pub company: String,
    pub change: f64,
    /// Remaining columns in table order, followed by the enrichment fields.
    pub fields: Vec<(FieldLabel, Option<String>)>,
}

impl MarketRecord {
    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(l, _)| l == label)
            .and_then(|(_, v)| v.as_deref())
    }
}

/// All market records, ascending by `Change`.
///
/// Serializes as a JSON object keyed by company name; entry order is kept
/// both ways so the sort survives a round trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketTable {
    pub records: Vec<MarketRecord>,
}

impl MarketTable {
    pub fn get(&self, company: &str) -> Option<&MarketRecord> {
        self.records.iter().find(|r| r.company == company)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

struct RecordBody<'a>(&'a MarketRecord);

impl Serialize for RecordBody<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let record = self.0;
        // The numeric change owns the "Change" key.
        let fields: Vec<_> = record.fields.iter().filter(|(l, _)| l != CHANGE_FIELD).collect();
        let mut map = serializer.serialize_map(Some(fields.len() + 1))?;
        map.serialize_entry(CHANGE_FIELD, &record.change)?;
        for (label, value) in fields {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

impl Serialize for MarketTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for record in &self.records {
            map.serialize_entry(&record.company, &RecordBody(record))?;
        }
        map.end()
    }
}

struct OwnedBody {
    change: f64,
    fields: Vec<(FieldLabel, Option<String>)>,
}

impl<'de> Deserialize<'de> for OwnedBody {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BodyVisitor;

        impl<'de> Visitor<'de> for BodyVisitor {
            type Value = OwnedBody;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a market record object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<OwnedBody, A::Error> {
                let mut change = None;
                let mut fields = Vec::new();
                while let Some(label) = map.next_key::<String>()? {
                    if label == CHANGE_FIELD {
                        change = Some(map.next_value::<f64>()?);
                    } else {
                        fields.push((label, map.next_value::<Option<String>>()?));
                    }
                }
                let change =
                    change.ok_or_else(|| <A::Error as DeError>::missing_field(CHANGE_FIELD))?;
                Ok(OwnedBody { change, fields })
            }
        }

        deserializer.deserialize_map(BodyVisitor)
    }
}

impl<'de> Deserialize<'de> for MarketTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = MarketTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object keyed by company name")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<MarketTable, A::Error> {
                let mut records = Vec::new();
                while let Some((company, body)) = map.next_entry::<String, OwnedBody>()? {
                    records.push(MarketRecord {
                        company,
                        change: body.change,
                        fields: body.fields,
                    });
                }
                Ok(MarketTable { records })
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}

/// One trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
}

/// A price point after warm-up, carrying both averages for both windows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorPoint {
    #[serde(flatten)]
    pub price: PricePoint,
    pub date_num: f64,
    pub ma_small: f64,
    pub ma_large: f64,
    pub ema_small: f64,
    pub ema_large: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSeries {
    pub small_window: usize,
    pub large_window: usize,
    pub points: Vec<IndicatorPoint>,
}

pub fn ma_label(window: usize) -> String {
    format!("MA_{}", window)
}

pub fn ema_label(window: usize) -> String {
    format!("EMA_{}", window)
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Overlay labels in plotting order.
    pub fn labels(&self) -> Vec<String> {
        vec![
            ma_label(self.small_window),
            ma_label(self.large_window),
            ema_label(self.small_window),
            ema_label(self.large_window),
        ]
    }

    /// Value column for an `MA_<w>` / `EMA_<w>` label.
    pub fn overlay(&self, label: &str) -> Option<Vec<f64>> {
        let pick: fn(&IndicatorPoint) -> f64 = if label == ma_label(self.small_window) {
            |p| p.ma_small
        } else if label == ma_label(self.large_window) {
            |p| p.ma_large
        } else if label == ema_label(self.small_window) {
            |p| p.ema_small
        } else if label == ema_label(self.large_window) {
            |p| p.ema_large
        } else {
            return None;
        };
        Some(self.points.iter().map(pick).collect())
    }
}

/// `(date_num, open, high, low, adj_close)` handed to candlestick rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 5]", from = "[f64; 5]")]
pub struct ChartTuple {
    pub date_num: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub adj_close: f64,
}

impl From<ChartTuple> for [f64; 5] {
    fn from(t: ChartTuple) -> Self {
        [t.date_num, t.open, t.high, t.low, t.adj_close]
    }
}

impl From<[f64; 5]> for ChartTuple {
    fn from(a: [f64; 5]) -> Self {
        ChartTuple {
            date_num: a[0],
            open: a[1],
            high: a[2],
            low: a[3],
            adj_close: a[4],
        }
    }
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    HttpError(String),
    #[error("request timed out")]
    Timeout,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("structure not found: {0}")]
    StructureNotFound(String),
    #[error("missing field: {0}")]
    MissingField(String),
    #[error("invalid selector: {0}")]
    InvalidSelector(String),
}

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("row has no detail link")]
    MissingLink,
    #[error(transparent)]
    Fetch(#[from] ScraperError),
    #[error(transparent)]
    Parse(#[from] ParserError),
}

#[derive(Debug, Error)]
pub enum MarketError {
    #[error(transparent)]
    Scraper(#[from] ScraperError),
    #[error(transparent)]
    Parse(#[from] ParserError),
    #[error("enrichment failed for row {row}: {source}")]
    Enrich { row: usize, source: EnrichError },
    #[error("missing column: {0}")]
    MissingColumn(String),
    #[error("invalid Change value {value:?} for {company}")]
    InvalidChange { company: String, value: String },
    #[error("duplicate company: {0}")]
    DuplicateCompany(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("artifact write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("artifact serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
