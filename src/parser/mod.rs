// Markup parsing: the listing table and per-stock detail pages.

pub mod detail_parser;
pub mod table_parser;

pub use detail_parser::DetailPageParser;
pub use table_parser::{CellContent, MarketTableParser, Parser};

use crate::model::ParserError;
use scraper::Selector;

pub(crate) fn selector(css: &str) -> Result<Selector, ParserError> {
    Selector::parse(css).map_err(|e| ParserError::InvalidSelector(format!("{}: {}", css, e)))
}
