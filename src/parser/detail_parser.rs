// Detail-page parsing for the enrichment fields
use crate::model::{ParserError, StockDetail};
use crate::parser::selector;
use crate::utils::clean_text;
use scraper::{Html, Selector};

const SYMBOL_PREFIX: &str = "NSE: ";

pub struct DetailPageParser {
    current_price: Selector,
    days_low: Selector,
    days_high: Selector,
    week52_low: Selector,
    week52_high: Selector,
    symbol_region: Selector,
}

impl DetailPageParser {
    pub fn new() -> Result<Self, ParserError> {
        Ok(Self {
            current_price: selector("div#Nse_Prc_tick_div strong")?,
            days_low: selector("span#n_low_sh")?,
            days_high: selector("span#n_high_sh")?,
            week52_low: selector("span#n_52low")?,
            week52_high: selector("span#n_52high")?,
            symbol_region: selector("div.PB10 div.FL.gry10")?,
        })
    }

    pub fn parse(&self, html: &str) -> Result<StockDetail, ParserError> {
        let document = Html::parse_document(html);

        let region = first_text(&document, &self.symbol_region, "symbol")?;
        let symbol = extract_symbol(&region)
            .ok_or_else(|| ParserError::MissingField("symbol".into()))?;

        Ok(StockDetail {
            current_price: first_text(&document, &self.current_price, "current_price")?,
            days_low: first_text(&document, &self.days_low, "days_low")?,
            days_high: first_text(&document, &self.days_high, "days_high")?,
            week52_low: first_text(&document, &self.week52_low, "52wk_low")?,
            week52_high: first_text(&document, &self.week52_high, "52wk_high")?,
            symbol,
        })
    }
}

fn first_text(document: &Html, sel: &Selector, field: &str) -> Result<String, ParserError> {
    document
        .select(sel)
        .next()
        .map(|el| clean_text(&el.text().collect::<String>()))
        .ok_or_else(|| ParserError::MissingField(field.to_string()))
}

/// The word after the first `NSE: ` in `text`.
pub fn extract_symbol(text: &str) -> Option<String> {
    text.match_indices(SYMBOL_PREFIX).find_map(|(i, _)| {
        let symbol: String = text[i + SYMBOL_PREFIX.len()..]
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if symbol.is_empty() { None } else { Some(symbol) }
    })
}
