// Listing-table extraction: header labels plus raw rows
use crate::model::{ExtractedTable, FieldLabel, LINK_FIELD, ParserError, RawRow};
use crate::parser::selector;
use crate::utils::clean_text;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

pub trait Parser {
    fn parse(&self, html: &str) -> Result<ExtractedTable, ParserError>;
}

/// What a table cell holds, checked in this order.
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    /// A `<b>` child; `link` is the first detail-page anchor found in the cell.
    Emphasis { text: Option<String>, link: Option<String> },
    /// A `<br>` child, with the text on either side of it and the whole
    /// cell's text.
    LineBreak { before: String, after: String, text: Option<String> },
    Plain(Option<String>),
}

impl CellContent {
    /// Column label for a header cell.
    pub fn into_label(self) -> FieldLabel {
        match self {
            CellContent::Emphasis { text, .. } => text.unwrap_or_default(),
            CellContent::LineBreak { before, after, .. } => {
                if before.is_empty() {
                    after
                } else if after.is_empty() {
                    before
                } else {
                    format!("{} {}", before, after)
                }
            }
            CellContent::Plain(text) => text.unwrap_or_default(),
        }
    }

    /// Appends this data cell's values to `row`: the cell value, then its
    /// detail link if one was found.
    pub fn push_values(self, row: &mut RawRow) {
        match self {
            CellContent::Emphasis { text, link } => {
                row.push(text);
                if let Some(href) = link {
                    row.push(Some(href));
                }
            }
            // Data cells keep the raw text; "1.0<br>2%" reads "1.02%".
            CellContent::LineBreak { text, .. } => row.push(text),
            CellContent::Plain(text) => row.push(text),
        }
    }
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

/// Parser for the index-page listing table.
pub struct MarketTableParser {
    table: Selector,
    table_css: String,
    row: Selector,
    header_cell: Selector,
    data_cell: Selector,
    emphasis: Selector,
    line_break: Selector,
    detail_anchor: Selector,
}

impl MarketTableParser {
    /// `table_css` locates the table; `link_marker` is a substring that
    /// identifies detail-page hrefs.
    pub fn new(table_css: &str, link_marker: &str) -> Result<Self, ParserError> {
        let anchor_css = format!("a[href*=\"{}\"]", link_marker.replace('"', "\\\""));
        Ok(Self {
            table: selector(table_css)?,
            table_css: table_css.to_string(),
            row: selector("tr")?,
            header_cell: selector("th")?,
            data_cell: selector("td")?,
            emphasis: selector("b")?,
            line_break: selector("br")?,
            detail_anchor: selector(&anchor_css)?,
        })
    }

    pub fn classify(&self, cell: ElementRef<'_>) -> CellContent {
        if let Some(b) = cell.select(&self.emphasis).next() {
            let link = cell
                .select(&self.detail_anchor)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(str::to_string);
            return CellContent::Emphasis {
                text: element_text(b),
                link,
            };
        }
        if let Some(br) = cell.select(&self.line_break).next() {
            return CellContent::LineBreak {
                before: sibling_text(br, true),
                after: sibling_text(br, false),
                text: element_text(cell),
            };
        }
        CellContent::Plain(element_text(cell))
    }

    fn extract(&self, table: ElementRef<'_>) -> ExtractedTable {
        let mut header: Vec<FieldLabel> = Vec::new();
        let mut rows: Vec<RawRow> = Vec::new();

        for tr in table.select(&self.row) {
            if header.is_empty() {
                header = tr
                    .select(&self.header_cell)
                    .map(|th| self.classify(th).into_label())
                    .collect();
            }

            let mut row = RawRow::new();
            for td in tr.select(&self.data_cell) {
                self.classify(td).push_values(&mut row);
            }
            if row.len() > 1 {
                rows.push(row);
            } else {
                debug!("Skipping row with {} value(s)", row.len());
            }
        }

        // Slot for the detail link that data rows carry after their first value.
        header.insert(header.len().min(1), LINK_FIELD.to_string());

        ExtractedTable { header, rows }
    }
}

impl Parser for MarketTableParser {
    fn parse(&self, html: &str) -> Result<ExtractedTable, ParserError> {
        let document = Html::parse_document(html);
        let table = document
            .select(&self.table)
            .next()
            .ok_or_else(|| ParserError::StructureNotFound(self.table_css.clone()))?;

        let extracted = self.extract(table);
        info!(
            "Extracted {} columns and {} rows",
            extracted.header.len(),
            extracted.rows.len()
        );
        Ok(extracted)
    }
}

fn element_text(element: ElementRef<'_>) -> Option<String> {
    non_empty(clean_text(&element.text().collect::<String>()))
}

/// Text of the node right before (or after) a `<br>`.
fn sibling_text(br: ElementRef<'_>, before: bool) -> String {
    let node = if before { br.prev_sibling() } else { br.next_sibling() };
    let raw = match node {
        Some(node) => match ElementRef::wrap(node) {
            Some(el) => el.text().collect::<String>(),
            None => node.value().as_text().map(|t| String::from(&**t)).unwrap_or_default(),
        },
        None => String::new(),
    };
    clean_text(&raw)
}
