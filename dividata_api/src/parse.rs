//! Extraction of the dividend history table from a Dividata stock page.

use regex::Regex;

use crate::types::{DividendRow, DividendTable};
use crate::Error;

const TABLE_PATTERN: &str =
    r#"(?is)<table[^>]*class\s*=\s*"table table-striped table-hover"[^>]*>(.*?)</table>"#;
const ROW_PATTERN: &str = r"(?is)<tr[^>]*>(.*?)</tr>";
const CELL_PATTERN: &str = r"(?is)<td[^>]*>(.*?)</td>";
const TAG_PATTERN: &str = r"(?s)<[^>]*>";

/// Parses the dividend table out of a Dividata page.
///
/// Returns `Ok(None)` when the page carries no dividend table, which is how
/// the site renders tickers that have never paid a dividend. Header rows
/// (rows without `<td>` cells) are skipped. Cells are stripped of markup,
/// entity-decoded and trimmed; only the first two cells of a row are kept.
pub fn parse_dividend_table(html: &str) -> Result<Option<DividendTable>, Error> {
    let table_re = compile(TABLE_PATTERN)?;
    let row_re = compile(ROW_PATTERN)?;
    let cell_re = compile(CELL_PATTERN)?;
    let tag_re = compile(TAG_PATTERN)?;

    let body = match table_re.captures(html).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None => return Ok(None),
    };

    let mut rows = Vec::new();
    for row in row_re.captures_iter(body) {
        let inner = match row.get(1) {
            Some(m) => m.as_str(),
            None => continue,
        };
        let mut cells = cell_re
            .captures_iter(inner)
            .filter_map(|c| c.get(1))
            .map(|m| clean_cell(&tag_re, m.as_str()));

        let ex_dividend_date = match cells.next() {
            Some(date) => date,
            None => continue,
        };
        let amount = cells.next().unwrap_or_default();
        rows.push(DividendRow {
            ex_dividend_date,
            amount,
        });
    }

    Ok(Some(DividendTable { rows }))
}

fn compile(pattern: &str) -> Result<Regex, Error> {
    Regex::new(pattern).map_err(|e| Error::Parse(format!("regex compile error: {}", e)))
}

fn clean_cell(tag_re: &Regex, raw: &str) -> String {
    let text = tag_re.replace_all(raw, "");
    decode_entities(&text).trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#36;", "$")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
