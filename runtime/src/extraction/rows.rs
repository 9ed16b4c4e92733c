//! Row extraction from the rendered station table.

use crate::error::ScrapeError;
use crate::renderer::RenderContext;
use anyhow::Context;
use chrono::{Local, NaiveDate};
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, info, warn};

/// Fewest cells a table row needs to be kept.
pub const MIN_CELLS: usize = 5;

/// Cells in a complete row; the last one is replaced by the capture date.
pub const FULL_ROW_CELLS: usize = 9;

/// Capture-date format (`DD/MM/YYYY`).
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Trimmed cell texts of one kept table row, capture date included.
pub type Row = Vec<String>;

/// Rows kept from one capture, in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Field count of the widest row.
    pub fn max_width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Today's capture date in local time.
pub fn capture_date(today: NaiveDate) -> String {
    today.format(DATE_FORMAT).to_string()
}

/// Local calendar date of the run.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Elements whose contents never render.
const NON_RENDERED: &[&str] = &["script", "style", "template", "noscript", "head"];

/// Elements that start a new line in rendered text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li",
    "main", "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

/// Read the table cells as the page renders them and build the dataset.
///
/// Cells come from `innerText` in the page. If the in-page read fails the
/// rendered markup is parsed instead.
pub async fn extract_rows(
    context: &dyn RenderContext,
    selector: &str,
    date: &str,
) -> Result<Dataset, ScrapeError> {
    let cells = match read_rendered_cells(context, selector).await {
        Ok(cells) => cells,
        Err(e) => {
            warn!("in-page cell read failed, parsing markup: {e:#}");
            let html = context
                .content()
                .await
                .map_err(|e| ScrapeError::Extraction(format!("{e:#}")))?;
            read_table_cells(&html, selector)?
        }
    };
    let total = cells.len();
    let dataset = build_dataset(cells, date);
    info!(
        table_rows = total,
        kept = dataset.len(),
        dropped = total - dataset.len(),
        "rows extracted"
    );
    Ok(dataset)
}

/// Script returning the trimmed `innerText` of every `td` per matching row.
pub fn cells_script(row_selector: &str) -> String {
    let selector = serde_json::Value::String(row_selector.to_string());
    format!(
        "Array.from(document.querySelectorAll({selector})).map(r => \
         Array.from(r.querySelectorAll('td')).map(td => td.innerText.trim()))"
    )
}

async fn read_rendered_cells(
    context: &dyn RenderContext,
    row_selector: &str,
) -> anyhow::Result<Vec<Vec<String>>> {
    let value = context.execute_js(&cells_script(row_selector)).await?;
    serde_json::from_value(value).context("decoding table cells")
}

/// Trimmed rendered text of the `td` cells of every element matching
/// `row_selector` in `html`.
pub fn read_table_cells(html: &str, row_selector: &str) -> Result<Vec<Vec<String>>, ScrapeError> {
    let rows = Selector::parse(row_selector)
        .map_err(|e| ScrapeError::Extraction(format!("bad row selector {row_selector:?}: {e:?}")))?;
    let cell = Selector::parse("td")
        .map_err(|e| ScrapeError::Extraction(format!("bad cell selector: {e:?}")))?;

    let document = Html::parse_document(html);
    Ok(document
        .select(&rows)
        .map(|row| row.select(&cell).map(rendered_text).collect())
        .collect())
}

/// Approximate `innerText`: hidden subtrees skipped, whitespace collapsed,
/// block children on their own lines.
fn rendered_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    push_rendered(element, &mut raw);
    raw.split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_rendered(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.extend(text.chars().map(|c| if c.is_whitespace() { ' ' } else { c }));
            }
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                if is_hidden(&child) {
                    continue;
                }
                let block = BLOCK_ELEMENTS.contains(&child.value().name());
                if block {
                    out.push('\n');
                }
                push_rendered(child, out);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

fn is_hidden(element: &ElementRef<'_>) -> bool {
    let el = element.value();
    if NON_RENDERED.contains(&el.name()) || el.attr("hidden").is_some() {
        return true;
    }
    el.attr("style").is_some_and(|style| {
        let style: String = style.chars().filter(|c| !c.is_whitespace()).collect();
        style.to_ascii_lowercase().contains("display:none")
    })
}

/// Keep rows with at least [`MIN_CELLS`] cells and stamp each with `date`.
pub fn build_dataset(rows: Vec<Vec<String>>, date: &str) -> Dataset {
    let rows = rows
        .into_iter()
        .filter(|cells| {
            let keep = cells.len() >= MIN_CELLS;
            if !keep {
                debug!(cells = cells.len(), "dropping short row");
            }
            keep
        })
        .map(|cells| stamp_capture_date(cells, date))
        .collect();
    Dataset { rows }
}

/// Overwrite the last field of a full row with `date`, otherwise append it.
///
/// Short rows keep their irregular width: a 5-cell row becomes 6 fields.
pub fn stamp_capture_date(mut cells: Vec<String>, date: &str) -> Row {
    if cells.len() == FULL_ROW_CELLS {
        cells[FULL_ROW_CELLS - 1] = date.to_string();
    } else {
        cells.push(date.to_string());
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::fake::FakeContext;

    const SEL: &str = ".MuiTable-root tbody tr";

    fn cells(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("c{i}")).collect()
    }

    fn table(rows: &[&[&str]]) -> String {
        let body: String = rows
            .iter()
            .map(|r| {
                let tds: String = r.iter().map(|c| format!("<td>{c}</td>")).collect();
                format!("<tr>{tds}</tr>")
            })
            .collect();
        format!(
            r#"<html><body><table class="MuiTable-root"><thead><tr><th>h</th></tr></thead><tbody>{body}</tbody></table></body></html>"#
        )
    }

    #[test]
    fn test_capture_date_format() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(capture_date(d), "07/03/2026");
    }

    #[test]
    fn test_full_row_overwrites_last_field() {
        let row = stamp_capture_date(cells(9), "01/02/2026");
        assert_eq!(row.len(), 9);
        assert_eq!(row[8], "01/02/2026");
        assert_eq!(row[7], "c7");
    }

    #[test]
    fn test_short_row_gets_date_appended() {
        let row = stamp_capture_date(cells(5), "01/02/2026");
        assert_eq!(row.len(), 6);
        assert_eq!(row[5], "01/02/2026");
    }

    #[test]
    fn test_wide_row_gets_date_appended() {
        let row = stamp_capture_date(cells(10), "01/02/2026");
        assert_eq!(row.len(), 11);
        assert_eq!(row[8], "c8");
        assert_eq!(row[10], "01/02/2026");
    }

    #[test]
    fn test_rows_below_five_cells_dropped() {
        let raw = vec![cells(0), cells(4), cells(5), cells(3), cells(9)];
        let ds = build_dataset(raw, "d");
        assert_eq!(ds.len(), 2);
        assert!(ds.rows.iter().all(|r| r.len() >= MIN_CELLS));
        assert_eq!(ds.max_width(), 9);
    }

    #[test]
    fn test_read_table_cells_trims_and_scopes_to_tbody() {
        let html = table(&[&["  สถานีA ", "\n loc\t", "x"]]);
        let rows = read_table_cells(&html, SEL).unwrap();
        assert_eq!(rows, vec![vec!["สถานีA", "loc", "x"]]);
    }

    #[test]
    fn test_read_table_cells_nested_markup() {
        let html = table(&[&["<span> 12.5 </span>", "<b>ok</b>"]]);
        let rows = read_table_cells(&html, SEL).unwrap();
        assert_eq!(rows[0], vec!["12.5", "ok"]);
    }

    #[test]
    fn test_bad_selector_is_extraction_error() {
        let err = read_table_cells("<html></html>", "tr[").unwrap_err();
        assert!(matches!(err, ScrapeError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_extract_rows_three_full_rows() {
        let row: &[&str] = &["a", "b", "10:00", "1.0", "2.0", "0.5", "40%", "ปกติ", "old"];
        let html = table(&[row, row, row]);
        let ctx = FakeContext::with_html(&html, 3);

        let ds = extract_rows(&ctx, SEL, "16/10/2026").await.unwrap();
        assert_eq!(ds.len(), 3);
        for r in &ds.rows {
            assert_eq!(r.len(), 9);
            assert_eq!(r[8], "16/10/2026");
        }
    }

    #[test]
    fn test_read_table_cells_uses_rendered_text() {
        let html = table(&[&[
            "<div>TST001</div>\n  <div>สถานีทดสอบ</div>",
            "1.25\n                    ม.รทก.",
            r#"<span style="display: none">hidden</span>ok"#,
            "a<br>b",
            "<span>x</span> <span>y</span>",
        ]]);
        let rows = read_table_cells(&html, SEL).unwrap();
        assert_eq!(
            rows[0],
            vec!["TST001\nสถานีทดสอบ", "1.25 ม.รทก.", "ok", "a\nb", "x y"]
        );
    }

    #[test]
    fn test_cells_script_quotes_selector() {
        let script = cells_script(SEL);
        assert!(script.contains(r#"".MuiTable-root tbody tr""#));
        assert!(script.contains("innerText.trim()"));
    }

    #[tokio::test]
    async fn test_extract_rows_prefers_in_page_text() {
        let mut ctx = FakeContext::with_rows(2);
        ctx.cells = Some(serde_json::json!([
            ["TST001\nสถานีทดสอบ", "b", "10:00", "1.25 ม.รทก.", "2.0", "0.5", "40%", "ปกติ", "old"],
            ["x", "y"]
        ]));
        ctx.content_error = true;

        let ds = extract_rows(&ctx, SEL, "16/10/2026").await.unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.rows[0][0], "TST001\nสถานีทดสอบ");
        assert_eq!(ds.rows[0][3], "1.25 ม.รทก.");
        assert_eq!(ds.rows[0][8], "16/10/2026");
    }

    #[tokio::test]
    async fn test_extract_rows_content_failure() {
        let mut ctx = FakeContext::with_rows(1);
        ctx.content_error = true;
        let err = extract_rows(&ctx, SEL, "d").await.unwrap_err();
        assert!(matches!(err, ScrapeError::Extraction(_)));
    }
}
