//! XHTML layout dump parser
//!
//! The XHTML dump format:
//! - one `<div class="page" data-page="N">` per page
//! - `<p>` per text line (`<br/>` also breaks a line)
//! - `<table data-bbox="x0,top,x1,bottom">` with `<tr>` rows of `<td>`/`<th>`
//!   cells; a self-closing `<td/>` is a merged cell, `<td></td>` an empty one

use crate::error::{ExtractError, ExtractResult};
use crate::sources::dump::LayoutBackend;
use crate::sources::layout::{CellGrid, LayoutDocument, PageLayout, TableRegion};
use crate::types::BoundingBox;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XhtmlLayoutBackend;

impl LayoutBackend for XhtmlLayoutBackend {
    fn decode_layout(&self, bytes: &[u8]) -> ExtractResult<LayoutDocument> {
        let xhtml = std::str::from_utf8(bytes)
            .map_err(|e| ExtractError::LayoutFormat(format!("XHTML dump is not UTF-8: {}", e)))?;
        parse_xhtml(xhtml)
    }

    fn name(&self) -> &str {
        "XhtmlLayoutBackend"
    }

    fn extensions(&self) -> &[&str] {
        &["xhtml", "html", "htm", "xml"]
    }
}

struct PageBuilder {
    number: u32,
    lines: Vec<String>,
    tables: Vec<TableRegion>,
}

impl PageBuilder {
    fn finish(self) -> PageLayout {
        PageLayout {
            page_number: self.number,
            text: self.lines.join("\n"),
            tables: self.tables,
        }
    }
}

#[derive(Default)]
struct TableBuilder {
    bbox: Option<BoundingBox>,
    rows: CellGrid,
    row: Option<Vec<Option<String>>>,
}

impl TableBuilder {
    fn push_cell(&mut self, cell: Option<String>) {
        // Cells outside a <tr> start an implicit row
        self.row.get_or_insert_with(Vec::new).push(cell);
    }

    fn end_row(&mut self) {
        if let Some(row) = self.row.take() {
            self.rows.push(row);
        }
    }
}

/// Parse an XHTML layout dump into pages
pub fn parse_xhtml(xhtml: &str) -> ExtractResult<LayoutDocument> {
    let mut reader = Reader::from_str(xhtml);
    reader.trim_text(false);

    let mut pages: Vec<PageLayout> = Vec::new();
    let mut page: Option<PageBuilder> = None;
    let mut div_depth = 0usize;
    let mut page_div_depth = 0usize;
    let mut line: Option<String> = None;
    let mut table: Option<TableBuilder> = None;
    let mut cell: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"div" => {
                    div_depth += 1;
                    if page.is_none() && is_page_div(&e) {
                        page = Some(PageBuilder {
                            number: page_number_attr(&e, pages.len())?,
                            lines: Vec::new(),
                            tables: Vec::new(),
                        });
                        page_div_depth = div_depth;
                    }
                }
                b"p" if page.is_some() && table.is_none() => line = Some(String::new()),
                b"table" => {
                    table = Some(TableBuilder {
                        bbox: bbox_attr(&e),
                        ..TableBuilder::default()
                    })
                }
                b"tr" => {
                    if let Some(t) = table.as_mut() {
                        t.end_row();
                        t.row = Some(Vec::new());
                    }
                }
                b"td" | b"th" if table.is_some() => cell = Some(String::new()),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"td" | b"th" => {
                    if let Some(t) = table.as_mut() {
                        t.push_cell(None);
                    }
                }
                b"br" => {
                    if let (Some(p), Some(l)) = (page.as_mut(), line.as_mut()) {
                        p.lines.push(std::mem::take(l));
                    } else if let Some(c) = cell.as_mut() {
                        c.push('\n');
                    }
                }
                b"div" if page.is_none() && is_page_div(&e) => {
                    let number = page_number_attr(&e, pages.len())?;
                    pages.push(PageLayout {
                        page_number: number,
                        ..PageLayout::default()
                    });
                }
                _ => {}
            },
            Event::Text(e) => {
                let text = e.unescape()?;
                if let Some(c) = cell.as_mut() {
                    c.push_str(&text);
                } else if let Some(l) = line.as_mut() {
                    l.push_str(&text);
                }
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                if let Some(c) = cell.as_mut() {
                    c.push_str(&text);
                } else if let Some(l) = line.as_mut() {
                    l.push_str(&text);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"td" | b"th" => {
                    if let (Some(t), Some(c)) = (table.as_mut(), cell.take()) {
                        t.push_cell(Some(c));
                    }
                }
                b"tr" => {
                    if let Some(t) = table.as_mut() {
                        t.end_row();
                    }
                }
                b"table" => {
                    if let Some(mut t) = table.take() {
                        t.end_row();
                        let p = page.as_mut().ok_or_else(|| {
                            ExtractError::LayoutFormat("<table> outside of a page <div>".to_string())
                        })?;
                        p.tables.push(TableRegion::new(t.rows, t.bbox));
                    }
                }
                b"p" => {
                    if let (Some(p), Some(l)) = (page.as_mut(), line.take()) {
                        p.lines.push(l);
                    }
                }
                b"div" => {
                    if page.is_some() && div_depth == page_div_depth {
                        if let Some(p) = page.take() {
                            pages.push(p.finish());
                        }
                    }
                    div_depth = div_depth.saturating_sub(1);
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(p) = page {
        return Err(ExtractError::LayoutFormat(format!(
            "page {} is not closed",
            p.number
        )));
    }

    Ok(LayoutDocument { pages })
}

fn attr_value(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .and_then(|attr| std::str::from_utf8(&attr.value).ok().map(|v| v.to_string()))
}

fn is_page_div(e: &BytesStart) -> bool {
    attr_value(e, b"class")
        .map(|class| class.split_whitespace().any(|c| c == "page"))
        .unwrap_or(false)
}

/// `data-page` when present, else the next sequential number
fn page_number_attr(e: &BytesStart, pages_seen: usize) -> ExtractResult<u32> {
    match attr_value(e, b"data-page") {
        Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
            ExtractError::LayoutFormat(format!("invalid data-page value '{}'", raw))
        }),
        None => Ok(pages_seen as u32 + 1),
    }
}

fn bbox_attr(e: &BytesStart) -> Option<BoundingBox> {
    let raw = attr_value(e, b"data-bbox")?;
    let coords: Vec<f64> = raw
        .split(',')
        .filter_map(|c| c.trim().parse::<f64>().ok())
        .collect();
    match coords.as_slice() {
        [x0, top, x1, bottom] => Some(BoundingBox {
            x0: *x0,
            top: *top,
            x1: *x1,
            bottom: *bottom,
        }),
        _ => {
            log::warn!("Ignoring malformed table bbox '{}'", raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<body>
<div class="page" data-page="1">
  <p>SECTION [2] HOUSEHOLD</p>
  <p>If yes, go to <b>Q2.3</b></p>
  <table data-bbox="36.0,120.5,560.0,300.25">
    <tr><th>Food</th><th>Food</th></tr>
    <tr><th>Item</th><th>Qty (kg)</th></tr>
    <tr><td>Q1.1</td><td/><td></td></tr>
  </table>
</div>
<div class="page" data-page="2"><p>Rice &amp; wheat<br/>only for rural</p></div>
<div class="page" data-page="3"/>
</body>
</html>"#;

    #[test]
    fn parses_pages_lines_and_tables() {
        let layout = parse_xhtml(SAMPLE).unwrap();
        assert_eq!(layout.page_count(), 3);

        let first = &layout.pages[0];
        assert_eq!(first.page_number, 1);
        assert_eq!(first.text, "SECTION [2] HOUSEHOLD\nIf yes, go to Q2.3");

        let table = &first.tables[0];
        assert_eq!(
            table.bbox,
            Some(BoundingBox { x0: 36.0, top: 120.5, x1: 560.0, bottom: 300.25 })
        );
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[1][1].as_deref(), Some("Qty (kg)"));
        assert_eq!(
            table.rows[2],
            vec![Some("Q1.1".to_string()), None, Some(String::new())]
        );
    }

    #[test]
    fn unescapes_text_and_splits_on_br() {
        let layout = parse_xhtml(SAMPLE).unwrap();
        assert_eq!(layout.pages[1].text, "Rice & wheat\nonly for rural");
        assert_eq!(layout.pages[2].page_number, 3);
        assert!(layout.pages[2].text.is_empty());
    }

    #[test]
    fn bad_page_number_is_an_error() {
        let err = parse_xhtml(r#"<div class="page" data-page="two"></div>"#).unwrap_err();
        assert!(matches!(err, ExtractError::LayoutFormat(_)));
    }

    #[test]
    fn unclosed_page_is_an_error() {
        assert!(parse_xhtml(r#"<div class="page"><p>text</p>"#).is_err());
    }

    #[test]
    fn malformed_bbox_is_dropped() {
        let layout = parse_xhtml(
            r#"<div class="page"><table data-bbox="1,2,3"><tr><td>a</td></tr></table></div>"#,
        )
        .unwrap();
        assert_eq!(layout.pages[0].tables[0].bbox, None);
        assert_eq!(layout.pages[0].page_number, 1);
    }
}
