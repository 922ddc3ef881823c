// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! DOM helpers shared by the extraction and navigation strategies.
//!
//! All functions here are synchronous: `scraper::Html` is `!Send`, so callers
//! parse, extract and drop the document before the next await point.

use scraper::{ElementRef, Html, Node, Selector};

/// A parsed provider page plus the derived views strategies need.
pub struct PageDocument {
    pub html: Html,
    /// Visible text, one line per text node.
    pub text: String,
    pub url: String,
}

impl PageDocument {
    pub fn parse(raw_html: &str, url: &str) -> Self {
        let html = Html::parse_document(raw_html);
        let text = visible_text(&html);
        Self {
            html,
            text,
            url: url.to_string(),
        }
    }
}

/// One `<table>` split into a header row and data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableData {
    /// Lower-cased header cell texts.
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    /// Index of the first header cell containing any of `needles`.
    pub fn column(&self, needles: &[&str]) -> Option<usize> {
        self.header
            .iter()
            .position(|h| needles.iter().any(|n| h.contains(n)))
    }
}

/// Text of an element with whitespace collapsed.
pub fn element_text(el: &ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lower-cased label with a trailing colon removed.
pub fn normalize_label(s: &str) -> String {
    collapse_whitespace(s)
        .trim_end_matches([':', '：'])
        .trim()
        .to_lowercase()
}

/// Visible text of the document, one line per non-empty text node.
///
/// Text inside `script`, `style`, `noscript` and `template` is skipped.
pub fn visible_text(document: &Html) -> String {
    let mut lines = Vec::new();
    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value().as_element().is_some_and(|e| {
                matches!(e.name(), "script" | "style" | "noscript" | "template")
            })
        });
        if hidden {
            continue;
        }
        let line = collapse_whitespace(text);
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines.join("\n")
}

/// Label/value pairs from `dt/dd`, two-cell table rows and
/// `.label`/`.value` sibling pairs, in document order per shape.
///
/// Labels are normalised with [`normalize_label`]; values are whitespace
/// collapsed.
pub fn label_value_pairs(document: &Html) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    let dt_sel = Selector::parse("dt").unwrap();
    for dt in document.select(&dt_sel) {
        if let Some(dd) = next_element_sibling(&dt).filter(|e| e.value().name() == "dd") {
            pairs.push((normalize_label(&element_text(&dt)), element_text(&dd)));
        }
    }

    let tr_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("th, td").unwrap();
    for tr in document.select(&tr_sel) {
        let cells: Vec<ElementRef<'_>> = tr.select(&cell_sel).collect();
        if cells.len() < 2 {
            continue;
        }
        let first_is_th = cells[0].value().name() == "th";
        if cells.len() == 2 || (first_is_th && cells[1].value().name() == "td") {
            pairs.push((normalize_label(&element_text(&cells[0])), element_text(&cells[1])));
        }
    }

    let label_sel = Selector::parse("[class*='label'], [class*='param-name'], [class*='prop-name']").unwrap();
    for label in document.select(&label_sel) {
        if let Some(value) = next_element_sibling(&label) {
            let text = element_text(&value);
            if !text.is_empty() {
                pairs.push((normalize_label(&element_text(&label)), text));
            }
        }
    }

    pairs
}

/// All tables of the document.
pub fn parse_tables(document: &Html) -> Vec<TableData> {
    let table_sel = Selector::parse("table").unwrap();
    document
        .select(&table_sel)
        .map(|t| parse_table(&t))
        .filter(|t| !t.header.is_empty())
        .collect()
}

/// Split one table element into header and data rows.
///
/// The header is the first row of `<thead>` when present, otherwise the first
/// row. The HTML parser inserts `<tbody>` on its own, so the presence of a
/// body element says nothing about the header.
pub fn parse_table(table: &ElementRef<'_>) -> TableData {
    let tr_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("th, td").unwrap();

    let trs: Vec<ElementRef<'_>> = table.select(&tr_sel).collect();
    if trs.is_empty() {
        return TableData::default();
    }
    let in_thead = |tr: &ElementRef<'_>| {
        tr.parent()
            .and_then(ElementRef::wrap)
            .is_some_and(|p| p.value().name() == "thead")
    };
    let header_idx = trs.iter().position(|tr| in_thead(tr)).unwrap_or(0);

    let cells_of = |tr: &ElementRef<'_>| -> Vec<String> {
        tr.select(&cell_sel).map(|c| element_text(&c)).collect()
    };

    let header = cells_of(&trs[header_idx])
        .into_iter()
        .map(|h| h.to_lowercase())
        .collect();
    let rows = trs
        .iter()
        .enumerate()
        .filter(|(i, tr)| *i != header_idx && !in_thead(tr))
        .map(|(_, tr)| cells_of(tr))
        .filter(|cells| !cells.is_empty())
        .collect();

    TableData { header, rows }
}

pub fn next_element_sibling<'a>(el: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

/// Truncate to at most `max` characters on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Slice of `text` from `before` bytes ahead of `start` to `after` bytes past
/// `end`, widened to char boundaries.
pub fn window(text: &str, start: usize, end: usize, before: usize, after: usize) -> &str {
    let mut lo = start.saturating_sub(before);
    while lo > 0 && !text.is_char_boundary(lo) {
        lo -= 1;
    }
    let mut hi = (end + after).min(text.len());
    while hi < text.len() && !text.is_char_boundary(hi) {
        hi += 1;
    }
    &text[lo..hi]
}
