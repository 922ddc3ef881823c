// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! OEM candidate strategies.
//!
//! Every strategy yields `(oem, name)` tuples; the refine step drops tuples
//! whose code is not a plausible OEM and treats an empty list as a miss.

use super::filters::{is_plausible_oem, regex};
use super::html::{collapse_whitespace, element_text, parse_tables, truncate_chars};
use super::{Cascade, FieldContext, FieldStrategy};
use crate::types::OemCandidate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use url::Url;

pub const FIELD: &str = "gearbox.oem";

const OEM_MAX_CHARS: usize = 100;
const NAME_MAX_CHARS: usize = 500;

/// Share of a column's cells that must look like part numbers.
const COLUMN_SCAN_THRESHOLD: f64 = 0.6;

const OEM_HEADERS: &[&str] = &["oem", "оем", "номер детали", "part number"];
const NAME_HEADERS: &[&str] = &["наименование", "название", "name", "description"];
const LINK_PARAMS: &[&str] = &["oem", "article", "number", "code", "detail"];

static HEADER_OEM: OnceLock<Regex> = OnceLock::new();

fn candidate(oem: &str, name: &str) -> OemCandidate {
    OemCandidate::new(
        truncate_chars(oem.trim(), OEM_MAX_CHARS),
        truncate_chars(name.trim(), NAME_MAX_CHARS),
    )
}

/// Cells of every row that has `<td>` cells, header rows included.
fn table_rows(table: &ElementRef<'_>) -> Vec<Vec<String>> {
    let tr_sel = Selector::parse("tr").unwrap();
    let td_sel = Selector::parse("td").unwrap();
    table
        .select(&tr_sel)
        .map(|tr| tr.select(&td_sel).map(|td| element_text(&td)).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect()
}

/// First cell other than `skip` that carries words rather than a code.
fn name_cell(cells: &[String], skip: usize) -> &str {
    cells
        .iter()
        .enumerate()
        .find(|(i, c)| *i != skip && c.chars().any(char::is_alphabetic) && !is_plausible_oem(c))
        .map(|(_, c)| c.as_str())
        .unwrap_or("")
}

/// First OEM-shaped cell of a row plus its name cell.
fn row_candidate(cells: &[String]) -> Option<OemCandidate> {
    let idx = cells.iter().position(|c| is_plausible_oem(c))?;
    Some(candidate(&cells[idx], name_cell(cells, idx)))
}

/// Table with an OEM column and a name column, matched by header.
pub struct TwoColumnTable;

impl FieldStrategy<Vec<OemCandidate>> for TwoColumnTable {
    fn tag(&self) -> &'static str {
        "two_column_table"
    }

    fn attempt(&self, cx: &FieldContext<'_>) -> Option<Vec<OemCandidate>> {
        let mut out = Vec::new();
        for table in parse_tables(&cx.doc.html) {
            let Some(oem_idx) = table.column(OEM_HEADERS) else {
                continue;
            };
            let name_idx = table.column(NAME_HEADERS);
            for row in &table.rows {
                let Some(oem) = row.get(oem_idx) else { continue };
                let name = name_idx.and_then(|i| row.get(i)).map(String::as_str).unwrap_or("");
                out.push(candidate(oem, name));
            }
        }
        (!out.is_empty()).then_some(out)
    }
}

/// Links whose query string carries a part-number parameter.
pub struct DetailLinkList;

impl FieldStrategy<Vec<OemCandidate>> for DetailLinkList {
    fn tag(&self) -> &'static str {
        "detail_link_list"
    }

    fn attempt(&self, cx: &FieldContext<'_>) -> Option<Vec<OemCandidate>> {
        let base = Url::parse(&cx.doc.url).ok()?;
        let sel = Selector::parse("a[href]").unwrap();
        let out: Vec<OemCandidate> = cx
            .doc
            .html
            .select(&sel)
            .filter_map(|a| {
                let href = a.value().attr("href")?;
                let url = base.join(href).ok()?;
                let (_, oem) = url
                    .query_pairs()
                    .find(|(k, v)| LINK_PARAMS.contains(&k.to_lowercase().as_str()) && !v.is_empty())?;
                Some(candidate(&oem, &element_text(&a)))
            })
            .collect();
        (!out.is_empty()).then_some(out)
    }
}

/// Column whose values mostly look like part numbers, whatever its header.
pub struct TableColumnScan;

impl FieldStrategy<Vec<OemCandidate>> for TableColumnScan {
    fn tag(&self) -> &'static str {
        "table_column_scan"
    }

    fn attempt(&self, cx: &FieldContext<'_>) -> Option<Vec<OemCandidate>> {
        let sel = Selector::parse("table").unwrap();
        let mut out = Vec::new();
        for table in cx.doc.html.select(&sel) {
            let rows = table_rows(&table);
            let width = rows.iter().map(Vec::len).max().unwrap_or(0);
            for col in 0..width {
                let hits = rows
                    .iter()
                    .filter(|r| r.get(col).is_some_and(|c| is_plausible_oem(c)))
                    .count();
                if hits == 0 || (hits as f64) < rows.len() as f64 * COLUMN_SCAN_THRESHOLD {
                    continue;
                }
                for row in &rows {
                    let Some(oem) = row.get(col).filter(|c| is_plausible_oem(c)) else {
                        continue;
                    };
                    out.push(candidate(oem, name_cell(row, col)));
                }
                break;
            }
        }
        (!out.is_empty()).then_some(out)
    }
}

/// Headings such as `Коробка передач 3043001600`.
pub struct HeaderOem;

impl FieldStrategy<Vec<OemCandidate>> for HeaderOem {
    fn tag(&self) -> &'static str {
        "header_oem"
    }

    fn attempt(&self, cx: &FieldContext<'_>) -> Option<Vec<OemCandidate>> {
        let re = regex(
            &HEADER_OEM,
            r"(?i)(?:Коробка\s+передач|Трансмиссия)\s+([A-Z0-9]{6,20})\b",
        );
        let sel = Selector::parse("h1, h2, h3, h4, h5, h6, [class*='title'], [class*='header']").unwrap();
        let mut out = Vec::new();
        for el in cx.doc.html.select(&sel) {
            let text = element_text(&el);
            if let Some(m) = re.captures(&text).and_then(|c| c.get(1)) {
                out.push(candidate(&m.as_str().to_uppercase(), &text));
            }
        }
        (!out.is_empty()).then_some(out)
    }
}

/// Tables between an "Оригинал" marker and the next "Аналоги"/"Копии" marker.
pub struct OriginalBlock;

impl OriginalBlock {
    /// Text owned directly by the element, children excluded.
    fn own_text(el: &ElementRef<'_>) -> String {
        let raw: String = el
            .children()
            .filter_map(|c| c.value().as_text().map(|t| t.to_string()))
            .collect();
        collapse_whitespace(&raw).to_lowercase()
    }

    fn tables_in_block(document: &Html) -> Vec<ElementRef<'_>> {
        let mut in_block = false;
        let mut tables = Vec::new();
        for el in document.root_element().descendants().filter_map(ElementRef::wrap) {
            if el.value().name() == "table" {
                if in_block {
                    tables.push(el);
                }
                continue;
            }
            let own = Self::own_text(&el);
            if own.starts_with("оригинал") {
                in_block = true;
            } else if own.starts_with("аналог") || own.starts_with("копи") {
                in_block = false;
            }
        }
        tables
    }
}

impl FieldStrategy<Vec<OemCandidate>> for OriginalBlock {
    fn tag(&self) -> &'static str {
        "original_block"
    }

    fn attempt(&self, cx: &FieldContext<'_>) -> Option<Vec<OemCandidate>> {
        let out: Vec<OemCandidate> = Self::tables_in_block(&cx.doc.html)
            .iter()
            .flat_map(table_rows)
            .filter_map(|cells| row_candidate(&cells))
            .collect();
        (!out.is_empty()).then_some(out)
    }
}

/// Keep plausible codes in page order; repeated rows stay repeated.
fn refine(candidates: Vec<OemCandidate>) -> Option<Vec<OemCandidate>> {
    let kept: Vec<OemCandidate> = candidates
        .into_iter()
        .filter(|c| is_plausible_oem(&c.oem))
        .collect();
    (!kept.is_empty()).then_some(kept)
}

/// Detail-page cascade.
pub fn cascade() -> Cascade<Vec<OemCandidate>> {
    Cascade::new(FIELD, refine)
        .then(TwoColumnTable)
        .then(DetailLinkList)
        .then(TableColumnScan)
}

/// Search-page cascade for catalogues that show parts next to the vehicle.
pub fn search_page_cascade() -> Cascade<Vec<OemCandidate>> {
    Cascade::new(FIELD, refine)
        .then(HeaderOem)
        .then(OriginalBlock)
        .then(TwoColumnTable)
        .then(DetailLinkList)
        .then(TableColumnScan)
}
