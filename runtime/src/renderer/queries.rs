// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! The fixed set of structured queries the engine may ask of a page.
//!
//! Keeping this list closed means that when a provider's markup drifts only
//! the strategy code changes; the renderer contract stays put. Bump
//! [`QUERY_CONTRACT_VERSION`] whenever a variant is added or its result shape
//! changes.

use crate::extraction::filters::is_plausible_oem;
use crate::extraction::html::{element_text, visible_text};
use scraper::{Html, Selector};
use serde_json::Value;

/// Version of the query contract between engine and renderer.
pub const QUERY_CONTRACT_VERSION: u32 = 1;

/// A named structured query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedQuery {
    /// Full serialised document (`string`).
    OuterHtml,
    /// Visible body text, scripts and styles excluded (`string`).
    BodyText,
    /// Number of table cells and links whose text is a plausible OEM code
    /// (`number`).
    PartNumberCount,
}

impl NamedQuery {
    pub fn name(&self) -> &'static str {
        match self {
            NamedQuery::OuterHtml => "outer_html",
            NamedQuery::BodyText => "body_text",
            NamedQuery::PartNumberCount => "part_number_count",
        }
    }

    /// In-page script for queries a live browser answers natively.
    ///
    /// `None` means the query is answered from the serialised document via
    /// [`evaluate_on_html`].
    pub fn script(&self) -> Option<&'static str> {
        match self {
            NamedQuery::OuterHtml => Some("document.documentElement.outerHTML"),
            NamedQuery::BodyText => Some("document.body ? document.body.innerText : ''"),
            NamedQuery::PartNumberCount => None,
        }
    }
}

/// Answer a query from a serialised document.
pub fn evaluate_on_html(query: &NamedQuery, html: &str) -> Value {
    match query {
        NamedQuery::OuterHtml => Value::String(html.to_string()),
        NamedQuery::BodyText => {
            let document = Html::parse_document(html);
            Value::String(visible_text(&document))
        }
        NamedQuery::PartNumberCount => {
            let document = Html::parse_document(html);
            Value::from(count_part_numbers(&document))
        }
    }
}

fn count_part_numbers(document: &Html) -> u64 {
    let sel = Selector::parse("td, th, a").unwrap();
    document
        .select(&sel)
        .filter(|el| {
            let text = element_text(el);
            text.split_whitespace().count() <= 6 && is_plausible_oem(&text)
        })
        .count() as u64
}
