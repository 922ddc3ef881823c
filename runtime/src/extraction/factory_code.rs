// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Factory/aggregate code strategies (`JHQ`, `JH3 542`).

use super::filters::{is_plausible_factory_code, regex};
use super::html::{label_value_pairs, parse_tables};
use super::model::{transmission_column_values, transmission_field_values};
use super::{refine_text, Cascade, FieldContext, FieldStrategy};
use regex::Regex;
use std::sync::OnceLock;

pub const FIELD: &str = "gearbox.factory_code";

const FACTORY_LABELS: &[&str] = &[
    "заводской код",
    "код кпп",
    "код коробки",
    "код агрегата",
    "код трансмиссии",
    "factory code",
    "transmission code",
    "gearbox code",
];

static PARENTHESIZED: OnceLock<Regex> = OnceLock::new();
static LETTER_CODE: OnceLock<Regex> = OnceLock::new();

fn is_factory_label(label: &str) -> bool {
    FACTORY_LABELS.iter().any(|l| label.contains(l))
}

/// Pair labelled "заводской код", "код КПП", "transmission code", ...
pub struct LabelledField;

impl FieldStrategy<String> for LabelledField {
    fn tag(&self) -> &'static str {
        "labelled_field"
    }

    fn attempt(&self, cx: &FieldContext<'_>) -> Option<String> {
        label_value_pairs(&cx.doc.html)
            .into_iter()
            .filter(|(label, _)| is_factory_label(label))
            .map(|(_, value)| value)
            .find(|v| is_plausible_factory_code(v))
    }
}

/// Column headed by a factory-code label.
pub struct StructuredColumn;

impl FieldStrategy<String> for StructuredColumn {
    fn tag(&self) -> &'static str {
        "structured_column"
    }

    fn attempt(&self, cx: &FieldContext<'_>) -> Option<String> {
        parse_tables(&cx.doc.html).into_iter().find_map(|table| {
            let idx = table.header.iter().position(|h| is_factory_label(h))?;
            table
                .rows
                .iter()
                .filter_map(|r| r.get(idx))
                .find(|v| is_plausible_factory_code(v))
                .cloned()
        })
    }
}

/// Code embedded in a transmission description: `МКПП 5-ступ. (JHQ)`.
pub struct HintDescriptionCode;

impl HintDescriptionCode {
    fn code_in(text: &str) -> Option<String> {
        let paren = regex(&PARENTHESIZED, r"\(([A-Z0-9][A-Z0-9 .\-]{0,14}[A-Z0-9])\)");
        if let Some(code) = paren
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .find(|v| is_plausible_factory_code(v))
        {
            return Some(code.to_string());
        }
        let letters = regex(&LETTER_CODE, r"\b([A-Z]{3,5})\b");
        letters
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .find(|v| !matches!(*v, "CVT" | "DSG" | "AMT" | "AWD" | "FWD" | "RWD") && is_plausible_factory_code(v))
            .map(str::to_string)
    }
}

impl FieldStrategy<String> for HintDescriptionCode {
    fn tag(&self) -> &'static str {
        "hint_description_code"
    }

    fn attempt(&self, cx: &FieldContext<'_>) -> Option<String> {
        transmission_field_values(cx.doc)
            .into_iter()
            .chain(transmission_column_values(cx.doc))
            .find_map(|v| Self::code_in(&v))
    }
}

/// Fall back to the gearbox model resolved earlier.
pub struct ModelReuse;

impl FieldStrategy<String> for ModelReuse {
    fn tag(&self) -> &'static str {
        "model_reuse"
    }

    fn attempt(&self, cx: &FieldContext<'_>) -> Option<String> {
        cx.model
            .filter(|m| is_plausible_factory_code(m))
            .map(str::to_string)
    }
}

fn refine(value: String) -> Option<String> {
    refine_text(value, is_plausible_factory_code)
}

pub fn cascade() -> Cascade<String> {
    Cascade::new(FIELD, refine)
        .then(LabelledField)
        .then(StructuredColumn)
        .then(HintDescriptionCode)
        .then(ModelReuse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::PageDocument;
    use crate::types::Evidence;

    fn run(html: &str, model: Option<&str>) -> (Option<String>, Vec<String>) {
        let doc = PageDocument::parse(html, "https://provider-a.test/");
        let mut ev = Evidence::default();
        let cx = FieldContext::new(&doc).with_model(model);
        (cascade().run(&cx, &mut ev), ev.strategy_tags)
    }

    #[test]
    fn test_labelled_field() {
        let (v, tags) = run("<dl><dt>Код КПП:</dt><dd>JHQ</dd></dl>", None);
        assert_eq!(v.as_deref(), Some("JHQ"));
        assert_eq!(tags, vec!["gearbox.factory_code:labelled_field"]);
    }

    #[test]
    fn test_structured_column() {
        let html = r#"<table><thead><tr><th>Модель</th><th>Код коробки</th><th>Год</th></tr></thead>
            <tbody><tr><td>Logan</td><td>JH3 542</td><td>2010</td></tr></tbody></table>"#;
        let (v, tags) = run(html, None);
        assert_eq!(v.as_deref(), Some("JH3 542"));
        assert_eq!(tags, vec!["gearbox.factory_code:structured_column"]);
    }

    #[test]
    fn test_hint_description_code() {
        let (v, tags) = run("<dl><dt>КПП</dt><dd>Механическая 5-ступ. (JHQ)</dd></dl>", None);
        assert_eq!(v.as_deref(), Some("JHQ"));
        assert_eq!(tags, vec!["gearbox.factory_code:hint_description_code"]);
    }

    #[test]
    fn test_model_reuse_last() {
        let (v, tags) = run("<p>nothing here</p>", Some("0B5"));
        assert_eq!(v.as_deref(), Some("0B5"));
        assert_eq!(tags, vec!["gearbox.factory_code:model_reuse"]);
        assert_eq!(run("<p>nothing here</p>", None).0, None);
    }

    #[test]
    fn test_lowercase_and_noise_rejected() {
        let (v, _) = run("<dl><dt>Заводской код</dt><dd>нет</dd></dl>", None);
        assert_eq!(v, None);
    }
}
