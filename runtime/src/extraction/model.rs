// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Gearbox model strategies (`0B5`, `09G`, `722.964`, `JH3542`, ...).

use super::filters::{is_plausible_model, regex as compiled};
use super::html::{element_text, label_value_pairs, parse_tables, window, PageDocument};
use super::{refine_text, Cascade, FieldContext, FieldStrategy};
use regex::Regex;
use scraper::Selector;
use std::sync::OnceLock;

pub const FIELD: &str = "gearbox.model";

/// Longest value the hint column strategy treats as a bare model.
const HINT_MAX_CHARS: usize = 16;

/// How far around a manufacturer code a transmission keyword may sit.
const KEYWORD_WINDOW: usize = 100;

/// Lower-case words that mark a transmission in running text.
pub const TRANSMISSION_KEYWORDS: &[&str] = &[
    "кпп", "коробк", "трансмисс", "вариатор", "transmission", "gearbox", "getriebe",
];

/// Locale noise stripped when decomposing a free-text description.
const DESCRIPTION_NOISE: &[&str] = &[
    "автоматическая", "механическая", "роботизированная", "коробка", "передач", "передачи",
    "ступенчатая", "ступ", "ст", "кпп", "акпп", "мкпп", "вариатор", "робот", "с", "в", "и",
    "manual", "automatic", "transmission", "gearbox", "speed", "at", "mt", "cvt", "amt",
];

static SPEED_TOKEN: OnceLock<Regex> = OnceLock::new();
static CODE_TOKEN: OnceLock<Regex> = OnceLock::new();
static KEYWORD_RE: OnceLock<Regex> = OnceLock::new();
static NUMERIC_RUN: OnceLock<Regex> = OnceLock::new();
static INLINE_LABEL: OnceLock<Regex> = OnceLock::new();
static MANUFACTURER_CODES: OnceLock<Vec<Regex>> = OnceLock::new();

fn manufacturer_codes() -> &'static [Regex] {
    MANUFACTURER_CODES.get_or_init(|| {
        [
            r"(?i)\b(6HP\d{2}[A-Z]?)\b",
            r"(?i)\b(8HP\d{2}[A-Z]?)\b",
            r"(?i)\b(AW\s?\d{2}-?\d{0,2}[A-Z]*)\b",
            r"(?i)\b(A[345]\d{3}[A-Z]*)\b",
            r"(?i)\b(TF-\d{2}[A-Z]*)\b",
            r"(?i)\b(ZF\s*\d+[A-Z]*)\b",
            r"(?i)\b(09G|09K|09D|0AM|0AW|0B5|0B6|02E|0CW|0DE)\b",
            r"\b([A-Z]{2,4}\s*-?\s*\d{2,4}[A-Z]?)\b",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("static pattern compiles"))
        .collect()
    })
}

/// Whether a normalised label names the transmission itself (not its code).
pub fn is_transmission_label(label: &str) -> bool {
    if label.is_empty() || label.chars().count() > 40 {
        return false;
    }
    if label.starts_with("код") || label.contains("code") {
        return false;
    }
    TRANSMISSION_KEYWORDS.iter().any(|k| label.contains(k))
}

/// Short value without locale words, e.g. `0B5` or `JH3 542`.
fn is_bare_code(value: &str) -> bool {
    value.chars().count() <= 20 && !value.chars().any(|c| c.is_alphabetic() && !c.is_ascii())
}

/// Values of every label/value pair labelled as the transmission.
pub fn transmission_field_values(doc: &PageDocument) -> Vec<String> {
    label_value_pairs(&doc.html)
        .into_iter()
        .filter(|(label, _)| is_transmission_label(label))
        .map(|(_, value)| value)
        .collect()
}

/// Values of table columns headed by a transmission label.
pub fn transmission_column_values(doc: &PageDocument) -> Vec<String> {
    let mut values = Vec::new();
    for table in parse_tables(&doc.html) {
        let Some(idx) = table.header.iter().position(|h| is_transmission_label(h)) else {
            continue;
        };
        values.extend(table.rows.iter().filter_map(|r| r.get(idx).cloned()));
    }
    values
}

/// `dt/dd`, `th/td` or two-cell row labelled КПП/коробка/transmission.
pub struct StructuredField;

impl FieldStrategy<String> for StructuredField {
    fn tag(&self) -> &'static str {
        "structured_field"
    }

    fn attempt(&self, cx: &FieldContext<'_>) -> Option<String> {
        transmission_field_values(cx.doc)
            .into_iter()
            .find(|v| is_bare_code(v) && is_plausible_model(v))
    }
}

/// Short value in a table column headed by a transmission label.
pub struct HintColumn;

impl FieldStrategy<String> for HintColumn {
    fn tag(&self) -> &'static str {
        "hint_column"
    }

    fn attempt(&self, cx: &FieldContext<'_>) -> Option<String> {
        transmission_column_values(cx.doc)
            .into_iter()
            .find(|v| v.chars().count() <= HINT_MAX_CHARS && is_bare_code(v) && is_plausible_model(v))
    }
}

/// Split a free-text transmission description into tokens and keep the first
/// code-shaped token that is not locale noise.
pub fn decompose_description(text: &str) -> Option<String> {
    let speed = compiled(&SPEED_TOKEN, r"(?i)^\d+-?(?:ступ|ст|speed|sp|скор)");
    let code = compiled(&CODE_TOKEN, r"^[A-Za-z0-9][A-Za-z0-9.\-]*$");
    text.split(|c: char| c.is_whitespace() || ",;()[]/".contains(c))
        .map(|t| t.trim_matches(|c: char| c == '.' || c == '-' || c == ':'))
        .filter(|t| !t.is_empty())
        .filter(|t| !DESCRIPTION_NOISE.contains(&t.to_lowercase().as_str()))
        .filter(|t| !speed.is_match(t))
        .filter(|t| code.is_match(t))
        .find(|t| is_plausible_model(t))
        .map(str::to_string)
}

pub struct DescriptionDecomposition;

impl FieldStrategy<String> for DescriptionDecomposition {
    fn tag(&self) -> &'static str {
        "description_decomposition"
    }

    fn attempt(&self, cx: &FieldContext<'_>) -> Option<String> {
        transmission_field_values(cx.doc)
            .into_iter()
            .chain(transmission_column_values(cx.doc))
            .find_map(|v| decompose_description(&v))
    }
}

/// Numeric run (`722.964`) after a transmission keyword in an
/// "aggregates used" field.
pub struct AggregatesNumericRun;

impl AggregatesNumericRun {
    fn aggregate_texts(doc: &PageDocument) -> Vec<String> {
        let mut texts: Vec<String> = label_value_pairs(&doc.html)
            .into_iter()
            .filter(|(label, _)| label.contains("агрегат") || label.contains("aggregate"))
            .map(|(_, value)| value)
            .collect();
        let sel = Selector::parse("[class*='aggregat']").unwrap();
        texts.extend(doc.html.select(&sel).map(|el| element_text(&el)));
        texts
    }

    fn numeric_run(text: &str) -> Option<String> {
        let keyword = compiled(&KEYWORD_RE, r"(?i)кпп|коробк|трансмисс|transmission|getriebe|gearbox");
        let run = compiled(&NUMERIC_RUN, r"\b(\d{3}\.\d{2,3}|\d{5,8})\b");
        if let Some(k) = keyword.find(text) {
            return run
                .find_iter(&text[k.end()..])
                .map(|m| m.as_str().to_string())
                .find(|v| is_plausible_model(v));
        }
        let runs: Vec<&str> = run.find_iter(text).map(|m| m.as_str()).collect();
        match runs.as_slice() {
            [only] if is_plausible_model(only) => Some(only.to_string()),
            _ => None,
        }
    }
}

impl FieldStrategy<String> for AggregatesNumericRun {
    fn tag(&self) -> &'static str {
        "aggregates_numeric_run"
    }

    fn attempt(&self, cx: &FieldContext<'_>) -> Option<String> {
        Self::aggregate_texts(cx.doc)
            .iter()
            .find_map(|t| Self::numeric_run(t))
    }
}

/// Known manufacturer code shape near a transmission keyword in the
/// tag-stripped text.
pub struct ManufacturerCode;

impl FieldStrategy<String> for ManufacturerCode {
    fn tag(&self) -> &'static str {
        "manufacturer_code"
    }

    fn attempt(&self, cx: &FieldContext<'_>) -> Option<String> {
        let text = &cx.doc.text;
        for pattern in manufacturer_codes() {
            for caps in pattern.captures_iter(text) {
                let Some(m) = caps.get(1) else { continue };
                let around = window(text, m.start(), m.end(), KEYWORD_WINDOW, KEYWORD_WINDOW / 2)
                    .to_lowercase();
                if !TRANSMISSION_KEYWORDS.iter().any(|k| around.contains(k)) {
                    continue;
                }
                let code: String = m
                    .as_str()
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect::<String>()
                    .to_uppercase();
                if is_plausible_model(&code) {
                    return Some(code);
                }
            }
        }
        None
    }
}

/// `КПП: 0B5` / `Transmission: 09G` in running text.
pub struct InlineLabel;

impl FieldStrategy<String> for InlineLabel {
    fn tag(&self) -> &'static str {
        "inline_label"
    }

    fn attempt(&self, cx: &FieldContext<'_>) -> Option<String> {
        let re = compiled(
            &INLINE_LABEL,
            r"(?i)(?:кпп|коробка(?:\s+передач)?|transmission|gearbox)\s*[:：]\s*([A-Za-z0-9][A-Za-z0-9.\-_ ]{1,30})",
        );
        re.captures_iter(&cx.doc.text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .find(|v| is_plausible_model(v))
    }
}

fn refine(value: String) -> Option<String> {
    refine_text(value, is_plausible_model)
}

/// Model cascade in priority order.
pub fn cascade() -> Cascade<String> {
    Cascade::new(FIELD, refine)
        .then(StructuredField)
        .then(HintColumn)
        .then(DescriptionDecomposition)
        .then(AggregatesNumericRun)
        .then(ManufacturerCode)
        .then(InlineLabel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Evidence;

    fn run(html: &str) -> (Option<String>, Vec<String>) {
        let doc = PageDocument::parse(html, "https://provider-a.test/search-vehicle");
        let mut ev = Evidence::default();
        let value = cascade().run(&FieldContext::new(&doc), &mut ev);
        (value, ev.strategy_tags)
    }

    #[test]
    fn test_structured_field() {
        let (v, tags) = run("<table><tr><th>Марка</th><td>VW</td></tr><tr><th>КПП</th><td>0B5</td></tr></table>");
        assert_eq!(v.as_deref(), Some("0B5"));
        assert_eq!(tags, vec!["gearbox.model:structured_field"]);
    }

    #[test]
    fn test_hint_column() {
        let html = r#"<table>
            <tr><th>Модель</th><th>Год</th><th>КПП</th></tr>
            <tr><td>Logan</td><td>2010</td><td>JH3542</td></tr></table>"#;
        let (v, tags) = run(html);
        assert_eq!(v.as_deref(), Some("JH3542"));
        assert_eq!(tags, vec!["gearbox.model:hint_column"]);
    }

    #[test]
    fn test_description_decomposition_strips_noise() {
        assert_eq!(
            decompose_description("Автоматическая коробка передач 6-ступ. 09G").as_deref(),
            Some("09G")
        );
        assert_eq!(decompose_description("Механическая КПП").as_deref(), None);
        let html = "<dl><dt>Коробка передач</dt><dd>Автоматическая коробка передач 6-ступ. (09G)</dd></dl>";
        let (v, tags) = run(html);
        assert_eq!(v.as_deref(), Some("09G"));
        assert_eq!(tags, vec!["gearbox.model:description_decomposition"]);
    }

    #[test]
    fn test_aggregates_numeric_run() {
        let html = "<table><tr><td>Агрегаты</td><td>Двигатель 272.948, КПП 722.964</td></tr></table>";
        let (v, tags) = run(html);
        assert_eq!(v.as_deref(), Some("722.964"));
        assert_eq!(tags, vec!["gearbox.model:aggregates_numeric_run"]);
    }

    #[test]
    fn test_manufacturer_code_needs_keyword() {
        let with_kw = "<div><p>Комплектация</p><p>Трансмиссия автомат ZF 6HP26 Sport</p></div>";
        let (v, tags) = run(with_kw);
        assert_eq!(v.as_deref(), Some("6HP26"));
        assert_eq!(tags, vec!["gearbox.model:manufacturer_code"]);

        let without_kw = "<div><p>Артикул 6HP26 на складе</p></div>";
        assert_eq!(run(without_kw).0, None);
    }

    #[test]
    fn test_inline_label() {
        let (v, tags) = run("<div><span>Сведения. КПП : Y4M</span></div>");
        assert_eq!(v.as_deref(), Some("Y4M"));
        // generic manufacturer shape does not match `Y4M`, so the inline pattern wins
        assert_eq!(tags, vec!["gearbox.model:inline_label"]);
    }

    #[test]
    fn test_rejects_dates_and_regions() {
        let html = "<table><tr><th>КПП</th><td>2008</td></tr><tr><th>Коробка</th><td>Европа</td></tr></table>";
        assert_eq!(run(html).0, None);
    }

    #[test]
    fn test_cascade_is_deterministic() {
        let html = "<dl><dt>КПП</dt><dd>0B5</dd></dl><p>Transmission: 09G</p>";
        let first = run(html);
        for _ in 0..5 {
            assert_eq!(run(html), first);
        }
        assert_eq!(first.0.as_deref(), Some("0B5"));
    }

    #[test]
    fn test_code_label_is_not_a_model_label() {
        assert!(!is_transmission_label("код кпп"));
        assert!(is_transmission_label("тип кпп"));
        assert!(is_transmission_label("коробка передач"));
    }
}
