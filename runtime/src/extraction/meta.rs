// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Vehicle description scraped from the search page.

use super::filters::regex;
use super::html::{label_value_pairs, truncate_chars, PageDocument};
use crate::types::{Evidence, VehicleMeta};
use regex::Regex;
use std::sync::OnceLock;

pub const FIELD: &str = "vehicle_meta";

const VALUE_MAX_CHARS: usize = 200;

/// Canonical slot and the normalised labels that feed it.
const META_LABELS: &[(&str, &[&str])] = &[
    ("make", &["марка", "производитель", "make", "brand", "manufacturer"]),
    ("model", &["модель", "model"]),
    ("year", &["год", "год выпуска", "year", "model year"]),
    ("engine", &["двигатель", "мотор", "engine"]),
    ("body", &["кузов", "тип кузова", "body", "body type"]),
    ("drive_type", &["привод", "тип привода", "drive", "drive type"]),
    ("transmission", &["кпп", "коробка", "коробка передач", "трансмиссия", "transmission", "gearbox"]),
];

static INLINE: OnceLock<Regex> = OnceLock::new();

fn slot_for(label: &str) -> Option<&'static str> {
    META_LABELS
        .iter()
        .find(|(_, labels)| labels.contains(&label))
        .map(|(slot, _)| *slot)
}

/// Fill the empty slot named by `label`; true when something was written.
fn fill(meta: &mut VehicleMeta, label: &str, value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }
    let Some(slot) = slot_for(label).and_then(|key| meta.slot_mut(key)) else {
        return false;
    };
    if slot.is_some() {
        return false;
    }
    *slot = Some(truncate_chars(value, VALUE_MAX_CHARS));
    true
}

/// Label pairs first, then `label: value` text for the slots still empty.
pub fn extract(doc: &PageDocument, evidence: &mut Evidence) -> VehicleMeta {
    let mut meta = VehicleMeta::default();

    let mut from_pairs = false;
    for (label, value) in label_value_pairs(&doc.html) {
        from_pairs |= fill(&mut meta, &label, &value);
    }
    if from_pairs {
        evidence.record_tag(FIELD, "label_pairs");
    }

    let inline = regex(
        &INLINE,
        r"(?i)(?:^|\n)[ \t]*(марка|производитель|модель|год выпуска|год|двигатель|мотор|тип кузова|кузов|тип привода|привод|коробка передач|коробка|кпп|трансмиссия|make|brand|model year|model|year|engine|body type|body|drive type|drive|transmission|gearbox)[ \t]*[:：]\s*([^\n]+)",
    );
    let mut from_text = false;
    for caps in inline.captures_iter(&doc.text) {
        let (Some(label), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        from_text |= fill(&mut meta, &label.as_str().to_lowercase(), value.as_str());
    }
    if from_text {
        evidence.record_tag(FIELD, "inline_label");
    }

    meta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_then_inline() {
        let html = r#"<table>
              <tr><th>Марка</th><td>Volkswagen</td></tr>
              <tr><th>Модель</th><td>Transporter T5</td></tr>
              <tr><th>Год выпуска</th><td>2008</td></tr></table>
            <p>Двигатель: AXB</p><p>Привод:</p><p>передний</p>"#;
        let doc = PageDocument::parse(html, "https://provider-a.test/");
        let mut ev = Evidence::default();
        let meta = extract(&doc, &mut ev);
        assert_eq!(meta.make.as_deref(), Some("Volkswagen"));
        assert_eq!(meta.model.as_deref(), Some("Transporter T5"));
        assert_eq!(meta.year.as_deref(), Some("2008"));
        assert_eq!(meta.engine.as_deref(), Some("AXB"));
        assert_eq!(meta.drive_type.as_deref(), Some("передний"));
        assert_eq!(meta.body, None);
        assert_eq!(ev.strategy_tags, vec!["vehicle_meta:label_pairs", "vehicle_meta:inline_label"]);
    }

    #[test]
    fn test_first_value_wins_and_is_truncated() {
        let long = "x".repeat(300);
        let html = format!("<dl><dt>Make</dt><dd>{long}</dd><dt>Марка</dt><dd>Other</dd></dl>");
        let doc = PageDocument::parse(&html, "https://provider-a.test/");
        let meta = extract(&doc, &mut Evidence::default());
        assert_eq!(meta.make.map(|m| m.chars().count()), Some(VALUE_MAX_CHARS));
    }

    #[test]
    fn test_empty_page() {
        let doc = PageDocument::parse("<p>Ничего не найдено</p>", "https://provider-a.test/");
        let mut ev = Evidence::default();
        assert!(extract(&doc, &mut ev).is_empty());
        assert!(ev.strategy_tags.is_empty());
    }
}
