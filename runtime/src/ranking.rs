// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Relevance filter and ranker for OEM candidates.

use crate::types::OemCandidate;
use std::cmp::Ordering;

/// Consumables and fasteners that share a catalogue page with the gearbox.
const EXCLUDE: &[&str] = &[
    "масло", "шайб", "фиксатор", "шумоизоляц", "болт", "гайк", "уплотн", "прокладк",
    "сальник", "фильтр", "датчик", "крепеж", "крепёж", "пробк", "oil", "gasket", "seal",
    "filter", "bolt", "nut", "sensor", "washer", "plug",
];

const INCLUDE: &[&str] = &[
    "кпп", "акпп", "мкпп", "коробк", "коробка передач", "мкп", "акп", "вариатор", "cvt",
    "трансмиссия", "transmission", "gearbox", "gear box",
];

const PRIORITY: &[&str] = &["в сборе", "трансмиссия", "коробка передач", "assembly", "complete"];

fn contains_any(name: &str, words: &[&str]) -> bool {
    words.iter().any(|w| name.contains(w))
}

/// Whether `text` names a consumable or fastener.
pub fn is_consumable(text: &str) -> bool {
    contains_any(&text.to_lowercase(), EXCLUDE)
}

/// Whether a candidate names a gearbox rather than a consumable.
pub fn is_relevant(candidate: &OemCandidate) -> bool {
    let name = candidate.name.to_lowercase();
    !contains_any(&name, EXCLUDE) && contains_any(&name, INCLUDE)
}

fn is_priority(candidate: &OemCandidate) -> bool {
    contains_any(&candidate.name.to_lowercase(), PRIORITY)
}

/// Relevant candidates, priority names first, then by name.
pub fn rank(candidates: &[OemCandidate]) -> Vec<OemCandidate> {
    let mut ranked: Vec<OemCandidate> = candidates.iter().filter(|c| is_relevant(c)).cloned().collect();
    ranked.sort_by(|a, b| match (is_priority(a), is_priority(b)) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.name.cmp(&b.name),
    });
    ranked
}

/// Top-ranked candidate, if any survives the filter.
pub fn select(candidates: &[OemCandidate]) -> Option<OemCandidate> {
    rank(candidates).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(oem: &str, name: &str) -> OemCandidate {
        OemCandidate::new(oem, name)
    }

    #[test]
    fn test_priority_assembly_wins() {
        let candidates = vec![
            c("X1", "Масло трансмиссионное"),
            c("X2", "КПП в сборе"),
            c("X3", "Коробка передач"),
        ];
        let ranked = rank(&candidates);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].oem, "X2");
        assert_eq!(select(&candidates).map(|c| c.oem), Some("X2".to_string()));
    }

    #[test]
    fn test_oil_filter_dropped_variator_kept() {
        let ranked = rank(&[
            c("X1", "Oil filter"),
            c("X2", "Коробка передач в сборе"),
            c("X3", "Вариатор"),
        ]);
        let oems: Vec<&str> = ranked.iter().map(|c| c.oem.as_str()).collect();
        assert_eq!(oems, vec!["X2", "X3"]);
    }

    #[test]
    fn test_ties_are_lexical() {
        let ranked = rank(&[c("B", "АКПП правая"), c("A", "АКПП левая")]);
        let names: Vec<&str> = ranked.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["АКПП левая", "АКПП правая"]);
    }

    #[test]
    fn test_consumables_excluded() {
        assert!(!is_relevant(&c("N90813202", "Болт КПП")));
        assert!(!is_relevant(&c("G052182A2", "Transmission oil")));
        assert!(!is_relevant(&c("0B5301103", "Фильтр АКПП")));
        assert!(!is_relevant(&c("1K0199555", "Опора двигателя")));
        assert!(is_relevant(&c("0B5300012A", "Gearbox assembly")));
    }

    #[test]
    fn test_nothing_relevant() {
        assert_eq!(select(&[c("G052182A2", "Масло")]), None);
        assert_eq!(select(&[]), None);
    }
}
