// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Field validity filters.
//!
//! Pure predicates deciding whether a scraped string is a plausible value for
//! a semantic field. Every accepted candidate passes through one of these,
//! whichever provider or strategy produced it.

use regex::Regex;
use std::sync::OnceLock;

pub(crate) fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern compiles"))
}

static STYLE_PREFIX: OnceLock<Regex> = OnceLock::new();
static CSS_MODULE: OnceLock<Regex> = OnceLock::new();
static LOWER_HEX: OnceLock<Regex> = OnceLock::new();
static VIN_SHAPE: OnceLock<Regex> = OnceLock::new();
static FRAME_SHAPE: OnceLock<Regex> = OnceLock::new();
static DATE_SHAPES: OnceLock<Regex> = OnceLock::new();
static MONTH_DATE: OnceLock<Regex> = OnceLock::new();
static DIGIT_RUN: OnceLock<Regex> = OnceLock::new();
static FACTORY_SHAPE: OnceLock<Regex> = OnceLock::new();

const BODY_WORDS: &[&str] = &[
    "седан", "хэтчбек", "хетчбек", "универсал", "внедорожник", "кроссовер", "купе",
    "кабриолет", "минивэн", "минивен", "пикап", "фургон", "лифтбек", "родстер",
    "sedan", "hatchback", "wagon", "estate", "suv", "coupe", "convertible", "minivan",
    "pickup", "van", "liftback", "roadster",
];

const REGION_WORDS: &[&str] = &[
    "европа", "япония", "корея", "китай", "россия", "сша", "америка", "азия", "канада",
    "европейский", "японский", "europe", "japan", "korea", "china", "russia", "usa",
    "america", "asia", "canada", "general", "gcc", "eu", "jp", "us", "rus",
];

/// Words that label a gearbox rather than identify one.
const NOISE_WORDS: &[&str] = &[
    "кпп", "акпп", "мкпп", "коробка", "передач", "коробка передач", "трансмиссия",
    "механическая", "автоматическая", "вариатор", "робот", "нет", "н/д", "-",
    "transmission", "gearbox", "manual", "automatic", "cvt", "n/a",
];

/// Style-artifact hashes: `css-1q2w3e`, `sc-AxjAm`, `table_x3f9a`, `9f3ab21c`.
pub fn looks_like_style_hash(s: &str) -> bool {
    let s = s.trim();
    if regex(&STYLE_PREFIX, r"^(?i:css|sc|jsx|emotion|svelte|styled|chakra|mui)-[A-Za-z0-9_-]+$")
        .is_match(s)
    {
        return true;
    }
    if regex(&CSS_MODULE, r"^_?[a-z][a-zA-Z]*_{1,2}[a-zA-Z0-9]{5,}$").is_match(s) {
        return true;
    }
    regex(&LOWER_HEX, r"^[0-9a-f]{8,}$").is_match(s)
        && s.chars().any(|c| c.is_ascii_alphabetic())
        && s.chars().any(|c| c.is_ascii_digit())
}

/// Body types, full VINs and frame numbers.
pub fn looks_like_body_code(s: &str) -> bool {
    let trimmed = s.trim();
    let lower = trimmed.to_lowercase();
    if lower.split(|c: char| !c.is_alphanumeric()).any(|w| BODY_WORDS.contains(&w)) {
        return true;
    }
    let upper = trimmed.to_uppercase();
    regex(&VIN_SHAPE, r"^[A-HJ-NPR-Z0-9]{17}$").is_match(&upper)
        || regex(&FRAME_SHAPE, r"^[A-Z]{2,5}\d{2,3}[A-Z]?-\d{5,7}$").is_match(&upper)
}

/// Geographic/market region names.
pub fn looks_like_region(s: &str) -> bool {
    let lower = s.trim().to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    (!words.is_empty() && words.iter().all(|w| REGION_WORDS.contains(w)))
        || REGION_WORDS.contains(&lower.as_str())
}

/// Years, numeric dates, month-name dates and date ranges.
pub fn looks_like_date(s: &str) -> bool {
    let s = s.trim();
    let date = r"(?:(?:19|20)\d{2}|\d{1,2}[./-]\d{1,2}[./-]\d{2,4}|\d{4}[./-]\d{1,2}(?:[./-]\d{1,2})?|\d{1,2}[./]\d{4})";
    let shapes = regex(
        &DATE_SHAPES,
        &format!(r"^{date}(?:\s*(?:-|–|—|по|to)\s*(?:{date}|н\.?\s*в\.?|now)?)?$"),
    );
    if shapes.is_match(s) {
        return true;
    }
    regex(
        &MONTH_DATE,
        r"(?i)^(?:\d{1,2}\s+)?(?:янв|фев|мар|апр|мая|май|июн|июл|авг|сен|окт|ноя|дек|jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[а-яa-z]*\.?\s+(?:19|20)\d{2}$",
    )
    .is_match(s)
}

fn rejected_by_common_filters(s: &str) -> bool {
    looks_like_style_hash(s) || looks_like_body_code(s) || looks_like_region(s) || looks_like_date(s)
}

fn has_digit_run(s: &str, min: usize) -> bool {
    regex(&DIGIT_RUN, r"\d+")
        .find_iter(s)
        .any(|m| m.as_str().len() >= min)
}

/// Whether `s` may be accepted as an OEM part number.
///
/// Requires a run of at least three digits, none of `( ) ; : =`, and a
/// length of 6 to 25 characters, on top of the common rejections.
pub fn is_plausible_oem(s: &str) -> bool {
    let s = s.trim();
    let len = s.chars().count();
    if !(6..=25).contains(&len) {
        return false;
    }
    if s.contains(['(', ')', ';', ':', '=']) {
        return false;
    }
    if !has_digit_run(s, 3) {
        return false;
    }
    !rejected_by_common_filters(s)
}

/// Whether `s` may be accepted as a gearbox model (e.g. `0B5`, `722.964`).
pub fn is_plausible_model(s: &str) -> bool {
    let s = s.trim();
    let len = s.chars().count();
    if !(2..=40).contains(&len) {
        return false;
    }
    if !s.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    if NOISE_WORDS.contains(&s.to_lowercase().as_str()) {
        return false;
    }
    !rejected_by_common_filters(s)
}

/// Whether `s` may be accepted as a factory/aggregate code (e.g. `JHQ`).
pub fn is_plausible_factory_code(s: &str) -> bool {
    let s = s.trim();
    let len = s.chars().count();
    if !(2..=16).contains(&len) {
        return false;
    }
    if !regex(&FACTORY_SHAPE, r"^[A-Z0-9][A-Z0-9 .\-]*[A-Z0-9]$").is_match(s) {
        return false;
    }
    if NOISE_WORDS.contains(&s.to_lowercase().as_str()) {
        return false;
    }
    !rejected_by_common_filters(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_hashes() {
        assert!(looks_like_style_hash("css-1q2w3e"));
        assert!(looks_like_style_hash("sc-AxjAm"));
        assert!(looks_like_style_hash("table_x3f9a1"));
        assert!(looks_like_style_hash("9f3ab21c0d"));
        assert!(!looks_like_style_hash("0B5300012A"));
        assert!(!looks_like_style_hash("3043001600"));
    }

    #[test]
    fn test_body_codes() {
        assert!(looks_like_body_code("Седан"));
        assert!(looks_like_body_code("5-door hatchback"));
        assert!(looks_like_body_code("WV1ZZZ7HZ8H020981"));
        assert!(looks_like_body_code("GX110-0069622"));
        assert!(!looks_like_body_code("0B5"));
    }

    #[test]
    fn test_regions() {
        assert!(looks_like_region("Европа"));
        assert!(looks_like_region("Japan / USA"));
        assert!(!looks_like_region("09G"));
    }

    #[test]
    fn test_dates() {
        assert!(looks_like_date("2008"));
        assert!(looks_like_date("05.2008"));
        assert!(looks_like_date("2008-05-01"));
        assert!(looks_like_date("01/05/2008"));
        assert!(looks_like_date("05.2008 - 12.2012"));
        assert!(looks_like_date("май 2008"));
        assert!(!looks_like_date("3043001600"));
        assert!(!looks_like_date("722.964"));
    }

    #[test]
    fn test_oem_rules() {
        assert!(is_plausible_oem("0B5300012A"));
        assert!(is_plausible_oem("A 204 270 84 04"));
        assert!(is_plausible_oem("3043001600"));
        assert!(!is_plausible_oem("AB12CD"), "needs a 3-digit run");
        assert!(!is_plausible_oem("12345"), "too short");
        assert!(!is_plausible_oem("0B5300012A0B5300012A0B5300"), "too long");
        assert!(!is_plausible_oem("0B5(300)12"));
        assert!(!is_plausible_oem("code=123456"));
        assert!(!is_plausible_oem("item;123456"));
        assert!(!is_plausible_oem("2008-05-01"));
        assert!(!is_plausible_oem("9f3ab21c0d"));
    }

    #[test]
    fn test_accepted_oem_property() {
        let samples = [
            "0B5300012A", "0K2N303000", "A 204 270 84 04", "N 90813202", "3043001600",
            "12", "abc", "(123456)", "x:1234567", "2012", "WV1ZZZ7HZ8H020981", "css-123456",
        ];
        for s in samples {
            if is_plausible_oem(s) {
                let len = s.chars().count();
                assert!((6..=25).contains(&len), "{s}");
                assert!(!s.contains(['(', ')', ';', ':', '=']), "{s}");
                assert!(has_digit_run(s, 3), "{s}");
            }
        }
    }

    #[test]
    fn test_model_rules() {
        assert!(is_plausible_model("0B5"));
        assert!(is_plausible_model("722.964"));
        assert!(is_plausible_model("DP0111"));
        assert!(is_plausible_model("Y4M"));
        assert!(!is_plausible_model("МКПП"));
        assert!(!is_plausible_model("2008"));
        assert!(!is_plausible_model("Европа"));
        assert!(!is_plausible_model("x"));
    }

    #[test]
    fn test_factory_code_rules() {
        assert!(is_plausible_factory_code("JHQ"));
        assert!(is_plausible_factory_code("JH3 542"));
        assert!(!is_plausible_factory_code("jhq"));
        assert!(!is_plausible_factory_code("КПП"));
        assert!(!is_plausible_factory_code("2010"));
    }
}
