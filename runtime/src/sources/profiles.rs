// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-provider knobs: URL shape, supported identifiers, page phrases.

use crate::identifier::{Identifier, IdentifierKind, ManufacturerFamily};
use crate::types::Provider;
use regex::Regex;
use url::Url;

const PROVIDER_A_NOT_FOUND: &[&str] = &[
    r"ничего\s+не\s+найдено",
    r"не\s+найдено",
    r"не\s+найден",
    r"данные\s+не\s+найдены",
    r"автомобиль\s+не\s+найден",
    r"vehicle\s+not\s+found",
    r"no\s+results",
];

const PROVIDER_B_NOT_FOUND: &[&str] = &[
    r"отсутствует\s+в\s+базе\s+данных",
    r"данный\s+vin\s+код\s+отсутствует",
    r"vin\s+код\s+отсутствует",
    r"не\s+найден",
];

/// How one catalogue is queried and read.
#[derive(Debug, Clone)]
pub struct ProviderProfile {
    pub provider: Provider,
    pub base_url: String,
    pub supported: &'static [IdentifierKind],
    /// Whether the category navigation runs after the search page.
    pub navigation: bool,
    /// Whether OEM candidates are read from the search page itself.
    pub oem_on_search_page: bool,
    /// Families for which only the model/code is reported.
    pub model_only_families: &'static [ManufacturerFamily],
    /// Container whose appearance marks a rendered result (optional wait).
    pub result_selector: Option<&'static str>,
    not_found: Vec<Regex>,
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){p}")).expect("static pattern compiles"))
        .collect()
}

impl ProviderProfile {
    /// General catalogue: VIN and frame, category navigation.
    pub fn provider_a(base_url: &str) -> Self {
        Self {
            provider: Provider::ProviderA,
            base_url: base_url.trim_end_matches('/').to_string(),
            supported: &[IdentifierKind::Vin, IdentifierKind::Frame],
            navigation: true,
            oem_on_search_page: false,
            model_only_families: &[ManufacturerFamily::Renault, ManufacturerFamily::Gm],
            result_selector: Some(".search-result, .vehicle-info, .car-info, table"),
            not_found: compile(PROVIDER_A_NOT_FOUND),
        }
    }

    /// Chinese-market catalogue: VIN only, parts listed on the search page.
    pub fn provider_b(base_url: &str) -> Self {
        Self {
            provider: Provider::ProviderB,
            base_url: base_url.trim_end_matches('/').to_string(),
            supported: &[IdentifierKind::Vin],
            navigation: false,
            oem_on_search_page: true,
            model_only_families: &[],
            result_selector: Some(".search-result, .product, .parts, table"),
            not_found: compile(PROVIDER_B_NOT_FOUND),
        }
    }

    pub fn supports(&self, kind: IdentifierKind) -> bool {
        self.supported.contains(&kind)
    }

    pub fn is_model_only(&self, family: ManufacturerFamily) -> bool {
        self.model_only_families.contains(&family)
    }

    /// Search page URL for `id`, query values percent-encoded.
    pub fn search_url(&self, id: &Identifier) -> Result<String, url::ParseError> {
        let url = match self.provider {
            Provider::ProviderA => Url::parse_with_params(
                &format!("{}/search-vehicle", self.base_url),
                &[("vin", id.value.as_str())],
            )?,
            Provider::ProviderB => Url::parse_with_params(
                &format!("{}/search", self.base_url),
                &[("query", id.value.as_str()), ("type", "vin")],
            )?,
        };
        Ok(url.to_string())
    }

    /// Whether the page text carries one of the provider's "not found" phrases.
    pub fn is_not_found(&self, text: &str) -> bool {
        self.not_found.iter().any(|re| re.is_match(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vin(value: &str) -> Identifier {
        Identifier::new(IdentifierKind::Vin, value).unwrap()
    }

    #[test]
    fn test_search_urls() {
        let a = ProviderProfile::provider_a("https://provider-a.test/");
        assert_eq!(
            a.search_url(&vin("wv1zzz7hz8h020981")).unwrap(),
            "https://provider-a.test/search-vehicle?vin=WV1ZZZ7HZ8H020981"
        );
        let frame = Identifier::new(IdentifierKind::Frame, "GX110-0069622").unwrap();
        assert_eq!(
            a.search_url(&frame).unwrap(),
            "https://provider-a.test/search-vehicle?vin=GX110-0069622"
        );

        let b = ProviderProfile::provider_b("https://provider-b.test");
        assert_eq!(
            b.search_url(&vin("LVSHCAMB0CE123456")).unwrap(),
            "https://provider-b.test/search?query=LVSHCAMB0CE123456&type=vin"
        );
    }

    #[test]
    fn test_supported_kinds() {
        assert!(ProviderProfile::provider_a("https://a.test").supports(IdentifierKind::Frame));
        assert!(!ProviderProfile::provider_b("https://b.test").supports(IdentifierKind::Frame));
    }

    #[test]
    fn test_not_found_phrases() {
        let a = ProviderProfile::provider_a("https://a.test");
        assert!(a.is_not_found("По вашему запросу ничего  не найдено"));
        assert!(a.is_not_found("Vehicle NOT found"));
        assert!(!a.is_not_found("Volkswagen Transporter"));

        let b = ProviderProfile::provider_b("https://b.test");
        assert!(b.is_not_found("Данный VIN код отсутствует в базе данных"));
        assert!(!b.is_not_found("Коробка передач 3043001600"));
    }

    #[test]
    fn test_model_only_families() {
        let a = ProviderProfile::provider_a("https://a.test");
        assert!(a.is_model_only(ManufacturerFamily::Renault));
        assert!(a.is_model_only(ManufacturerFamily::Gm));
        assert!(!a.is_model_only(ManufacturerFamily::Vag));
    }
}
