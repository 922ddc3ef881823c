// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end lookups through the service against in-memory catalogue pages.
//!
//! Covers routing between providers, category navigation to the assembly
//! page, timeout retry, frame handling and model-only families.

use assert_json_diff::assert_json_include;
use gearscope_runtime::config::{LookupConfig, RoutingStrategy};
use gearscope_runtime::identifier::IdentifierKind;
use gearscope_runtime::renderer::static_pages::StaticRenderer;
use gearscope_runtime::renderer::Renderer;
use gearscope_runtime::retry::RetryPolicy;
use gearscope_runtime::service::LookupService;
use gearscope_runtime::types::{OemStatus, Provider};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

const A: &str = "https://provider-a.test";
const B: &str = "https://provider-b.test";

// ── Catalogue pages ──

const VW_SEARCH: &str = r#"
<div class="vehicle-info">
  <dl>
    <dt>Марка</dt><dd>Volkswagen</dd>
    <dt>Модель</dt><dd>Transporter T5</dd>
    <dt>КПП</dt><dd>0B5</dd>
  </dl>
  <ul class="groups">
    <li><a href="/catalog/engine">Двигатель</a></li>
    <li><a href="/catalog/kpp">Коробка передач</a></li>
  </ul>
</div>"#;

const VW_GEARBOX: &str = r#"
<h1>Коробка передач</h1>
<table>
  <tr><th>OEM</th><th>Наименование</th></tr>
  <tr><td>0B5301516A</td><td>Фильтр масляный АКПП</td></tr>
  <tr><td>0B5300012A</td><td>Коробка передач в сборе</td></tr>
</table>"#;

const A_NOTHING: &str = "<div class=\"search-result\">По вашему запросу ничего не найдено</div>";

const B_CHERY: &str = r#"
<div class="search-result">
  <h2 class="product-title">Коробка передач 3043001600</h2>
  <p>Chery Tiggo, 2012</p>
</div>"#;

const RENAULT_SEARCH: &str = r#"
<table>
  <tr><td>Марка</td><td>Renault</td></tr>
  <tr><td>КПП</td><td>JH3</td></tr>
</table>
<a href="/catalog/kpp">Коробка передач</a>"#;

fn config() -> LookupConfig {
    LookupConfig {
        provider_a_url: A.to_string(),
        provider_b_url: B.to_string(),
        nav_timeout_ms: 2_000,
        ..LookupConfig::default()
    }
}

fn service(renderer: &StaticRenderer) -> LookupService {
    LookupService::with_renderer(config(), Arc::new(renderer.clone()))
        .with_retry_policy(RetryPolicy::new(1).with_base_delay(Duration::ZERO))
}

#[tokio::test]
async fn test_vag_vin_resolved_through_category_navigation() {
    let renderer = StaticRenderer::new()
        .with_page(&format!("{A}/search-vehicle"), VW_SEARCH)
        .with_page(&format!("{A}/catalog/kpp"), VW_GEARBOX);
    let svc = service(&renderer);

    let result = assert_ok!(svc.resolve(IdentifierKind::Vin, "WV1ZZZ7HZ8H020981").await);

    assert_eq!(result.gearbox.model.as_deref(), Some("0B5"));
    assert_eq!(result.gearbox.oem.as_deref(), Some("0B5300012A"));
    assert_eq!(result.gearbox.oem_status, OemStatus::Found);
    assert_eq!(result.gearbox.oem_candidates.len(), 2);
    assert_eq!(result.vehicle_meta.make.as_deref(), Some("Volkswagen"));
    assert!(result.evidence.has_tag("gearbox.model:structured_field"));
    assert!(result.evidence.has_tag("navigation:keyword_link"));
    assert!(result.evidence.has_tag("gearbox.oem:two_column_table"));
    assert!(!renderer.visited(B), "secondary must not be consulted");
    assert_eq!(renderer.active_contexts(), 0);

    assert_json_include!(
        actual: serde_json::to_value(&result).unwrap(),
        expected: json!({
            "gearbox": {
                "model": "0B5",
                "oem": "0B5300012A",
                "oemStatus": "FOUND",
                "needsManualInput": false
            },
            "evidence": {
                "source": "providerA",
                "sourceTried": ["providerA"],
                "sourceSelected": "providerA",
                "finalUrl": "https://provider-a.test/catalog/kpp",
                "navigationState": "AssemblyDetail"
            }
        })
    );
}

#[tokio::test]
async fn test_search_page_parts_used_when_navigation_finds_nothing() {
    let search = r#"
<div class="vehicle-info">
  <dl><dt>Марка</dt><dd>Volkswagen</dd><dt>КПП</dt><dd>0B5</dd></dl>
  <table>
    <tr><th>OEM</th><th>Наименование</th></tr>
    <tr><td>0B5300012A</td><td>Коробка передач в сборе</td></tr>
  </table>
</div>"#;
    let renderer = StaticRenderer::new().with_page(&format!("{A}/search-vehicle"), search);
    let svc = service(&renderer);

    let result = assert_ok!(svc.resolve(IdentifierKind::Vin, "WV1ZZZ7HZ8H020981").await);
    assert_eq!(result.gearbox.model.as_deref(), Some("0B5"));
    assert_eq!(result.gearbox.oem.as_deref(), Some("0B5300012A"));
    assert_eq!(result.gearbox.oem_status, OemStatus::Found);
    assert_eq!(result.evidence.navigation_state.as_deref(), Some("SearchResult"));
    assert!(!renderer.visited(B));
}

#[tokio::test]
async fn test_repeated_part_rows_are_all_reported() {
    let gearbox = r#"
<table>
  <tr><th>OEM</th><th>Наименование</th></tr>
  <tr><td>0B5300012A</td><td>Коробка передач в сборе</td></tr>
  <tr><td>0B5301516A</td><td>Фильтр масляный АКПП</td></tr>
  <tr><td>0B5300012A</td><td>Коробка передач в сборе</td></tr>
</table>"#;
    let renderer = StaticRenderer::new()
        .with_page(&format!("{A}/search-vehicle"), VW_SEARCH)
        .with_page(&format!("{A}/catalog/kpp"), gearbox);
    let svc = service(&renderer);

    let result = assert_ok!(svc.resolve(IdentifierKind::Vin, "WV1ZZZ7HZ8H020981").await);
    let oems: Vec<&str> = result
        .gearbox
        .oem_candidates
        .iter()
        .map(|c| c.oem.as_str())
        .collect();
    assert_eq!(oems, vec!["0B5300012A", "0B5301516A", "0B5300012A"]);
    assert_eq!(result.gearbox.oem.as_deref(), Some("0B5300012A"));
}

#[tokio::test]
async fn test_chinese_vin_falls_back_to_secondary() {
    let renderer = StaticRenderer::new()
        .with_page(&format!("{A}/search-vehicle"), A_NOTHING)
        .with_page(&format!("{B}/search"), B_CHERY);
    let svc = service(&renderer);

    let result = assert_ok!(svc.resolve(IdentifierKind::Vin, "LVSHCAMB0CE123456").await);

    assert_eq!(result.gearbox.oem.as_deref(), Some("3043001600"));
    assert_eq!(result.gearbox.oem_status, OemStatus::Found);
    assert_eq!(result.evidence.source_selected, Some(Provider::ProviderB));
    assert_eq!(
        result.evidence.source_tried,
        vec![Provider::ProviderA, Provider::ProviderB]
    );
    assert!(result.evidence.has_tag("gearbox.oem:header_oem"));
    assert_eq!(
        renderer.visits(),
        vec![
            "https://provider-a.test/search-vehicle?vin=LVSHCAMB0CE123456".to_string(),
            "https://provider-b.test/search?query=LVSHCAMB0CE123456&type=vin".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_both_providers_empty_surfaces_primary_not_found() {
    let renderer = StaticRenderer::new()
        .with_page(&format!("{A}/search-vehicle"), A_NOTHING)
        .with_page(
            &format!("{B}/search"),
            "<p>Данный VIN код отсутствует в базе данных</p>",
        );
    let err = assert_err!(service(&renderer).resolve(IdentifierKind::Vin, "LVSHCAMB0CE123456").await);
    assert_eq!(err.code(), "NOT_FOUND");
    assert_eq!(err.evidence().and_then(|e| e.source), Some(Provider::ProviderA));
}

#[tokio::test]
async fn test_timeout_is_retried() {
    let renderer = StaticRenderer::new()
        .with_page(&format!("{A}/search-vehicle"), VW_SEARCH)
        .with_page(&format!("{A}/catalog/kpp"), VW_GEARBOX)
        .with_timeouts(1);
    let svc = service(&renderer);

    let result = assert_ok!(svc.resolve(IdentifierKind::Vin, "WV1ZZZ7HZ8H020981").await);
    assert_eq!(result.gearbox.oem.as_deref(), Some("0B5300012A"));
    assert_eq!(renderer.active_contexts(), 0, "timed-out page was released");
}

#[tokio::test]
async fn test_timeout_without_retries_left() {
    let renderer = StaticRenderer::new()
        .with_page(&format!("{A}/search-vehicle"), VW_SEARCH)
        .with_timeouts(2);
    let svc = service(&renderer);

    let err = assert_err!(svc.resolve(IdentifierKind::Vin, "WV1ZZZ7HZ8H020981").await);
    assert_eq!(err.code(), "TIMEOUT");
    assert!(!renderer.visited(B), "timeouts never fall back");
}

#[tokio::test]
async fn test_frame_without_data_needs_manual_input() {
    let renderer = StaticRenderer::new()
        .with_page(&format!("{A}/search-vehicle"), "<div class=\"car-info\">Toyota Mark II</div>");
    let svc = service(&renderer);

    let result = assert_ok!(svc.resolve(IdentifierKind::Frame, "GX110-0069622").await);
    assert!(result.gearbox.needs_manual_input);
    assert_eq!(result.gearbox.oem_status, OemStatus::NotAvailable);
    assert_eq!(result.evidence.source_tried, vec![Provider::ProviderA]);
    assert!(!renderer.visited(B));
}

#[tokio::test]
async fn test_frame_pinned_to_secondary_is_unsupported() {
    let renderer = StaticRenderer::new();
    let svc = LookupService::with_renderer(
        LookupConfig {
            routing: RoutingStrategy::ProviderB,
            ..config()
        },
        Arc::new(renderer.clone()),
    );
    let err = assert_err!(svc.resolve(IdentifierKind::Frame, "GX110-0069622").await);
    assert_eq!(err.code(), "UNSUPPORTED_IDENTIFIER");
    assert!(renderer.visits().is_empty());
}

#[tokio::test]
async fn test_renault_reports_model_only() {
    let renderer = StaticRenderer::new()
        .with_page(&format!("{A}/search-vehicle"), RENAULT_SEARCH)
        .with_page(&format!("{A}/catalog/kpp"), VW_GEARBOX);
    let svc = service(&renderer);

    let result = assert_ok!(svc.resolve(IdentifierKind::Vin, "VF1LM1B0H36666666").await);
    assert_eq!(result.gearbox.model.as_deref(), Some("JH3"));
    assert_eq!(result.gearbox.oem_status, OemStatus::ModelOnly);
    assert_eq!(result.gearbox.oem, None);
    assert!(result.gearbox.oem_candidates.is_empty());
    assert!(!renderer.visited(&format!("{A}/catalog")), "no navigation for model-only families");
}

#[tokio::test]
async fn test_concurrent_lookups_share_one_renderer() {
    let renderer = StaticRenderer::new()
        .with_page(&format!("{A}/search-vehicle"), VW_SEARCH)
        .with_page(&format!("{A}/catalog/kpp"), VW_GEARBOX);
    let svc = LookupService::with_renderer(
        LookupConfig {
            max_lookups: 1,
            ..config()
        },
        Arc::new(renderer.clone()),
    );

    let (first, second) = tokio::join!(
        svc.resolve(IdentifierKind::Vin, "WV1ZZZ7HZ8H020981"),
        svc.resolve(IdentifierKind::Vin, "WV2ZZZ7HZ9H000002"),
    );
    assert_eq!(assert_ok!(first).gearbox.oem_status, OemStatus::Found);
    assert_eq!(assert_ok!(second).gearbox.oem_status, OemStatus::Found);
    assert_eq!(renderer.active_contexts(), 0);
}
