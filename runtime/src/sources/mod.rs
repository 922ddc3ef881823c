// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-provider resolution: one identifier against one catalogue.

pub mod profiles;

pub use profiles::ProviderProfile;

use crate::error::LookupError;
use crate::extraction::{factory_code, meta, model, oem, Cascade, FieldContext, PageDocument};
use crate::identifier::{Identifier, IdentifierKind};
use crate::navigation::{NavBudget, NavState, Navigator};
use crate::ranking;
use crate::renderer::{outer_html, CaptureTarget, PageLease, Readiness, RenderContext, RendererCell};
use crate::types::{
    Evidence, GearboxInfo, LookupResult, OemCandidate, OemStatus, Provider, VehicleMeta,
    MAX_OEM_CANDIDATES,
};
use async_trait::async_trait;
use base64::Engine;
use std::sync::Arc;

/// Resolves identifiers against one provider.
#[async_trait]
pub trait SourceResolver: Send + Sync {
    fn provider(&self) -> Provider;

    fn supports(&self, kind: IdentifierKind) -> bool;

    async fn resolve(&self, id: &Identifier) -> Result<LookupResult, LookupError>;
}

/// Knobs shared by every page resolver.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub nav_timeout_ms: u64,
    pub capture_failures: bool,
}

/// What the search page yielded.
struct SearchFindings {
    not_found: bool,
    meta: VehicleMeta,
    model: Option<String>,
    factory_code: Option<String>,
    candidates: Option<Vec<OemCandidate>>,
}

/// Read everything the search page offers. Synchronous: the parsed DOM must
/// not live across an await.
fn read_search_page(
    html: &str,
    url: &str,
    profile: &ProviderProfile,
    evidence: &mut Evidence,
) -> SearchFindings {
    let doc = PageDocument::parse(html, url);
    if profile.is_not_found(&doc.text) {
        return SearchFindings {
            not_found: true,
            meta: VehicleMeta::default(),
            model: None,
            factory_code: None,
            candidates: None,
        };
    }

    let meta = meta::extract(&doc, evidence);
    let model = model::cascade().run(&FieldContext::new(&doc), evidence);
    let factory_code = factory_code::cascade()
        .run(&FieldContext::new(&doc).with_model(model.as_deref()), evidence);
    let candidates = if profile.oem_on_search_page {
        oem::search_page_cascade().run(&FieldContext::new(&doc), evidence)
    } else {
        None
    };

    SearchFindings {
        not_found: false,
        meta,
        model,
        factory_code,
        candidates,
    }
}

fn read_oem(
    html: &str,
    url: &str,
    cascade: Cascade<Vec<OemCandidate>>,
    evidence: &mut Evidence,
) -> Option<Vec<OemCandidate>> {
    let doc = PageDocument::parse(html, url);
    cascade.run(&FieldContext::new(&doc), evidence)
}

/// Resolver driving a rendered page through search, navigation and
/// extraction.
pub struct PageResolver {
    profile: ProviderProfile,
    renderer: Arc<RendererCell>,
    settings: ResolverSettings,
}

impl PageResolver {
    pub fn new(profile: ProviderProfile, renderer: Arc<RendererCell>, settings: ResolverSettings) -> Self {
        Self {
            profile,
            renderer,
            settings,
        }
    }

    pub fn profile(&self) -> &ProviderProfile {
        &self.profile
    }

    async fn run(
        &self,
        ctx: &mut dyn RenderContext,
        id: &Identifier,
        search_url: &str,
        evidence: &mut Evidence,
    ) -> Result<LookupResult, LookupError> {
        let provider = self.profile.provider;
        let timeout_ms = self.settings.nav_timeout_ms;
        let budget = NavBudget::from_nav_timeout(timeout_ms);

        let nav = ctx
            .navigate(search_url, &Readiness::NetworkIdle, timeout_ms)
            .await
            .map_err(|e| LookupError::from_render(e, evidence))?;
        evidence.final_url = nav.final_url.clone();
        tracing::debug!(%provider, load_time_ms = nav.load_time_ms, "search page loaded");

        if let Some(selector) = self.profile.result_selector {
            let appeared = ctx
                .wait_for(&Readiness::Selector(selector.to_string()), budget.wait_timeout_ms)
                .await
                .unwrap_or(false);
            if !appeared {
                evidence.note("result container did not appear");
            }
        }

        let html = outer_html(ctx)
            .await
            .map_err(|e| LookupError::from_render(e, evidence))?;
        let found = read_search_page(&html, &nav.final_url, &self.profile, evidence);
        if found.not_found {
            tracing::info!(%provider, "provider reports identifier unknown");
            return Err(LookupError::NotFound {
                provider,
                evidence: Box::new(evidence.clone()),
            });
        }

        let family = id.family();
        if self.profile.is_model_only(family) && (found.model.is_some() || found.factory_code.is_some()) {
            evidence.note(format!("{family:?} family: provider carries no genuine OEM data"));
            return Ok(LookupResult {
                vehicle_meta: found.meta,
                gearbox: GearboxInfo {
                    model: found.model,
                    factory_code: found.factory_code,
                    oem_status: OemStatus::ModelOnly,
                    ..GearboxInfo::default()
                },
                evidence: evidence.clone(),
            });
        }

        let mut candidates = found.candidates;
        if candidates.is_none() && self.profile.navigation {
            let outcome = Navigator::standard(budget)
                .drive(ctx, search_url, evidence)
                .await
                .map_err(|e| LookupError::from_render(e, evidence))?;
            let page = outer_html(ctx)
                .await
                .map_err(|e| LookupError::from_render(e, evidence))?;
            candidates = match outcome.state {
                NavState::AssemblyDetail => {
                    evidence.final_url = outcome.final_url.clone();
                    read_oem(&page, &outcome.final_url, oem::cascade(), evidence)
                }
                // No way into the catalogue: read whatever the search page lists
                _ => read_oem(&page, &outcome.final_url, oem::search_page_cascade(), evidence),
            };
        }

        let candidates = candidates.unwrap_or_default();
        let selected = ranking::select(&candidates);
        let oem_status = match (&selected, candidates.is_empty()) {
            (Some(_), _) => OemStatus::Found,
            (None, false) => OemStatus::NotFound,
            (None, true) => OemStatus::NotAvailable,
        };

        let mut gearbox = GearboxInfo {
            model: found.model,
            factory_code: found.factory_code,
            oem: selected.map(|c| c.oem),
            oem_candidates: candidates.into_iter().take(MAX_OEM_CANDIDATES).collect(),
            oem_status,
            needs_manual_input: false,
        };

        if gearbox.model.is_none() && gearbox.oem.is_none() {
            if id.kind == IdentifierKind::Frame {
                evidence.note("frame lookup yielded no gearbox data");
                gearbox.needs_manual_input = true;
            } else {
                evidence.parse_error = Some("neither gearbox model nor OEM extracted".to_string());
                self.capture_failure(ctx, evidence).await;
                return Err(LookupError::ParseFailed {
                    provider,
                    evidence: Box::new(evidence.clone()),
                });
            }
        }

        Ok(LookupResult {
            vehicle_meta: found.meta,
            gearbox,
            evidence: evidence.clone(),
        })
    }

    /// Attach a full-page PNG when capture is enabled. Best effort.
    async fn capture_failure(&self, ctx: &dyn RenderContext, evidence: &mut Evidence) {
        if !self.settings.capture_failures {
            return;
        }
        match ctx.capture_image(&CaptureTarget::FullPage).await {
            Ok(png) => {
                evidence.failure_image = Some(base64::engine::general_purpose::STANDARD.encode(png));
            }
            Err(e) => tracing::warn!("failure capture skipped: {e:#}"),
        }
    }
}

#[async_trait]
impl SourceResolver for PageResolver {
    fn provider(&self) -> Provider {
        self.profile.provider
    }

    fn supports(&self, kind: IdentifierKind) -> bool {
        self.profile.supports(kind)
    }

    async fn resolve(&self, id: &Identifier) -> Result<LookupResult, LookupError> {
        let provider = self.profile.provider;
        if !self.profile.supports(id.kind) {
            return Err(LookupError::UnsupportedIdentifier {
                kind: id.kind,
                provider,
            });
        }

        let mut evidence = Evidence::new(provider);
        let search_url = self.profile.search_url(id).map_err(|e| LookupError::Internal {
            message: format!("cannot build search URL: {e}"),
            evidence: None,
        })?;
        tracing::info!(%provider, url = %search_url, "resolving");

        let renderer = self
            .renderer
            .get()
            .await
            .map_err(|e| LookupError::from_render(e, &evidence))?;
        let context = renderer
            .new_context()
            .await
            .map_err(|e| LookupError::from_render(e, &evidence))?;
        let mut lease = PageLease::new(context);

        let outcome = self.run(lease.get_mut(), id, &search_url, &mut evidence).await;
        if let Err(e) = lease.release().await {
            tracing::warn!(%provider, "closing page failed: {e:#}");
        }

        match &outcome {
            Ok(result) => tracing::info!(
                %provider,
                status = ?result.gearbox.oem_status,
                model = result.gearbox.model.as_deref().unwrap_or("-"),
                "resolved"
            ),
            Err(e) => tracing::info!(%provider, code = e.code(), "resolution failed: {e}"),
        }
        outcome
    }
}
