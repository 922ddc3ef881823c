// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Library entry point: routed, retried, concurrency-limited lookups.

use crate::config::LookupConfig;
use crate::error::LookupError;
use crate::identifier::{Identifier, IdentifierKind};
use crate::renderer::{outer_html, PageLease, Readiness, Renderer, RendererCell};
use crate::retry::RetryPolicy;
use crate::router::SourceRouter;
use crate::sources::{PageResolver, ProviderProfile, ResolverSettings};
use crate::types::{Evidence, LookupResult, PageSnapshot};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::Instrument;

pub struct LookupService {
    config: LookupConfig,
    renderer: Arc<RendererCell>,
    router: SourceRouter,
    retry: RetryPolicy,
    lookups: Semaphore,
    fetches: Semaphore,
}

impl LookupService {
    /// Service backed by a Chromium instance launched on first use.
    pub fn new(config: LookupConfig) -> Self {
        let cell = RendererCell::chromium(config.headless, config.chromium_path.clone());
        Self::build(config, Arc::new(cell))
    }

    /// Service over an existing renderer.
    pub fn with_renderer(config: LookupConfig, renderer: Arc<dyn Renderer>) -> Self {
        Self::build(config, Arc::new(RendererCell::ready(renderer)))
    }

    fn build(config: LookupConfig, renderer: Arc<RendererCell>) -> Self {
        let settings = ResolverSettings {
            nav_timeout_ms: config.nav_timeout_ms,
            capture_failures: config.capture_failures,
        };
        let primary = PageResolver::new(
            ProviderProfile::provider_a(&config.provider_a_url),
            Arc::clone(&renderer),
            settings.clone(),
        );
        let secondary = PageResolver::new(
            ProviderProfile::provider_b(&config.provider_b_url),
            Arc::clone(&renderer),
            settings,
        );
        Self {
            router: SourceRouter::new(Arc::new(primary), Arc::new(secondary), config.routing),
            retry: RetryPolicy::new(config.max_retries),
            lookups: Semaphore::new(config.max_lookups),
            fetches: Semaphore::new(config.max_fetches),
            renderer,
            config,
        }
    }

    /// Replace the retry policy (tests shorten the backoff).
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// Resolve an identifier to gearbox data.
    pub async fn resolve(&self, kind: IdentifierKind, value: &str) -> Result<LookupResult, LookupError> {
        let id = Identifier::new(kind, value)
            .ok_or_else(|| LookupError::InvalidIdentifier("identifier value is empty".to_string()))?;
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("lookup", %request_id, kind = %id.kind, value = %id.value);

        let id = &id;
        let router = &self.router;
        let lookups = &self.lookups;
        self.retry
            .run(move |attempt| async move {
                let _permit = lookups.acquire().await.map_err(|e| LookupError::Internal {
                    message: format!("lookup limiter closed: {e}"),
                    evidence: None,
                })?;
                tracing::debug!(attempt, "lookup attempt");
                router.resolve(id).await
            })
            .instrument(span)
            .await
    }

    /// Render one page and return its final URL, HTML and visible text.
    pub async fn fetch_page(&self, url: &str) -> Result<PageSnapshot, LookupError> {
        url::Url::parse(url)
            .map_err(|e| LookupError::InvalidIdentifier(format!("invalid URL {url}: {e}")))?;
        let _permit = self.fetches.acquire().await.map_err(|e| LookupError::Internal {
            message: format!("fetch limiter closed: {e}"),
            evidence: None,
        })?;

        let start = Instant::now();
        let evidence = Evidence::default();
        let renderer = self
            .renderer
            .get()
            .await
            .map_err(|e| LookupError::from_render(e, &evidence))?;
        let mut lease = PageLease::new(
            renderer
                .new_context()
                .await
                .map_err(|e| LookupError::from_render(e, &evidence))?,
        );

        let snapshot = async {
            let ctx = lease.get_mut();
            let nav = ctx.navigate(url, &Readiness::Load, self.config.nav_timeout_ms).await?;
            let html = outer_html(ctx).await?;
            let text = ctx.text_content().await?;
            Ok::<_, anyhow::Error>(PageSnapshot {
                final_url: nav.final_url,
                html,
                text,
                load_time_ms: start.elapsed().as_millis() as u64,
                fetched_at: chrono::Utc::now(),
            })
        }
        .await;

        if let Err(e) = lease.release().await {
            tracing::warn!("closing page failed: {e:#}");
        }
        snapshot.map_err(|e| LookupError::from_render(e, &evidence))
    }

    /// Close the browser if one was launched.
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.renderer.shutdown().await
    }
}
