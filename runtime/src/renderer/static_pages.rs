// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! In-memory renderer serving registered HTML by URL.
//!
//! Links are followed by resolving their `href` against the current URL;
//! clicking an element without `href` (a menu toggle) succeeds without
//! changing the page, since the registered markup already holds every branch.

use super::queries::evaluate_on_html;
use super::{
    CaptureTarget, ClickTarget, NamedQuery, NavigationResult, Readiness, RenderContext,
    RenderTimeout, Renderer,
};
use crate::extraction::html::{element_text, visible_text};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

/// PNG signature; static pages have no pixels to capture.
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Default)]
struct Site {
    pages: HashMap<String, String>,
    /// Navigations left that fail with a timeout.
    pending_timeouts: AtomicUsize,
    visits: Mutex<Vec<String>>,
}

impl Site {
    /// Exact URL first, then the same URL without its query string.
    fn page(&self, url: &str) -> Option<(String, String)> {
        if let Some(html) = self.pages.get(url) {
            return Some((url.to_string(), html.clone()));
        }
        let mut parsed = Url::parse(url).ok()?;
        parsed.set_query(None);
        parsed.set_fragment(None);
        let bare = parsed.to_string();
        self.pages.get(&bare).map(|html| (url.to_string(), html.clone()))
    }

    fn record_visit(&self, url: &str) {
        if let Ok(mut visits) = self.visits.lock() {
            visits.push(url.to_string());
        }
    }
}

/// Renderer over a fixed set of pages.
#[derive(Clone, Default)]
pub struct StaticRenderer {
    site: Arc<Site>,
    active_count: Arc<AtomicUsize>,
}

impl StaticRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `html` under `url`. Call before the renderer is shared.
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        if let Some(site) = Arc::get_mut(&mut self.site) {
            site.pages.insert(url.to_string(), html.to_string());
        }
        self
    }

    /// Make the next `n` navigations fail with a timeout.
    pub fn with_timeouts(self, n: usize) -> Self {
        self.site.pending_timeouts.store(n, Ordering::SeqCst);
        self
    }

    /// Every URL navigated to or followed, in order.
    pub fn visits(&self) -> Vec<String> {
        self.site
            .visits
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    /// Whether any visit started with `prefix`.
    pub fn visited(&self, prefix: &str) -> bool {
        self.visits().iter().any(|v| v.starts_with(prefix))
    }
}

#[async_trait]
impl Renderer for StaticRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        self.active_count.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(StaticContext {
            site: Arc::clone(&self.site),
            active_count: Arc::clone(&self.active_count),
            url: "about:blank".to_string(),
            html: String::new(),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// One tab over a [`StaticRenderer`].
pub struct StaticContext {
    site: Arc<Site>,
    active_count: Arc<AtomicUsize>,
    url: String,
    html: String,
}

/// What a click resolved to.
enum ClickPlan {
    Missing,
    Toggle,
    Follow(String),
}

fn find_target<'a>(document: &'a Html, target: &ClickTarget) -> Option<ElementRef<'a>> {
    match target {
        ClickTarget::Text { selector, text } => {
            let sel = Selector::parse(selector).ok()?;
            let want = text.to_lowercase();
            let found = document
                .select(&sel)
                .find(|el| element_text(el).to_lowercase().contains(&want));
            found
        }
        ClickTarget::Selector { selector, index } => {
            let sel = Selector::parse(selector).ok()?;
            let found = document.select(&sel).nth(*index);
            found
        }
    }
}

fn plan_click(html: &str, current_url: &str, target: &ClickTarget) -> Result<ClickPlan> {
    let document = Html::parse_document(html);
    let Some(el) = find_target(&document, target) else {
        return Ok(ClickPlan::Missing);
    };
    // the element itself or its enclosing anchor
    let href = std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .find_map(|e| e.value().attr("href").map(str::to_string));
    let Some(href) = href.filter(|h| !h.starts_with('#') && !h.starts_with("javascript:")) else {
        return Ok(ClickPlan::Toggle);
    };
    let next = Url::parse(current_url)
        .and_then(|base| base.join(&href))
        .map_err(|e| anyhow!("cannot resolve {href} against {current_url}: {e}"))?;
    Ok(ClickPlan::Follow(next.to_string()))
}

fn selector_present(html: &str, selector: &str) -> bool {
    let document = Html::parse_document(html);
    Selector::parse(selector)
        .map(|sel| document.select(&sel).next().is_some())
        .unwrap_or(false)
}

impl StaticContext {
    fn load(&mut self, url: &str) -> Result<()> {
        self.site.record_visit(url);
        let (final_url, html) = self
            .site
            .page(url)
            .ok_or_else(|| anyhow!("no page registered for {url}"))?;
        self.url = final_url;
        self.html = html;
        Ok(())
    }
}

#[async_trait]
impl RenderContext for StaticContext {
    async fn navigate(
        &mut self,
        url: &str,
        _readiness: &Readiness,
        timeout_ms: u64,
    ) -> Result<NavigationResult> {
        let timed_out = self
            .site
            .pending_timeouts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if timed_out {
            self.site.record_visit(url);
            return Err(RenderTimeout::new("navigate", timeout_ms).into());
        }
        self.load(url)?;
        Ok(NavigationResult {
            final_url: self.url.clone(),
            load_time_ms: 0,
        })
    }

    async fn evaluate(&self, query: &NamedQuery) -> Result<serde_json::Value> {
        Ok(evaluate_on_html(query, &self.html))
    }

    async fn click(&mut self, target: &ClickTarget, _timeout_ms: u64) -> Result<bool> {
        match plan_click(&self.html, &self.url, target)? {
            ClickPlan::Missing => Ok(false),
            ClickPlan::Toggle => Ok(true),
            ClickPlan::Follow(next) => {
                self.load(&next)?;
                Ok(true)
            }
        }
    }

    async fn wait_for(&self, readiness: &Readiness, _timeout_ms: u64) -> Result<bool> {
        Ok(match readiness {
            Readiness::Load | Readiness::NetworkIdle => true,
            Readiness::Selector(selector) => selector_present(&self.html, selector),
        })
    }

    async fn capture_image(&self, _target: &CaptureTarget) -> Result<Vec<u8>> {
        Ok(PNG_SIGNATURE.to_vec())
    }

    async fn text_content(&self) -> Result<String> {
        Ok(visible_text(&Html::parse_document(&self.html)))
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.url.clone())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.active_count.fetch_sub(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::PageLease;

    const A: &str = "https://provider-a.test/search-vehicle";

    #[tokio::test]
    async fn test_query_string_fallback_and_link_follow() {
        let renderer = StaticRenderer::new()
            .with_page(A, r#"<a href="detail/1"><span>КПП</span></a><button>Раскрыть</button>"#)
            .with_page("https://provider-a.test/detail/1", "<p>detail</p>");
        let mut ctx = renderer.new_context().await.unwrap();

        let nav = ctx
            .navigate(&format!("{A}?vin=WV1ZZZ7HZ8H020981"), &Readiness::NetworkIdle, 1_000)
            .await
            .unwrap();
        assert_eq!(nav.final_url, format!("{A}?vin=WV1ZZZ7HZ8H020981"));

        assert!(ctx.click(&ClickTarget::text("button", "раскрыть"), 1_000).await.unwrap());
        assert!(!ctx.click(&ClickTarget::text("a", "двигатель"), 1_000).await.unwrap());
        assert!(ctx.click(&ClickTarget::text("span", "кпп"), 1_000).await.unwrap());
        assert_eq!(ctx.current_url().await.unwrap(), "https://provider-a.test/detail/1");
        assert_eq!(ctx.text_content().await.unwrap(), "detail");
        assert_eq!(renderer.visits().len(), 2);
    }

    #[tokio::test]
    async fn test_timeouts_then_success() {
        let renderer = StaticRenderer::new().with_page(A, "<p>ok</p>").with_timeouts(1);
        let mut ctx = renderer.new_context().await.unwrap();
        let err = ctx.navigate(A, &Readiness::Load, 250).await.unwrap_err();
        assert!(err.downcast_ref::<RenderTimeout>().is_some());
        assert!(ctx.navigate(A, &Readiness::Load, 250).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_page_is_an_error() {
        let renderer = StaticRenderer::new();
        let mut ctx = renderer.new_context().await.unwrap();
        assert!(ctx.navigate("https://nowhere.test/", &Readiness::Load, 250).await.is_err());
    }

    #[tokio::test]
    async fn test_lease_closes_context() {
        let renderer = StaticRenderer::new();
        let lease = PageLease::new(renderer.new_context().await.unwrap());
        assert_eq!(renderer.active_contexts(), 1);
        lease.release().await.unwrap();
        assert_eq!(renderer.active_contexts(), 0);
    }

    #[tokio::test]
    async fn test_wait_for_selector() {
        let renderer = StaticRenderer::new().with_page(A, "<div class=\"result\"></div>");
        let mut ctx = renderer.new_context().await.unwrap();
        ctx.navigate(A, &Readiness::Load, 250).await.unwrap();
        assert!(ctx.wait_for(&Readiness::Selector(".result".into()), 10).await.unwrap());
        assert!(!ctx.wait_for(&Readiness::Selector(".missing".into()), 10).await.unwrap());
    }
}
