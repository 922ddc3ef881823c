// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Renderer abstraction for browser-based page rendering.
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over
//! the browser engine (Chromium via chromiumoxide, or static in-memory pages).
//! The engine never runs free-form scripts: it asks for one of the
//! [`NamedQuery`] values and gets plain JSON back.

pub mod chromium;
pub mod queries;
pub mod static_pages;

pub use queries::{NamedQuery, QUERY_CONTRACT_VERSION};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// Condition a page must satisfy before it is considered ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// The load event fired.
    Load,
    /// The load event fired and network activity settled.
    NetworkIdle,
    /// An element matching this CSS selector exists.
    Selector(String),
}

/// Element the engine wants clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    /// First element matching `selector` whose text contains `text`
    /// (case-insensitive, whitespace-collapsed).
    Text { selector: String, text: String },
    /// The `index`-th element matching `selector`.
    Selector { selector: String, index: usize },
}

impl ClickTarget {
    pub fn text(selector: &str, text: &str) -> Self {
        ClickTarget::Text {
            selector: selector.to_string(),
            text: text.to_string(),
        }
    }
}

impl fmt::Display for ClickTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClickTarget::Text { selector, text } => write!(f, "{selector}[text~={text:?}]"),
            ClickTarget::Selector { selector, index } => write!(f, "{selector}[{index}]"),
        }
    }
}

/// What to capture as an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTarget {
    FullPage,
    Element(String),
}

/// A renderer operation exceeded its time bound.
///
/// Carried inside `anyhow::Error` and downcast by the error taxonomy so that
/// the retry controller can tell timeouts apart from other failures.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{operation} timed out after {timeout_ms}ms")]
pub struct RenderTimeout {
    pub operation: String,
    pub timeout_ms: u64,
}

impl RenderTimeout {
    pub fn new(operation: &str, timeout_ms: u64) -> Self {
        Self {
            operation: operation.to_string(),
            timeout_ms,
        }
    }
}

/// A browser engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new browser context (tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Shut down the browser engine.
    async fn shutdown(&self) -> Result<()>;
    /// Number of currently active contexts.
    fn active_contexts(&self) -> usize;
}

/// A single browser context (tab) for rendering pages.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL and wait for `readiness`, bounded by `timeout_ms`.
    async fn navigate(
        &mut self,
        url: &str,
        readiness: &Readiness,
        timeout_ms: u64,
    ) -> Result<NavigationResult>;
    /// Run a named structured query against the current document.
    async fn evaluate(&self, query: &NamedQuery) -> Result<serde_json::Value>;
    /// Locate and click an element. `Ok(false)` when nothing matched.
    async fn click(&mut self, target: &ClickTarget, timeout_ms: u64) -> Result<bool>;
    /// Wait for a readiness condition. `Ok(false)` when it did not hold in time.
    async fn wait_for(&self, readiness: &Readiness, timeout_ms: u64) -> Result<bool>;
    /// Capture a PNG image of the page or of one element.
    async fn capture_image(&self, target: &CaptureTarget) -> Result<Vec<u8>>;
    /// Visible text content of the current document.
    async fn text_content(&self) -> Result<String>;
    /// Get the current URL.
    async fn current_url(&self) -> Result<String>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Convenience reads built on [`RenderContext::evaluate`].
pub async fn outer_html(ctx: &dyn RenderContext) -> Result<String> {
    let value = ctx.evaluate(&NamedQuery::OuterHtml).await?;
    Ok(value.as_str().unwrap_or_default().to_string())
}

pub async fn part_number_count(ctx: &dyn RenderContext) -> Result<u64> {
    let value = ctx.evaluate(&NamedQuery::PartNumberCount).await?;
    Ok(value.as_u64().unwrap_or(0))
}

/// A page context that is closed on every exit path.
///
/// Call [`PageLease::release`] to close it and observe the result; if the
/// lease is dropped instead (early return, `?`, panic), the close is spawned
/// onto the current runtime.
pub struct PageLease {
    ctx: Option<Box<dyn RenderContext>>,
}

impl PageLease {
    pub fn new(ctx: Box<dyn RenderContext>) -> Self {
        Self { ctx: Some(ctx) }
    }

    pub fn get(&self) -> &dyn RenderContext {
        self.ctx
            .as_deref()
            .expect("page lease used after release")
    }

    pub fn get_mut(&mut self) -> &mut dyn RenderContext {
        self.ctx
            .as_deref_mut()
            .expect("page lease used after release")
    }

    pub async fn release(mut self) -> Result<()> {
        match self.ctx.take() {
            Some(ctx) => ctx.close().await,
            None => Ok(()),
        }
    }
}

impl Drop for PageLease {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    let _ = ctx.close().await;
                });
            }
        }
    }
}

/// Process-wide renderer, launched on first use.
///
/// Concurrent first callers await the same launch; a failed launch leaves
/// the cell empty so the next caller tries again.
pub struct RendererCell {
    cell: OnceCell<Arc<dyn Renderer>>,
    headless: bool,
    chromium_path: Option<PathBuf>,
}

impl RendererCell {
    /// Lazily launched Chromium.
    pub fn chromium(headless: bool, chromium_path: Option<PathBuf>) -> Self {
        Self {
            cell: OnceCell::new(),
            headless,
            chromium_path,
        }
    }

    /// Cell holding an already constructed renderer.
    pub fn ready(renderer: Arc<dyn Renderer>) -> Self {
        Self {
            cell: OnceCell::from(renderer),
            headless: true,
            chromium_path: None,
        }
    }

    pub async fn get(&self) -> Result<Arc<dyn Renderer>> {
        let renderer = self
            .cell
            .get_or_try_init(|| async {
                let chromium =
                    chromium::ChromiumRenderer::launch(self.headless, self.chromium_path.as_deref())
                        .await?;
                Ok::<Arc<dyn Renderer>, anyhow::Error>(Arc::new(chromium))
            })
            .await?;
        Ok(Arc::clone(renderer))
    }

    pub fn is_launched(&self) -> bool {
        self.cell.initialized()
    }

    /// Shut the renderer down if it was ever launched.
    pub async fn shutdown(&self) -> Result<()> {
        match self.cell.get() {
            Some(renderer) => renderer.shutdown().await,
            None => Ok(()),
        }
    }
}
