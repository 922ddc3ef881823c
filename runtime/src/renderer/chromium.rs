// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Chromium-based renderer using chromiumoxide.

use super::queries::evaluate_on_html;
use super::{
    CaptureTarget, ClickTarget, NamedQuery, NavigationResult, Readiness, RenderContext,
    RenderTimeout, Renderer,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Bound for queries, captures and URL reads.
const QUERY_TIMEOUT_MS: u64 = 10_000;

/// Quiet period treated as "network idle" once the document is complete.
const IDLE_SETTLE_MS: u64 = 500;

const POLL_INTERVAL_MS: u64 = 100;

/// Find the Chromium binary path.
///
/// Order: explicit configuration, `GEARSCOPE_CHROMIUM_PATH`,
/// `~/.gearscope/chromium/`, then the system `PATH`.
pub fn find_chromium(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured.filter(|p| p.exists()) {
        return Some(path.to_path_buf());
    }

    if let Ok(p) = std::env::var("GEARSCOPE_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".gearscope/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".gearscope/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".gearscope/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".gearscope/chromium/chrome-linux64/chrome"),
                home.join(".gearscope/chromium/chrome"),
            ]
        };
        if let Some(c) = candidates.into_iter().find(|c| c.exists()) {
            return Some(c);
        }
    }

    ["google-chrome", "chromium", "chromium-browser"]
        .iter()
        .find_map(|bin| which::which(bin).ok())
}

/// Run `fut` under a time bound, mapping expiry to [`RenderTimeout`].
async fn bounded<T, F>(operation: &str, timeout_ms: u64, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
        Ok(result) => result,
        Err(_) => Err(RenderTimeout::new(operation, timeout_ms).into()),
    }
}

/// Chromium-based renderer.
pub struct ChromiumRenderer {
    browser: Mutex<Browser>,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumRenderer {
    /// Launch a Chromium instance, headless unless `headless` is false.
    pub async fn launch(headless: bool, chromium_path: Option<&Path>) -> Result<Self> {
        let chrome_path = find_chromium(chromium_path)
            .context("Chromium not found. Set GEARSCOPE_CHROMIUM_PATH or install Chrome.")?;

        let mut builder = BrowserConfig::builder().chrome_executable(chrome_path);
        if headless {
            builder = builder.arg("--headless=new");
        } else {
            builder = builder.with_head();
        }
        let config = builder
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--lang=ru-RU")
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        tracing::info!(headless, "chromium launched");
        Ok(Self {
            browser: Mutex::new(browser),
            active_count: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        self.active_count.fetch_add(1, Ordering::Relaxed);

        Ok(Box::new(ChromiumContext {
            page,
            active_count: Arc::clone(&self.active_count),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        browser.close().await.context("failed to close Chromium")?;
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// A single Chromium tab.
pub struct ChromiumContext {
    page: Page,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumContext {
    async fn eval<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<T> {
        self.page
            .evaluate(script)
            .await
            .context("page evaluation failed")?
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert evaluation result: {e:?}"))
    }

    async fn ready(&self, readiness: &Readiness) -> Result<bool> {
        match readiness {
            Readiness::Load => {
                self.eval::<bool>("document.readyState === 'complete'").await
            }
            Readiness::NetworkIdle => {
                if !self.eval::<bool>("document.readyState === 'complete'").await? {
                    return Ok(false);
                }
                tokio::time::sleep(Duration::from_millis(IDLE_SETTLE_MS)).await;
                Ok(true)
            }
            Readiness::Selector(selector) => {
                let script = format!(
                    "document.querySelector({}) !== null",
                    serde_json::to_string(selector)?
                );
                self.eval::<bool>(&script).await
            }
        }
    }

    async fn poll_ready(&self, readiness: &Readiness) -> Result<()> {
        while !self.ready(readiness).await.unwrap_or(false) {
            tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
        }
        Ok(())
    }

    fn click_script(target: &ClickTarget) -> Result<String> {
        let pick = match target {
            ClickTarget::Text { selector, text } => format!(
                "Array.from(document.querySelectorAll({sel})).find(e => \
                 (e.innerText || e.textContent || '').replace(/\\s+/g, ' ').trim().toLowerCase() \
                 .includes({text}.toLowerCase()))",
                sel = serde_json::to_string(selector)?,
                text = serde_json::to_string(text)?,
            ),
            ClickTarget::Selector { selector, index } => format!(
                "document.querySelectorAll({sel})[{index}]",
                sel = serde_json::to_string(selector)?,
            ),
        };
        Ok(format!(
            "(() => {{ const el = {pick}; if (!el) return false; \
             el.scrollIntoView({{block: 'center'}}); el.click(); return true; }})()"
        ))
    }
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(
        &mut self,
        url: &str,
        readiness: &Readiness,
        timeout_ms: u64,
    ) -> Result<NavigationResult> {
        let start = Instant::now();

        bounded("navigate", timeout_ms, async {
            self.page
                .goto(url)
                .await
                .with_context(|| format!("navigation to {url} failed"))?;
            let _ = self.page.wait_for_navigation().await;
            self.poll_ready(readiness).await
        })
        .await?;

        let final_url = self
            .page
            .url()
            .await
            .unwrap_or_default()
            .unwrap_or_else(|| url.to_string());

        Ok(NavigationResult {
            final_url,
            load_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn evaluate(&self, query: &NamedQuery) -> Result<serde_json::Value> {
        bounded(query.name(), QUERY_TIMEOUT_MS, async {
            match query.script() {
                Some(script) => self.eval(script).await,
                None => {
                    let html: String = self.eval("document.documentElement.outerHTML").await?;
                    Ok(evaluate_on_html(query, &html))
                }
            }
        })
        .await
    }

    async fn click(&mut self, target: &ClickTarget, timeout_ms: u64) -> Result<bool> {
        let script = Self::click_script(target)?;
        let clicked = bounded("click", timeout_ms, self.eval::<bool>(&script)).await?;
        if clicked {
            // A link click may start a navigation; give it the same bound
            let _ = tokio::time::timeout(
                Duration::from_millis(timeout_ms),
                self.page.wait_for_navigation(),
            )
            .await;
        }
        tracing::debug!(%target, clicked, "click");
        Ok(clicked)
    }

    async fn wait_for(&self, readiness: &Readiness, timeout_ms: u64) -> Result<bool> {
        match tokio::time::timeout(Duration::from_millis(timeout_ms), self.poll_ready(readiness)).await {
            Ok(result) => result.map(|_| true),
            Err(_) => Ok(false),
        }
    }

    async fn capture_image(&self, target: &CaptureTarget) -> Result<Vec<u8>> {
        bounded("capture", QUERY_TIMEOUT_MS, async {
            match target {
                CaptureTarget::FullPage => self
                    .page
                    .screenshot(
                        ScreenshotParams::builder()
                            .format(CaptureScreenshotFormat::Png)
                            .full_page(true)
                            .build(),
                    )
                    .await
                    .context("page capture failed"),
                CaptureTarget::Element(selector) => self
                    .page
                    .find_element(selector.as_str())
                    .await
                    .with_context(|| format!("no element matches {selector}"))?
                    .screenshot(CaptureScreenshotFormat::Png)
                    .await
                    .context("element capture failed"),
            }
        })
        .await
    }

    async fn text_content(&self) -> Result<String> {
        let value = self.evaluate(&NamedQuery::BodyText).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn current_url(&self) -> Result<String> {
        let url = bounded("current_url", QUERY_TIMEOUT_MS, async {
            self.page.url().await.context("failed to get URL")
        })
        .await?;
        Ok(url.unwrap_or_default())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.active_count.fetch_sub(1, Ordering::Relaxed);
        let _ = self.page.close().await;
        Ok(())
    }
}
