// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Navigation from a vehicle search page to the gearbox assembly page.
//!
//! States run `SearchResult → CategoryMenuOpen → AssemblyDetail`. The
//! [`Navigator`] tries each [`NavigationStrategy`] in order; a strategy that
//! misses leaves the driver to restore the search page before the next one.
//! Click and wait misses are fall-through, page-open failures are not.
//!
//! Strategies plan their clicks synchronously from the serialised document
//! and only then await the renderer, so no parsed DOM crosses an await.

pub mod category_tree;
pub mod keyword_link;
pub mod legacy_anchor;

use crate::renderer::{outer_html, part_number_count, ClickTarget, Readiness, RenderContext};
use crate::types::Evidence;
use anyhow::Result;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::fmt;

/// Labels of the transmission group in catalogue menus.
pub const GROUP_KEYWORDS: &[&str] = &[
    "трансмиссия", "коробка передач", "кпп", "акпп", "мкпп", "transmission", "gearbox", "getriebe",
];

/// Labels of links that lead to the gearbox assembly itself.
pub const LEAF_KEYWORDS: &[&str] = &[
    "коробка передач", "коробк", "кпп", "акпп", "мкпп", "вариатор", "трансмиссия", "в сборе",
    "transmission", "gearbox", "assembly",
];

/// Where the page is in the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    SearchResult,
    CategoryMenuOpen,
    AssemblyDetail,
}

impl NavState {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavState::SearchResult => "SearchResult",
            NavState::CategoryMenuOpen => "CategoryMenuOpen",
            NavState::AssemblyDetail => "AssemblyDetail",
        }
    }
}

impl fmt::Display for NavState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounds every strategy observes.
#[derive(Debug, Clone)]
pub struct NavBudget {
    /// Bound for opening (or re-opening) a page.
    pub nav_timeout_ms: u64,
    pub click_timeout_ms: u64,
    pub wait_timeout_ms: u64,
    /// Clicks one strategy may spend on candidate links.
    pub max_clicks: usize,
    /// Child sub-sections the category tree expands per parent.
    pub max_children: usize,
}

impl NavBudget {
    pub fn from_nav_timeout(nav_timeout_ms: u64) -> Self {
        Self {
            nav_timeout_ms,
            click_timeout_ms: (nav_timeout_ms / 3).max(1_000),
            wait_timeout_ms: (nav_timeout_ms / 6).max(500),
            max_clicks: 3,
            max_children: 4,
        }
    }
}

impl Default for NavBudget {
    fn default() -> Self {
        Self::from_nav_timeout(30_000)
    }
}

/// One way of getting from the search page to the assembly page.
#[async_trait]
pub trait NavigationStrategy: Send + Sync {
    fn tag(&self) -> &'static str;

    /// `Ok(true)` when a leaf link was followed.
    async fn attempt(&self, ctx: &mut dyn RenderContext, budget: &NavBudget) -> Result<bool>;
}

/// Where the driver left the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationOutcome {
    pub state: NavState,
    pub strategy: Option<&'static str>,
    pub final_url: String,
}

/// Runs the strategy set against an open search page.
pub struct Navigator {
    strategies: Vec<Box<dyn NavigationStrategy>>,
    budget: NavBudget,
}

impl Navigator {
    pub fn new(budget: NavBudget) -> Self {
        Self {
            strategies: Vec::new(),
            budget,
        }
    }

    /// Category tree, then flat keyword links, then legacy anchors.
    pub fn standard(budget: NavBudget) -> Self {
        Self::new(budget)
            .with(category_tree::CategoryTree)
            .with(keyword_link::KeywordLink)
            .with(legacy_anchor::LegacyAnchor)
    }

    pub fn with(mut self, strategy: impl NavigationStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn tags(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.tag()).collect()
    }

    /// Drive from `search_url` (already open in `ctx`) towards a page with
    /// part numbers. Returns `SearchResult` when every strategy missed.
    pub async fn drive(
        &self,
        ctx: &mut dyn RenderContext,
        search_url: &str,
        evidence: &mut Evidence,
    ) -> Result<NavigationOutcome> {
        // Where the search URL actually landed, redirects included
        let landing = ctx.current_url().await?;
        for strategy in &self.strategies {
            let reached = match strategy.attempt(ctx, &self.budget).await {
                Ok(reached) => reached,
                Err(e) => {
                    tracing::debug!(strategy = strategy.tag(), "navigation strategy failed: {e:#}");
                    false
                }
            };

            if reached {
                self.verify_or_drill(ctx).await?;
                let final_url = ctx.current_url().await?;
                evidence.record_tag("navigation", strategy.tag());
                evidence.navigation_state = Some(NavState::AssemblyDetail.to_string());
                return Ok(NavigationOutcome {
                    state: NavState::AssemblyDetail,
                    strategy: Some(strategy.tag()),
                    final_url,
                });
            }

            // Restore the search page if the miss moved us
            if ctx.current_url().await? != landing {
                ctx.navigate(search_url, &Readiness::NetworkIdle, self.budget.nav_timeout_ms)
                    .await?;
            }
        }

        evidence.navigation_state = Some(NavState::SearchResult.to_string());
        Ok(NavigationOutcome {
            state: NavState::SearchResult,
            strategy: None,
            final_url: landing,
        })
    }

    /// Accept a page exposing part numbers, otherwise spend one more click.
    async fn verify_or_drill(&self, ctx: &mut dyn RenderContext) -> Result<()> {
        if part_number_count(ctx).await? > 0 {
            return Ok(());
        }
        let html = outer_html(ctx).await?;
        let current = ctx.current_url().await?;
        let Some(target) = plan_drill_deeper(&html, &current) else {
            return Ok(());
        };
        tracing::debug!(%target, "no part numbers on page, drilling deeper");
        if ctx.click(&target, self.budget.click_timeout_ms).await.unwrap_or(false) {
            let _ = ctx.wait_for(&Readiness::Load, self.budget.wait_timeout_ms).await;
        }
        Ok(())
    }
}

/// Lower-cased `text` contains any of `words`.
pub fn matches_any(text: &str, words: &[&str]) -> bool {
    let lower = text.to_lowercase();
    words.iter().any(|w| lower.contains(w))
}

/// `ClickTarget::Selector` addressing `el` by its position among all
/// elements matching `selector`.
pub fn indexed_target(document: &Html, selector: &str, el: &ElementRef<'_>) -> Option<ClickTarget> {
    let sel = Selector::parse(selector).ok()?;
    let index = document.select(&sel).position(|e| e.id() == el.id())?;
    Some(ClickTarget::Selector {
        selector: selector.to_string(),
        index,
    })
}

/// Whether an anchor's `href` leads somewhere other than the current page.
pub fn is_followable(href: &str, current_url: &str) -> bool {
    let href = href.trim();
    !href.is_empty()
        && !href.starts_with('#')
        && !href.to_lowercase().starts_with("javascript:")
        && href != current_url
}

/// Leaf link to follow when the reached page shows no part numbers.
fn plan_drill_deeper(html: &str, current_url: &str) -> Option<ClickTarget> {
    let document = Html::parse_document(html);
    let sel = Selector::parse("a[href]").unwrap();
    document
        .select(&sel)
        .find(|a| {
            let text = crate::extraction::html::element_text(a);
            a.value().attr("href").is_some_and(|h| is_followable(h, current_url))
                && matches_any(&text, LEAF_KEYWORDS)
                && !crate::ranking::is_consumable(&text)
        })
        .and_then(|a| indexed_target(&document, "a[href]", &a))
}
