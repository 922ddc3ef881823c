// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Flat keyword matching over every link on the page.

use super::{indexed_target, is_followable, matches_any, NavBudget, NavigationStrategy, LEAF_KEYWORDS};
use crate::extraction::html::element_text;
use crate::ranking::is_consumable;
use crate::renderer::{outer_html, ClickTarget, Readiness, RenderContext};
use anyhow::Result;
use async_trait::async_trait;
use scraper::{Html, Selector};

/// Assembly-level wording ranks ahead of plain group names.
const ASSEMBLY_WORDS: &[&str] = &["в сборе", "assembly", "коробка передач"];

/// Transmission links, assembly wording first, document order otherwise.
pub(crate) fn plan(html: &str, current_url: &str) -> Vec<ClickTarget> {
    let document = Html::parse_document(html);
    let sel = Selector::parse("a[href]").unwrap();
    let mut scored: Vec<(bool, ClickTarget)> = document
        .select(&sel)
        .filter_map(|a| {
            let text = element_text(&a);
            let href = a.value().attr("href")?;
            if !is_followable(href, current_url) || is_consumable(&text) || !matches_any(&text, LEAF_KEYWORDS) {
                return None;
            }
            let target = indexed_target(&document, "a[href]", &a)?;
            Some((matches_any(&text, ASSEMBLY_WORDS), target))
        })
        .collect();
    scored.sort_by_key(|(assembly, _)| !assembly);
    scored.into_iter().map(|(_, t)| t).collect()
}

pub struct KeywordLink;

#[async_trait]
impl NavigationStrategy for KeywordLink {
    fn tag(&self) -> &'static str {
        "keyword_link"
    }

    async fn attempt(&self, ctx: &mut dyn RenderContext, budget: &NavBudget) -> Result<bool> {
        let current = ctx.current_url().await?;
        let targets = plan(&outer_html(ctx).await?, &current);
        for target in targets.iter().take(budget.max_clicks) {
            match ctx.click(target, budget.click_timeout_ms).await {
                Ok(true) => {
                    let _ = ctx.wait_for(&Readiness::Load, budget.wait_timeout_ms).await;
                    return Ok(true);
                }
                Ok(false) => {}
                Err(e) => tracing::debug!(%target, "click failed: {e:#}"),
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assembly_links_first() {
        let html = r##"
            <a href="/g/1">Акпп масло</a>
            <a href="/g/2">КПП детали</a>
            <a href="#kpp">КПП</a>
            <a href="/g/3">Коробка передач в сборе</a>
            <a href="/g/4">Кузов</a>"##;
        let targets = plan(html, "https://provider-a.test/");
        let indices: Vec<usize> = targets
            .iter()
            .map(|t| match t {
                ClickTarget::Selector { index, .. } => *index,
                other => panic!("unexpected target {other}"),
            })
            .collect();
        assert_eq!(indices, vec![3, 1]);
    }

    #[test]
    fn test_no_links() {
        assert!(plan("<p>КПП</p>", "https://provider-a.test/").is_empty());
    }
}
