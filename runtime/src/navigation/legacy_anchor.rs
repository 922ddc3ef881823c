// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Older layouts: anchors whose `href` or `name` carries a transliterated
//! keyword even when the link text is an icon or a number.

use super::{indexed_target, is_followable, NavBudget, NavigationStrategy};
use crate::renderer::{outer_html, ClickTarget, Readiness, RenderContext};
use anyhow::Result;
use async_trait::async_trait;
use scraper::{Html, Selector};

const SLUG_KEYWORDS: &[&str] = &["kpp", "akpp", "korobka", "gearbox", "transmission", "getriebe"];

fn carries_slug(value: &str) -> bool {
    let lower = value.to_lowercase();
    SLUG_KEYWORDS.iter().any(|k| lower.contains(k))
}

pub(crate) fn plan(html: &str, current_url: &str) -> Vec<ClickTarget> {
    let document = Html::parse_document(html);
    let sel = Selector::parse("a").unwrap();
    document
        .select(&sel)
        .filter(|a| {
            let href = a.value().attr("href").unwrap_or("");
            let name = a.value().attr("name").unwrap_or("");
            (is_followable(href, current_url) && carries_slug(href)) || carries_slug(name)
        })
        .filter_map(|a| indexed_target(&document, "a", &a))
        .collect()
}

pub struct LegacyAnchor;

#[async_trait]
impl NavigationStrategy for LegacyAnchor {
    fn tag(&self) -> &'static str {
        "legacy_anchor"
    }

    async fn attempt(&self, ctx: &mut dyn RenderContext, budget: &NavBudget) -> Result<bool> {
        let current = ctx.current_url().await?;
        let targets = plan(&outer_html(ctx).await?, &current);
        for target in targets.iter().take(budget.max_clicks) {
            let before = ctx.current_url().await?;
            match ctx.click(target, budget.click_timeout_ms).await {
                Ok(true) => {
                    let _ = ctx.wait_for(&Readiness::Load, budget.wait_timeout_ms).await;
                    // a named anchor without href only scrolls
                    if ctx.current_url().await? != before {
                        return Ok(true);
                    }
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
    use crate::renderer::static_pages::StaticRenderer;
    use crate::renderer::Renderer;

    const SEARCH: &str = "https://provider-a.test/search-vehicle?vin=X";

    #[test]
    fn test_plan_matches_href_and_name() {
        let html = r#"<a href="/cat/engine">1</a><a href="/cat/korobka-peredach">2</a><a name="akpp"></a>"#;
        let targets = plan(html, SEARCH);
        assert_eq!(
            targets,
            vec![
                ClickTarget::Selector { selector: "a".into(), index: 1 },
                ClickTarget::Selector { selector: "a".into(), index: 2 },
            ]
        );
    }

    #[tokio::test]
    async fn test_follows_slug_link() {
        let renderer = StaticRenderer::new()
            .with_page(SEARCH, r#"<a name="kpp"></a><a href="/cat/kpp/12"><img src="i.png"></a>"#)
            .with_page("https://provider-a.test/cat/kpp/12", "<p>0B5300012A</p>");
        let mut ctx = renderer.new_context().await.unwrap();
        ctx.navigate(SEARCH, &Readiness::NetworkIdle, 1_000).await.unwrap();
        assert!(LegacyAnchor.attempt(ctx.as_mut(), &NavBudget::default()).await.unwrap());
        assert_eq!(ctx.current_url().await.unwrap(), "https://provider-a.test/cat/kpp/12");
    }
}
