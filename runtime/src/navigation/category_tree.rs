// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Collapsible category trees: expand the transmission group, then its
//! sub-sections, and follow the first matching leaf.

use super::{
    indexed_target, is_followable, matches_any, NavBudget, NavState, NavigationStrategy,
    GROUP_KEYWORDS, LEAF_KEYWORDS,
};
use crate::extraction::html::{element_text, next_element_sibling};
use crate::ranking::is_consumable;
use crate::renderer::{outer_html, ClickTarget, Readiness, RenderContext};
use anyhow::Result;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

/// Elements that open or close a section.
const TOGGLE_SELECTOR: &str = "summary, [aria-expanded], [data-toggle], [class*='tree-node'] > span";

/// Leaf and child toggles found inside one expanded section.
#[derive(Debug, Default, PartialEq, Eq)]
struct SectionPlan {
    leaf: Option<ClickTarget>,
    children: Vec<ClickTarget>,
}

/// Toggles whose label names the transmission group.
fn plan_parents(html: &str) -> Vec<ClickTarget> {
    let document = Html::parse_document(html);
    let sel = Selector::parse(TOGGLE_SELECTOR).unwrap();
    document
        .select(&sel)
        .filter(|el| matches_any(&element_text(el), GROUP_KEYWORDS))
        .filter_map(|el| indexed_target(&document, TOGGLE_SELECTOR, &el))
        .collect()
}

/// Container a toggle controls.
fn section_of<'a>(document: &'a Html, toggle: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    if let Some(id) = toggle.value().attr("aria-controls") {
        let sel = Selector::parse(&format!("[id='{id}']")).ok()?;
        if let Some(target) = document.select(&sel).next() {
            return Some(target);
        }
    }
    match toggle.value().name() {
        "summary" => toggle.parent().and_then(ElementRef::wrap),
        _ => next_element_sibling(toggle).or_else(|| toggle.parent().and_then(ElementRef::wrap)),
    }
}

/// Resolve a toggle target back to its element.
fn locate<'a>(document: &'a Html, target: &ClickTarget) -> Option<ElementRef<'a>> {
    let ClickTarget::Selector { selector, index } = target else {
        return None;
    };
    let sel = Selector::parse(selector).ok()?;
    document.select(&sel).nth(*index)
}

/// Leaf link and nested toggles inside the section `toggle` controls.
fn plan_section(html: &str, toggle: &ClickTarget, current_url: &str, max_children: usize) -> SectionPlan {
    let document = Html::parse_document(html);
    let Some(section) = locate(&document, toggle).and_then(|t| section_of(&document, &t)) else {
        return SectionPlan::default();
    };

    let link_sel = Selector::parse("a[href]").unwrap();
    let leaf = section
        .select(&link_sel)
        .find(|a| {
            let text = element_text(a);
            a.value().attr("href").is_some_and(|h| is_followable(h, current_url))
                && matches_any(&text, LEAF_KEYWORDS)
                && !is_consumable(&text)
        })
        .and_then(|a| indexed_target(&document, "a[href]", &a));

    let toggle_sel = Selector::parse(TOGGLE_SELECTOR).unwrap();
    let toggle_el = locate(&document, toggle);
    let children = section
        .select(&toggle_sel)
        .filter(|el| toggle_el.map_or(true, |t| t.id() != el.id()))
        .filter(|el| matches_any(&element_text(el), LEAF_KEYWORDS))
        .take(max_children)
        .filter_map(|el| indexed_target(&document, TOGGLE_SELECTOR, &el))
        .collect();

    SectionPlan { leaf, children }
}

pub struct CategoryTree;

impl CategoryTree {
    async fn follow(ctx: &mut dyn RenderContext, leaf: &ClickTarget, budget: &NavBudget) -> Result<bool> {
        if !ctx.click(leaf, budget.click_timeout_ms).await? {
            return Ok(false);
        }
        let _ = ctx.wait_for(&Readiness::Load, budget.wait_timeout_ms).await;
        Ok(true)
    }

    async fn expand(ctx: &mut dyn RenderContext, toggle: &ClickTarget, budget: &NavBudget) -> Result<bool> {
        if !ctx.click(toggle, budget.click_timeout_ms).await? {
            return Ok(false);
        }
        let _ = ctx.wait_for(&Readiness::Load, budget.wait_timeout_ms).await;
        Ok(true)
    }
}

#[async_trait]
impl NavigationStrategy for CategoryTree {
    fn tag(&self) -> &'static str {
        "category_tree"
    }

    async fn attempt(&self, ctx: &mut dyn RenderContext, budget: &NavBudget) -> Result<bool> {
        let parents = plan_parents(&outer_html(ctx).await?);
        for parent in parents.iter().take(budget.max_clicks) {
            if !Self::expand(ctx, parent, budget).await? {
                continue;
            }
            tracing::debug!(state = %NavState::CategoryMenuOpen, %parent, "expanded group");

            let current = ctx.current_url().await?;
            let plan = plan_section(&outer_html(ctx).await?, parent, &current, budget.max_children);
            if let Some(leaf) = &plan.leaf {
                if Self::follow(ctx, leaf, budget).await? {
                    return Ok(true);
                }
            }

            for child in &plan.children {
                if !Self::expand(ctx, child, budget).await? {
                    continue;
                }
                let child_plan = plan_section(&outer_html(ctx).await?, child, &current, 0);
                if let Some(leaf) = &child_plan.leaf {
                    if Self::follow(ctx, leaf, budget).await? {
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }
}
