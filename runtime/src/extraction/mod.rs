// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Cascading field extraction.
//!
//! Each target field owns an ordered list of independent strategies. The
//! cascade runs them in priority order; the first output that survives the
//! field's refine step (its validity filter) wins, later strategies are
//! skipped, and the winner's tag is written to the evidence trail.
//!
//! Strategies are synchronous and operate on a parsed [`PageDocument`], so
//! every one of them can be exercised on a literal HTML fixture.

pub mod factory_code;
pub mod filters;
pub mod html;
pub mod meta;
pub mod model;
pub mod oem;

pub use html::PageDocument;

use crate::types::Evidence;

/// Everything a strategy may look at.
pub struct FieldContext<'a> {
    pub doc: &'a PageDocument,
    /// Gearbox model resolved earlier in the pipeline, if any.
    pub model: Option<&'a str>,
}

impl<'a> FieldContext<'a> {
    pub fn new(doc: &'a PageDocument) -> Self {
        Self { doc, model: None }
    }

    pub fn with_model(mut self, model: Option<&'a str>) -> Self {
        self.model = model;
        self
    }
}

/// One way of producing a value for a field.
pub trait FieldStrategy<T>: Send + Sync {
    /// Stable identifier written to the evidence trail.
    fn tag(&self) -> &'static str;
    /// Try to produce a value. `None` means this strategy does not apply.
    fn attempt(&self, cx: &FieldContext<'_>) -> Option<T>;
}

/// Outcome of a cascade run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted<T> {
    pub value: T,
    pub tag: &'static str,
}

/// Ordered strategy list for one field.
pub struct Cascade<T> {
    field: &'static str,
    strategies: Vec<Box<dyn FieldStrategy<T>>>,
    refine: fn(T) -> Option<T>,
}

impl<T> Cascade<T> {
    pub fn new(field: &'static str, refine: fn(T) -> Option<T>) -> Self {
        Self {
            field,
            strategies: Vec::new(),
            refine,
        }
    }

    pub fn then(mut self, strategy: impl FieldStrategy<T> + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn tags(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.tag()).collect()
    }

    /// Run the strategies in order without touching evidence.
    pub fn extract(&self, cx: &FieldContext<'_>) -> Option<Extracted<T>> {
        self.strategies.iter().find_map(|strategy| {
            let value = (self.refine)(strategy.attempt(cx)?)?;
            Some(Extracted {
                value,
                tag: strategy.tag(),
            })
        })
    }

    /// Run the cascade and record the winning tag.
    pub fn run(&self, cx: &FieldContext<'_>, evidence: &mut Evidence) -> Option<T> {
        let hit = self.extract(cx)?;
        tracing::debug!(field = self.field, strategy = hit.tag, "extraction hit");
        evidence.record_tag(self.field, hit.tag);
        Some(hit.value)
    }
}

/// Refine step for free-text fields: trim and collapse whitespace, then
/// apply `accept`.
pub fn refine_text(value: String, accept: fn(&str) -> bool) -> Option<String> {
    let value = html::collapse_whitespace(&value);
    accept(&value).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, Option<&'static str>);

    impl FieldStrategy<String> for Fixed {
        fn tag(&self) -> &'static str {
            self.0
        }
        fn attempt(&self, _cx: &FieldContext<'_>) -> Option<String> {
            self.1.map(str::to_string)
        }
    }

    fn non_empty(v: String) -> Option<String> {
        refine_text(v, |s| s.len() > 2)
    }

    #[test]
    fn test_first_surviving_strategy_wins() {
        let doc = PageDocument::parse("<p></p>", "https://example.test/");
        let cascade = Cascade::new("gearbox.model", non_empty)
            .then(Fixed("miss", None))
            .then(Fixed("filtered", Some("x")))
            .then(Fixed("hit", Some("  0B5  ")))
            .then(Fixed("later", Some("09G")));
        let mut ev = Evidence::default();
        assert_eq!(cascade.run(&FieldContext::new(&doc), &mut ev), Some("0B5".to_string()));
        assert_eq!(ev.strategy_tags, vec!["gearbox.model:hit"]);
        assert_eq!(cascade.tags(), vec!["miss", "filtered", "hit", "later"]);
    }

    #[test]
    fn test_exhausted_cascade_records_nothing() {
        let doc = PageDocument::parse("<p></p>", "https://example.test/");
        let cascade = Cascade::new("gearbox.model", non_empty).then(Fixed("miss", None));
        let mut ev = Evidence::default();
        assert_eq!(cascade.run(&FieldContext::new(&doc), &mut ev), None);
        assert!(ev.strategy_tags.is_empty());
    }
}
