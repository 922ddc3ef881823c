// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for lookups.

use crate::identifier::IdentifierKind;
use crate::renderer::RenderTimeout;
use crate::types::{Evidence, Provider};

/// Stable machine-readable error codes.
pub mod codes {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const PARSE_FAILED: &str = "PARSE_FAILED";
    pub const UNSUPPORTED_IDENTIFIER: &str = "UNSUPPORTED_IDENTIFIER";
    pub const TIMEOUT: &str = "TIMEOUT";
    pub const INTERNAL: &str = "INTERNAL";
    pub const INVALID_IDENTIFIER: &str = "INVALID_IDENTIFIER";
}

/// All errors a lookup can surface.
#[derive(thiserror::Error, Debug)]
pub enum LookupError {
    /// The provider explicitly reported the identifier as unknown.
    #[error("{provider} does not know this identifier")]
    NotFound {
        provider: Provider,
        evidence: Box<Evidence>,
    },

    /// The page was reached but no field survived validity filtering.
    #[error("{provider}: no gearbox field survived extraction")]
    ParseFailed {
        provider: Provider,
        evidence: Box<Evidence>,
    },

    #[error("{kind} identifiers are not supported by {provider}")]
    UnsupportedIdentifier {
        kind: IdentifierKind,
        provider: Provider,
    },

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("internal error: {message}")]
    Internal {
        message: String,
        evidence: Option<Box<Evidence>>,
    },

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl LookupError {
    pub fn code(&self) -> &'static str {
        match self {
            LookupError::NotFound { .. } => codes::NOT_FOUND,
            LookupError::ParseFailed { .. } => codes::PARSE_FAILED,
            LookupError::UnsupportedIdentifier { .. } => codes::UNSUPPORTED_IDENTIFIER,
            LookupError::Timeout(_) => codes::TIMEOUT,
            LookupError::Internal { .. } => codes::INTERNAL,
            LookupError::InvalidIdentifier(_) => codes::INVALID_IDENTIFIER,
        }
    }

    /// Whether the retry controller may re-run the attempt.
    pub fn is_timeout(&self) -> bool {
        matches!(self, LookupError::Timeout(_))
    }

    /// Whether the source router may fall back to the next provider.
    pub fn allows_fallback(&self) -> bool {
        matches!(
            self,
            LookupError::NotFound { .. } | LookupError::ParseFailed { .. }
        )
    }

    /// Evidence accumulated before the failure, when there is any.
    pub fn evidence(&self) -> Option<&Evidence> {
        match self {
            LookupError::NotFound { evidence, .. } | LookupError::ParseFailed { evidence, .. } => {
                Some(&**evidence)
            }
            LookupError::Internal { evidence, .. } => evidence.as_deref(),
            _ => None,
        }
    }

    /// Classify a renderer failure, attaching the evidence gathered so far.
    ///
    /// Anything carrying a [`RenderTimeout`] in its chain becomes `Timeout`;
    /// every other collaborator failure is `Internal`.
    pub fn from_render(err: anyhow::Error, evidence: &Evidence) -> Self {
        if let Some(timeout) = err.chain().find_map(|e| e.downcast_ref::<RenderTimeout>()) {
            return LookupError::Timeout(timeout.to_string());
        }
        LookupError::Internal {
            message: format!("{err:#}"),
            evidence: Some(Box::new(evidence.clone())),
        }
    }
}

impl From<anyhow::Error> for LookupError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(timeout) = err.chain().find_map(|e| e.downcast_ref::<RenderTimeout>()) {
            return LookupError::Timeout(timeout.to_string());
        }
        LookupError::Internal {
            message: format!("{err:#}"),
            evidence: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_timeout_is_detected_through_context() {
        let err: anyhow::Error = anyhow::Error::new(RenderTimeout {
            operation: "navigate".into(),
            timeout_ms: 500,
        });
        let err = Err::<(), _>(err).context("opening search page").unwrap_err();
        let mapped = LookupError::from_render(err, &Evidence::default());
        assert!(mapped.is_timeout());
        assert_eq!(mapped.code(), codes::TIMEOUT);
    }

    #[test]
    fn test_other_render_failure_is_internal_with_evidence() {
        let mut ev = Evidence::new(Provider::ProviderA);
        ev.final_url = "https://example.test/search".into();
        let mapped = LookupError::from_render(anyhow::anyhow!("tab crashed"), &ev);
        assert_eq!(mapped.code(), codes::INTERNAL);
        assert!(!mapped.allows_fallback());
        assert_eq!(mapped.evidence().unwrap().final_url, "https://example.test/search");
    }

    #[test]
    fn test_fallback_classes() {
        let nf = LookupError::NotFound {
            provider: Provider::ProviderA,
            evidence: Box::default(),
        };
        let pf = LookupError::ParseFailed {
            provider: Provider::ProviderA,
            evidence: Box::default(),
        };
        assert!(nf.allows_fallback());
        assert!(pf.allows_fallback());
        assert!(!LookupError::Timeout("x".into()).allows_fallback());
        assert!(!LookupError::UnsupportedIdentifier {
            kind: IdentifierKind::Frame,
            provider: Provider::ProviderB
        }
        .allows_fallback());
    }
}
