// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Provider selection and fallback.
//!
//! Frame numbers go to the primary provider only. Under `auto`, a VIN goes
//! to the primary first and the secondary is consulted when the primary did
//! not produce a FOUND OEM; the secondary's answer wins only when it is
//! FOUND itself.

use crate::config::RoutingStrategy;
use crate::error::LookupError;
use crate::identifier::{Identifier, IdentifierKind};
use crate::sources::SourceResolver;
use crate::types::{LookupResult, OemStatus, Provider};
use std::sync::Arc;

pub struct SourceRouter {
    primary: Arc<dyn SourceResolver>,
    secondary: Arc<dyn SourceResolver>,
    strategy: RoutingStrategy,
}

fn stamp(mut result: LookupResult, tried: &[Provider], selected: Provider) -> LookupResult {
    result.evidence.source_tried = tried.to_vec();
    result.evidence.source_selected = Some(selected);
    result
}

impl SourceRouter {
    pub fn new(
        primary: Arc<dyn SourceResolver>,
        secondary: Arc<dyn SourceResolver>,
        strategy: RoutingStrategy,
    ) -> Self {
        Self {
            primary,
            secondary,
            strategy,
        }
    }

    pub fn strategy(&self) -> RoutingStrategy {
        self.strategy
    }

    pub async fn resolve(&self, id: &Identifier) -> Result<LookupResult, LookupError> {
        match (self.strategy, id.kind) {
            (RoutingStrategy::ProviderB, IdentifierKind::Frame) => {
                Err(LookupError::UnsupportedIdentifier {
                    kind: id.kind,
                    provider: self.secondary.provider(),
                })
            }
            (RoutingStrategy::ProviderB, _) => self.pinned(&self.secondary, id).await,
            (RoutingStrategy::ProviderA, _) | (RoutingStrategy::Auto, IdentifierKind::Frame) => {
                self.pinned(&self.primary, id).await
            }
            (RoutingStrategy::Auto, IdentifierKind::Vin) => self.cascade(id).await,
        }
    }

    async fn pinned(&self, resolver: &Arc<dyn SourceResolver>, id: &Identifier) -> Result<LookupResult, LookupError> {
        let provider = resolver.provider();
        let result = resolver.resolve(id).await?;
        Ok(stamp(result, &[provider], provider))
    }

    async fn cascade(&self, id: &Identifier) -> Result<LookupResult, LookupError> {
        let a = self.primary.provider();
        let b = self.secondary.provider();
        let tried = [a, b];

        match self.primary.resolve(id).await {
            Ok(result) if result.gearbox.oem_status == OemStatus::Found => {
                tracing::info!(provider = %a, "primary found OEM");
                Ok(stamp(result, &[a], a))
            }
            Ok(primary_result) => {
                tracing::info!(
                    provider = %a,
                    status = ?primary_result.gearbox.oem_status,
                    "primary has no OEM, asking {b}"
                );
                match self.secondary.resolve(id).await {
                    Ok(result) if result.gearbox.oem_status == OemStatus::Found => {
                        Ok(stamp(result, &tried, b))
                    }
                    Ok(_) => Ok(stamp(primary_result, &tried, a)),
                    Err(e) => {
                        tracing::warn!(provider = %b, code = e.code(), "secondary failed, keeping primary result");
                        Ok(stamp(primary_result, &tried, a))
                    }
                }
            }
            Err(primary_err) if primary_err.allows_fallback() => {
                tracing::info!(provider = %a, code = primary_err.code(), "falling back to {b}");
                match self.secondary.resolve(id).await {
                    Ok(result) => Ok(stamp(result, &tried, b)),
                    Err(e) => {
                        tracing::warn!(provider = %b, code = e.code(), "fallback failed");
                        Err(primary_err)
                    }
                }
            }
            Err(e) => Err(e),
        }
    }
}
