// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! `gearscope lookup`: resolve one identifier and print the result as JSON.

use crate::cli::output;
use crate::config::{LookupConfig, RoutingStrategy};
use crate::identifier::IdentifierKind;
use crate::service::LookupService;
use anyhow::{bail, Result};

/// Flags that override the environment for a single lookup.
#[derive(Debug, Default)]
pub struct LookupArgs {
    pub frame: bool,
    pub strategy: Option<RoutingStrategy>,
    pub headed: bool,
    pub capture_failures: bool,
}

impl LookupArgs {
    fn apply(&self, config: &mut LookupConfig) {
        if let Some(strategy) = self.strategy {
            config.routing = strategy;
        }
        if self.headed {
            config.headless = false;
        }
        if self.capture_failures {
            config.capture_failures = true;
        }
    }

    fn kind(&self) -> IdentifierKind {
        if self.frame {
            IdentifierKind::Frame
        } else {
            IdentifierKind::Vin
        }
    }
}

pub async fn run(value: &str, args: &LookupArgs) -> Result<()> {
    let mut config = LookupConfig::from_env();
    args.apply(&mut config);
    tracing::debug!(routing = %config.routing, headless = config.headless, "lookup config");

    let service = LookupService::new(config);
    let outcome = service.resolve(args.kind(), value).await;
    if let Err(e) = service.shutdown().await {
        tracing::warn!("browser shutdown failed: {e:#}");
    }

    match outcome {
        Ok(result) => output::print_json(&result),
        Err(err) => {
            output::print_json(&output::error_json(&err))?;
            bail!("{}: {err}", err.code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = LookupArgs {
            frame: true,
            strategy: Some(RoutingStrategy::ProviderA),
            headed: true,
            capture_failures: true,
        };
        let mut config = LookupConfig::default();
        args.apply(&mut config);
        assert_eq!(config.routing, RoutingStrategy::ProviderA);
        assert!(!config.headless);
        assert!(config.capture_failures);
        assert_eq!(args.kind(), IdentifierKind::Frame);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let mut config = LookupConfig {
            routing: RoutingStrategy::ProviderB,
            ..LookupConfig::default()
        };
        LookupArgs::default().apply(&mut config);
        assert_eq!(config.routing, RoutingStrategy::ProviderB);
        assert!(config.headless);
        assert_eq!(LookupArgs::default().kind(), IdentifierKind::Vin);
    }
}
