// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Runtime configuration read from `GEARSCOPE_*` environment variables.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_PROVIDER_A_URL: &str = "https://podzamenu.ru";
pub const DEFAULT_PROVIDER_B_URL: &str = "https://xn--80aagvgd7a1ae.xn--p1acf";

/// Which providers a lookup may contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingStrategy {
    /// Provider A first, provider B as fallback.
    #[default]
    Auto,
    ProviderA,
    ProviderB,
}

impl fmt::Display for RoutingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RoutingStrategy::Auto => "auto",
            RoutingStrategy::ProviderA => "provider-a",
            RoutingStrategy::ProviderB => "provider-b",
        })
    }
}

impl FromStr for RoutingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "auto" | "" => Ok(RoutingStrategy::Auto),
            "provider-a" | "providera" | "a" => Ok(RoutingStrategy::ProviderA),
            "provider-b" | "providerb" | "b" => Ok(RoutingStrategy::ProviderB),
            other => Err(format!(
                "unknown routing strategy '{other}' (expected auto, provider-a or provider-b)"
            )),
        }
    }
}

/// Effective configuration of a [`crate::service::LookupService`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupConfig {
    pub provider_a_url: String,
    pub provider_b_url: String,
    pub routing: RoutingStrategy,
    pub headless: bool,
    pub capture_failures: bool,
    /// Concurrent full lookups.
    pub max_lookups: usize,
    /// Concurrent lightweight page fetches.
    pub max_fetches: usize,
    /// Bound for each page open; click and wait bounds derive from it.
    pub nav_timeout_ms: u64,
    /// Extra attempts after a timeout.
    pub max_retries: u32,
    pub chromium_path: Option<PathBuf>,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            provider_a_url: DEFAULT_PROVIDER_A_URL.to_string(),
            provider_b_url: DEFAULT_PROVIDER_B_URL.to_string(),
            routing: RoutingStrategy::Auto,
            headless: true,
            capture_failures: false,
            max_lookups: 2,
            max_fetches: 4,
            nav_timeout_ms: 30_000,
            max_retries: 1,
            chromium_path: None,
        }
    }
}

impl LookupConfig {
    /// Read the process environment.
    pub fn from_env() -> Self {
        Self::from_source(|name| std::env::var(name).ok())
    }

    /// Read configuration through `get`, falling back to defaults for
    /// missing or unparsable values.
    pub fn from_source(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let string = |name: &str| get(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let routing = match string("GEARSCOPE_ROUTING").map(|v| v.parse::<RoutingStrategy>()) {
            Some(Ok(r)) => r,
            Some(Err(e)) => {
                tracing::warn!("{e}; using auto");
                RoutingStrategy::Auto
            }
            None => defaults.routing,
        };

        Self {
            provider_a_url: string("GEARSCOPE_PROVIDER_A_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.provider_a_url),
            provider_b_url: string("GEARSCOPE_PROVIDER_B_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.provider_b_url),
            routing,
            headless: read_bool(string("GEARSCOPE_HEADLESS"), defaults.headless),
            capture_failures: read_bool(string("GEARSCOPE_CAPTURE_FAILURES"), defaults.capture_failures),
            max_lookups: read_parsed(string("GEARSCOPE_MAX_LOOKUPS"), defaults.max_lookups).max(1),
            max_fetches: read_parsed(string("GEARSCOPE_MAX_FETCHES"), defaults.max_fetches).max(1),
            nav_timeout_ms: read_parsed(string("GEARSCOPE_NAV_TIMEOUT_MS"), defaults.nav_timeout_ms),
            max_retries: read_parsed(string("GEARSCOPE_MAX_RETRIES"), defaults.max_retries),
            chromium_path: string("GEARSCOPE_CHROMIUM_PATH").map(PathBuf::from),
        }
    }
}

fn read_parsed<T: FromStr>(value: Option<String>, default_value: T) -> T {
    value.and_then(|v| v.parse::<T>().ok()).unwrap_or(default_value)
}

fn read_bool(value: Option<String>, default_value: bool) -> bool {
    match value.map(|v| v.to_ascii_lowercase()).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default_value,
    }
}
