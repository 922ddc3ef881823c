// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core data types returned by a lookup.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of OEM candidates retained on a result.
pub const MAX_OEM_CANDIDATES: usize = 10;

/// External information provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    /// General parts catalogue (VIN and frame numbers).
    #[serde(rename = "providerA")]
    ProviderA,
    /// Chinese-market catalogue (VIN only).
    #[serde(rename = "providerB")]
    ProviderB,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::ProviderA => "providerA",
            Provider::ProviderB => "providerB",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partial vehicle description scraped alongside the gearbox data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drive_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmission: Option<String>,
}

impl VehicleMeta {
    /// Mutable slot for a canonical meta key (`make`, `model`, ...).
    pub fn slot_mut(&mut self, key: &str) -> Option<&mut Option<String>> {
        match key {
            "make" => Some(&mut self.make),
            "model" => Some(&mut self.model),
            "year" => Some(&mut self.year),
            "engine" => Some(&mut self.engine),
            "body" => Some(&mut self.body),
            "drive_type" => Some(&mut self.drive_type),
            "transmission" => Some(&mut self.transmission),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &VehicleMeta::default()
    }
}

/// An (OEM code, part name) pair found on a provider page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OemCandidate {
    pub oem: String,
    pub name: String,
}

impl OemCandidate {
    pub fn new(oem: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            oem: oem.into(),
            name: name.into(),
        }
    }
}

/// How far the OEM resolution got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OemStatus {
    /// A relevant, filter-valid OEM code was selected.
    Found,
    /// Candidates were extracted but none was a gearbox part.
    NotFound,
    /// No candidates could be extracted at all.
    NotAvailable,
    /// The provider cannot deliver genuine OEM data for this manufacturer
    /// family; only the model/code is reported.
    ModelOnly,
}

/// Gearbox portion of a lookup result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GearboxInfo {
    pub model: Option<String>,
    pub factory_code: Option<String>,
    pub oem: Option<String>,
    pub oem_candidates: Vec<OemCandidate>,
    pub oem_status: OemStatus,
    pub needs_manual_input: bool,
}

impl Default for GearboxInfo {
    fn default() -> Self {
        Self {
            model: None,
            factory_code: None,
            oem: None,
            oem_candidates: Vec::new(),
            oem_status: OemStatus::NotAvailable,
            needs_manual_input: false,
        }
    }
}

/// Append-only diagnostic trail for one resolution attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    /// Provider that produced this record.
    pub source: Option<Provider>,
    /// Every provider the router contacted, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_tried: Vec<Provider>,
    /// Provider whose result was returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_selected: Option<Provider>,
    /// `<field>:<strategy>` tags in firing order.
    pub strategy_tags: Vec<String>,
    pub final_url: String,
    /// Navigation state the page ended in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation_state: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
    /// Base64 PNG captured when the attempt failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_image: Option<String>,
}

impl Evidence {
    /// Fresh evidence for an attempt against one provider.
    pub fn new(provider: Provider) -> Self {
        Self {
            source: Some(provider),
            ..Self::default()
        }
    }

    pub fn record_tag(&mut self, field: &str, tag: &str) {
        self.strategy_tags.push(format!("{field}:{tag}"));
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.strategy_tags.iter().any(|t| t == tag)
    }
}

/// The unit returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResult {
    pub vehicle_meta: VehicleMeta,
    pub gearbox: GearboxInfo,
    pub evidence: Evidence,
}

/// Rendered page returned by a lightweight fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub final_url: String,
    pub html: String,
    pub text: String,
    pub load_time_ms: u64,
    pub fetched_at: chrono::DateTime<chrono::Utc>,
}
