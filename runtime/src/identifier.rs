// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Vehicle identifiers and WMI classification.
//!
//! A VIN's first three characters (the World Manufacturer Identifier) tell us
//! the manufacturer family and the assembly region. Providers use the family
//! to decide whether genuine OEM data can be delivered at all.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of vehicle identifier supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IdentifierKind {
    /// 17-character Vehicle Identification Number.
    Vin,
    /// Chassis/frame number (JDM style, e.g. `GX110-0069622`).
    Frame,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierKind::Vin => f.write_str("VIN"),
            IdentifierKind::Frame => f.write_str("FRAME"),
        }
    }
}

impl std::str::FromStr for IdentifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "VIN" => Ok(IdentifierKind::Vin),
            "FRAME" => Ok(IdentifierKind::Frame),
            other => Err(format!("unknown identifier kind: {other}")),
        }
    }
}

/// Assembly region derived from the first VIN character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Africa,
    Asia,
    China,
    Europe,
    NorthAmerica,
    Oceania,
    SouthAmerica,
    Unknown,
}

/// Manufacturer family derived from the WMI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManufacturerFamily {
    Vag,
    Mercedes,
    Bmw,
    Toyota,
    Nissan,
    Renault,
    HyundaiKia,
    Gm,
    Ford,
    Volvo,
    LandRover,
    Lada,
    Mitsubishi,
    Mazda,
    SsangYong,
    Chinese,
    Other,
}

/// WMI prefixes, longest first within each family so that a three-character
/// entry wins over a shared two-character prefix.
const WMI_TABLE: &[(&str, ManufacturerFamily)] = &[
    // VAG
    ("WVW", ManufacturerFamily::Vag),
    ("WV1", ManufacturerFamily::Vag),
    ("WV2", ManufacturerFamily::Vag),
    ("WAU", ManufacturerFamily::Vag),
    ("WUA", ManufacturerFamily::Vag),
    ("TMB", ManufacturerFamily::Vag),
    ("VSS", ManufacturerFamily::Vag),
    ("XW8", ManufacturerFamily::Vag),
    ("3VW", ManufacturerFamily::Vag),
    ("9BW", ManufacturerFamily::Vag),
    // Mercedes-Benz
    ("WDB", ManufacturerFamily::Mercedes),
    ("WDC", ManufacturerFamily::Mercedes),
    ("WDD", ManufacturerFamily::Mercedes),
    ("WDF", ManufacturerFamily::Mercedes),
    ("W1K", ManufacturerFamily::Mercedes),
    // BMW
    ("WBA", ManufacturerFamily::Bmw),
    ("WBS", ManufacturerFamily::Bmw),
    ("WBY", ManufacturerFamily::Bmw),
    ("5UX", ManufacturerFamily::Bmw),
    ("X4X", ManufacturerFamily::Bmw),
    // Renault / Dacia
    ("VF1", ManufacturerFamily::Renault),
    ("VF6", ManufacturerFamily::Renault),
    ("X7L", ManufacturerFamily::Renault),
    ("UU1", ManufacturerFamily::Renault),
    ("XUF", ManufacturerFamily::Gm),
    ("XWF", ManufacturerFamily::Gm),
    ("KL1", ManufacturerFamily::Gm),
    ("W0L", ManufacturerFamily::Gm),
    ("1G", ManufacturerFamily::Gm),
    // Nissan / Infiniti
    ("SJN", ManufacturerFamily::Nissan),
    ("Z8N", ManufacturerFamily::Nissan),
    ("VSK", ManufacturerFamily::Nissan),
    ("JN", ManufacturerFamily::Nissan),
    // Toyota / Lexus
    ("JT", ManufacturerFamily::Toyota),
    ("SB1", ManufacturerFamily::Toyota),
    ("XW7", ManufacturerFamily::Toyota),
    // Hyundai / Kia
    ("XWK", ManufacturerFamily::HyundaiKia),
    ("Z94", ManufacturerFamily::HyundaiKia),
    ("KM", ManufacturerFamily::HyundaiKia),
    ("KN", ManufacturerFamily::HyundaiKia),
    // Ford
    ("X9F", ManufacturerFamily::Ford),
    ("Z6F", ManufacturerFamily::Ford),
    ("WF0", ManufacturerFamily::Ford),
    ("1F", ManufacturerFamily::Ford),
    // Others
    ("YV1", ManufacturerFamily::Volvo),
    ("SAL", ManufacturerFamily::LandRover),
    ("XTA", ManufacturerFamily::Lada),
    ("XWE", ManufacturerFamily::Lada),
    ("Z8T", ManufacturerFamily::Mitsubishi),
    ("4A3", ManufacturerFamily::Mitsubishi),
    ("JA", ManufacturerFamily::Mitsubishi),
    ("RUM", ManufacturerFamily::Mazda),
    ("JM", ManufacturerFamily::Mazda),
    ("Z8U", ManufacturerFamily::SsangYong),
    ("KPT", ManufacturerFamily::SsangYong),
];

/// A caller-supplied identifier, normalised on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub kind: IdentifierKind,
    pub value: String,
}

impl Identifier {
    /// Build an identifier, trimming and upper-casing the value.
    ///
    /// Returns `None` when the value is empty after trimming.
    pub fn new(kind: IdentifierKind, value: &str) -> Option<Self> {
        let value = value.trim().to_uppercase();
        if value.is_empty() {
            return None;
        }
        Some(Self { kind, value })
    }

    /// The World Manufacturer Identifier, for VINs only.
    pub fn wmi(&self) -> Option<&str> {
        match self.kind {
            IdentifierKind::Vin => self.value.get(..3),
            IdentifierKind::Frame => None,
        }
    }

    /// Region of assembly derived from the first VIN character.
    pub fn region(&self) -> Region {
        let Some(first) = self.wmi().and_then(|w| w.chars().next()) else {
            return Region::Unknown;
        };
        match first {
            'L' => Region::China,
            'A'..='H' => Region::Africa,
            'J'..='R' => Region::Asia,
            'S'..='Z' => Region::Europe,
            '1'..='5' => Region::NorthAmerica,
            '6' | '7' => Region::Oceania,
            '8' | '9' => Region::SouthAmerica,
            _ => Region::Unknown,
        }
    }

    /// Manufacturer family derived from the WMI prefix table.
    pub fn family(&self) -> ManufacturerFamily {
        let Some(wmi) = self.wmi() else {
            return ManufacturerFamily::Other;
        };
        if let Some((_, family)) = WMI_TABLE
            .iter()
            .filter(|(prefix, _)| wmi.starts_with(prefix))
            .max_by_key(|(prefix, _)| prefix.len())
        {
            return *family;
        }
        if self.region() == Region::China {
            return ManufacturerFamily::Chinese;
        }
        ManufacturerFamily::Other
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.value)
    }
}
