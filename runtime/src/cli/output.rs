// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Output helpers shared by the subcommands.

use crate::error::LookupError;
use serde::Serialize;

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// JSON body for a failed lookup: code, message and evidence when present.
pub fn error_json(err: &LookupError) -> serde_json::Value {
    let mut body = serde_json::json!({
        "error": true,
        "code": err.code(),
        "message": err.to_string(),
    });
    if let Some(evidence) = err.evidence() {
        body["evidence"] = serde_json::to_value(evidence).unwrap_or(serde_json::Value::Null);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Evidence, Provider};

    #[test]
    fn test_error_json_carries_evidence() {
        let mut evidence = Evidence::new(Provider::ProviderA);
        evidence.note("not-found phrase on search page");
        let err = LookupError::NotFound {
            provider: Provider::ProviderA,
            evidence: Box::new(evidence),
        };
        let body = error_json(&err);
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["evidence"]["source"], "providerA");
    }

    #[test]
    fn test_error_json_without_evidence() {
        let body = error_json(&LookupError::Timeout("navigate timed out after 10ms".into()));
        assert_eq!(body["code"], "TIMEOUT");
        assert!(body.get("evidence").is_none());
    }
}
