// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! `gearscope fetch`: render one page and print its URL and text.

use crate::cli::output;
use crate::config::LookupConfig;
use crate::service::LookupService;
use anyhow::{bail, Result};

pub async fn run(url: &str, json: bool) -> Result<()> {
    let service = LookupService::new(LookupConfig::from_env());
    let outcome = service.fetch_page(url).await;
    if let Err(e) = service.shutdown().await {
        tracing::warn!("browser shutdown failed: {e:#}");
    }

    match outcome {
        Ok(snapshot) if json => output::print_json(&snapshot),
        Ok(snapshot) => {
            println!("{}", snapshot.final_url);
            println!();
            println!("{}", snapshot.text);
            Ok(())
        }
        Err(err) => {
            output::print_json(&output::error_json(&err))?;
            bail!("{}: {err}", err.code())
        }
    }
}
