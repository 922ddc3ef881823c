// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Environment readiness check.

use crate::config::LookupConfig;
use crate::renderer::chromium::find_chromium;
use anyhow::Result;
use std::process::Command;

/// Report Chromium availability, memory and the effective configuration.
pub async fn run() -> Result<()> {
    println!("Gearscope Doctor");
    println!("================");
    println!();

    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();

    let config = LookupConfig::from_env();
    let chromium_path = find_chromium(config.chromium_path.as_deref());
    match &chromium_path {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!(
            "[!!] Chromium NOT found. Set GEARSCOPE_CHROMIUM_PATH or install chromium/google-chrome."
        ),
    }

    match get_available_memory_mb() {
        Some(mb) if mb >= 512 => println!("[OK] Available memory: {mb}MB (>= 512MB required)"),
        Some(mb) => println!("[!!] Available memory: {mb}MB (< 512MB, Chromium may crash)"),
        None => println!("[??] Could not determine available memory"),
    }

    println!();
    println!("Effective configuration:");
    println!("{}", serde_json::to_string_pretty(&config)?);

    println!();
    if chromium_path.is_some() {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }
    Ok(())
}

/// Available memory in MB (platform-specific).
fn get_available_memory_mb() -> Option<u64> {
    #[cfg(target_os = "macos")]
    {
        let output = Command::new("sysctl").args(["-n", "hw.memsize"]).output().ok()?;
        let bytes: u64 = String::from_utf8_lossy(&output.stdout).trim().parse().ok()?;
        Some(bytes / 1_048_576)
    }
    #[cfg(target_os = "linux")]
    {
        let output = Command::new("free").args(["-m"]).output().ok()?;
        parse_free_output(&String::from_utf8_lossy(&output.stdout))
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

/// "available" column of the `Mem:` row of `free -m`.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_free_output(output: &str) -> Option<u64> {
    output
        .lines()
        .find(|line| line.starts_with("Mem:"))
        .and_then(|line| line.split_whitespace().nth(6))
        .and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_free_output() {
        let out = "              total        used        free      shared  buff/cache   available\n\
                   Mem:          15890        4210        6120         310        5560       11050\n\
                   Swap:          2047           0        2047\n";
        assert_eq!(parse_free_output(out), Some(11050));
        assert_eq!(parse_free_output("garbage"), None);
    }
}
