// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI subcommand implementations for the `gearscope` binary.

pub mod doctor;
pub mod fetch_cmd;
pub mod lookup_cmd;
pub mod output;
