// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Gearscope runtime library: resolve a VIN or frame number to the gearbox
//! model, factory code and OEM part number by driving parts-catalogue pages.
//!
//! [`service::LookupService`] is the entry point; everything below it is
//! exposed for integration testing.

pub mod cli;
pub mod config;
pub mod error;
pub mod extraction;
pub mod identifier;
pub mod navigation;
pub mod ranking;
pub mod renderer;
pub mod retry;
pub mod router;
pub mod service;
pub mod sources;
pub mod types;
