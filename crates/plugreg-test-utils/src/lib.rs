// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for plugreg integration tests.
//!
//! # Components
//!
//! - [`ModuleImageBuilder`] - Module image fixtures written to temp directories
//! - [`RecordingCatalog`] - Catalog decorator with call counting and failure injection
//! - [`ScriptedDecider`] - Conflict decider with per-name answers
//! - [`CountingSource`] - Disk module source that counts probes

pub mod counting_source;
pub mod decider;
pub mod module_builder;
pub mod recording_catalog;

pub use counting_source::CountingSource;
pub use decider::ScriptedDecider;
pub use module_builder::{ModuleImageBuilder, LEGACY_SDK_REFERENCE, SDK_REFERENCE, TEST_TOKEN};
pub use recording_catalog::{CatalogCall, RecordingCatalog};
