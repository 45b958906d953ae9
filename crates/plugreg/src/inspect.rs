// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `plugreg inspect` and `plugreg discover`.

use std::path::Path;

use plugreg_config::PlugregConfig;
use plugreg_core::{LocalState, ModuleRecord, PlugregError};
use plugreg_probe::{ModuleProbe, ResolvedReference};
use serde::Serialize;

use crate::output;

#[derive(Debug, Serialize)]
struct InspectJson<'a> {
    full_name: String,
    module: &'a ModuleRecord,
    references: &'a [ResolvedReference],
}

impl<'a> InspectJson<'a> {
    fn new(module: &'a ModuleRecord, references: &'a [ResolvedReference]) -> Self {
        Self {
            full_name: module.full_name(),
            module,
            references,
        }
    }
}

#[derive(Debug, Serialize)]
struct DiscoverJson<'a> {
    module: &'a ModuleRecord,
    plugins: &'a [plugreg_core::PluginDescriptor],
    warnings: Vec<String>,
}

impl<'a> From<&'a LocalState> for DiscoverJson<'a> {
    fn from(local: &'a LocalState) -> Self {
        Self {
            module: &local.module,
            plugins: &local.plugins,
            warnings: local.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, PlugregError> {
    serde_json::to_string_pretty(value).map_err(|e| PlugregError::Internal(e.to_string()))
}

pub fn run_inspect(config: &PlugregConfig, path: &Path, json: bool) -> Result<(), PlugregError> {
    let probe = ModuleProbe::from_config(config);
    let module = probe.inspect(path)?;
    let references = probe.references(path)?;
    if json {
        println!("{}", to_json(&InspectJson::new(&module, &references))?);
    } else {
        output::print_module(&module);
        output::print_references(&references);
    }
    Ok(())
}

pub fn run_discover(
    config: &PlugregConfig,
    path: &Path,
    json: bool,
    use_color: bool,
) -> Result<(), PlugregError> {
    let local = ModuleProbe::from_config(config).discover(path)?;
    if json {
        println!("{}", to_json(&DiscoverJson::from(&local))?);
    } else {
        output::print_local(&local, use_color);
    }
    Ok(())
}
