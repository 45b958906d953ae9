// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal rendering for command results.

use std::io::IsTerminal;

use colored::Colorize;
use plugreg_core::{ClassificationWarning, LocalState, ModuleRecord, PluginKind};
use plugreg_probe::ResolvedReference;
use plugreg_reconcile::{ExecutionReport, ItemStatus, Plan, RegisterAction};

/// Colors are used only on a terminal and never with `--plain`.
pub fn use_color(plain: bool) -> bool {
    !plain && std::io::stdout().is_terminal()
}

fn mark(ok: bool, use_color: bool) -> String {
    match (ok, use_color) {
        (true, true) => "✓".green().to_string(),
        (false, true) => "✗".red().to_string(),
        (true, false) => "[OK]".to_string(),
        (false, false) => "[FAIL]".to_string(),
    }
}

fn warn_mark(use_color: bool) -> String {
    if use_color {
        "!".yellow().to_string()
    } else {
        "[WARN]".to_string()
    }
}

pub fn print_module(module: &ModuleRecord) {
    println!("  Full name: {}", module.full_name());
    println!("  Name:      {}", module.name);
    println!("  Version:   {}", module.version);
    println!("  Culture:   {}", module.culture);
    println!(
        "  Token:     {}",
        module.signing_token.as_deref().unwrap_or("(unsigned)")
    );
    if let Some((major, minor)) = module.protocol_version {
        println!("  Protocol:  {major}.{minor}");
    }
    if let Some(file) = &module.server_file_name {
        println!("  File:      {file}");
    }
}

pub fn print_references(references: &[ResolvedReference]) {
    if references.is_empty() {
        return;
    }
    println!("  References:");
    for reference in references {
        match reference.resolved {
            Some(version) => println!("    {} (found {version})", reference.reference),
            None => println!("    {} (not found)", reference.reference),
        }
    }
}

pub fn print_local(local: &LocalState, use_color: bool) {
    print_module(&local.module);
    println!();
    if local.plugins.is_empty() {
        println!("  No plugin types found.");
    }
    for plugin in &local.plugins {
        let kind = match plugin.kind {
            PluginKind::Plugin => "plugin",
            PluginKind::WorkflowActivity => "activity",
        };
        let mut line = format!("  {:<9} {}", kind, plugin.type_name);
        if plugin.isolatable == plugreg_core::Isolatable::No {
            line.push_str(" (not isolatable)");
        }
        if let Some(group) = &plugin.workflow_group {
            line.push_str(&format!(" [{group}]"));
        }
        println!("{line}");
    }
    print_warnings(&local.warnings, use_color);
}

pub fn print_warnings(warnings: &[ClassificationWarning], use_color: bool) {
    for warning in warnings {
        println!("  {} {warning}", warn_mark(use_color));
    }
}

pub fn print_plan(plan: &Plan, use_color: bool) {
    println!("{}", plan.summary());
    for entry in &plan.to_register {
        let verb = match entry.action {
            RegisterAction::Create => "create",
            RegisterAction::Update { .. } => "update",
        };
        println!("  {verb:<7} {}", entry.type_name());
    }
    for removed in &plan.to_remove {
        println!("  {:<7} {}", "remove", removed.type_name);
    }
    for rename in &plan.group_renames {
        println!("  group   {}: {} -> {}", rename.type_name, rename.from, rename.to);
    }
    print_warnings(&plan.warnings, use_color);
}

pub fn print_report(report: &ExecutionReport, use_color: bool) {
    for item in &report.items {
        let (ok, note) = match item.status {
            ItemStatus::Created(_) => (true, "created"),
            ItemStatus::Updated(_) => (true, "updated"),
            ItemStatus::Removed(_) => (true, "removed"),
            ItemStatus::Reused(_) => (true, "kept existing"),
            ItemStatus::Failed => (false, "failed"),
            ItemStatus::Cancelled => (false, "cancelled"),
        };
        println!("  {} {:<40} {note}", mark(ok, use_color), item.type_name);
    }
    for error in &report.errors {
        println!("  {} {error}", mark(false, use_color));
    }
    if let Some(error) = &report.timestamp_error {
        println!("  {} timestamps: {error}", warn_mark(use_color));
    }
    println!("{report}");
}
