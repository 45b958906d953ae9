// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for module inspection and discovery on disk.

use std::path::Path;
use std::sync::Arc;

use plugreg_core::{
    Isolatable, IsolationMode, ModuleSource, ModuleVersion, PluginKind, PlugregError, SourceKind,
};
use plugreg_probe::classify::LEGACY_PROTOCOL_VERSION;
use plugreg_probe::{ClassifierRules, ModuleProbe, ModuleResolver, ResolvedReference};
use plugreg_test_utils::{CountingSource, ModuleImageBuilder};

fn probe_in(dir: &Path, source: Arc<dyn ModuleSource>) -> ModuleProbe {
    let resolver = ModuleResolver::new(
        vec![dir.to_path_buf()],
        vec![String::new(), "x86_64".to_string()],
        "module",
        Arc::clone(&source),
    );
    ModuleProbe::new(source, Arc::new(resolver), ClassifierRules::default())
}

#[test]
fn inspect_reads_module_identity() {
    let dir = tempfile::tempdir().unwrap();
    let path = ModuleImageBuilder::new("Contoso.Plugins", "1.2.3.4")
        .signed()
        .write_to(dir.path());

    let probe = probe_in(dir.path(), Arc::new(CountingSource::new()));
    let module = probe.inspect(&path).unwrap();

    assert_eq!(module.name, "Contoso.Plugins");
    assert_eq!(module.version, ModuleVersion::new(1, 2, 3, 4));
    assert_eq!(module.culture, "neutral");
    assert_eq!(module.signing_token.as_deref(), Some("31BF3856AD364E35"));
    assert_eq!(module.source_kind, SourceKind::Disk);
    assert_eq!(module.isolation_mode, IsolationMode::None);
    assert_eq!(
        module.server_file_name.as_deref(),
        Some("Contoso.Plugins.module")
    );
}

#[test]
fn inspect_keeps_specific_culture_and_reports_unsigned() {
    let dir = tempfile::tempdir().unwrap();
    let path = ModuleImageBuilder::new("Contoso.Resources", "1.0")
        .culture("fr-FR")
        .write_to(dir.path());

    let module = probe_in(dir.path(), Arc::new(CountingSource::new()))
        .inspect(&path)
        .unwrap();
    assert_eq!(module.culture, "fr-FR");
    assert!(module.signing_token.is_none());
    assert_eq!(module.version, ModuleVersion::new(1, 0, 0, 0));
}

#[test]
fn inspect_missing_path_is_path_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let probe = probe_in(dir.path(), Arc::new(CountingSource::new()));

    let err = probe.inspect(&dir.path().join("nope.module")).unwrap_err();
    assert!(matches!(err, PlugregError::PathNotFound { .. }));
}

#[test]
fn inspect_non_module_file_is_invalid_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("native.module");
    std::fs::write(&path, b"MZ\x90\x00 not a module image").unwrap();

    let err = probe_in(dir.path(), Arc::new(CountingSource::new()))
        .inspect(&path)
        .unwrap_err();
    assert!(matches!(err, PlugregError::InvalidBinaryFormat { .. }));
}

#[test]
fn discover_classifies_every_contract() {
    let dir = tempfile::tempdir().unwrap();
    let path = ModuleImageBuilder::new("Contoso.Plugins", "1.0.0.0")
        .signed()
        .legacy_plugin("Contoso.Plugins.Legacy")
        .plugin("Contoso.Plugins.AccountCreate")
        .activity("Contoso.Plugins.SendMail")
        .helper("Contoso.Plugins.Helpers")
        .write_to(dir.path());

    let local = probe_in(dir.path(), Arc::new(CountingSource::new()))
        .discover(&path)
        .unwrap();

    assert!(local.warnings.is_empty());
    assert_eq!(
        local.type_names(),
        vec![
            "Contoso.Plugins.Legacy",
            "Contoso.Plugins.AccountCreate",
            "Contoso.Plugins.SendMail"
        ]
    );

    let legacy = local.find("contoso.plugins.legacy").unwrap();
    assert_eq!(legacy.kind, PluginKind::Plugin);
    assert_eq!(legacy.isolatable, Isolatable::No);
    assert!(legacy.workflow_group.is_none());

    let current = local.find("Contoso.Plugins.AccountCreate").unwrap();
    assert_eq!(current.isolatable, Isolatable::Yes);

    let activity = local.find("Contoso.Plugins.SendMail").unwrap();
    assert_eq!(activity.kind, PluginKind::WorkflowActivity);
    assert_eq!(
        activity.workflow_group.as_deref(),
        Some("Contoso.Plugins: Version: 1.0.0.0")
    );

    // Last plugin seen is the current-contract one, declared by SDK 9.0.
    assert_eq!(local.module.protocol_version, Some((9, 0)));
    assert!(local.plugins.iter().all(|p| p.module_id == local.module.id));
}

#[test]
fn legacy_only_module_reports_pinned_protocol() {
    let dir = tempfile::tempdir().unwrap();
    let path = ModuleImageBuilder::new("Contoso.Old", "3.0")
        .signed()
        .legacy_plugin("Contoso.Old.Plugin")
        .write_to(dir.path());

    let local = probe_in(dir.path(), Arc::new(CountingSource::new()))
        .discover(&path)
        .unwrap();
    assert_eq!(local.module.protocol_version, Some(LEGACY_PROTOCOL_VERSION));
}

#[test]
fn unversioned_interface_module_is_resolved_from_probe_path() {
    let dir = tempfile::tempdir().unwrap();
    let arch = dir.path().join("x86_64");
    std::fs::create_dir(&arch).unwrap();
    ModuleImageBuilder::new("Plugreg.Sdk", "9.1.0.7").write_to(&arch);

    let path = ModuleImageBuilder::new("Contoso.Plugins", "1.0")
        .signed()
        .plugin_declared_in("Contoso.Plugins.A", "Plugreg.Sdk")
        .write_to(dir.path());

    let local = probe_in(dir.path(), Arc::new(CountingSource::new()))
        .discover(&path)
        .unwrap();
    assert!(local.warnings.is_empty());
    assert_eq!(local.module.protocol_version, Some((9, 1)));
}

#[test]
fn unresolvable_interface_module_becomes_warning() {
    let dir = tempfile::tempdir().unwrap();
    let path = ModuleImageBuilder::new("Contoso.Plugins", "1.0")
        .signed()
        .plugin_declared_in("Contoso.Plugins.A", "Missing.Sdk")
        .plugin("Contoso.Plugins.B")
        .write_to(dir.path());

    let local = probe_in(dir.path(), Arc::new(CountingSource::new()))
        .discover(&path)
        .unwrap();
    assert_eq!(local.type_names(), vec!["Contoso.Plugins.B"]);
    assert_eq!(local.warnings.len(), 1);
    assert_eq!(local.warnings[0].type_name, "Contoso.Plugins.A");
    assert!(local.warnings[0].message.contains("Missing.Sdk"));
}

#[test]
fn case_duplicate_type_names_keep_the_first() {
    let dir = tempfile::tempdir().unwrap();
    let path = ModuleImageBuilder::new("Contoso.Plugins", "1.0")
        .signed()
        .plugin("Contoso.Plugins.Account")
        .plugin("contoso.plugins.ACCOUNT")
        .write_to(dir.path());

    let local = probe_in(dir.path(), Arc::new(CountingSource::new()))
        .discover(&path)
        .unwrap();
    assert_eq!(local.type_names(), vec!["Contoso.Plugins.Account"]);
    assert_eq!(local.warnings.len(), 1);
    assert_eq!(local.warnings[0].type_name, "contoso.plugins.ACCOUNT");
}

#[test]
fn repeated_unresolvable_reference_probes_disk_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = ModuleImageBuilder::new("Contoso.Plugins", "1.0")
        .signed()
        .plugin_declared_in("Contoso.Plugins.A", "Missing.Sdk")
        .write_to(dir.path());

    let source = Arc::new(CountingSource::new());
    let probe = probe_in(dir.path(), Arc::clone(&source) as Arc<dyn ModuleSource>);

    probe.discover(&path).unwrap();
    let after_first = source.exists_calls();
    probe.discover(&path).unwrap();

    // Only the target file itself is checked again.
    assert_eq!(source.exists_calls(), after_first + 1);
    assert_eq!(probe.resolver().cached("Missing.Sdk"), Some(None));
}

#[test]
fn cached_not_found_outlives_later_files() {
    let dir = tempfile::tempdir().unwrap();
    let sdk = ModuleImageBuilder::new("Plugreg.Sdk", "9.2");
    let first = ModuleImageBuilder::new("First", "1.0")
        .signed()
        .plugin_declared_in("First.P", "Plugreg.Sdk")
        .write_to(dir.path());

    let probe = probe_in(dir.path(), Arc::new(CountingSource::new()));
    // Not on the probe path yet: unresolved, and the outcome is cached.
    let local = probe.discover(&first).unwrap();
    assert_eq!(local.warnings.len(), 1);

    sdk.write_to(dir.path());
    let local = probe.discover(&first).unwrap();
    assert_eq!(local.warnings.len(), 1);
}

#[test]
fn references_resolve_from_the_probe_path() {
    let dir = tempfile::tempdir().unwrap();
    let arch = dir.path().join("x86_64");
    std::fs::create_dir(&arch).unwrap();
    ModuleImageBuilder::new("Contoso.Shared", "3.1.0.0").write_to(&arch);
    let path = ModuleImageBuilder::new("Contoso.Plugins", "1.0")
        .reference("Contoso.Shared")
        .reference("Contoso.Missing, Version=1.0.0.0")
        .write_to(dir.path());

    let source = Arc::new(CountingSource::new());
    let probe = probe_in(dir.path(), Arc::clone(&source) as Arc<dyn ModuleSource>);

    assert_eq!(
        probe.references(&path).unwrap(),
        vec![
            ResolvedReference {
                reference: "Contoso.Shared".into(),
                resolved: Some(ModuleVersion::new(3, 1, 0, 0)),
            },
            ResolvedReference {
                reference: "Contoso.Missing, Version=1.0.0.0".into(),
                resolved: None,
            },
        ]
    );
    // The target and the one module found on disk.
    assert_eq!(source.read_calls(), 2);

    // Only the target is read again; both references come from the cache.
    let again = probe.references(&path).unwrap();
    assert_eq!(again[0].resolved, Some(ModuleVersion::new(3, 1, 0, 0)));
    assert_eq!(source.read_calls(), 3);
}
