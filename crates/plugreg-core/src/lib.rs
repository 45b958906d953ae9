// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for plugreg.
//!
//! This crate provides the data model shared by module probing and plugin
//! reconciliation, the error taxonomy, and the collaborator traits the core
//! talks to (remote catalog, conflict decider, module source).

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ClassificationWarning, PlugregError, ValidationFailure};
pub use types::{
    name_key, same_name,
    CollidingPlugin, ConflictDecision, EntityRef, Isolatable, IsolationMode, LocalState,
    ModuleRecord, ModuleVersion, NameCollision, PluginDescriptor, PluginKind, RemoteState,
    SourceKind,
};

pub use traits::{ConflictDecider, DiskSource, FixedDecision, ModuleSource, PluginCatalog};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugreg_error_has_all_variants() {
        let _missing = PlugregError::PathNotFound {
            path: "missing.module".into(),
        };
        let _format = PlugregError::InvalidBinaryFormat {
            path: "bad.module".into(),
            reason: "bad header".into(),
        };
        let _io = PlugregError::Io {
            path: "x".into(),
            source: std::io::Error::other("test"),
        };
        let _config = PlugregError::Config("test".into());
        let _catalog = PlugregError::catalog("test");
        let _validation = PlugregError::from(ValidationFailure::NothingSelected);
        let _internal = PlugregError::Internal("test".into());
    }

    #[test]
    fn validation_failures_name_implicated_descriptors() {
        let err = ValidationFailure::MissingRemoteDescriptor {
            names: vec!["Contoso.B".into(), "Contoso.D".into()],
        };
        let text = err.to_string();
        assert!(text.contains("Contoso.B"));
        assert!(text.contains("Contoso.D"));

        let err = ValidationFailure::VersionIncompatible {
            registered: ModuleVersion::new(2, 0, 3, 1),
            candidate: ModuleVersion::new(2, 1, 0, 5),
        };
        let text = err.to_string();
        assert!(text.contains("2.0.3.1"));
        assert!(text.contains("2.1.0.5"));
    }

    #[test]
    fn validation_error_is_transparent() {
        let err = PlugregError::from(ValidationFailure::MissingSigningKey {
            module: "Contoso.Plugins".into(),
        });
        assert_eq!(
            err.to_string(),
            "module `Contoso.Plugins` registers plugins but is not signed"
        );
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_catalog<T: PluginCatalog>() {}
        fn _assert_decider<T: ConflictDecider>() {}
        fn _assert_source<T: ModuleSource>() {}
        _assert_decider::<FixedDecision>();
        _assert_source::<DiskSource>();
    }

    #[tokio::test]
    async fn fixed_decision_always_answers_the_same() {
        let decider = FixedDecision(ConflictDecision::CreateDuplicate);
        let collision = NameCollision {
            type_name: "Contoso.A".into(),
            module_name: "Contoso".into(),
            existing: CollidingPlugin {
                plugin_id: uuid::Uuid::new_v4(),
                module_id: uuid::Uuid::new_v4(),
                module_name: "Other".into(),
            },
        };
        assert_eq!(
            decider.decide(&collision).await,
            ConflictDecision::CreateDuplicate
        );
    }
}
