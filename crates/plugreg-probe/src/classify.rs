// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure classification of type shapes into registrable kinds.

use plugreg_config::model::ClassifierConfig;
use plugreg_core::Isolatable;

use crate::image::{InterfaceRef, TypeKind, TypeShape};

/// The legacy contract predates isolation and protocol negotiation, so its
/// protocol version is pinned.
pub const LEGACY_PROTOCOL_VERSION: (u16, u16) = (4, 0);

/// Contract names the classifier matches against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierRules {
    pub plugin_interface: String,
    pub legacy_plugin_interface: String,
    pub workflow_base_types: Vec<String>,
}

impl From<&ClassifierConfig> for ClassifierRules {
    fn from(config: &ClassifierConfig) -> Self {
        Self {
            plugin_interface: config.plugin_interface.clone(),
            legacy_plugin_interface: config.legacy_plugin_interface.clone(),
            workflow_base_types: config.workflow_base_types.clone(),
        }
    }
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self::from(&ClassifierConfig::default())
    }
}

/// Which plugin contract a type implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginContract<'a> {
    /// The current execution interface; protocol version comes from its declaring module.
    Current(&'a InterfaceRef),
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification<'a> {
    Plugin {
        isolatable: Isolatable,
        contract: PluginContract<'a>,
    },
    WorkflowActivity,
    Ignored,
}

/// Classifies one type. Only exported, non-abstract classes are candidates;
/// the current plugin interface takes precedence over the legacy one, and
/// both over workflow-activity ancestry.
pub fn classify<'a>(shape: &'a TypeShape, rules: &ClassifierRules) -> Classification<'a> {
    if !shape.is_exported || shape.is_abstract || shape.kind != TypeKind::Class {
        return Classification::Ignored;
    }

    if let Some(interface) = find_interface(shape, &rules.plugin_interface) {
        return Classification::Plugin {
            isolatable: Isolatable::Yes,
            contract: PluginContract::Current(interface),
        };
    }

    if find_interface(shape, &rules.legacy_plugin_interface).is_some() {
        return Classification::Plugin {
            isolatable: Isolatable::No,
            contract: PluginContract::Legacy,
        };
    }

    let is_activity = shape.base_types.iter().any(|base| {
        rules
            .workflow_base_types
            .iter()
            .any(|activity| activity == base)
    });
    if is_activity {
        return Classification::WorkflowActivity;
    }

    Classification::Ignored
}

fn find_interface<'a>(shape: &'a TypeShape, name: &str) -> Option<&'a InterfaceRef> {
    shape.interfaces.iter().find(|i| i.full_name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SDK: &str = "Plugreg.Sdk, Version=9.0.2.3";

    fn rules() -> ClassifierRules {
        ClassifierRules::default()
    }

    #[test]
    fn current_interface_is_isolatable_plugin() {
        let shape = TypeShape::class("Contoso.AccountCreate").implementing("Plugreg.Sdk.IPlugin", SDK);
        match classify(&shape, &rules()) {
            Classification::Plugin {
                isolatable,
                contract: PluginContract::Current(interface),
            } => {
                assert_eq!(isolatable, Isolatable::Yes);
                assert_eq!(interface.module, SDK);
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn legacy_interface_is_not_isolatable() {
        let shape = TypeShape::class("Contoso.Old")
            .implementing("Plugreg.Sdk.Legacy.IPlugin", "Plugreg.Sdk.Legacy");
        assert_eq!(
            classify(&shape, &rules()),
            Classification::Plugin {
                isolatable: Isolatable::No,
                contract: PluginContract::Legacy,
            }
        );
    }

    #[test]
    fn current_interface_wins_over_legacy() {
        let shape = TypeShape::class("Contoso.Both")
            .implementing("Plugreg.Sdk.Legacy.IPlugin", "Plugreg.Sdk.Legacy")
            .implementing("Plugreg.Sdk.IPlugin", SDK);
        assert!(matches!(
            classify(&shape, &rules()),
            Classification::Plugin {
                contract: PluginContract::Current(_),
                ..
            }
        ));
    }

    #[test]
    fn workflow_ancestry_anywhere_in_chain() {
        let shape = TypeShape::class("Contoso.SendMail")
            .deriving("Contoso.BaseActivity")
            .deriving("Plugreg.Workflow.CodeActivity")
            .deriving("System.Object");
        assert_eq!(classify(&shape, &rules()), Classification::WorkflowActivity);
    }

    #[test]
    fn non_candidates_are_ignored() {
        let mut abstract_plugin =
            TypeShape::class("Contoso.PluginBase").implementing("Plugreg.Sdk.IPlugin", SDK);
        abstract_plugin.is_abstract = true;
        assert_eq!(classify(&abstract_plugin, &rules()), Classification::Ignored);

        let mut internal = TypeShape::class("Contoso.Hidden").implementing("Plugreg.Sdk.IPlugin", SDK);
        internal.is_exported = false;
        assert_eq!(classify(&internal, &rules()), Classification::Ignored);

        let mut interface = TypeShape::class("Contoso.IMarker").implementing("Plugreg.Sdk.IPlugin", SDK);
        interface.kind = TypeKind::Interface;
        assert_eq!(classify(&interface, &rules()), Classification::Ignored);

        let helper = TypeShape::class("Contoso.Helpers").deriving("System.Object");
        assert_eq!(classify(&helper, &rules()), Classification::Ignored);
    }

    #[test]
    fn rules_follow_configuration() {
        let config = ClassifierConfig {
            plugin_interface: "Contoso.Sdk.IPlugin".into(),
            legacy_plugin_interface: "Contoso.Sdk.V4.IPlugin".into(),
            workflow_base_types: vec!["Contoso.Flow.Step".into()],
        };
        let rules = ClassifierRules::from(&config);

        let step = TypeShape::class("Contoso.MyStep").deriving("Contoso.Flow.Step");
        assert_eq!(classify(&step, &rules), Classification::WorkflowActivity);

        let default_plugin = TypeShape::class("Contoso.P").implementing("Plugreg.Sdk.IPlugin", SDK);
        assert_eq!(classify(&default_plugin, &rules), Classification::Ignored);
    }
}
