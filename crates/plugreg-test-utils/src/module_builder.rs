// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builder for module image fixtures.

use std::path::{Path, PathBuf};

use plugreg_core::ModuleVersion;
use plugreg_probe::{ModuleImage, TypeShape};

/// Reference to the SDK module declaring the current plugin interface.
pub const SDK_REFERENCE: &str = "Plugreg.Sdk, Version=9.0.0.0, Culture=neutral, PublicKeyToken=31bf3856ad364e35";

/// Reference to the module declaring the legacy plugin interface.
pub const LEGACY_SDK_REFERENCE: &str = "Plugreg.Sdk.Legacy, Version=4.0.0.0";

/// Token used by [`ModuleImageBuilder::signed`].
pub const TEST_TOKEN: [u8; 8] = [0x31, 0xbf, 0x38, 0x56, 0xad, 0x36, 0x4e, 0x35];

/// Builds module images using the default classifier contracts.
#[derive(Debug, Clone)]
pub struct ModuleImageBuilder {
    image: ModuleImage,
}

impl ModuleImageBuilder {
    pub fn new(name: &str, version: &str) -> Self {
        let version: ModuleVersion = version.parse().unwrap_or_default();
        Self {
            image: ModuleImage::new(name, version),
        }
    }

    /// Signs the module with [`TEST_TOKEN`].
    pub fn signed(mut self) -> Self {
        self.image.public_key_token = TEST_TOKEN.to_vec();
        self
    }

    pub fn culture(mut self, culture: &str) -> Self {
        self.image.culture = culture.to_string();
        self
    }

    pub fn reference(mut self, reference: &str) -> Self {
        self.image.references.push(reference.to_string());
        self
    }

    /// A class implementing the current plugin interface from [`SDK_REFERENCE`].
    pub fn plugin(self, type_name: &str) -> Self {
        self.plugin_declared_in(type_name, SDK_REFERENCE)
    }

    /// A current-contract plugin whose interface is declared in `module`.
    pub fn plugin_declared_in(self, type_name: &str, module: &str) -> Self {
        self.shape(TypeShape::class(type_name).implementing("Plugreg.Sdk.IPlugin", module))
    }

    pub fn legacy_plugin(self, type_name: &str) -> Self {
        self.shape(
            TypeShape::class(type_name)
                .implementing("Plugreg.Sdk.Legacy.IPlugin", LEGACY_SDK_REFERENCE),
        )
    }

    pub fn activity(self, type_name: &str) -> Self {
        self.shape(
            TypeShape::class(type_name)
                .deriving("Plugreg.Workflow.CodeActivity")
                .deriving("Plugreg.Workflow.Activity"),
        )
    }

    /// A class matching no contract.
    pub fn helper(self, type_name: &str) -> Self {
        self.shape(TypeShape::class(type_name))
    }

    pub fn shape(mut self, shape: TypeShape) -> Self {
        self.image.types.push(shape);
        self
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.image
            .encode()
            .expect("module image fixtures always encode")
    }

    /// Writes `{dir}/{name}.module` and returns its path.
    pub fn write_to(&self, dir: &Path) -> PathBuf {
        let path = dir.join(format!("{}.module", self.image.name));
        std::fs::write(&path, self.bytes()).expect("write module image fixture");
        path
    }
}
