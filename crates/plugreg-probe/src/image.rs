// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk module image format and module references.
//!
//! An image is an 8-byte header (`PLGMOD`, a NUL byte, the format version)
//! followed by a JSON body describing the module identity, the modules it
//! references, and the shape of every type it defines.

use std::fmt;

use plugreg_core::types::NEUTRAL_CULTURE;
use plugreg_core::{same_name, ModuleVersion};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Magic bytes at the start of every module image.
pub const MAGIC: &[u8; 6] = b"PLGMOD";

/// Image format version written by this crate.
pub const FORMAT_VERSION: u8 = 1;

/// Length of the fixed header.
pub const HEADER_LEN: usize = 8;

/// Reasons an image fails format validation.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("file is {0} bytes, shorter than the image header")]
    TooShort(usize),

    #[error("missing module image signature")]
    BadMagic,

    #[error("unsupported image format version {0}")]
    UnsupportedVersion(u8),

    #[error("malformed image body: {0}")]
    Body(#[from] serde_json::Error),

    #[error("image does not name its module")]
    MissingName,
}

/// Kind of a type definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
    Struct,
    Enum,
}

/// An interface implemented by a type, with the module that declares it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceRef {
    pub full_name: String,
    /// Reference to the declaring module (`Name, Version=...` form).
    pub module: String,
}

/// Declarative shape of one type: what the classifier looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeShape {
    pub full_name: String,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default = "default_exported")]
    pub is_exported: bool,
    /// Every interface the type implements, directly or through a base type.
    #[serde(default)]
    pub interfaces: Vec<InterfaceRef>,
    /// Base-type chain, nearest first.
    #[serde(default)]
    pub base_types: Vec<String>,
}

fn default_exported() -> bool {
    true
}

impl TypeShape {
    /// An exported concrete class with no interfaces and no base types.
    pub fn class(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            kind: TypeKind::Class,
            is_abstract: false,
            is_exported: true,
            interfaces: Vec::new(),
            base_types: Vec::new(),
        }
    }

    pub fn implementing(mut self, interface: impl Into<String>, module: impl Into<String>) -> Self {
        self.interfaces.push(InterfaceRef {
            full_name: interface.into(),
            module: module.into(),
        });
        self
    }

    pub fn deriving(mut self, base_type: impl Into<String>) -> Self {
        self.base_types.push(base_type.into());
        self
    }
}

/// A loaded module image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleImage {
    pub name: String,
    pub version: ModuleVersion,
    /// Culture name; empty for the invariant culture.
    #[serde(default)]
    pub culture: String,
    #[serde(default)]
    pub public_key_token: Vec<u8>,
    /// Modules this one depends on, by reference string.
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub types: Vec<TypeShape>,
}

impl ModuleImage {
    pub fn new(name: impl Into<String>, version: ModuleVersion) -> Self {
        Self {
            name: name.into(),
            version,
            culture: String::new(),
            public_key_token: Vec::new(),
            references: Vec::new(),
            types: Vec::new(),
        }
    }

    /// Culture label, with the invariant culture reported as `neutral`.
    pub fn culture_label(&self) -> &str {
        let culture = self.culture.trim();
        if culture.is_empty() || culture.eq_ignore_ascii_case(NEUTRAL_CULTURE) {
            NEUTRAL_CULTURE
        } else {
            culture
        }
    }

    /// Upper-case hex signing token, or `None` when the image is unsigned.
    pub fn signing_token(&self) -> Option<String> {
        if self.public_key_token.is_empty() {
            None
        } else {
            Some(hex::encode_upper(&self.public_key_token))
        }
    }

    /// The reference string another module would use to name this one.
    pub fn full_name(&self) -> String {
        ModuleReference {
            name: self.name.clone(),
            version: Some(self.version),
            culture: Some(self.culture_label().to_string()),
            public_key_token: Some(if self.public_key_token.is_empty() {
                "null".to_string()
            } else {
                hex::encode(&self.public_key_token)
            }),
        }
        .to_string()
    }

    /// Validates the header and decodes the body.
    pub fn decode(bytes: &[u8]) -> Result<Self, ImageError> {
        if bytes.len() < HEADER_LEN {
            return Err(ImageError::TooShort(bytes.len()));
        }
        if &bytes[..MAGIC.len()] != MAGIC || bytes[MAGIC.len()] != 0 {
            return Err(ImageError::BadMagic);
        }
        let format = bytes[HEADER_LEN - 1];
        if format != FORMAT_VERSION {
            return Err(ImageError::UnsupportedVersion(format));
        }

        let image: ModuleImage = serde_json::from_slice(&bytes[HEADER_LEN..])?;
        if image.name.trim().is_empty() {
            return Err(ImageError::MissingName);
        }
        Ok(image)
    }

    pub fn encode(&self) -> Result<Vec<u8>, ImageError> {
        let body = serde_json::to_vec(self)?;
        let mut bytes = Vec::with_capacity(HEADER_LEN + body.len());
        bytes.extend_from_slice(MAGIC);
        bytes.push(0);
        bytes.push(FORMAT_VERSION);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }
}

/// A parsed module reference: `Name[, Version=a.b.c.d][, Culture=x][, PublicKeyToken=hex]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleReference {
    pub name: String,
    pub version: Option<ModuleVersion>,
    pub culture: Option<String>,
    pub public_key_token: Option<String>,
}

/// Error returned for malformed module references.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed module reference `{reference}`: {reason}")]
pub struct ReferenceError {
    pub reference: String,
    pub reason: String,
}

impl ModuleReference {
    pub fn parse(reference: &str) -> Result<Self, ReferenceError> {
        let fail = |reason: &str| ReferenceError {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = reference.split(',').map(str::trim);
        let name = parts.next().unwrap_or_default();
        if name.is_empty() {
            return Err(fail("empty module name"));
        }

        let mut parsed = Self {
            name: name.to_string(),
            version: None,
            culture: None,
            public_key_token: None,
        };

        for part in parts {
            let Some((key, value)) = part.split_once('=') else {
                return Err(fail("expected `Key=Value` after the module name"));
            };
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "version" => {
                    parsed.version = Some(value.parse().map_err(|_| fail("bad version"))?);
                }
                "culture" => parsed.culture = Some(value.to_string()),
                "publickeytoken" => parsed.public_key_token = Some(value.to_string()),
                // Unknown attributes (processor architecture etc.) do not affect identity.
                _ => {}
            }
        }

        Ok(parsed)
    }

    /// True when `image` satisfies every component this reference specifies.
    pub fn matches(&self, image: &ModuleImage) -> bool {
        if !same_name(&self.name, &image.name) {
            return false;
        }
        if let Some(version) = self.version {
            if version != image.version {
                return false;
            }
        }
        if let Some(culture) = &self.culture {
            if !culture.eq_ignore_ascii_case(image.culture_label()) {
                return false;
            }
        }
        if let Some(token) = &self.public_key_token {
            let image_token = if image.public_key_token.is_empty() {
                "null".to_string()
            } else {
                hex::encode(&image.public_key_token)
            };
            if !token.eq_ignore_ascii_case(&image_token) {
                return false;
            }
        }
        true
    }
}

impl fmt::Display for ModuleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(version) = &self.version {
            write!(f, ", Version={version}")?;
        }
        if let Some(culture) = &self.culture {
            write!(f, ", Culture={culture}")?;
        }
        if let Some(token) = &self.public_key_token {
            write!(f, ", PublicKeyToken={token}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ModuleImage {
        let mut image = ModuleImage::new("Contoso.Plugins", ModuleVersion::new(1, 0, 0, 0));
        image.public_key_token = vec![0x31, 0xbf, 0x38, 0x56, 0xad, 0x36, 0x4e, 0x35];
        image.types.push(
            TypeShape::class("Contoso.Plugins.AccountCreate")
                .implementing("Plugreg.Sdk.IPlugin", "Plugreg.Sdk, Version=9.0.0.0"),
        );
        image
    }

    #[test]
    fn decode_rejects_short_and_foreign_files() {
        assert!(matches!(ModuleImage::decode(b"PLG"), Err(ImageError::TooShort(3))));
        assert!(matches!(
            ModuleImage::decode(b"MZ\x90\x00\x03\x00\x00\x00{}"),
            Err(ImageError::BadMagic)
        ));
    }

    #[test]
    fn decode_rejects_unknown_format_version() {
        let mut bytes = sample().encode().unwrap();
        bytes[HEADER_LEN - 1] = 9;
        assert!(matches!(
            ModuleImage::decode(&bytes),
            Err(ImageError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn decode_rejects_truncated_body() {
        let bytes = sample().encode().unwrap();
        let truncated = &bytes[..bytes.len() - 5];
        assert!(matches!(ModuleImage::decode(truncated), Err(ImageError::Body(_))));
    }

    #[test]
    fn encoded_image_decodes_to_same_module() {
        let image = sample();
        assert_eq!(ModuleImage::decode(&image.encode().unwrap()).unwrap(), image);
    }

    #[test]
    fn type_shape_defaults_to_exported_concrete_class() {
        let shape: TypeShape = serde_json::from_str(r#"{"full_name":"A.B"}"#).unwrap();
        assert_eq!(shape.kind, TypeKind::Class);
        assert!(shape.is_exported);
        assert!(!shape.is_abstract);
    }

    #[test]
    fn culture_and_token_labels() {
        let mut image = sample();
        assert_eq!(image.culture_label(), "neutral");
        assert_eq!(image.signing_token().as_deref(), Some("31BF3856AD364E35"));

        image.culture = "de-DE".into();
        image.public_key_token.clear();
        assert_eq!(image.culture_label(), "de-DE");
        assert_eq!(image.signing_token(), None);
    }

    #[test]
    fn full_name_uses_lowercase_token() {
        assert_eq!(
            sample().full_name(),
            "Contoso.Plugins, Version=1.0.0.0, Culture=neutral, PublicKeyToken=31bf3856ad364e35"
        );
    }

    #[test]
    fn reference_parses_all_components() {
        let reference = ModuleReference::parse(
            "Plugreg.Sdk, Version=9.0.2.3, Culture=neutral, PublicKeyToken=31bf3856ad364e35",
        )
        .unwrap();
        assert_eq!(reference.name, "Plugreg.Sdk");
        assert_eq!(reference.version, Some(ModuleVersion::new(9, 0, 2, 3)));
        assert_eq!(reference.culture.as_deref(), Some("neutral"));
        assert_eq!(reference.public_key_token.as_deref(), Some("31bf3856ad364e35"));
    }

    #[test]
    fn reference_accepts_bare_name() {
        let reference = ModuleReference::parse("Plugreg.Sdk").unwrap();
        assert_eq!(reference.name, "Plugreg.Sdk");
        assert!(reference.version.is_none());
    }

    #[test]
    fn reference_rejects_garbage() {
        assert!(ModuleReference::parse("").is_err());
        assert!(ModuleReference::parse("A, Version").is_err());
        assert!(ModuleReference::parse("A, Version=x.y").is_err());
    }

    #[test]
    fn reference_matches_only_specified_components() {
        let image = sample();
        assert!(ModuleReference::parse("contoso.plugins").unwrap().matches(&image));
        assert!(
            ModuleReference::parse("Contoso.Plugins, Version=1.0.0.0, PublicKeyToken=31BF3856AD364E35")
                .unwrap()
                .matches(&image)
        );
        assert!(
            !ModuleReference::parse("Contoso.Plugins, Version=2.0.0.0")
                .unwrap()
                .matches(&image)
        );
        assert!(
            !ModuleReference::parse("Contoso.Plugins, PublicKeyToken=null")
                .unwrap()
                .matches(&image)
        );
    }
}
