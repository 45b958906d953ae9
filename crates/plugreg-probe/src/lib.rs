// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Module loading, reference resolution, and plugin discovery.
//!
//! A [`ModuleProbe`] opens a fresh [`LoadContext`] per target module, attaches
//! the shared [`ModuleResolver`] so references can be found on the probe path,
//! and runs every type through the pure [`classify`] function to build a
//! `LocalState`.

pub mod classify;
pub mod context;
pub mod image;
pub mod probe;
pub mod resolver;

pub use classify::{classify, Classification, ClassifierRules, PluginContract};
pub use context::{LoadContext, LoadedModules};
pub use image::{ImageError, InterfaceRef, ModuleImage, ModuleReference, TypeKind, TypeShape};
pub use probe::{ModuleProbe, ResolvedReference};
pub use resolver::ModuleResolver;
