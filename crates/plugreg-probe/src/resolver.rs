// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Module reference resolution over a prioritized search path.
//!
//! [`ModuleResolver::resolve`] consults, in order:
//! 1. its own cache (found and not-found outcomes are both cached),
//! 2. the modules already loaded in the calling context,
//! 3. `base_directories × subdirectories`, testing
//!    `{base}/{sub}/{name}.{extension}`; the first existing file that decodes
//!    as a module image wins.
//!
//! The cache lives as long as the resolver, which is normally shared for the
//! whole process. Lookups for the same name are mutually exclusive; different
//! names resolve concurrently.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use plugreg_config::model::ProbeConfig;
use plugreg_core::ModuleSource;
use tracing::{debug, trace};

use crate::context::LoadedModules;
use crate::image::{ModuleImage, ModuleReference};

type Resolution = Option<Arc<ModuleImage>>;

pub struct ModuleResolver {
    base_directories: Vec<PathBuf>,
    subdirectories: Vec<String>,
    extension: String,
    source: Arc<dyn ModuleSource>,
    cache: DashMap<String, Arc<OnceLock<Resolution>>>,
}

impl ModuleResolver {
    pub fn new(
        base_directories: Vec<PathBuf>,
        subdirectories: Vec<String>,
        extension: impl Into<String>,
        source: Arc<dyn ModuleSource>,
    ) -> Self {
        Self {
            base_directories,
            subdirectories,
            extension: extension.into(),
            source,
            cache: DashMap::new(),
        }
    }

    pub fn from_config(config: &ProbeConfig, source: Arc<dyn ModuleSource>) -> Self {
        Self::new(
            config.effective_base_directories(),
            config.subdirectories.clone(),
            config.extension.clone(),
            source,
        )
    }

    /// Candidate paths for a simple module name, in probing order.
    pub fn candidates(&self, simple_name: &str) -> Vec<PathBuf> {
        let file_name = format!("{simple_name}.{}", self.extension);
        let mut paths = Vec::with_capacity(self.base_directories.len() * self.subdirectories.len());
        for base in &self.base_directories {
            for sub in &self.subdirectories {
                let dir = if sub.is_empty() {
                    base.clone()
                } else {
                    base.join(sub)
                };
                paths.push(dir.join(&file_name));
            }
        }
        paths
    }

    /// Resolves a module reference. Never fails: an unresolvable name
    /// yields `None`, and that outcome is cached too.
    pub fn resolve(&self, requested: &str, loaded: &LoadedModules) -> Resolution {
        let outcome = match self.cached(requested) {
            Some(outcome) => {
                trace!(requested, "module resolution served from cache");
                outcome
            }
            None => {
                if let Some(image) = loaded.find(requested) {
                    return Some(image);
                }
                let cell = Arc::clone(&*self.cache.entry(requested.to_string()).or_default());
                cell.get_or_init(|| self.probe(requested)).clone()
            }
        };

        // A hit joins the caller's context even when another context probed it.
        if let Some(image) = &outcome {
            loaded.insert(Arc::clone(image));
        }
        outcome
    }

    /// The cached outcome for `requested`, if resolution already ran.
    pub fn cached(&self, requested: &str) -> Option<Resolution> {
        let cell = self.cache.get(requested).map(|cell| Arc::clone(&cell))?;
        cell.get().cloned()
    }

    /// Number of names with a cache slot.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    fn probe(&self, requested: &str) -> Resolution {
        let reference = match ModuleReference::parse(requested) {
            Ok(reference) => reference,
            Err(e) => {
                debug!(requested, error = %e, "cannot resolve malformed module reference");
                return None;
            }
        };

        for path in self.candidates(&reference.name) {
            if !self.source.exists(&path) {
                continue;
            }

            let bytes = match self.source.read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "skipping unreadable module candidate");
                    continue;
                }
            };

            match ModuleImage::decode(&bytes) {
                Ok(image) => {
                    let image = Arc::new(image);
                    debug!(requested, path = %path.display(), "resolved module reference");
                    return Some(image);
                }
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "skipping module candidate with invalid format");
                }
            }
        }

        debug!(requested, "module reference not found on probe path");
        None
    }
}

impl std::fmt::Debug for ModuleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleResolver")
            .field("base_directories", &self.base_directories)
            .field("subdirectories", &self.subdirectories)
            .field("extension", &self.extension)
            .field("cached", &self.cache.len())
            .finish()
    }
}
