// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Isolated load contexts.
//!
//! Every probe opens a fresh [`LoadContext`]: modules loaded while
//! inspecting one target never leak into the next. References that are not
//! already loaded are handed to the attached [`ModuleResolver`].

use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use plugreg_core::{ModuleSource, PlugregError};
use tracing::debug;

use crate::image::{ModuleImage, ModuleReference};
use crate::resolver::ModuleResolver;

/// Modules loaded into one context, keyed by full name.
#[derive(Debug, Default)]
pub struct LoadedModules {
    modules: DashMap<String, Arc<ModuleImage>>,
}

impl LoadedModules {
    pub fn insert(&self, image: Arc<ModuleImage>) {
        self.modules.insert(image.full_name(), image);
    }

    /// Finds a loaded module satisfying the given reference string.
    pub fn find(&self, requested: &str) -> Option<Arc<ModuleImage>> {
        if let Some(image) = self.modules.get(requested) {
            return Some(Arc::clone(&image));
        }
        let reference = ModuleReference::parse(requested).ok()?;
        self.modules
            .iter()
            .find(|entry| reference.matches(entry.value()))
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// A disposable context modules are loaded into.
pub struct LoadContext {
    source: Arc<dyn ModuleSource>,
    resolver: Option<Arc<ModuleResolver>>,
    loaded: LoadedModules,
}

impl LoadContext {
    pub fn new(source: Arc<dyn ModuleSource>) -> Self {
        Self {
            source,
            resolver: None,
            loaded: LoadedModules::default(),
        }
    }

    /// Installs the resolution hook. Attaching again replaces the previous
    /// resolver instead of chaining it.
    pub fn attach(&mut self, resolver: Arc<ModuleResolver>) {
        if self.resolver.replace(resolver).is_some() {
            debug!("replaced module resolver on load context");
        }
    }

    pub fn detach(&mut self) {
        self.resolver = None;
    }

    pub fn has_resolver(&self) -> bool {
        self.resolver.is_some()
    }

    pub fn loaded(&self) -> &LoadedModules {
        &self.loaded
    }

    /// Loads the image at `path` into this context.
    ///
    /// Unlike resolution probing, an invalid image here is an error.
    pub fn load_from(&self, path: &Path) -> Result<Arc<ModuleImage>, PlugregError> {
        let bytes = self.source.read(path).map_err(|source| PlugregError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let image = ModuleImage::decode(&bytes).map_err(|e| PlugregError::InvalidBinaryFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let image = Arc::new(image);
        self.loaded.insert(Arc::clone(&image));
        debug!(module = %image.name, version = %image.version, path = %path.display(), "loaded module image");
        Ok(image)
    }

    /// Loads a referenced module: already-loaded modules first, then the
    /// attached resolver. `None` when neither can supply it.
    pub fn load_reference(&self, requested: &str) -> Option<Arc<ModuleImage>> {
        if let Some(image) = self.loaded.find(requested) {
            return Some(image);
        }
        self.resolver
            .as_ref()
            .and_then(|resolver| resolver.resolve(requested, &self.loaded))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use plugreg_core::ModuleVersion;

    use super::*;

    #[derive(Default)]
    struct MapSource {
        files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    }

    impl MapSource {
        fn with(self, path: &str, image: &ModuleImage) -> Self {
            self.files
                .lock()
                .unwrap()
                .insert(PathBuf::from(path), image.encode().unwrap());
            self
        }
    }

    impl ModuleSource for MapSource {
        fn exists(&self, path: &Path) -> bool {
            self.files.lock().unwrap().contains_key(path)
        }

        fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
            self.files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))
        }
    }

    #[test]
    fn load_from_registers_module_as_loaded() {
        let image = ModuleImage::new("Contoso.Plugins", ModuleVersion::new(1, 2, 0, 0));
        let source = Arc::new(MapSource::default().with("/m/Contoso.Plugins.module", &image));
        let ctx = LoadContext::new(source);

        ctx.load_from(Path::new("/m/Contoso.Plugins.module")).unwrap();
        assert_eq!(ctx.loaded().len(), 1);
        assert!(ctx.loaded().find("Contoso.Plugins, Version=1.2.0.0").is_some());
        assert!(ctx.load_reference("Contoso.Plugins").is_some());
    }

    #[test]
    fn load_from_rejects_invalid_image() {
        let source = Arc::new(MapSource::default());
        source
            .files
            .lock()
            .unwrap()
            .insert(PathBuf::from("/m/bad.module"), b"not a module".to_vec());
        let ctx = LoadContext::new(source);

        let err = ctx.load_from(Path::new("/m/bad.module")).unwrap_err();
        assert!(matches!(err, PlugregError::InvalidBinaryFormat { .. }));
        assert!(ctx.loaded().is_empty());
    }

    #[test]
    fn reference_without_resolver_is_unresolved() {
        let ctx = LoadContext::new(Arc::new(MapSource::default()));
        assert!(!ctx.has_resolver());
        assert!(ctx.load_reference("Plugreg.Sdk, Version=9.0.0.0").is_none());
    }

    #[test]
    fn attach_replaces_previous_resolver() {
        let source: Arc<dyn ModuleSource> = Arc::new(MapSource::default());
        let first = Arc::new(ModuleResolver::new(
            vec![PathBuf::from("/first")],
            vec![String::new()],
            "module",
            Arc::clone(&source),
        ));
        let second = Arc::new(ModuleResolver::new(
            vec![PathBuf::from("/second")],
            vec![String::new()],
            "module",
            Arc::clone(&source),
        ));

        let mut ctx = LoadContext::new(source);
        ctx.attach(Arc::clone(&first));
        ctx.attach(Arc::clone(&second));
        assert!(ctx.has_resolver());

        // Only the second resolver sees the lookup.
        assert!(ctx.load_reference("Missing").is_none());
        assert_eq!(first.cache_len(), 0);
        assert_eq!(second.cache_len(), 1);

        ctx.detach();
        assert!(!ctx.has_resolver());
    }
}
