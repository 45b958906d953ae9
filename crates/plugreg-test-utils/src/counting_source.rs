// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Module source that counts filesystem probes.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use plugreg_core::{DiskSource, ModuleSource};

/// Reads from disk like [`DiskSource`], counting `exists` and `read` calls.
#[derive(Debug, Default)]
pub struct CountingSource {
    exists_calls: AtomicUsize,
    read_calls: AtomicUsize,
}

impl CountingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }

    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }
}

impl ModuleSource for CountingSource {
    fn exists(&self, path: &Path) -> bool {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        DiskSource.exists(path)
    }

    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        DiskSource.read(path)
    }
}
