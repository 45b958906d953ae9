// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-existence and byte-read primitive used by probing and resolution.

use std::path::Path;

/// Read-only access to module files.
pub trait ModuleSource: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;
}

/// The local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskSource;

impl ModuleSource for DiskSource {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}
