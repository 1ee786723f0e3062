use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path};
use std::time::Instant;

use walkdir::WalkDir;

use crate::compression::{Compression, CompressionRegistry};
use crate::error::{Error, Result};
use crate::logging::LoggingExt;

/// Compressed variants available for one logical path, in registry
/// preference order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileEntry {
    compressions: Vec<Compression>,
}

impl FileEntry {
    pub fn compressions(&self) -> &[Compression] {
        &self.compressions
    }
}

/// Logical request path (`/js/main.js`) to its compressed variants.
///
/// Built once at startup and read concurrently afterwards; files added on
/// disk later are not picked up.
#[derive(Debug, Clone, Default)]
pub struct VariantIndex {
    files: HashMap<String, FileEntry>,
}

impl VariantIndex {
    /// Scans `root` for pre-compressed files known to `registry`.
    ///
    /// A directory root is walked recursively and keys are relative to it.
    /// A file root only looks at its siblings named `{file}{suffix}`.
    pub fn build(root: &Path, registry: &CompressionRegistry) -> Result<Self> {
        let start_time = Instant::now();
        let metadata = match fs::metadata(root) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::RootNotFound(root.to_path_buf()))
            }
            Err(e) => return Err(Error::io(root, e)),
        };

        let mut builder = IndexBuilder::new(registry);
        if metadata.is_dir() {
            builder.scan_directory(root)?;
        } else {
            builder.scan_siblings(root)?;
        }
        let index = builder.finish();

        log::info!(
            "Indexed {} compressed path(s) under {} in {:?}",
            index.len(),
            root.display(),
            start_time.elapsed()
        );
        Ok(index)
    }

    pub fn get(&self, path: &str) -> Option<&FileEntry> {
        self.files.get(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}

struct IndexBuilder<'a> {
    registry: &'a CompressionRegistry,
    // registry positions per logical path
    found: HashMap<String, Vec<usize>>,
}

impl<'a> IndexBuilder<'a> {
    fn new(registry: &'a CompressionRegistry) -> Self {
        Self {
            registry,
            found: HashMap::new(),
        }
    }

    fn scan_directory(&mut self, root: &Path) -> Result<()> {
        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(root).map_err(|e| {
                Error::io(entry.path(), io::Error::new(io::ErrorKind::InvalidData, e))
            })?;

            match logical_path(relative) {
                Some(candidate) => {
                    self.add_candidate(&candidate);
                }
                None => log::warn!("Skipping non UTF-8 path: {}", entry.path().display()),
            }
        }
        Ok(())
    }

    fn scan_siblings(&mut self, file: &Path) -> Result<()> {
        let file_name = match file.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => {
                log::warn!("Root file has no usable name: {}", file.display());
                return Ok(());
            }
        };
        let parent = match file.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let entries = parent.log_operation("read_dir", || {
            fs::read_dir(parent).map_err(|e| Error::io(parent, e))
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(parent, e))?;
            if let Some(name) = entry.file_name().to_str() {
                if name.starts_with(&file_name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();

        let expected = format!("/{}", file_name);
        for name in names {
            let candidate = format!("/{}", name);
            match self.registry.match_suffix(&candidate) {
                Some((_, c)) if candidate.strip_suffix(c.suffix()) == Some(expected.as_str()) => {
                    self.add_candidate(&candidate);
                }
                Some(_) => log::debug!("Ignoring near-miss sibling {}", candidate),
                None => {}
            }
        }
        Ok(())
    }

    /// Files matching no registered suffix are originals and stay unindexed.
    fn add_candidate(&mut self, candidate: &str) -> bool {
        let Some((position, compression)) = self.registry.match_suffix(candidate) else {
            return false;
        };

        let Some(key) = candidate.strip_suffix(compression.suffix()) else {
            return false;
        };
        // a bare suffix such as "/.gz" has no original to stand for
        if key.is_empty() || key.ends_with('/') {
            return false;
        }

        log::debug!("Found {} variant for {}", compression.encoding(), key);
        self.found.entry(key.to_string()).or_default().push(position);
        true
    }

    fn finish(self) -> VariantIndex {
        let registry: Vec<&Compression> = self.registry.iter().collect();
        let files = self
            .found
            .into_iter()
            .map(|(key, mut positions)| {
                positions.sort_unstable();
                positions.dedup();
                let compressions = positions
                    .into_iter()
                    .map(|p| registry[p].clone())
                    .collect();
                (key, FileEntry { compressions })
            })
            .collect();
        VariantIndex { files }
    }
}

/// `a/b/c.js` -> `/a/b/c.js`, whatever the host separator.
fn logical_path(relative: &Path) -> Option<String> {
    let mut logical = String::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            logical.push('/');
            logical.push_str(part.to_str()?);
        }
    }
    Some(logical)
}
