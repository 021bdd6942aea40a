//! In-memory OOXML package.
//!
//! A `.docx` file is a zip archive of XML parts. Archiving stays outside this
//! crate: a [`Package`] is built from part bytes or from an extracted
//! directory and written back the same way.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::TemplateError;

/// Main document part every package must contain.
pub const MAIN_DOCUMENT: &str = "word/document.xml";
/// Content type registry part.
pub const CONTENT_TYPES: &str = "[Content_Types].xml";

/// Part store keyed by package path (`word/document.xml`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    parts: BTreeMap<String, Vec<u8>>,
}

impl Package {
    /// Create an empty package.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a package from `(name, bytes)` pairs.
    pub fn from_parts<I, N, B>(parts: I) -> Self
    where
        I: IntoIterator<Item = (N, B)>,
        N: Into<String>,
        B: Into<Vec<u8>>,
    {
        Self {
            parts: parts
                .into_iter()
                .map(|(name, bytes)| (name.into(), bytes.into()))
                .collect(),
        }
    }

    /// Load every file below an extracted package directory.
    ///
    /// Files that cannot be read are logged and skipped.
    pub fn from_dir(dir: &Path) -> Result<Self, TemplateError> {
        let mut package = Self::new();
        package.load_dir(dir, dir)?;
        tracing::debug!(dir = %dir.display(), parts = package.parts.len(), "Loaded package");
        Ok(package)
    }

    fn load_dir(&mut self, root: &Path, dir: &Path) -> Result<(), TemplateError> {
        let entries = fs::read_dir(dir).map_err(|source| TemplateError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                self.load_dir(root, &path)?;
                continue;
            }
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            match fs::read(&path) {
                Ok(bytes) => {
                    self.parts.insert(name, bytes);
                }
                Err(err) => {
                    tracing::warn!(part = %name, error = %err, "Skipping unreadable package entry");
                }
            }
        }
        Ok(())
    }

    /// Write every part below `dir`, creating directories as needed.
    pub fn write_dir(&self, dir: &Path) -> Result<(), TemplateError> {
        for (name, bytes) in &self.parts {
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|source| TemplateError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::write(&path, bytes).map_err(|source| TemplateError::Io { path, source })?;
        }
        Ok(())
    }

    /// Part bytes by name.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(Vec::as_slice)
    }

    /// Insert or replace a part.
    pub fn set(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.parts.insert(name.into(), bytes.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    /// Part names in sorted order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}
