//! File loader for `!base` and `!include` references.

use crate::error::{Result, UpError};
use std::fs;
use std::path::{Path, PathBuf};

/// A document source read from disk.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    /// Canonical absolute path, used as the identity of the file.
    pub path: PathBuf,
    pub source: String,
}

impl LoadedSource {
    /// Directory that references inside this file resolve against.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Loads referenced documents and tracks the active include chain.
///
/// A path is on the chain only while its document is being processed, so
/// the same file may appear in two independent branches.
#[derive(Debug, Default)]
pub struct TemplateLoader {
    include_stack: Vec<PathBuf>,
}

impl TemplateLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `reference` against `base_dir` and read it.
    pub fn load(&self, base_dir: &Path, reference: &str) -> Result<LoadedSource> {
        self.load_path(&resolve_reference(base_dir, reference))
    }

    pub fn load_path(&self, requested: &Path) -> Result<LoadedSource> {
        let path = requested
            .canonicalize()
            .map_err(|source| UpError::LoadError {
                path: requested.to_path_buf(),
                source,
            })?;

        if self.include_stack.contains(&path) {
            return Err(UpError::CircularInclude { path });
        }

        let source = fs::read_to_string(&path).map_err(|source| UpError::LoadError {
            path: requested.to_path_buf(),
            source,
        })?;
        Ok(LoadedSource { path, source })
    }

    /// Push a canonical path onto the chain for circular detection
    pub fn push_include(&mut self, path: &Path) {
        self.include_stack.push(path.to_path_buf());
    }

    /// Pop the innermost path from the chain
    pub fn pop_include(&mut self) {
        self.include_stack.pop();
    }

    pub fn depth(&self) -> usize {
        self.include_stack.len()
    }

    pub fn clear(&mut self) {
        self.include_stack.clear();
    }
}

fn resolve_reference(base_dir: &Path, reference: &str) -> PathBuf {
    let reference = Path::new(reference.trim());
    if reference.is_absolute() {
        reference.to_path_buf()
    } else {
        base_dir.join(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_relative_reference() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("base.up"), "name base\n").unwrap();

        let loader = TemplateLoader::new();
        let loaded = loader.load(dir.path(), "base.up").unwrap();
        assert_eq!(loaded.source, "name base\n");
        assert!(loaded.path.is_absolute());
        assert_eq!(loaded.dir(), dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let loader = TemplateLoader::new();
        let result = loader.load(dir.path(), "missing.up");
        match result {
            Err(UpError::LoadError { path, .. }) => assert!(path.ends_with("missing.up")),
            other => panic!("expected load error, got {other:?}"),
        }
    }

    #[test]
    fn test_circular_include_detection() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.up");
        fs::write(&file, "a 1\n").unwrap();

        let mut loader = TemplateLoader::new();
        let canonical = file.canonicalize().unwrap();
        loader.push_include(&canonical);

        let result = loader.load(dir.path(), "./a.up");
        assert!(matches!(result, Err(UpError::CircularInclude { .. })));

        loader.pop_include();
        assert_eq!(loader.depth(), 0);
        assert!(loader.load(dir.path(), "a.up").is_ok());
    }
}
