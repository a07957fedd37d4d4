//! Values Locator - values.yaml discovery and parsing
//!
//! Candidates are ordered shallowest first, then by workspace-relative path,
//! so `chart/values.yaml` always wins over `chart/charts/sub/values.yaml`
//! regardless of directory iteration order. Symlinks are never followed.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::constants::VALUES_FILE_NAME;

#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    #[error("values.yaml not found in the Helm chart.")]
    NotFound,

    #[error("values.yaml is malformed: {0}")]
    Malformed(String),

    #[error("Failed to read extracted chart")]
    Io(#[from] std::io::Error),
}

/// A located manifest, relative to the workspace root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedManifest {
    pub absolute: PathBuf,
    pub relative: PathBuf,
}

pub struct ValuesLocator {
    file_name: String,
}

impl ValuesLocator {
    pub fn new() -> Self {
        Self::with_file_name(VALUES_FILE_NAME)
    }

    pub fn with_file_name(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    /// All matches in resolution order
    pub fn candidates(&self, root: &Path) -> Result<Vec<PathBuf>, LocateError> {
        let mut found = Vec::new();
        self.walk(root, root, &mut found)?;
        found.sort_by(|a, b| {
            a.components()
                .count()
                .cmp(&b.components().count())
                .then_with(|| a.cmp(b))
        });
        Ok(found)
    }

    /// The manifest that wins the tie-break
    pub fn locate(&self, root: &Path) -> Result<LocatedManifest, LocateError> {
        let candidates = self.candidates(root)?;
        if candidates.len() > 1 {
            log::debug!("{} values files found, using {}", candidates.len(), candidates[0].display());
        }
        let relative = candidates.into_iter().next().ok_or(LocateError::NotFound)?;
        Ok(LocatedManifest {
            absolute: root.join(&relative),
            relative,
        })
    }

    fn walk(&self, root: &Path, dir: &Path, found: &mut Vec<PathBuf>) -> Result<(), LocateError> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            // DirEntry::file_type does not follow symlinks
            let file_type = entry.file_type()?;
            let path = entry.path();

            if file_type.is_dir() {
                self.walk(root, &path, found)?;
            } else if file_type.is_file() && entry.file_name() == self.file_name.as_str() {
                if let Ok(relative) = path.strip_prefix(root) {
                    found.push(relative.to_path_buf());
                }
            }
        }
        Ok(())
    }
}

impl Default for ValuesLocator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// PARSING
// ============================================================================

/// Parse manifest text. Empty documents become an empty mapping.
pub fn parse_manifest(text: &str) -> Result<Value, LocateError> {
    let value: Value = serde_yaml::from_str(text).map_err(|e| LocateError::Malformed(e.to_string()))?;
    match value {
        Value::Mapping(_) => Ok(value),
        Value::Null => Ok(Value::Mapping(Mapping::new())),
        other => Err(LocateError::Malformed(format!(
            "top level must be a mapping, found {}",
            kind_of(&other)
        ))),
    }
}

/// Read and parse a located manifest
pub fn load_manifest(manifest: &LocatedManifest) -> Result<Value, LocateError> {
    let bytes = fs::read(&manifest.absolute)?;
    let text = String::from_utf8(bytes)
        .map_err(|_| LocateError::Malformed("file is not valid UTF-8".to_string()))?;
    parse_manifest(&text)
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
