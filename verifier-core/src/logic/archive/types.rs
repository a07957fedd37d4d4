//! Archive Types

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::{ARCHIVE_EXTENSION, DEFAULT_MAX_ENTRIES, DEFAULT_MAX_EXTRACTED_BYTES};

// ============================================================================
// UPLOAD
// ============================================================================

/// Raw chart upload as received from the client. Request-scoped.
#[derive(Clone)]
pub struct UploadedArchive {
    /// Filename claimed by the client (echoed back in the report)
    pub filename: String,
    /// Compressed payload
    pub bytes: Vec<u8>,
}

impl UploadedArchive {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Extension check on the claimed filename, ASCII case-insensitive
    pub fn has_archive_extension(&self) -> bool {
        let name = self.filename.to_ascii_lowercase();
        name.len() > ARCHIVE_EXTENSION.len() && name.ends_with(ARCHIVE_EXTENSION)
    }

    /// Hex SHA-256 of the payload, for log correlation
    pub fn sha256(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        hex::encode(hasher.finalize())
    }
}

impl std::fmt::Debug for UploadedArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedArchive")
            .field("filename", &self.filename)
            .field("size", &self.bytes.len())
            .finish()
    }
}

// ============================================================================
// LIMITS
// ============================================================================

/// Tar-bomb limits applied while unpacking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionLimits {
    /// Maximum sum of regular file sizes
    pub max_total_bytes: u64,
    /// Maximum number of archive entries (all kinds)
    pub max_entries: usize,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            max_total_bytes: DEFAULT_MAX_EXTRACTED_BYTES,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

/// What an extraction wrote
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionSummary {
    pub entries: usize,
    pub files: usize,
    pub directories: usize,
    pub links: usize,
    pub total_bytes: u64,
}

// ============================================================================
// ERRORS
// ============================================================================

/// Failure while validating or unpacking an upload.
///
/// `Display` output is safe to return to clients: it never contains
/// server-side paths. Low-level detail lives in `detail` and is logged.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Invalid file type '{filename}'. Please upload a .tgz Helm chart.")]
    InvalidExtension { filename: String },

    #[error("Archive is malformed or truncated")]
    Malformed { detail: String },

    #[error("Archive entry '{path}' rejected: {reason}")]
    DisallowedEntry { path: String, reason: String },

    #[error("Archive exceeds the extracted size limit of {limit} bytes")]
    SizeLimitExceeded { limit: u64 },

    #[error("Archive exceeds the limit of {limit} entries")]
    TooManyEntries { limit: usize },

    #[error("Workspace I/O failure")]
    Workspace {
        #[source]
        source: std::io::Error,
    },
}

impl ExtractionError {
    pub(crate) fn malformed(err: impl std::fmt::Display) -> Self {
        ExtractionError::Malformed {
            detail: err.to_string(),
        }
    }

    pub(crate) fn disallowed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ExtractionError::DisallowedEntry {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Anything but a server-side workspace failure is the client's fault
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ExtractionError::Workspace { .. })
    }

    /// Diagnostic detail for logs (never returned to callers)
    pub fn detail(&self) -> Option<String> {
        match self {
            ExtractionError::Malformed { detail } => Some(detail.clone()),
            ExtractionError::Workspace { source } => Some(source.to_string()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ExtractionError {
    fn from(source: std::io::Error) -> Self {
        ExtractionError::Workspace { source }
    }
}
