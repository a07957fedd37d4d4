//! Configuration module

use std::env;
use std::path::PathBuf;

use helm_verifier_core::constants::{
    DEFAULT_CLASSIFIER_PATH, DEFAULT_MAX_ENTRIES, DEFAULT_MAX_EXTRACTED_BYTES, DEFAULT_MAX_UPLOAD_BYTES,
    DEFAULT_PREPROCESSOR_PATH,
};
use helm_verifier_core::ExtractionLimits;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Preprocessor artifact (JSON)
    pub preprocessor_path: PathBuf,

    /// One-Class SVM artifact (JSON)
    pub classifier_path: PathBuf,

    /// Parent directory of per-request workspaces
    pub workspace_dir: PathBuf,

    /// Request body cap, enforced before the handler runs
    pub max_upload_bytes: usize,

    /// Cap on the sum of extracted file sizes
    pub max_extracted_bytes: u64,

    /// Cap on archive entries
    pub max_archive_entries: usize,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),

            preprocessor_path: lookup("PREPROCESSOR_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PREPROCESSOR_PATH)),

            classifier_path: lookup("CLASSIFIER_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CLASSIFIER_PATH)),

            workspace_dir: lookup("WORKSPACE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),

            max_upload_bytes: lookup("MAX_UPLOAD_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),

            max_extracted_bytes: lookup("MAX_EXTRACTED_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_EXTRACTED_BYTES),

            max_archive_entries: lookup("MAX_ARCHIVE_ENTRIES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_ENTRIES),

            environment: lookup("ENVIRONMENT")
                .unwrap_or_else(|| "development".to_string()),
        }
    }

    pub fn extraction_limits(&self) -> ExtractionLimits {
        ExtractionLimits {
            max_total_bytes: self.max_extracted_bytes,
            max_entries: self.max_archive_entries,
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
