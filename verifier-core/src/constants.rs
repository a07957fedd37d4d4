//! Central Configuration Constants
//!
//! Single source of truth for the defaults shared by the core pipeline
//! and the HTTP server.

/// Extension every uploaded chart archive must carry (compared case-insensitively)
pub const ARCHIVE_EXTENSION: &str = ".tgz";

/// Reserved name of the values manifest inside a chart
pub const VALUES_FILE_NAME: &str = "values.yaml";

/// Prefix of every per-request workspace directory
pub const WORKSPACE_PREFIX: &str = "helm-";

/// Default cap on the sum of extracted entry sizes (50 MiB)
pub const DEFAULT_MAX_EXTRACTED_BYTES: u64 = 50 * 1024 * 1024;

/// Default cap on the number of entries in one archive
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// Default cap on the raw upload size (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Default preprocessor artifact path
pub const DEFAULT_PREPROCESSOR_PATH: &str = "preprocessor.json";

/// Default classifier artifact path
pub const DEFAULT_CLASSIFIER_PATH: &str = "ocsvm_model.json";

/// Library version
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");
