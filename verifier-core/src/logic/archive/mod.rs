//! Archive Module - Untrusted Upload Handling
//!
//! Extension check, bounded .tgz extraction, and the per-request
//! workspace the chart is unpacked into.

pub mod types;
pub mod extract;
pub mod workspace;


// Re-export common types
pub use types::{ExtractionError, ExtractionLimits, ExtractionSummary, UploadedArchive};
pub use extract::ArchiveExtractor;
pub use workspace::Workspace;
