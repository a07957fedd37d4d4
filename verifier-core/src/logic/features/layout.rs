//! Feature Layout - Centralized Feature Definition
//!
//! **This file controls the feature schema shared with the model artifacts**
//!
//! ## Rules:
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION
//!
//! Artifacts record the version and hash they were trained against; a
//! mismatch is refused at load time instead of silently mispredicting.

use crc32fast::Hasher;

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Column names of the feature matrix, in order
pub const FEATURE_LAYOUT: &[&str] = &[
    "replica_count",    // 0: replicas (count)
    "cpu_limit",        // 1: CPU limit (cores)
    "memory_limit",     // 2: memory limit (bytes)
    "network_function", // 3: ordinal code (AMF=0, SMF=1, PCF=2)
];

/// Must match FEATURE_LAYOUT.len()
pub const FEATURE_COUNT: usize = 4;

/// Index of the categorical column
pub const NETWORK_FUNCTION_COLUMN: usize = 3;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 over version + names, used to detect layout mismatches
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[FEATURE_VERSION]);

    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutMismatchError {
    pub expected_version: u8,
    pub expected_hash: u32,
    pub actual_version: u8,
    pub actual_hash: u32,
}

impl std::fmt::Display for LayoutMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Feature layout mismatch: expected v{} (hash: {:08x}), got v{} (hash: {:08x})",
            self.expected_version,
            self.expected_hash,
            self.actual_version,
            self.actual_hash
        )
    }
}

impl std::error::Error for LayoutMismatchError {}

pub fn validate_layout(incoming_version: u8, incoming_hash: u32) -> Result<(), LayoutMismatchError> {
    let current_hash = layout_hash();

    if incoming_version != FEATURE_VERSION || incoming_hash != current_hash {
        return Err(LayoutMismatchError {
            expected_version: FEATURE_VERSION,
            expected_hash: current_hash,
            actual_version: incoming_version,
            actual_hash: incoming_hash,
        });
    }

    Ok(())
}

/// Same names in the same order as FEATURE_LAYOUT
pub fn names_match(names: &[String]) -> bool {
    names.len() == FEATURE_COUNT
        && names.iter().zip(FEATURE_LAYOUT.iter()).all(|(a, b)| a == b)
}

pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}

pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURE_LAYOUT.get(index).copied()
}
