//! Logic Module - Verification Pipeline Stages
//!
//! - `archive/` - Upload validation, safe extraction, request workspaces
//! - `locator` - values.yaml discovery and parsing
//! - `features/` - Feature table derivation and unit normalization
//! - `model/` - Preprocessing transform and anomaly classifier contract
//! - `verifier` - Per-request orchestration

pub mod archive;
pub mod locator;
pub mod features;
pub mod model;
pub mod verifier;
