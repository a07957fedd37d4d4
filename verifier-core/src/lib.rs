//! Helm Policy Verifier - Core Pipeline
//!
//! Turns an untrusted Helm chart upload into a fixed-shape feature table
//! and runs it through the anomaly model contract.
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌──────────┐   ┌──────────┐   ┌────────────┐
//! │ .tgz     │──▶│ Workspace │──▶│ values   │──▶│ Feature  │──▶│ Transform  │
//! │ upload   │   │ (extract) │   │ .yaml    │   │ Table    │   │ + OC-SVM   │
//! └──────────┘   └───────────┘   └──────────┘   └──────────┘   └────────────┘
//!                      │                                              │
//!                      └────────── released on every exit ◀───────────┘
//! ```

pub mod constants;
pub mod error;
pub mod logic;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{VerifyError, VerifyResult};
pub use logic::archive::{ExtractionError, ExtractionLimits, UploadedArchive, Workspace};
pub use logic::features::{
    FeatureError, FeatureRow, FeatureTable, NetworkFunction, FEATURE_COUNT, FEATURE_LAYOUT,
};
pub use logic::model::{
    Classifier, InferencePipeline, ModelError, ModelStatus, OneClassSvm, ScalerEncoder, Transform,
};
pub use logic::verifier::{PredictionResult, VerificationReport, Verifier};
