//! Model Module - Preprocessing + anomaly classification
//!
//! Two JSON artifacts behind two traits, so either half can be swapped
//! without touching the request path.

pub mod inference;
pub mod preprocessor;
pub mod ocsvm;

// Re-export common types
pub use inference::{Classifier, InferencePipeline, ModelError, ModelStatus, Transform};
pub use preprocessor::{NumericScaling, OneHotEncoding, ScalerEncoder};
pub use ocsvm::{Kernel, OneClassSvm};
