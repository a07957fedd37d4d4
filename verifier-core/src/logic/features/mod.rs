//! Features Module - Feature Extraction Engine
//!
//! values.yaml → fixed three-row feature table → model matrix.
//! Unit normalization lives in `quantity`, the column schema in `layout`.

pub mod layout;
pub mod quantity;
pub mod table;
pub mod extract;

#[cfg(test)]
mod tests;

// Re-export common types
pub use layout::{FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION, layout_hash};
pub use table::{FeatureRow, FeatureTable, NetworkFunction};
pub use extract::{FeatureError, FeatureExtractor};
pub use quantity::{parse_quantity, QuantityError};
