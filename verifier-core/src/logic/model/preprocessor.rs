//! Preprocessor - standard scaling + one-hot encoding
//!
//! Artifact (JSON):
//! ```json
//! {
//!   "feature_version": 1,
//!   "layout_hash": 305419896,
//!   "feature_names": ["replica_count", "cpu_limit", "memory_limit", "network_function"],
//!   "numeric": { "columns": ["replica_count", "cpu_limit", "memory_limit"],
//!                "mean": [2.0, 0.5, 5.0e8], "scale": [1.0, 0.25, 2.5e8] },
//!   "categorical": { "column": "network_function", "categories": ["AMF", "SMF", "PCF"] }
//! }
//! ```
//! Output columns: scaled numeric columns in artifact order, then one
//! indicator column per category. A category missing from the list encodes
//! as all zeros.

use std::path::Path;

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::inference::{ModelError, Transform};
use crate::logic::features::layout::{
    feature_index, feature_name, names_match, validate_layout, FEATURE_COUNT, FEATURE_LAYOUT,
    NETWORK_FUNCTION_COLUMN,
};
use crate::logic::features::NetworkFunction;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericScaling {
    pub columns: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoding {
    pub column: String,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerEncoderArtifact {
    feature_version: u8,
    layout_hash: u32,
    feature_names: Vec<String>,
    numeric: NumericScaling,
    categorical: OneHotEncoding,
}

/// Validated preprocessor, ready to transform feature matrices
#[derive(Debug, Clone)]
pub struct ScalerEncoder {
    numeric: NumericScaling,
    categories: Vec<NetworkFunction>,
    /// Column in the feature matrix for each numeric entry
    numeric_index: Vec<usize>,
}

impl ScalerEncoder {
    pub fn new(numeric: NumericScaling, categorical: OneHotEncoding) -> Result<Self, ModelError> {
        if numeric.mean.len() != numeric.columns.len() || numeric.scale.len() != numeric.columns.len() {
            return Err(ModelError::InvalidArtifact(format!(
                "numeric scaling has {} columns, {} means and {} scales",
                numeric.columns.len(),
                numeric.mean.len(),
                numeric.scale.len()
            )));
        }
        if numeric.mean.iter().chain(numeric.scale.iter()).any(|v| !v.is_finite()) {
            return Err(ModelError::InvalidArtifact("numeric scaling contains non-finite values".into()));
        }

        let mut numeric_index = Vec::with_capacity(numeric.columns.len());
        for column in &numeric.columns {
            let index = feature_index(column)
                .ok_or_else(|| ModelError::Schema(format!("unknown numeric column '{}'", column)))?;
            if index == NETWORK_FUNCTION_COLUMN {
                return Err(ModelError::Schema(format!("'{}' is categorical", column)));
            }
            if numeric_index.contains(&index) {
                return Err(ModelError::Schema(format!("numeric column '{}' listed twice", column)));
            }
            numeric_index.push(index);
        }

        if Some(categorical.column.as_str()) != feature_name(NETWORK_FUNCTION_COLUMN) {
            return Err(ModelError::Schema(format!(
                "categorical column must be '{}', got '{}'",
                FEATURE_LAYOUT[NETWORK_FUNCTION_COLUMN],
                categorical.column
            )));
        }

        let mut categories = Vec::with_capacity(categorical.categories.len());
        for name in &categorical.categories {
            let nf = NetworkFunction::ALL
                .into_iter()
                .find(|nf| nf.as_str() == name)
                .ok_or_else(|| ModelError::Schema(format!("unknown category '{}'", name)))?;
            if categories.contains(&nf) {
                return Err(ModelError::Schema(format!("category '{}' listed twice", name)));
            }
            categories.push(nf);
        }

        if numeric_index.is_empty() && categories.is_empty() {
            return Err(ModelError::InvalidArtifact("preprocessor produces no columns".into()));
        }

        Ok(Self {
            numeric,
            categories,
            numeric_index,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        let artifact: ScalerEncoderArtifact = serde_json::from_str(text).map_err(|e| ModelError::Parse {
            path: "<inline>".into(),
            source: e,
        })?;
        Self::from_artifact(artifact)
    }

    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path).map_err(|e| ModelError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let artifact: ScalerEncoderArtifact = serde_json::from_str(&text).map_err(|e| ModelError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_artifact(artifact)
    }

    fn from_artifact(artifact: ScalerEncoderArtifact) -> Result<Self, ModelError> {
        if !names_match(&artifact.feature_names) {
            return Err(ModelError::Schema(format!(
                "preprocessor was fitted on {:?}, expected {:?}",
                artifact.feature_names, FEATURE_LAYOUT
            )));
        }
        validate_layout(artifact.feature_version, artifact.layout_hash)?;
        Self::new(artifact.numeric, artifact.categorical)
    }

    /// Zero scale means a constant column; leave it centred but unscaled
    fn scale_at(&self, i: usize) -> f64 {
        let scale = self.numeric.scale[i];
        if scale == 0.0 { 1.0 } else { scale }
    }
}

impl Transform for ScalerEncoder {
    fn input_width(&self) -> usize {
        FEATURE_COUNT
    }

    fn output_width(&self) -> usize {
        self.numeric_index.len() + self.categories.len()
    }

    fn describe(&self) -> String {
        format!(
            "scaler-encoder({} numeric, {} categories)",
            self.numeric_index.len(),
            self.categories.len()
        )
    }

    fn transform(&self, features: ArrayView2<'_, f64>) -> Result<Array2<f64>, ModelError> {
        if features.ncols() != FEATURE_COUNT {
            return Err(ModelError::Schema(format!(
                "expected {} feature columns, got {}",
                FEATURE_COUNT,
                features.ncols()
            )));
        }

        let numeric_width = self.numeric_index.len();
        let mut output = Array2::<f64>::zeros((features.nrows(), self.output_width()));

        for (r, row) in features.rows().into_iter().enumerate() {
            for (i, &column) in self.numeric_index.iter().enumerate() {
                output[[r, i]] = (row[column] - self.numeric.mean[i]) / self.scale_at(i);
            }

            let code = row[NETWORK_FUNCTION_COLUMN];
            let nf = if code.fract() == 0.0 && code >= 0.0 {
                NetworkFunction::from_code(code as usize)
            } else {
                None
            }
            .ok_or_else(|| ModelError::Schema(format!("invalid network function code {}", code)))?;

            if let Some(position) = self.categories.iter().position(|c| *c == nf) {
                output[[r, numeric_width + position]] = 1.0;
            }
        }

        Ok(output)
    }
}
