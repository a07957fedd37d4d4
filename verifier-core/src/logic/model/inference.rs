//! Inference Pipeline - Transform + Classifier contract
//!
//! Both artifacts are loaded once at startup and shared read-only between
//! requests. Every call checks shapes on the way in and out, so a model
//! trained against another feature layout fails loudly instead of
//! mispredicting.

use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::ocsvm::OneClassSvm;
use super::preprocessor::ScalerEncoder;
use crate::logic::features::layout::{LayoutMismatchError, FEATURE_COUNT, FEATURE_VERSION, layout_hash};
use crate::logic::features::FeatureTable;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to read artifact {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse artifact {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Layout(#[from] LayoutMismatchError),

    #[error("Invalid artifact: {0}")]
    InvalidArtifact(String),

    #[error("Schema mismatch: {0}")]
    Schema(String),

    #[error("Invalid model output: {0}")]
    InvalidOutput(String),
}

// ============================================================================
// INFERENCE TRAITS
// ============================================================================

/// Preprocessing step: feature matrix → model matrix, same row count
pub trait Transform: Send + Sync {
    fn input_width(&self) -> usize;
    fn output_width(&self) -> usize;
    fn describe(&self) -> String;
    fn transform(&self, features: ArrayView2<'_, f64>) -> Result<Array2<f64>, ModelError>;
}

/// Anomaly classifier: one label per row, +1 inlier / -1 outlier
pub trait Classifier: Send + Sync {
    fn input_width(&self) -> usize;
    fn describe(&self) -> String;
    fn predict(&self, matrix: ArrayView2<'_, f64>) -> Result<Vec<i8>, ModelError>;
}

// ============================================================================
// STATUS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub feature_version: u8,
    pub layout_hash: u32,
    pub input_width: usize,
    pub transform_width: usize,
    pub transform: String,
    pub classifier: String,
    pub preprocessor_path: Option<String>,
    pub classifier_path: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct InferencePipeline {
    transform: Box<dyn Transform>,
    classifier: Box<dyn Classifier>,
    sources: Option<(String, String)>,
    loaded_at: DateTime<Utc>,
}

impl InferencePipeline {
    /// Wire a transform to a classifier, refusing incompatible widths
    pub fn new(
        transform: impl Transform + 'static,
        classifier: impl Classifier + 'static,
    ) -> Result<Self, ModelError> {
        if transform.input_width() != FEATURE_COUNT {
            return Err(ModelError::Schema(format!(
                "transform expects {} input columns, feature layout has {}",
                transform.input_width(),
                FEATURE_COUNT
            )));
        }
        if transform.output_width() != classifier.input_width() {
            return Err(ModelError::Schema(format!(
                "transform produces {} columns, classifier expects {}",
                transform.output_width(),
                classifier.input_width()
            )));
        }

        Ok(Self {
            transform: Box::new(transform),
            classifier: Box::new(classifier),
            sources: None,
            loaded_at: Utc::now(),
        })
    }

    /// Load the JSON artifacts from disk
    pub fn load(preprocessor_path: &Path, classifier_path: &Path) -> Result<Self, ModelError> {
        log::info!("Loading preprocessor from: {}", preprocessor_path.display());
        let transform = ScalerEncoder::from_file(preprocessor_path)?;

        log::info!("Loading classifier from: {}", classifier_path.display());
        let classifier = OneClassSvm::from_file(classifier_path)?;

        let mut pipeline = Self::new(transform, classifier)?;
        pipeline.sources = Some((
            preprocessor_path.display().to_string(),
            classifier_path.display().to_string(),
        ));
        log::info!(
            "Model pipeline ready: {} -> {}",
            pipeline.transform.describe(),
            pipeline.classifier.describe()
        );
        Ok(pipeline)
    }

    /// Feature table → model matrix
    pub fn preprocess(&self, table: &FeatureTable) -> Result<Array2<f64>, ModelError> {
        let features = table.to_matrix();
        let rows = features.nrows();

        if features.ncols() != self.transform.input_width() {
            return Err(ModelError::Schema(format!(
                "feature matrix has {} columns, transform expects {}",
                features.ncols(),
                self.transform.input_width()
            )));
        }

        let transformed = self.transform.transform(features.view())?;
        if transformed.dim() != (rows, self.transform.output_width()) {
            return Err(ModelError::InvalidOutput(format!(
                "transform returned shape {:?}, expected ({}, {})",
                transformed.dim(),
                rows,
                self.transform.output_width()
            )));
        }
        Ok(transformed)
    }

    /// Binary labels per row: 1 = inlier ("normal"), 0 = outlier
    pub fn predict(&self, matrix: ArrayView2<'_, f64>) -> Result<Vec<u8>, ModelError> {
        let rows = matrix.nrows();
        if matrix.ncols() != self.classifier.input_width() {
            return Err(ModelError::Schema(format!(
                "matrix has {} columns, classifier expects {}",
                matrix.ncols(),
                self.classifier.input_width()
            )));
        }

        let predictions = self.classifier.predict(matrix)?;
        if predictions.len() != rows {
            return Err(ModelError::InvalidOutput(format!(
                "classifier returned {} labels for {} rows",
                predictions.len(),
                rows
            )));
        }

        predictions
            .into_iter()
            .map(|p| match p {
                1 => Ok(1),
                -1 => Ok(0),
                other => Err(ModelError::InvalidOutput(format!("unexpected label {}", other))),
            })
            .collect()
    }

    pub fn classify(&self, table: &FeatureTable) -> Result<Vec<u8>, ModelError> {
        let start_time = Instant::now();
        let matrix = self.preprocess(table)?;
        let labels = self.predict(matrix.view())?;
        log::debug!("Classified {} rows in {}us", labels.len(), start_time.elapsed().as_micros());
        Ok(labels)
    }

    pub fn status(&self) -> ModelStatus {
        ModelStatus {
            feature_version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            input_width: self.transform.input_width(),
            transform_width: self.transform.output_width(),
            transform: self.transform.describe(),
            classifier: self.classifier.describe(),
            preprocessor_path: self.sources.as_ref().map(|(p, _)| p.clone()),
            classifier_path: self.sources.as_ref().map(|(_, c)| c.clone()),
            loaded_at: self.loaded_at,
        }
    }
}

impl std::fmt::Debug for InferencePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferencePipeline")
            .field("transform", &self.transform.describe())
            .field("classifier", &self.classifier.describe())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::{FeatureRow, NetworkFunction};

    /// Passes the matrix through untouched
    struct Identity(usize);

    impl Transform for Identity {
        fn input_width(&self) -> usize { self.0 }
        fn output_width(&self) -> usize { self.0 }
        fn describe(&self) -> String { "identity".into() }
        fn transform(&self, features: ArrayView2<'_, f64>) -> Result<Array2<f64>, ModelError> {
            Ok(features.to_owned())
        }
    }

    /// Outlier whenever replicas exceed a bound
    struct ReplicaBound(f64);

    impl Classifier for ReplicaBound {
        fn input_width(&self) -> usize { FEATURE_COUNT }
        fn describe(&self) -> String { "replica-bound".into() }
        fn predict(&self, matrix: ArrayView2<'_, f64>) -> Result<Vec<i8>, ModelError> {
            Ok(matrix.rows().into_iter().map(|r| if r[0] > self.0 { -1 } else { 1 }).collect())
        }
    }

    struct Fixed(Vec<i8>);

    impl Classifier for Fixed {
        fn input_width(&self) -> usize { FEATURE_COUNT }
        fn describe(&self) -> String { "fixed".into() }
        fn predict(&self, _matrix: ArrayView2<'_, f64>) -> Result<Vec<i8>, ModelError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_labels_mapped_to_binary() {
        let pipeline = InferencePipeline::new(Identity(FEATURE_COUNT), ReplicaBound(5.0)).unwrap();
        let table = FeatureTable::empty().with_row(FeatureRow {
            replica_count: 10,
            cpu_limit: 1.0,
            memory_limit: 1024,
            network_function: NetworkFunction::Smf,
        });

        assert_eq!(pipeline.classify(&table).unwrap(), vec![1, 0, 1]);
    }

    #[test]
    fn test_rejects_wrong_input_width() {
        let err = InferencePipeline::new(Identity(3), ReplicaBound(5.0)).unwrap_err();
        assert!(matches!(err, ModelError::Schema(_)));
    }

    #[test]
    fn test_rejects_classifier_width_mismatch() {
        struct Wide;
        impl Classifier for Wide {
            fn input_width(&self) -> usize { 7 }
            fn describe(&self) -> String { "wide".into() }
            fn predict(&self, _m: ArrayView2<'_, f64>) -> Result<Vec<i8>, ModelError> { Ok(vec![]) }
        }

        let err = InferencePipeline::new(Identity(FEATURE_COUNT), Wide).unwrap_err();
        assert!(matches!(err, ModelError::Schema(_)));
    }

    #[test]
    fn test_rejects_wrong_label_count() {
        let pipeline = InferencePipeline::new(Identity(FEATURE_COUNT), Fixed(vec![1, 1])).unwrap();
        let err = pipeline.classify(&FeatureTable::empty()).unwrap_err();
        assert!(matches!(err, ModelError::InvalidOutput(_)));
    }

    #[test]
    fn test_rejects_unknown_label() {
        let pipeline = InferencePipeline::new(Identity(FEATURE_COUNT), Fixed(vec![1, 0, -1])).unwrap();
        let err = pipeline.classify(&FeatureTable::empty()).unwrap_err();
        assert!(err.to_string().contains("unexpected label 0"));
    }

    #[test]
    fn test_status_reports_layout() {
        let pipeline = InferencePipeline::new(Identity(FEATURE_COUNT), ReplicaBound(1.0)).unwrap();
        let status = pipeline.status();

        assert_eq!(status.feature_version, FEATURE_VERSION);
        assert_eq!(status.layout_hash, layout_hash());
        assert_eq!(status.classifier, "replica-bound");
        assert_eq!(status.preprocessor_path, None);
    }

    #[test]
    fn test_load_from_files() {
        use crate::test_support::{classifier_json, preprocessor_json};

        let dir = tempfile::TempDir::new().unwrap();
        let pre = dir.path().join("preprocessor.json");
        let clf = dir.path().join("ocsvm_model.json");
        std::fs::write(&pre, preprocessor_json()).unwrap();
        std::fs::write(&clf, classifier_json()).unwrap();

        let pipeline = InferencePipeline::load(&pre, &clf).unwrap();
        let table = FeatureTable::empty().with_row(FeatureRow {
            replica_count: 7,
            cpu_limit: 0.5,
            memory_limit: 1 << 30,
            network_function: NetworkFunction::Pcf,
        });

        assert_eq!(pipeline.classify(&table).unwrap(), vec![1, 1, 0]);
        assert_eq!(pipeline.status().transform_width, 6);
        assert_eq!(pipeline.status().classifier_path, Some(clf.display().to_string()));
    }

    #[test]
    fn test_load_rejects_width_mismatch() {
        use crate::test_support::preprocessor_json;

        let dir = tempfile::TempDir::new().unwrap();
        let pre = dir.path().join("preprocessor.json");
        let clf = dir.path().join("ocsvm_model.json");
        std::fs::write(&pre, preprocessor_json()).unwrap();
        std::fs::write(
            &clf,
            r#"{ "kernel": "rbf", "gamma": 0.1, "support_vectors": [[0.0, 0.0, 0.0, 0.0]], "dual_coef": [1.0], "intercept": 0.0 }"#,
        )
        .unwrap();

        assert!(matches!(InferencePipeline::load(&pre, &clf), Err(ModelError::Schema(_))));
    }
}
