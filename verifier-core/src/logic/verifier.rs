//! Verifier - per-request orchestration
//!
//! Received → Validated → Extracted → ValuesLocated → ManifestParsed
//! → FeaturesExtracted → Preprocessed → Classified → Responded
//!
//! Released is entered from every point once a workspace exists.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{VerifyError, VerifyResult};
use crate::logic::archive::{ArchiveExtractor, ExtractionLimits, UploadedArchive, Workspace};
use crate::logic::features::{FeatureExtractor, FeatureRow, FeatureTable};
use crate::logic::locator::{load_manifest, ValuesLocator};
use crate::logic::model::InferencePipeline;

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    #[serde(flatten)]
    pub row: FeatureRow,
    /// 1 = inlier, 0 = outlier
    pub predicted_label: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub helm_file: String,
    pub predictions: Vec<PredictionResult>,
}

impl VerificationReport {
    fn build(helm_file: String, table: FeatureTable, labels: Vec<u8>) -> Self {
        let predictions = table
            .into_rows()
            .into_iter()
            .zip(labels)
            .map(|(row, predicted_label)| PredictionResult { row, predicted_label })
            .collect();

        Self { helm_file, predictions }
    }

    pub fn outliers(&self) -> impl Iterator<Item = &PredictionResult> {
        self.predictions.iter().filter(|p| p.predicted_label == 0)
    }
}

// ============================================================================
// STAGES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    Extracted,
    ValuesLocated,
    ManifestParsed,
    FeaturesExtracted,
    Preprocessed,
    Classified,
    Responded,
    Released,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Validated => "validated",
            Stage::Extracted => "extracted",
            Stage::ValuesLocated => "values_located",
            Stage::ManifestParsed => "manifest_parsed",
            Stage::FeaturesExtracted => "features_extracted",
            Stage::Preprocessed => "preprocessed",
            Stage::Classified => "classified",
            Stage::Responded => "responded",
            Stage::Released => "released",
        };
        f.write_str(name)
    }
}

fn enter(request_id: Uuid, stage: Stage) {
    log::debug!("[{}] {}", request_id, stage);
}

// ============================================================================
// VERIFIER
// ============================================================================

pub struct Verifier {
    pipeline: Arc<InferencePipeline>,
    extractor: ArchiveExtractor,
    locator: ValuesLocator,
    features: FeatureExtractor,
    workspace_root: PathBuf,
}

impl Verifier {
    pub fn new(
        pipeline: Arc<InferencePipeline>,
        workspace_root: impl Into<PathBuf>,
        limits: ExtractionLimits,
    ) -> Self {
        Self {
            pipeline,
            extractor: ArchiveExtractor::new(limits),
            locator: ValuesLocator::new(),
            features: FeatureExtractor::new(),
            workspace_root: workspace_root.into(),
        }
    }

    pub fn pipeline(&self) -> &InferencePipeline {
        &self.pipeline
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn limits(&self) -> &ExtractionLimits {
        self.extractor.limits()
    }

    /// Run one upload through the whole pipeline. Blocking.
    pub fn verify(&self, upload: UploadedArchive) -> VerifyResult<VerificationReport> {
        let request_id = Uuid::new_v4();
        self.verify_with_id(request_id, upload)
    }

    pub fn verify_with_id(&self, request_id: Uuid, upload: UploadedArchive) -> VerifyResult<VerificationReport> {
        let start_time = Instant::now();
        enter(request_id, Stage::Received);
        log::info!(
            "[{}] Verifying '{}' ({} bytes, sha256 {})",
            request_id,
            upload.filename,
            upload.bytes.len(),
            upload.sha256()
        );

        // Extension check happens before any disk is touched
        self.extractor.validate(&upload)?;
        enter(request_id, Stage::Validated);

        let workspace = Workspace::allocate(&self.workspace_root, request_id).map_err(VerifyError::Workspace)?;
        let result = self.run(request_id, &upload, &workspace);

        if let Err(e) = workspace.release() {
            log::error!("[{}] Failed to release workspace: {}", request_id, e);
        }
        enter(request_id, Stage::Released);

        match &result {
            Ok(report) => log::info!(
                "[{}] Verified '{}' in {}ms ({} outliers)",
                request_id,
                report.helm_file,
                start_time.elapsed().as_millis(),
                report.outliers().count()
            ),
            Err(e) => log::warn!("[{}] Verification failed: {}", request_id, e),
        }

        result
    }

    fn run(
        &self,
        request_id: Uuid,
        upload: &UploadedArchive,
        workspace: &Workspace,
    ) -> VerifyResult<VerificationReport> {
        // 1. Unpack into the request workspace
        let summary = self.extractor.extract(upload, workspace.path())?;
        log::debug!(
            "[{}] Extracted {} entries ({} bytes)",
            request_id,
            summary.entries,
            summary.total_bytes
        );
        enter(request_id, Stage::Extracted);

        // 2. Find and parse values.yaml
        let located = self.locator.locate(workspace.path())?;
        log::debug!("[{}] Using {}", request_id, located.relative.display());
        enter(request_id, Stage::ValuesLocated);

        let manifest = load_manifest(&located)?;
        enter(request_id, Stage::ManifestParsed);

        // 3. Fixed three-row table
        let table = self.features.extract(&manifest)?;
        enter(request_id, Stage::FeaturesExtracted);

        // 4. Model
        let matrix = self.pipeline.preprocess(&table)?;
        enter(request_id, Stage::Preprocessed);

        let labels = self.pipeline.predict(matrix.view())?;
        enter(request_id, Stage::Classified);

        let report = VerificationReport::build(upload.filename.clone(), table, labels);
        enter(request_id, Stage::Responded);
        Ok(report)
    }
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("pipeline", &self.pipeline)
            .field("workspace_root", &self.workspace_root)
            .field("limits", self.extractor.limits())
            .finish()
    }
}
